//! # Ticket Repository
//!
//! Repair tickets ("daily customer data").
//!
//! ## Window Queries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DayWindow [start, end] (unix ms, inclusive)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQL: created_at BETWEEN start AND end   (idx_tickets_created)         │
//! │       ORDER BY created_at DESC           (newest first)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  decode doc ──► BranchMatch::matches(meta.branchId, branchId, id)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Branch filtering runs after decoding because the branch id may sit in
//! either of two fields and in either of two shapes.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::document::{decode_all, encode, DocRow};
use crate::error::{DbError, DbResult};
use cpr_core::business_day::DayWindow;
use cpr_core::ticket::Ticket;
use cpr_core::BranchMatch;

const ENTITY: &str = "ticket";

fn millis(ts: Option<DateTime<Utc>>, id: &str) -> DbResult<i64> {
    ts.map(|t| t.timestamp_millis())
        .ok_or_else(|| DbError::Internal(format!("ticket {id} has no timestamp")))
}

/// Repository for ticket database operations.
#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: SqlitePool,
}

impl TicketRepository {
    /// Creates a new TicketRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TicketRepository { pool }
    }

    /// Inserts a prepared ticket (id and timestamps already assigned).
    pub async fn insert(&self, ticket: &Ticket) -> DbResult<()> {
        debug!(id = %ticket.id, problems = ticket.problems.len(), "Inserting ticket");

        sqlx::query("INSERT INTO tickets (id, created_at, updated_at, doc) VALUES (?1, ?2, ?3, ?4)")
            .bind(&ticket.id)
            .bind(millis(ticket.created_at, &ticket.id)?)
            .bind(millis(ticket.updated_at, &ticket.id)?)
            .bind(encode(ticket)?)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Gets a ticket by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Ticket>> {
        let row: Option<DocRow> = sqlx::query_as("SELECT id, doc FROM tickets WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.decode(ENTITY)).transpose()
    }

    /// Replaces a stored ticket. Returns false when it does not exist.
    pub async fn update(&self, ticket: &Ticket) -> DbResult<bool> {
        debug!(id = %ticket.id, "Updating ticket");

        let result = sqlx::query("UPDATE tickets SET updated_at = ?2, doc = ?3 WHERE id = ?1")
            .bind(&ticket.id)
            .bind(millis(ticket.updated_at, &ticket.id)?)
            .bind(encode(ticket)?)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Tickets created inside `window` that belong to `branch_id` under
    /// `policy`, newest first.
    pub async fn list_for_branch(
        &self,
        branch_id: &str,
        window: &DayWindow,
        policy: BranchMatch,
    ) -> DbResult<Vec<Ticket>> {
        let rows: Vec<DocRow> = sqlx::query_as(
            r#"
            SELECT id, doc FROM tickets
            WHERE created_at BETWEEN ?1 AND ?2
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(window.start_millis())
        .bind(window.end_millis())
        .fetch_all(&self.pool)
        .await?;

        let in_window = rows.len();
        let tickets: Vec<Ticket> = decode_all::<Ticket>(ENTITY, rows)?
            .into_iter()
            .filter(|t| policy.matches(t.meta.branch_id.as_ref(), t.branch_id.as_ref(), branch_id))
            .collect();

        debug!(
            branch_id = %branch_id,
            date = %window.date,
            policy = policy.as_str(),
            in_window,
            matched = tickets.len(),
            "Listed tickets for branch"
        );
        Ok(tickets)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, NaiveDate};
    use cpr_core::ticket::{Amounts, Problem, Summary, TicketMeta};
    use cpr_core::{BranchRef, Customer, Device, Money};

    fn window() -> DayWindow {
        DayWindow::for_report_date(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
    }

    fn ticket(id: &str, nested: Option<BranchRef>, top: Option<BranchRef>, at: DateTime<Utc>) -> Ticket {
        let problems = vec![Problem {
            client_id: "p1".into(),
            work_part: "SCREEN".into(),
            problem_description: "cracked".into(),
            amounts: Amounts {
                base_amount: Some(Money::from_major(100)),
                collected_total: None,
            },
            ..Default::default()
        }];
        Ticket {
            id: id.into(),
            customer: Customer {
                name: "Karim".into(),
                phone: "017".into(),
            },
            device: Device {
                brand: "Nokia".into(),
                model_no: "3310".into(),
            },
            summary: Summary::recompute(&problems),
            problems,
            meta: TicketMeta {
                entered_by: "Rafi".into(),
                staff_id: Some("s1".into()),
                branch_id: nested,
                ..Default::default()
            },
            branch_id: top,
            created_at: Some(at),
            updated_at: Some(at),
            ..Default::default()
        }
    }

    async fn repo() -> TicketRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().tickets()
    }

    #[tokio::test]
    async fn test_insert_get_update() {
        let repo = repo().await;
        let mut t = ticket("t1", Some(BranchRef::structured("b1")), None, window().start);
        repo.insert(&t).await.unwrap();

        let stored = repo.get("t1").await.unwrap().unwrap();
        assert_eq!(stored, t);

        t.customer.name = "Karim Uddin".into();
        t.updated_at = Some(window().end);
        assert!(repo.update(&t).await.unwrap());
        assert_eq!(repo.get("t1").await.unwrap().unwrap().customer.name, "Karim Uddin");

        t.id = "missing".into();
        assert!(!repo.update(&t).await.unwrap());
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_window_boundaries() {
        let repo = repo().await;
        let w = window();
        let ms = Duration::milliseconds(1);
        let b = || Some(BranchRef::plain("b1"));

        repo.insert(&ticket("at-start", b(), None, w.start)).await.unwrap();
        repo.insert(&ticket("before-start", b(), None, w.start - ms)).await.unwrap();
        repo.insert(&ticket("at-end", b(), None, w.end)).await.unwrap();
        repo.insert(&ticket("after-end", b(), None, w.end + ms)).await.unwrap();

        let ids: Vec<String> = repo
            .list_for_branch("b1", &w, BranchMatch::AnyRepresentation)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["at-end".to_string(), "at-start".to_string()]);
    }

    #[tokio::test]
    async fn test_branch_representations() {
        let repo = repo().await;
        let at = window().start + Duration::hours(2);

        repo.insert(&ticket("nested-struct", Some(BranchRef::structured("b1")), None, at)).await.unwrap();
        repo.insert(&ticket("nested-plain", Some(BranchRef::plain("b1")), None, at)).await.unwrap();
        repo.insert(&ticket("top-plain", None, Some(BranchRef::plain("b1")), at)).await.unwrap();
        repo.insert(&ticket("other", Some(BranchRef::structured("b2")), None, at)).await.unwrap();

        let any = repo.list_for_branch("b1", &window(), BranchMatch::AnyRepresentation).await.unwrap();
        assert_eq!(any.len(), 3);
        assert!(any.iter().all(|t| t.id != "other"));

        let nested = repo.list_for_branch("b1", &window(), BranchMatch::NestedOnly).await.unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].id, "nested-plain");
    }
}
