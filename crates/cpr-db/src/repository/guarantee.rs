//! # Guarantee Repository
//!
//! Guarantee records, the free-text search over them, and the bulk
//! replace used when a ticket's guarantees are edited.
//!
//! ## Replace For Ticket
//! ```text
//! BEGIN
//!   DELETE FROM guarantees WHERE ticket_id = ?     (every old record)
//!   INSERT ...                                     (each new record)
//! COMMIT                                           (all or nothing)
//! ```

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::document::{decode_all, encode, DocRow};
use crate::error::DbResult;
use cpr_core::business_day::DayWindow;
use cpr_core::guarantee::GuaranteeRecord;
use cpr_core::BranchMatch;

const ENTITY: &str = "guarantee";

// =============================================================================
// Search Filter
// =============================================================================

/// Filter for [`GuaranteeRepository::search`].
///
/// `pattern` is matched case-insensitively against customer name, customer
/// phone and device brand. `from`/`to` bound `guarantee.startDate`
/// inclusively; records without a start date drop out once either bound is
/// set.
#[derive(Debug, Clone, Default)]
pub struct GuaranteeSearch {
    pub pattern: Option<Regex>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl GuaranteeSearch {
    /// Compiles a case-insensitive search pattern. Blank input means no pattern.
    pub fn with_pattern(mut self, raw: &str) -> Result<Self, regex::Error> {
        let raw = raw.trim();
        self.pattern = if raw.is_empty() {
            None
        } else {
            Some(RegexBuilder::new(raw).case_insensitive(true).build()?)
        };
        Ok(self)
    }

    fn accepts(&self, record: &GuaranteeRecord) -> bool {
        match &self.pattern {
            None => true,
            Some(re) => record.search_fields().iter().any(|f| re.is_match(f)),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

async fn insert_one(conn: &mut SqliteConnection, record: &GuaranteeRecord) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO guarantees (id, ticket_id, created_at, start_date, doc) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&record.id)
    .bind(&record.daily_customer_data_id)
    .bind(record.meta.created_at.map(|t| t.timestamp_millis()))
    .bind(record.guarantee.start_date.map(|t| t.timestamp_millis()))
    .bind(encode(record)?)
    .execute(conn)
    .await?;
    Ok(())
}

/// Repository for guarantee database operations.
#[derive(Debug, Clone)]
pub struct GuaranteeRepository {
    pool: SqlitePool,
}

impl GuaranteeRepository {
    /// Creates a new GuaranteeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        GuaranteeRepository { pool }
    }

    /// Inserts every record in one transaction.
    pub async fn insert_many(&self, records: &[GuaranteeRecord]) -> DbResult<()> {
        debug!(count = records.len(), "Inserting guarantees");

        let mut tx = self.pool.begin().await?;
        for record in records {
            insert_one(&mut *tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Deletes every guarantee linked to `ticket_id` and inserts `records`
    /// in their place, atomically. Returns how many old records went.
    pub async fn replace_for_ticket(&self, ticket_id: &str, records: &[GuaranteeRecord]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM guarantees WHERE ticket_id = ?1")
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for record in records {
            insert_one(&mut *tx, record).await?;
        }
        tx.commit().await?;

        debug!(ticket_id = %ticket_id, removed, inserted = records.len(), "Replaced guarantees for ticket");
        Ok(removed)
    }

    /// Gets a guarantee by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<GuaranteeRecord>> {
        let row: Option<DocRow> = sqlx::query_as("SELECT id, doc FROM guarantees WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.decode(ENTITY)).transpose()
    }

    /// Replaces a stored guarantee. Returns false when it does not exist.
    pub async fn update(&self, record: &GuaranteeRecord) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE guarantees SET ticket_id = ?2, created_at = ?3, start_date = ?4, doc = ?5 WHERE id = ?1",
        )
        .bind(&record.id)
        .bind(&record.daily_customer_data_id)
        .bind(record.meta.created_at.map(|t| t.timestamp_millis()))
        .bind(record.guarantee.start_date.map(|t| t.timestamp_millis()))
        .bind(encode(record)?)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a guarantee. Returns false when it does not exist.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM guarantees WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(id = %id, deleted = result.rows_affected(), "Deleted guarantee");
        Ok(result.rows_affected() > 0)
    }

    /// Guarantees matching `filter`, newest start date first.
    pub async fn search(&self, filter: &GuaranteeSearch) -> DbResult<Vec<GuaranteeRecord>> {
        let rows: Vec<DocRow> = sqlx::query_as(
            r#"
            SELECT id, doc FROM guarantees
            WHERE (?1 IS NULL OR start_date >= ?1)
              AND (?2 IS NULL OR start_date <= ?2)
            ORDER BY start_date DESC, rowid DESC
            "#,
        )
        .bind(filter.from.map(|t| t.timestamp_millis()))
        .bind(filter.to.map(|t| t.timestamp_millis()))
        .fetch_all(&self.pool)
        .await?;

        let records: Vec<GuaranteeRecord> = decode_all::<GuaranteeRecord>(ENTITY, rows)?
            .into_iter()
            .filter(|g| filter.accepts(g))
            .collect();

        debug!(
            pattern = filter.pattern.as_ref().map(Regex::as_str),
            found = records.len(),
            "Searched guarantees"
        );
        Ok(records)
    }

    /// Guarantees created inside `window` that belong to `branch_id`.
    ///
    /// Only `meta.branchId` is consulted; guarantees carry no top-level
    /// branch field.
    pub async fn list_for_branch_in_window(
        &self,
        branch_id: &str,
        window: &DayWindow,
        policy: BranchMatch,
    ) -> DbResult<Vec<GuaranteeRecord>> {
        let rows: Vec<DocRow> = sqlx::query_as(
            r#"
            SELECT id, doc FROM guarantees
            WHERE created_at BETWEEN ?1 AND ?2
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(window.start_millis())
        .bind(window.end_millis())
        .fetch_all(&self.pool)
        .await?;

        let records: Vec<GuaranteeRecord> = decode_all::<GuaranteeRecord>(ENTITY, rows)?
            .into_iter()
            .filter(|g| policy.matches(g.meta.branch_id.as_ref(), None, branch_id))
            .collect();

        debug!(
            branch_id = %branch_id,
            date = %window.date,
            policy = policy.as_str(),
            matched = records.len(),
            "Listed guarantees for branch"
        );
        Ok(records)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, NaiveDate, TimeZone};
    use cpr_core::guarantee::{GuaranteeMeta, GuaranteeTerms};
    use cpr_core::{BranchRef, Customer, Device, Money};

    fn window() -> DayWindow {
        DayWindow::for_report_date(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
    }

    fn record(id: &str, name: &str, brand: &str, start_day: u32) -> GuaranteeRecord {
        GuaranteeRecord {
            id: id.into(),
            client_id: format!("client-{id}"),
            is_active: true,
            customer: Customer {
                name: name.into(),
                phone: "01700000000".into(),
            },
            device: Device {
                brand: brand.into(),
                model_no: "X".into(),
            },
            guarantee: GuaranteeTerms {
                duration: Some("3 Months".into()),
                amount: Money::from_major(200),
                start_date: Some(Utc.with_ymd_and_hms(2024, 3, start_day, 0, 0, 0).unwrap()),
                end_date: None,
            },
            meta: GuaranteeMeta {
                branch_id: Some(BranchRef::structured("b1")),
                created_at: Some(window().start + Duration::hours(1)),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn linked(mut r: GuaranteeRecord, ticket: &str) -> GuaranteeRecord {
        r.daily_customer_data_id = Some(ticket.into());
        r
    }

    async fn repo() -> GuaranteeRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().guarantees()
    }

    #[tokio::test]
    async fn test_insert_get_update_delete() {
        let repo = repo().await;
        let mut g = record("g1", "Karim", "Nokia", 1);
        repo.insert_many(std::slice::from_ref(&g)).await.unwrap();
        assert_eq!(repo.get("g1").await.unwrap().unwrap(), g);

        g.deactivate(window().end);
        assert!(repo.update(&g).await.unwrap());
        assert!(!repo.get("g1").await.unwrap().unwrap().is_active);

        assert!(repo.delete("g1").await.unwrap());
        assert!(!repo.delete("g1").await.unwrap());
        assert!(repo.get("g1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_for_ticket() {
        let repo = repo().await;
        repo.insert_many(&[
            linked(record("old1", "A", "Nokia", 1), "t1"),
            linked(record("old2", "B", "Nokia", 2), "t1"),
            linked(record("keep", "C", "Nokia", 3), "t2"),
        ])
        .await
        .unwrap();

        let removed = repo
            .replace_for_ticket("t1", &[linked(record("new1", "A", "Nokia", 4), "t1")])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(repo.get("old1").await.unwrap().is_none());
        assert!(repo.get("new1").await.unwrap().is_some());
        assert!(repo.get("keep").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_replace_is_atomic() {
        let repo = repo().await;
        repo.insert_many(&[linked(record("old1", "A", "Nokia", 1), "t1")])
            .await
            .unwrap();

        // second insert collides with the first, so nothing may change
        let dup = linked(record("dup", "A", "Nokia", 2), "t1");
        let err = repo.replace_for_ticket("t1", &[dup.clone(), dup]).await;
        assert!(err.is_err());
        assert!(repo.get("old1").await.unwrap().is_some());
        assert!(repo.get("dup").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_pattern_and_dates() {
        let repo = repo().await;
        repo.insert_many(&[
            record("g1", "Karim", "Nokia", 1),
            record("g2", "Rahim", "Samsung", 5),
            record("g3", "karima", "Xiaomi", 9),
        ])
        .await
        .unwrap();

        let all = repo.search(&GuaranteeSearch::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["g3", "g2", "g1"]);

        let by_name = GuaranteeSearch::default().with_pattern("KARIM").unwrap();
        assert_eq!(repo.search(&by_name).await.unwrap().len(), 2);

        let by_brand = GuaranteeSearch::default().with_pattern("sams").unwrap();
        assert_eq!(repo.search(&by_brand).await.unwrap()[0].id, "g2");

        let ranged = GuaranteeSearch {
            from: Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert_eq!(repo.search(&ranged).await.unwrap().len(), 2);

        assert!(GuaranteeSearch::default().with_pattern("(").is_err());
        assert!(GuaranteeSearch::default().with_pattern("  ").unwrap().pattern.is_none());
    }

    #[tokio::test]
    async fn test_list_for_branch_in_window() {
        let repo = repo().await;
        let mut plain = record("plain", "A", "Nokia", 1);
        plain.meta.branch_id = Some(BranchRef::plain("b1"));
        let mut late = record("late", "B", "Nokia", 1);
        late.meta.created_at = Some(window().end + Duration::milliseconds(1));
        let mut other = record("other", "C", "Nokia", 1);
        other.meta.branch_id = Some(BranchRef::structured("b2"));

        repo.insert_many(&[record("structured", "D", "Nokia", 1), plain, late, other])
            .await
            .unwrap();

        let found = repo
            .list_for_branch_in_window("b1", &window(), BranchMatch::AnyRepresentation)
            .await
            .unwrap();
        let mut ids: Vec<_> = found.iter().map(|g| g.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["plain", "structured"]);

        let found = repo
            .list_for_branch_in_window("b1", &window(), BranchMatch::NestedOnly)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "plain");
    }
}
