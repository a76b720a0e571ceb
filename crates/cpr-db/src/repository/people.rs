//! # People Repository
//!
//! Admins, managers and staff, each role in its own table.
//!
//! ## Table Layout
//! ```text
//! ┌──────────┬──────────────────────────────────────────────────────────┐
//! │ Role     │ Table                                                    │
//! ├──────────┼──────────────────────────────────────────────────────────┤
//! │ admin    │ admins   (id, email UNIQUE, password, branch_id, doc)    │
//! │ manager  │ managers (id, email UNIQUE, password, branch_id, doc)    │
//! │ staff    │ staff    (id, email UNIQUE, password, branch_id, doc)    │
//! └──────────┴──────────────────────────────────────────────────────────┘
//! ```
//!
//! `branch_id` holds the canonical branch id text so login can filter on it
//! in SQL whatever shape the document stores.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::document::{decode, decode_all, encode, DocRow};
use crate::error::{DbError, DbResult};
use cpr_core::{PersonRecord, Role};

fn table(role: Role) -> &'static str {
    match role {
        Role::Admin => "admins",
        Role::Manager => "managers",
        Role::Staff => "staff",
    }
}

fn canonical_branch(record: &PersonRecord) -> Option<String> {
    record
        .branch_id
        .as_ref()
        .filter(|b| !b.is_blank())
        .map(|b| b.canonical().to_string())
}

/// Repository for person database operations.
#[derive(Debug, Clone)]
pub struct PeopleRepository {
    pool: SqlitePool,
}

impl PeopleRepository {
    /// Creates a new PeopleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PeopleRepository { pool }
    }

    /// True when any admin, manager or staff member already uses `email`.
    pub async fn email_exists(&self, email: &str) -> DbResult<bool> {
        let exists: i64 = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM admins WHERE email = ?1)
                OR EXISTS(SELECT 1 FROM managers WHERE email = ?1)
                OR EXISTS(SELECT 1 FROM staff WHERE email = ?1)
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists != 0)
    }

    /// Inserts a person into the table for their role.
    pub async fn insert(&self, record: &PersonRecord, password: &str) -> DbResult<()> {
        debug!(id = %record.id, role = %record.role, "Inserting person");

        let sql = format!(
            "INSERT INTO {} (id, email, password, branch_id, doc) VALUES (?1, ?2, ?3, ?4, ?5)",
            table(record.role)
        );
        sqlx::query(&sql)
            .bind(&record.id)
            .bind(&record.email)
            .bind(password)
            .bind(canonical_branch(record))
            .bind(encode(record)?)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &record.email),
                other => other,
            })?;

        Ok(())
    }

    /// Lists every person with the given role, in creation order.
    pub async fn list(&self, role: Role) -> DbResult<Vec<PersonRecord>> {
        let sql = format!("SELECT id, doc FROM {} ORDER BY rowid", table(role));
        let rows: Vec<DocRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        decode_all(role.as_str(), rows)
    }

    /// Gets a person by id.
    pub async fn get(&self, role: Role, id: &str) -> DbResult<Option<PersonRecord>> {
        let sql = format!("SELECT id, doc FROM {} WHERE id = ?1", table(role));
        let row: Option<DocRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| r.decode(role.as_str())).transpose()
    }

    /// Replaces a stored person. A new password is written only when given.
    ///
    /// Returns false when no row has the record's id.
    pub async fn update(&self, record: &PersonRecord, password: Option<&str>) -> DbResult<bool> {
        debug!(id = %record.id, role = %record.role, "Updating person");

        let sql = format!(
            "UPDATE {} SET email = ?2, branch_id = ?3, doc = ?4, password = COALESCE(?5, password) WHERE id = ?1",
            table(record.role)
        );
        let result = sqlx::query(&sql)
            .bind(&record.id)
            .bind(&record.email)
            .bind(canonical_branch(record))
            .bind(encode(record)?)
            .bind(password)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a person, returning the removed record.
    pub async fn delete(&self, role: Role, id: &str) -> DbResult<Option<PersonRecord>> {
        let sql = format!("DELETE FROM {} WHERE id = ?1 RETURNING id, doc", table(role));
        let row: Option<DocRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        debug!(id = %id, role = %role, deleted = row.is_some(), "Deleted person");
        row.map(|r| r.decode(role.as_str())).transpose()
    }

    /// Batch lookup of staff records by id.
    ///
    /// Ids with no staff record are simply absent from the map.
    pub async fn find_staff_by_ids(&self, ids: &[String]) -> DbResult<HashMap<String, PersonRecord>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id, doc FROM staff WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows: Vec<DocRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        debug!(requested = ids.len(), found = rows.len(), "Staff batch lookup");

        rows.into_iter()
            .map(|row| {
                let record: PersonRecord = decode("staff", &row.id, &row.doc)?;
                Ok((row.id, record))
            })
            .collect()
    }

    /// Finds the person matching a login attempt.
    ///
    /// Admins match on email and password; managers and staff must also
    /// belong to `branch_id`.
    pub async fn find_for_login(
        &self,
        role: Role,
        email: &str,
        password: &str,
        branch_id: Option<&str>,
    ) -> DbResult<Option<PersonRecord>> {
        let row: Option<DocRow> = if role.requires_branch() {
            let sql = format!(
                "SELECT id, doc FROM {} WHERE email = ?1 AND password = ?2 AND branch_id = ?3",
                table(role)
            );
            sqlx::query_as(&sql)
                .bind(email)
                .bind(password)
                .bind(branch_id.unwrap_or_default().trim())
                .fetch_optional(&self.pool)
                .await?
        } else {
            let sql = format!("SELECT id, doc FROM {} WHERE email = ?1 AND password = ?2", table(role));
            sqlx::query_as(&sql)
                .bind(email)
                .bind(password)
                .fetch_optional(&self.pool)
                .await?
        };

        row.map(|r| r.decode(role.as_str())).transpose()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use cpr_core::{BranchRef, Percentage};
    use serde_json::json;

    fn person(id: &str, email: &str, role: &str) -> PersonRecord {
        let body = json!({
            "name": format!("Person {id}"),
            "phone": "017",
            "email": email,
            "password": "pw",
            "role": role,
            "branchName": "Mirpur",
            "branchId": { "$oid": "b1" },
            "salaryPercentage": 25,
            "managerDailySalary": 900
        })
        .as_object()
        .cloned()
        .unwrap();
        let (mut record, _) = PersonRecord::from_submission(body).unwrap();
        record.id = id.to_string();
        record
    }

    async fn repo() -> PeopleRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().people()
    }

    #[tokio::test]
    async fn test_insert_get_list() {
        let repo = repo().await;
        repo.insert(&person("s1", "a@x.com", "staff"), "pw").await.unwrap();
        repo.insert(&person("m1", "b@x.com", "manager"), "pw").await.unwrap();

        assert_eq!(repo.list(Role::Staff).await.unwrap().len(), 1);
        assert_eq!(repo.list(Role::Manager).await.unwrap().len(), 1);
        assert!(repo.list(Role::Admin).await.unwrap().is_empty());

        let s = repo.get(Role::Staff, "s1").await.unwrap().unwrap();
        assert_eq!(s.salary_percentage, Some(Percentage::from_percent(25)));
        assert!(repo.get(Role::Manager, "s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_email_exists_across_roles() {
        let repo = repo().await;
        repo.insert(&person("m1", "boss@x.com", "manager"), "pw").await.unwrap();

        assert!(repo.email_exists("boss@x.com").await.unwrap());
        assert!(!repo.email_exists("other@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_in_same_table() {
        let repo = repo().await;
        repo.insert(&person("s1", "a@x.com", "staff"), "pw").await.unwrap();
        let err = repo.insert(&person("s2", "a@x.com", "staff"), "pw").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = repo().await;
        let mut s = person("s1", "a@x.com", "staff");
        repo.insert(&s, "pw").await.unwrap();

        s.name = "Renamed".into();
        assert!(repo.update(&s, Some("new")).await.unwrap());
        assert_eq!(repo.get(Role::Staff, "s1").await.unwrap().unwrap().name, "Renamed");
        assert!(repo.find_for_login(Role::Staff, "a@x.com", "new", Some("b1")).await.unwrap().is_some());

        let removed = repo.delete(Role::Staff, "s1").await.unwrap().unwrap();
        assert_eq!(removed.name, "Renamed");
        assert!(repo.delete(Role::Staff, "s1").await.unwrap().is_none());

        let mut ghost = person("s9", "g@x.com", "staff");
        ghost.name = "Ghost".into();
        assert!(!repo.update(&ghost, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_staff_by_ids() {
        let repo = repo().await;
        repo.insert(&person("s1", "a@x.com", "staff"), "pw").await.unwrap();
        repo.insert(&person("s2", "b@x.com", "staff"), "pw").await.unwrap();

        let found = repo
            .find_staff_by_ids(&["s1".to_string(), "gone".to_string(), "s2".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found["s2"].name, "Person s2");

        assert!(repo.find_staff_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_checks_branch_for_staff_only() {
        let repo = repo().await;
        repo.insert(&person("s1", "a@x.com", "staff"), "pw").await.unwrap();

        let mut admin = person("a1", "root@x.com", "admin");
        admin.branch_id = None;
        repo.insert(&admin, "root").await.unwrap();

        assert!(repo.find_for_login(Role::Staff, "a@x.com", "pw", Some("b1")).await.unwrap().is_some());
        assert!(repo.find_for_login(Role::Staff, "a@x.com", "pw", Some("b2")).await.unwrap().is_none());
        assert!(repo.find_for_login(Role::Staff, "a@x.com", "bad", Some("b1")).await.unwrap().is_none());
        assert!(repo.find_for_login(Role::Admin, "root@x.com", "root", None).await.unwrap().is_some());

        let s = repo.get(Role::Staff, "s1").await.unwrap().unwrap();
        assert_eq!(s.branch_id, Some(BranchRef::structured("b1")));
    }
}
