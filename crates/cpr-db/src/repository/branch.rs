//! # Branch Repository
//!
//! Branches are plain rows; they have no nested fields worth a document.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use cpr_core::Branch;

#[derive(Debug, sqlx::FromRow)]
struct BranchRow {
    id: String,
    branch_name: String,
    branch_location: String,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Branch {
            id: row.id,
            branch_name: row.branch_name,
            branch_location: row.branch_location,
        }
    }
}

/// Repository for branch database operations.
#[derive(Debug, Clone)]
pub struct BranchRepository {
    pool: SqlitePool,
}

impl BranchRepository {
    /// Creates a new BranchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BranchRepository { pool }
    }

    /// Lists all branches in creation order.
    pub async fn list(&self) -> DbResult<Vec<Branch>> {
        let rows: Vec<BranchRow> = sqlx::query_as(
            "SELECT id, branch_name, branch_location FROM branches ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed branches");
        Ok(rows.into_iter().map(Branch::from).collect())
    }

    /// Gets a branch by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Branch>> {
        let row: Option<BranchRow> = sqlx::query_as(
            "SELECT id, branch_name, branch_location FROM branches WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Branch::from))
    }

    /// Inserts a new branch.
    pub async fn insert(&self, branch: &Branch) -> DbResult<()> {
        debug!(id = %branch.id, name = %branch.branch_name, "Inserting branch");

        sqlx::query("INSERT INTO branches (id, branch_name, branch_location) VALUES (?1, ?2, ?3)")
            .bind(&branch.id)
            .bind(&branch.branch_name)
            .bind(&branch.branch_location)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
