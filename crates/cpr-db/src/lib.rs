//! # cpr-db: Database Layer for the CPR Back Office
//!
//! SQLite-backed document store for branches, people, repair tickets and
//! guarantees, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CPR Data Flow                                    │
//! │                                                                         │
//! │  HTTP handler (daily_report, create_ticket, ...)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     cpr-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ BranchRepo     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ PeopleRepo     │    │ 001_initial  │  │   │
//! │  │   │               │    │ TicketRepo     │    │              │  │   │
//! │  │   │               │    │ GuaranteeRepo  │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (DATABASE_PATH, default ./data/cpr.db)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cpr_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/cpr.db")).await?;
//! let branches = db.branches().list().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

mod document;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::branch::BranchRepository;
pub use repository::guarantee::{GuaranteeRepository, GuaranteeSearch};
pub use repository::people::PeopleRepository;
pub use repository::ticket::TicketRepository;
