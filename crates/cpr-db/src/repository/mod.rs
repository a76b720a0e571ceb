//! # Repository Module
//!
//! Database repository implementations for the back office.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.tickets().list_for_branch("b1", &window, policy)           │
//! │       ▼                                                                 │
//! │  TicketRepository                                                      │
//! │  ├── insert / get / update                                             │
//! │  └── list_for_branch (time window in SQL, branch policy in Rust)       │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`branch::BranchRepository`] - Branch list and create
//! - [`people::PeopleRepository`] - Admins, managers, staff; login lookup; staff batch lookup
//! - [`ticket::TicketRepository`] - Repair tickets
//! - [`guarantee::GuaranteeRepository`] - Guarantees, search, replace-for-ticket

pub mod branch;
pub mod guarantee;
pub mod people;
pub mod ticket;
