//! # cpr-core: Pure Business Logic for the CPR Back Office
//!
//! This crate holds every rule of the repair back office that does not need
//! a database or a network: money, repair tickets, guarantees, branch-id
//! normalization, business-day windows and the daily branch report.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     CPR Back Office Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Manager / Staff web app (TypeScript)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cpr-api (axum handlers)                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cpr-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────────┐ ┌──────────────┐  │   │
//! │  │   │  money   │ │  ticket  │ │ business_day │ │    report    │  │   │
//! │  │   │  Money   │ │ Summary  │ │  DayWindow   │ │ DailyReport  │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────────┘ └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                cpr-db (SQLite document store)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - People, branches, roles, percentages
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`branch`] - Branch id representations and match policies
//! - [`business_day`] - UTC+6 calendar-day windows
//! - [`ticket`] - Repair tickets and summary recomputation
//! - [`guarantee`] - Warranty records
//! - [`report`] - Daily branch report aggregation
//! - [`document`] - Top-level merge for partial updates
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use cpr_core::business_day::DayWindow;
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
//! let window = DayWindow::for_report_date(date);
//!
//! // Dhaka midnight is 18:00 UTC on the previous day
//! assert_eq!(window.start.to_rfc3339(), "2024-03-09T18:00:00+00:00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod branch;
pub mod business_day;
pub mod document;
pub mod error;
pub mod guarantee;
pub mod money;
pub mod report;
pub mod ticket;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use branch::{BranchMatch, BranchRef, ReportPolicy};
pub use business_day::DayWindow;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Offset of the business timezone (Asia/Dhaka) from UTC, in hours.
///
/// Bangladesh has observed no daylight saving since 2009, so the offset is
/// fixed. Every "calendar day" in this system is a day on this clock.
pub const BUSINESS_UTC_OFFSET_HOURS: i64 = 6;

/// Label for problems submitted without a work-part category.
pub const UNKNOWN_SERVICE_LABEL: &str = "Unknown Service";

/// Name shown for staff ids that no longer resolve to a staff record.
pub const UNKNOWN_STAFF_NAME: &str = "Unknown";
