//! # Business Day
//!
//! Every branch closes its books on Dhaka time (UTC+6, no daylight saving).
//! A calendar day on that clock maps to this UTC range:
//!
//! ```text
//!   Dhaka  2024-03-10 00:00:00.000 ─────────────── 2024-03-10 23:59:59.999
//!            │                                                │
//!            ▼  −6h                                           ▼  −6h
//!   UTC    2024-03-09 18:00:00.000 ─────────────── 2024-03-10 17:59:59.999
//!          start (inclusive)                       end (inclusive)
//! ```
//!
//! Two entry points exist and are kept apart on purpose:
//! - [`DayWindow::for_report_date`] takes the explicit date a report asks for
//! - [`DayWindow::business_today`] answers "which day is it in Dhaka right now"
//!   for the ticket listing
//!
//! Neither reads the clock. Callers pass `now` in.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::ValidationError;
use crate::BUSINESS_UTC_OFFSET_HOURS;

/// An inclusive UTC range covering one business-timezone calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    /// The calendar date on the business clock.
    pub date: NaiveDate,
    /// Local 00:00:00.000 expressed in UTC.
    pub start: DateTime<Utc>,
    /// Local 23:59:59.999 expressed in UTC.
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// Window for an explicit calendar date, as requested by a report.
    ///
    /// Dates at the very edge of chrono's range clamp to it.
    pub fn for_report_date(date: NaiveDate) -> Self {
        let offset = Duration::hours(BUSINESS_UTC_OFFSET_HOURS);
        let local_midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        let start = local_midnight
            .checked_sub_signed(offset)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = start
            .checked_add_signed(Duration::days(1) - Duration::milliseconds(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        DayWindow { date, start, end }
    }

    /// Window for the current calendar day on the business clock.
    pub fn business_today(now: DateTime<Utc>) -> Self {
        let local_now = now + Duration::hours(BUSINESS_UTC_OFFSET_HOURS);
        Self::for_report_date(local_now.date_naive())
    }

    /// Inclusive on both ends.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Start as unix milliseconds (storage representation).
    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// End as unix milliseconds (storage representation).
    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }
}

/// Parses a report date in strict `YYYY-MM-DD` form.
///
/// ## Example
/// ```rust
/// use cpr_core::business_day::parse_report_date;
///
/// assert!(parse_report_date("2024-03-10").is_ok());
/// assert!(parse_report_date("10/03/2024").is_err());
/// ```
pub fn parse_report_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::required("date"));
    }
    let bad = || ValidationError::invalid_format("date", "expected YYYY-MM-DD");

    // chrono's %Y also takes signed and longer years
    let shaped = raw.len() == 10
        && raw.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(bad());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| bad())
}

/// Parses an instant sent by a client.
///
/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (taken as UTC
/// midnight, the way browsers read them). Returns `None` for anything else.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(truncate_to_millis(dt.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)))
}

/// Drops sub-millisecond precision, which the store does not keep.
pub fn truncate_to_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(instant.timestamp_millis()).unwrap_or(instant)
}

// =============================================================================
// Unit Tests
// =============================================================================
