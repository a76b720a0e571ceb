//! # Guarantees
//!
//! A guarantee is a warranty sold with a repair. It is stored as its own
//! record, usually linked back to the ticket that produced it through
//! `dailyCustomerDataId`.
//!
//! ## Lifecycle
//! ```text
//!   create ──► isActive = true ──► deactivate ──► isActive = false
//!                                                      │
//!                         no way back ◄────────────────┘
//! ```
//!
//! A deactivated guarantee's fee is counted as demurrage in the daily
//! report of the day it was created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::branch::BranchRef;
use crate::business_day::{parse_instant, truncate_to_millis};
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::ticket::ExtraPart;
use crate::types::{Customer, Device};
use crate::validation::require;

// =============================================================================
// Stored Record
// =============================================================================

/// The repair a guarantee covers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GuaranteeProblem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_part: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_repaired: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GuaranteeTerms {
    /// e.g. "3 Months"
    #[serde(default)]
    pub duration: Option<String>,
    /// Fee charged for the guarantee.
    #[serde(default)]
    pub amount: Money,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GuaranteeMeta {
    #[serde(default)]
    pub entered_by: Option<String>,
    #[serde(default)]
    pub staff_email: Option<String>,
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub branch_id: Option<BranchRef>,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub branch_manager_name: Option<String>,
    #[serde(default)]
    pub branch_manager_email: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub issued_at: Option<DateTime<Utc>>,
    /// Creation instant; the daily report buckets guarantees by this field.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A stored guarantee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GuaranteeRecord {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "IdProvidedWhileCreatingData", default)]
    pub client_id: String,
    /// The ticket this guarantee was sold with.
    #[serde(default)]
    pub daily_customer_data_id: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub customer: Customer,
    #[serde(default)]
    pub device: Device,
    #[serde(default)]
    pub problem: GuaranteeProblem,
    #[serde(default)]
    pub guarantee: GuaranteeTerms,
    #[serde(default)]
    pub part: ExtraPart,
    #[serde(default)]
    pub meta: GuaranteeMeta,
}

impl GuaranteeRecord {
    /// Marks the guarantee inactive. There is no reverse operation.
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.meta.updated_at = Some(truncate_to_millis(now));
    }

    /// Fields matched by the free-text guarantee search.
    pub fn search_fields(&self) -> [&str; 3] {
        [&self.customer.name, &self.customer.phone, &self.device.brand]
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("IdProvidedWhileCreatingData", &self.client_id)?;
        require("customer.name", &self.customer.name)?;
        require("customer.phone", &self.customer.phone)?;
        require("device.brand", &self.device.brand)?;
        require("device.modelNo", &self.device.model_no)?;
        Ok(())
    }
}

// =============================================================================
// Submission
// =============================================================================

/// Guarantee terms as submitted. Dates may be RFC 3339 or `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGuaranteeTerms {
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// A guarantee as submitted by the counter app.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGuarantee {
    #[serde(rename = "IdProvidedWhileCreatingData", default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub daily_customer_data_id: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub device: Option<Device>,
    #[serde(default)]
    pub problem: Option<GuaranteeProblem>,
    #[serde(default)]
    pub guarantee: Option<NewGuaranteeTerms>,
    #[serde(default)]
    pub part: Option<ExtraPart>,
    #[serde(default)]
    pub meta: Option<GuaranteeMeta>,
}

impl NewGuarantee {
    /// Normalizes a submission into a record ready to store.
    ///
    /// - `isActive` defaults to true
    /// - fee and part cost default to 0
    /// - `meta.createdAt` is `now`, `meta.issuedAt` defaults to `now`
    /// - `ticket_id`, when given, overrides the submitted ticket link
    pub fn into_record(self, id: String, ticket_id: Option<&str>, now: DateTime<Utc>) -> CoreResult<GuaranteeRecord> {
        let now = truncate_to_millis(now);
        let terms = self.guarantee.unwrap_or_default();
        let mut meta = self.meta.unwrap_or_default();
        meta.issued_at = Some(meta.issued_at.map(truncate_to_millis).unwrap_or(now));
        meta.created_at = Some(now);
        meta.updated_at = None;

        let record = GuaranteeRecord {
            id,
            client_id: self.client_id.unwrap_or_default(),
            daily_customer_data_id: ticket_id
                .map(str::to_string)
                .or(self.daily_customer_data_id)
                .filter(|t| !t.trim().is_empty()),
            is_active: self.is_active.unwrap_or(true),
            customer: self.customer.unwrap_or_default().trimmed(),
            device: self.device.unwrap_or_default().trimmed(),
            problem: self.problem.unwrap_or_default(),
            guarantee: GuaranteeTerms {
                duration: terms.duration.filter(|d| !d.trim().is_empty()),
                amount: terms.amount.unwrap_or_default(),
                start_date: parse_optional_date("guarantee.startDate", terms.start_date.as_deref())?,
                end_date: parse_optional_date("guarantee.endDate", terms.end_date.as_deref())?,
            },
            part: self.part.unwrap_or_default(),
            meta,
        };
        record.validate()?;
        Ok(record)
    }
}

fn parse_optional_date(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ValidationError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_instant(s)
            .map(Some)
            .ok_or_else(|| ValidationError::invalid_format(field, "expected a date")),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
