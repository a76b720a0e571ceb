//! # Repair Tickets
//!
//! A ticket is one customer intake at a branch counter ("daily customer
//! data"). It lists the problems found on the device, what each one costs,
//! and who entered it.
//!
//! ## Ticket Shape
//! ```text
//! Ticket
//! ├── customer { name, phone }
//! ├── device   { brand, modelNo }
//! ├── problems [ Problem, ... ]          at least one
//! │     ├── workPart, problemDescription, partRepaired
//! │     ├── extraPart { used, source, partCost }
//! │     ├── guarantee { included, duration, amount, startDate, endDate }
//! │     └── amounts   { baseAmount, collectedTotal }
//! ├── summary  { baseTotalCollectedORServiceCharge, netTotalCollected,
//! │              totalPartsCost, profit }  derived from problems
//! ├── meta     { enteredBy, staffId, branchId, branchName, ... }
//! ├── branchId                            legacy top-level location
//! └── expenses [ { label, amount } ]      optional
//! ```
//!
//! ## Summary Recomputation
//! The summary is stored, but whenever an update replaces the problem list
//! it is rebuilt from scratch by [`Summary::recompute`]. It is never merged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::branch::BranchRef;
use crate::business_day::truncate_to_millis;
use crate::document::merge_top_level;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Customer, Device};
use crate::validation::require;

// =============================================================================
// Problem
// =============================================================================

/// Where a replacement part came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PartSource {
    Stock,
    Outside,
}

/// A spare part fitted while fixing a problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExtraPart {
    #[serde(default)]
    pub used: bool,
    #[serde(default)]
    pub source: Option<PartSource>,
    #[serde(default)]
    pub stock_item_id: Option<String>,
    #[serde(default)]
    pub outside_shop_id: Option<String>,
    #[serde(default)]
    pub part_cost: Money,
}

impl ExtraPart {
    /// Cost counted against the ticket; zero unless the part was used.
    pub fn counted_cost(&self) -> Money {
        if self.used {
            self.part_cost
        } else {
            Money::zero()
        }
    }
}

/// Guarantee terms sold with a single problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProblemGuarantee {
    #[serde(default)]
    pub eligible: bool,
    #[serde(default)]
    pub included: bool,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
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
pub struct Amounts {
    /// Service charge plus parts for this problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_amount: Option<Money>,
    /// Base amount plus guarantee fee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_total: Option<Money>,
}

/// One reported issue on a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Problem {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Id the client generated for the problem before the ticket existed.
    #[serde(rename = "IdProvidedWhileCreatingData", default)]
    pub client_id: String,
    #[serde(default)]
    pub work_part: String,
    #[serde(default)]
    pub problem_description: String,
    #[serde(default)]
    pub part_repaired: String,
    #[serde(default)]
    pub extra_part: ExtraPart,
    #[serde(default)]
    pub guarantee: ProblemGuarantee,
    #[serde(default)]
    pub amounts: Amounts,
    /// Flat amount written by early clients, read only when `amounts.baseAmount` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_amount: Option<Money>,
    /// Flat guarantee fee written by early clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guarantee_amount: Option<Money>,
}

impl Problem {
    /// Base amount, falling back to the legacy flat field.
    pub fn effective_base_amount(&self) -> Money {
        self.amounts.base_amount.or(self.base_amount).unwrap_or_default()
    }

    /// Guarantee fee, falling back to the legacy flat field.
    pub fn effective_guarantee_amount(&self) -> Money {
        self.guarantee.amount.or(self.guarantee_amount).unwrap_or_default()
    }

    /// Base amount as recorded under `amounts`, zero when absent.
    pub fn structured_base_amount(&self) -> Money {
        self.amounts.base_amount.unwrap_or_default()
    }

    fn validate(&self, index: usize) -> Result<(), ValidationError> {
        require(&format!("problems[{index}].IdProvidedWhileCreatingData"), &self.client_id)?;
        require(&format!("problems[{index}].workPart"), &self.work_part)?;
        require(&format!("problems[{index}].problemDescription"), &self.problem_description)?;
        Ok(())
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Ticket totals derived from its problems.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Summary {
    #[serde(rename = "baseTotalCollectedORServiceCharge", default)]
    pub base_total: Money,
    #[serde(default)]
    pub net_total_collected: Money,
    #[serde(default)]
    pub total_parts_cost: Money,
    #[serde(default)]
    pub profit: Money,
}

impl Summary {
    /// Rebuilds the summary from a problem list.
    ///
    /// ```text
    /// baseTotal      = Σ base
    /// netTotal       = Σ (base + guarantee fee)
    /// totalPartsCost = Σ partCost where extraPart.used
    /// profit         = netTotal − totalPartsCost
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use cpr_core::ticket::{Problem, Summary};
    /// use cpr_core::Money;
    ///
    /// let mut p = Problem::default();
    /// p.amounts.base_amount = Some(Money::from_major(100));
    /// let s = Summary::recompute(&[p]);
    /// assert_eq!(s.profit, Money::from_major(100));
    /// ```
    pub fn recompute(problems: &[Problem]) -> Summary {
        let mut summary = Summary::default();
        for p in problems {
            let base = p.effective_base_amount();
            summary.base_total += base;
            summary.net_total_collected += base + p.effective_guarantee_amount();
            summary.total_parts_cost += p.extra_part.counted_cost();
        }
        summary.profit = summary.net_total_collected - summary.total_parts_cost;
        summary
    }
}

// =============================================================================
// Ticket
// =============================================================================

/// Who entered a ticket and for which branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TicketMeta {
    /// Staff display name.
    #[serde(default)]
    pub entered_by: String,
    #[serde(default)]
    pub staff_email: String,
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub branch_id: Option<BranchRef>,
    #[serde(default)]
    pub branch_name: String,
    #[serde(default)]
    pub branch_manager_name: Option<String>,
    #[serde(default)]
    pub branch_manager_email: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl TicketMeta {
    /// The entering staff id, ignoring blanks.
    pub fn staff_id(&self) -> Option<&str> {
        self.staff_id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// A standalone cost booked against a ticket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub amount: Money,
}

/// One repair intake.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Ticket {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub is_guarantee_service: bool,
    #[serde(default)]
    pub customer: Customer,
    #[serde(default)]
    pub device: Device,
    #[serde(default)]
    pub problems: Vec<Problem>,
    #[serde(default)]
    pub summary: Summary,
    #[serde(default)]
    pub meta: TicketMeta,
    /// Branch id at the top level, as written by early clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<BranchRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expenses: Option<Vec<ExpenseEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Turns a submitted ticket into one ready to store.
    ///
    /// Assigns the id and timestamps, trims customer and device text, and
    /// validates. The submitted summary is kept as sent.
    pub fn prepare_new(mut self, id: String, now: DateTime<Utc>) -> CoreResult<Ticket> {
        let now = truncate_to_millis(now);
        self.id = id;
        self.customer = self.customer.trimmed();
        self.device = self.device.trimmed();
        self.meta.submitted_at = Some(self.meta.submitted_at.map(truncate_to_millis).unwrap_or(now));
        self.created_at = Some(now);
        self.updated_at = Some(now);
        self.validate()?;
        Ok(self)
    }

    /// Applies a partial update.
    ///
    /// When the patch carries `problems` as an array the summary is rebuilt
    /// from it, replacing any summary in the patch. Without `problems` the
    /// stored summary stays as it is. The result is validated again.
    pub fn apply_update(&self, mut patch: Map<String, Value>, now: DateTime<Utc>) -> CoreResult<Ticket> {
        if let Some(Value::Array(items)) = patch.get("problems") {
            let problems: Vec<Problem> = serde_json::from_value(Value::Array(items.clone()))
                .map_err(|e| CoreError::InvalidUpdate(format!("problems: {e}")))?;
            let summary = serde_json::to_value(Summary::recompute(&problems))
                .map_err(|e| CoreError::InvalidUpdate(e.to_string()))?;
            patch.insert("summary".to_string(), summary);
        }
        patch.remove("updatedAt");

        let mut updated = merge_top_level(self, patch)?;
        updated.customer = updated.customer.trimmed();
        updated.device = updated.device.trimmed();
        updated.updated_at = Some(truncate_to_millis(now));
        updated.validate()?;
        Ok(updated)
    }

    /// Checks the fields every stored ticket must have.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("customer.name", &self.customer.name)?;
        require("customer.phone", &self.customer.phone)?;
        require("device.brand", &self.device.brand)?;
        require("device.modelNo", &self.device.model_no)?;
        require("meta.enteredBy", &self.meta.entered_by)?;
        match &self.meta.branch_id {
            Some(b) if !b.is_blank() => {}
            _ => return Err(ValidationError::required("meta.branchId")),
        }
        if self.problems.is_empty() {
            return Err(ValidationError::Empty {
                field: "problem".to_string(),
            });
        }
        for (i, p) in self.problems.iter().enumerate() {
            p.validate(i)?;
        }
        Ok(())
    }

    /// Sum of the standalone expense entries, zero when there are none.
    pub fn expense_total(&self) -> Money {
        self.expenses.iter().flatten().map(|e| e.amount).sum()
    }

    /// Brand for grouping, `None` when blank.
    pub fn brand(&self) -> Option<&str> {
        let brand = self.device.brand.trim();
        (!brand.is_empty()).then_some(brand)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
