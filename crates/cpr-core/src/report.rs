//! # Daily Branch Report
//!
//! Aggregates one branch's business day into the report managers close the
//! day with.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  tickets in window ──► TicketTally::from_tickets                        │
//! │                          ├── per staff:   count, Σ netTotalCollected    │
//! │                          ├── per service: count, Σ amounts.baseAmount   │
//! │                          ├── per brand:   count                         │
//! │                          ├── partsIncome: Σ used extraPart.partCost     │
//! │                          └── expenses:    Σ ticket.expenses[].amount    │
//! │                                   │                                     │
//! │                        staff_ids()│──► staff directory batch lookup     │
//! │                                   ▼                                     │
//! │  guarantees in window ──► GuaranteeTally ──► build_daily_report         │
//! │                            ├── guaranteeTotal   Σ amount                │
//! │                            └── demurrageTotal   Σ amount (inactive)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals
//! ```text
//! netIncome = totalStaffEarnings + totalMachineIncome + partsIncome
//!           − (totalExpenses + demurrageTotal)
//! ```
//! Staff earnings and machine income are both taken from the same tickets.
//! They are reported as two separate lines and both enter the net figure.
//!
//! Groups keep the order in which their key was first seen in the ticket
//! list, so the report reads in the same order the store returned tickets.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::guarantee::GuaranteeRecord;
use crate::money::Money;
use crate::ticket::{ExpenseEntry, Ticket};
use crate::types::{Percentage, PersonRecord};
use crate::{UNKNOWN_SERVICE_LABEL, UNKNOWN_STAFF_NAME};

// =============================================================================
// Ticket Pass
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffTally {
    pub staff_id: String,
    pub ticket_count: u32,
    pub earnings: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTally {
    pub name: String,
    pub count: u32,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandTally {
    pub brand: String,
    pub count: u32,
}

/// Everything the report needs from one day's tickets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketTally {
    pub staff: Vec<StaffTally>,
    pub services: Vec<ServiceTally>,
    pub brands: Vec<BrandTally>,
    pub parts_income: Money,
    pub total_expenses: Money,
}

impl TicketTally {
    /// Runs the ticket pass.
    ///
    /// Tickets without a staff id still count toward services, brands,
    /// parts and expenses; they are only left out of the staff groups.
    pub fn from_tickets<'a, I>(tickets: I) -> Self
    where
        I: IntoIterator<Item = &'a Ticket>,
    {
        let mut tally = TicketTally::default();
        let mut staff_index: HashMap<String, usize> = HashMap::new();
        let mut service_index: HashMap<String, usize> = HashMap::new();
        let mut brand_index: HashMap<String, usize> = HashMap::new();

        for ticket in tickets {
            if let Some(staff_id) = ticket.meta.staff_id() {
                let i = *staff_index.entry(staff_id.to_string()).or_insert_with(|| {
                    tally.staff.push(StaffTally {
                        staff_id: staff_id.to_string(),
                        ticket_count: 0,
                        earnings: Money::zero(),
                    });
                    tally.staff.len() - 1
                });
                tally.staff[i].ticket_count += 1;
                tally.staff[i].earnings += ticket.summary.net_total_collected;
            }

            for problem in &ticket.problems {
                let name = match problem.work_part.trim() {
                    "" => UNKNOWN_SERVICE_LABEL,
                    part => part,
                };
                let i = *service_index.entry(name.to_string()).or_insert_with(|| {
                    tally.services.push(ServiceTally {
                        name: name.to_string(),
                        count: 0,
                        amount: Money::zero(),
                    });
                    tally.services.len() - 1
                });
                tally.services[i].count += 1;
                tally.services[i].amount += problem.structured_base_amount();
                tally.parts_income += problem.extra_part.counted_cost();
            }

            if let Some(brand) = ticket.brand() {
                let i = *brand_index.entry(brand.to_string()).or_insert_with(|| {
                    tally.brands.push(BrandTally {
                        brand: brand.to_string(),
                        count: 0,
                    });
                    tally.brands.len() - 1
                });
                tally.brands[i].count += 1;
            }

            tally.total_expenses += ticket.expense_total();
        }

        tally
    }

    /// Distinct staff ids in first-seen order, for the directory lookup.
    pub fn staff_ids(&self) -> Vec<String> {
        self.staff.iter().map(|s| s.staff_id.clone()).collect()
    }
}

// =============================================================================
// Guarantee Pass
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuaranteeTally {
    pub guarantee_total: Money,
    pub demurrage_total: Money,
}

impl GuaranteeTally {
    /// Sums all fees, and separately the fees of deactivated guarantees.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a GuaranteeRecord>,
    {
        records.into_iter().fold(GuaranteeTally::default(), |mut acc, g| {
            acc.guarantee_total += g.guarantee.amount;
            if !g.is_active {
                acc.demurrage_total += g.guarantee.amount;
            }
            acc
        })
    }
}

// =============================================================================
// Report DTOs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StaffLine {
    pub staff_id: String,
    pub name: String,
    pub total_customers: u32,
    pub total_earnings: Money,
    pub salary_percent: Percentage,
    pub salary_amount: Money,
    pub net_pay: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MachineLine {
    pub name: String,
    pub count: u32,
    pub total_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct BrandLine {
    pub brand: String,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GuaranteeTotals {
    pub guarantee_total: Money,
    pub demurrage_total: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReportTotals {
    pub total_staff_earnings: Money,
    pub total_machine_income: Money,
    pub total_expenses: Money,
    pub parts_income: Money,
    pub net_income: Money,
}

/// The daily report returned to managers.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct DailyReport {
    /// The request, echoed back.
    #[ts(type = "Record<string, unknown>")]
    pub meta: Map<String, Value>,
    pub staff: Vec<StaffLine>,
    pub machines: Vec<MachineLine>,
    /// Reserved; always empty.
    pub expenses: Vec<ExpenseEntry>,
    pub guarantee: GuaranteeTotals,
    pub brands: Vec<BrandLine>,
    pub totals: ReportTotals,
}

// =============================================================================
// Assembly
// =============================================================================

/// Joins the ticket and guarantee passes with the staff directory.
///
/// Staff ids missing from `directory` are reported as "Unknown" with a 0%
/// commission, so their tickets still show up in full.
pub fn build_daily_report(
    meta: Map<String, Value>,
    tickets: TicketTally,
    directory: &HashMap<String, PersonRecord>,
    guarantees: GuaranteeTally,
) -> DailyReport {
    let staff: Vec<StaffLine> = tickets
        .staff
        .into_iter()
        .map(|s| {
            let (name, percent) = match directory.get(&s.staff_id) {
                Some(person) => (person.name.clone(), person.commission()),
                None => (UNKNOWN_STAFF_NAME.to_string(), Percentage::zero()),
            };
            let salary_amount = s.earnings.percentage_to_whole_major(percent);
            StaffLine {
                staff_id: s.staff_id,
                name,
                total_customers: s.ticket_count,
                total_earnings: s.earnings,
                salary_percent: percent,
                salary_amount,
                net_pay: s.earnings - salary_amount,
            }
        })
        .collect();

    let machines: Vec<MachineLine> = tickets
        .services
        .into_iter()
        .map(|s| MachineLine {
            name: s.name,
            count: s.count,
            total_amount: s.amount,
        })
        .collect();

    let brands: Vec<BrandLine> = tickets
        .brands
        .into_iter()
        .map(|b| BrandLine {
            brand: b.brand,
            count: b.count,
        })
        .collect();

    let total_staff_earnings: Money = staff.iter().map(|s| s.total_earnings).sum();
    let total_machine_income: Money = machines.iter().map(|m| m.total_amount).sum();
    let net_income = total_staff_earnings + total_machine_income + tickets.parts_income
        - (tickets.total_expenses + guarantees.demurrage_total);

    DailyReport {
        meta,
        staff,
        machines,
        expenses: Vec::new(),
        guarantee: GuaranteeTotals {
            guarantee_total: guarantees.guarantee_total,
            demurrage_total: guarantees.demurrage_total,
        },
        brands,
        totals: ReportTotals {
            total_staff_earnings,
            total_machine_income,
            total_expenses: tickets.total_expenses,
            parts_income: tickets.parts_income,
            net_income,
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
