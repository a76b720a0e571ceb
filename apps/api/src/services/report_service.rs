//! Daily branch report assembly.
//!
//! Provides the read side behind `POST /api/daily-report`.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use cpr_core::report::{build_daily_report, DailyReport, GuaranteeTally, TicketTally};
use cpr_core::{DayWindow, ReportPolicy};
use cpr_db::{Database, DbResult};

/// Builds daily reports from the store.
pub struct ReportService {
    db: Database,
    policy: ReportPolicy,
}

impl ReportService {
    pub fn new(db: Database, policy: ReportPolicy) -> Self {
        ReportService { db, policy }
    }

    /// Report for `branch_id` over `window`.
    ///
    /// The ticket side (tickets, then the staff directory for the staff
    /// ids they mention) runs concurrently with the guarantee query.
    /// `meta` is echoed back in the report unchanged.
    pub async fn daily_report(
        &self,
        branch_id: &str,
        window: &DayWindow,
        meta: Map<String, Value>,
    ) -> DbResult<DailyReport> {
        let ticket_side = async {
            let tickets = self
                .db
                .tickets()
                .list_for_branch(branch_id, window, self.policy.tickets)
                .await?;
            let tally = TicketTally::from_tickets(&tickets);
            let directory = self.db.people().find_staff_by_ids(&tally.staff_ids()).await?;
            Ok::<_, cpr_db::DbError>((tickets.len(), tally, directory))
        };
        let guarantees = self.db.guarantees();
        let guarantee_side = guarantees.list_for_branch_in_window(branch_id, window, self.policy.guarantees);

        let ((ticket_count, tally, directory), records) = tokio::try_join!(ticket_side, guarantee_side)?;

        for staff in &tally.staff {
            if !directory.contains_key(&staff.staff_id) {
                warn!(staff_id = %staff.staff_id, branch_id, "Staff id not in directory");
            }
        }

        debug!(
            branch_id,
            tickets = ticket_count,
            guarantees = records.len(),
            "Daily report inputs loaded"
        );

        Ok(build_daily_report(
            meta,
            tally,
            &directory,
            GuaranteeTally::from_records(&records),
        ))
    }
}
