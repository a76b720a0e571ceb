//! Repair tickets ("daily customer data").

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use cpr_core::ticket::Ticket;
use cpr_core::DayWindow;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{check_id, new_id, now, JsonObject};
use crate::AppState;

/// `POST /api/daily-customer-data`
pub async fn create_ticket(State(state): State<AppState>, body: JsonObject) -> ApiResult<Json<Value>> {
    let submitted: Ticket = body.decode()?;
    let ticket = submitted.prepare_new(new_id(), now())?;

    state.db.tickets().insert(&ticket).await?;

    info!(
        id = %ticket.id,
        problems = ticket.problems.len(),
        net_total = %ticket.summary.net_total_collected,
        "Ticket saved"
    );
    Ok(Json(json!({ "message": "Daily customer data saved", "data": ticket })))
}

/// `GET /api/daily-customer-data/{id}`
pub async fn get_ticket(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Ticket>> {
    check_id(&id, "Invalid id")?;

    state
        .db
        .tickets()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Not found"))
}

/// `PUT /api/daily-customer-data/{id}`
///
/// Partial update. Sending `problems` rebuilds the summary from them.
pub async fn update_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonObject(patch): JsonObject,
) -> ApiResult<Json<Ticket>> {
    check_id(&id, "Invalid id")?;

    let tickets = state.db.tickets();
    let current = tickets.get(&id).await?.ok_or_else(|| ApiError::not_found("Not found"))?;
    let recomputed = matches!(patch.get("problems"), Some(Value::Array(_)));

    let updated = current.apply_update(patch, now())?;
    if !tickets.update(&updated).await? {
        return Err(ApiError::not_found("Not found"));
    }

    info!(id = %id, recomputed, "Ticket updated");
    Ok(Json(updated))
}

/// `POST /api/get-daily-customer-data-from-manager`
///
/// Tickets a branch took in today, business time, newest first.
pub async fn list_today_for_branch(
    State(state): State<AppState>,
    body: JsonObject,
) -> ApiResult<Json<Vec<Ticket>>> {
    let branch_id = body
        .text("branchId")
        .ok_or_else(|| ApiError::bad_request("branchId is required in request body"))?;

    let window = DayWindow::business_today(now());
    let tickets = state
        .db
        .tickets()
        .list_for_branch(&branch_id, &window, state.policy.tickets)
        .await?;

    Ok(Json(tickets))
}
