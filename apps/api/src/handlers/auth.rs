//! Login.
//!
//! Credentials are compared as stored, field by field. Admins match on
//! email and password; managers and staff must also name their branch.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tracing::{debug, info};

use cpr_core::validation::normalize_email;
use cpr_core::{LoginUser, Role};

use crate::error::{ApiError, ApiResult};
use crate::handlers::JsonObject;
use crate::AppState;

/// `POST /api/login`
pub async fn login(State(state): State<AppState>, body: JsonObject) -> ApiResult<Json<Value>> {
    let role: Role = body
        .text("role")
        .and_then(|r| r.parse().ok())
        .ok_or_else(|| ApiError::bad_request("Invalid role."))?;

    let email = normalize_email(&body.text("email").unwrap_or_default());
    let password = match body.0.get("password") {
        Some(Value::String(p)) => p.clone(),
        _ => String::new(),
    };
    let branch_id = body.text("branchId");

    let found = state
        .db
        .people()
        .find_for_login(role, &email, &password, branch_id.as_deref())
        .await?;

    let Some(person) = found else {
        debug!(role = %role, email = %email, "Login rejected");
        return Err(ApiError::Unauthorized("Invalid credentials.".to_string()));
    };

    info!(id = %person.id, role = %role, "Login successful");
    Ok(Json(json!({
        "message": "Login successful",
        "user": LoginUser::from(person),
    })))
}
