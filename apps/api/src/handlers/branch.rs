//! Branches.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use cpr_core::{Branch, NewBranch};

use crate::error::ApiResult;
use crate::handlers::{new_id, JsonObject};
use crate::AppState;

/// `GET /api/branches`
pub async fn list_branches(State(state): State<AppState>) -> ApiResult<Json<Vec<Branch>>> {
    Ok(Json(state.db.branches().list().await?))
}

/// `POST /api/branches`
pub async fn create_branch(State(state): State<AppState>, body: JsonObject) -> ApiResult<(StatusCode, Json<Value>)> {
    let submission: NewBranch = body.decode()?;
    submission.validate()?;

    let branch = submission.into_branch(new_id());
    state.db.branches().insert(&branch).await?;

    info!(id = %branch.id, name = %branch.branch_name, "Branch created");
    Ok((StatusCode::CREATED, Json(json!({ "message": "Branch created", "data": branch }))))
}
