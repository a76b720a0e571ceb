//! Admins, managers and staff.
//!
//! The three roles share one set of handlers; the role comes from the
//! request body on create and from the path everywhere else.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use cpr_core::document::merge_top_level;
use cpr_core::validation::normalize_email;
use cpr_core::{PersonRecord, Role};

use crate::error::{ApiError, ApiResult};
use crate::handlers::{check_id, new_id, JsonObject};
use crate::AppState;

const EMAIL_TAKEN: &str = "Email already exists. Try another Email";

fn path_role(raw: &str) -> ApiResult<Role> {
    raw.parse().map_err(|_| ApiError::not_found("Not found"))
}

fn not_found(role: Role) -> ApiError {
    ApiError::not_found(format!("{} not found", role.title()))
}

/// `POST /api/saveStaffOrManagerInfo`
pub async fn save_person(State(state): State<AppState>, body: JsonObject) -> ApiResult<(StatusCode, Json<Value>)> {
    let email = normalize_email(&body.text("email").unwrap_or_default());
    if !email.is_empty() && state.db.people().email_exists(&email).await? {
        return Err(ApiError::bad_request(EMAIL_TAKEN));
    }

    let (mut record, password) = PersonRecord::from_submission(body.0)?;
    record.id = new_id();

    state.db.people().insert(&record, &password).await.map_err(|e| match e {
        cpr_db::DbError::UniqueViolation { .. } => ApiError::bad_request(EMAIL_TAKEN),
        other => other.into(),
    })?;

    info!(id = %record.id, role = %record.role, "Person saved");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("{} info saved", record.role),
            "data": record,
        })),
    ))
}

/// `GET /api/{role}`
pub async fn list_people(State(state): State<AppState>, Path(role): Path<String>) -> ApiResult<Json<Vec<PersonRecord>>> {
    let role = path_role(&role)?;
    Ok(Json(state.db.people().list(role).await?))
}

/// `GET /api/{role}/{id}`
pub async fn get_person(
    State(state): State<AppState>,
    Path((role, id)): Path<(String, String)>,
) -> ApiResult<Json<PersonRecord>> {
    let role = path_role(&role)?;
    check_id(&id, "Invalid id")?;

    state
        .db
        .people()
        .get(role, &id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(role))
}

/// `PUT /api/{role}/{id}`
///
/// Top-level keys in the body replace the stored ones. A `password` key
/// replaces the password; the role cannot change.
pub async fn update_person(
    State(state): State<AppState>,
    Path((role, id)): Path<(String, String)>,
    JsonObject(mut patch): JsonObject,
) -> ApiResult<Json<Value>> {
    let role = path_role(&role)?;
    check_id(&id, "Invalid id")?;

    let people = state.db.people();
    let current = people.get(role, &id).await?.ok_or_else(|| not_found(role))?;

    let password = match patch.remove("password") {
        Some(Value::String(p)) if !p.trim().is_empty() => Some(p),
        _ => None,
    };
    patch.remove("role");

    let mut updated: PersonRecord = merge_top_level(&current, patch)?;
    updated.role = role;
    updated.email = normalize_email(&updated.email);
    updated.validate()?;

    if updated.email != current.email && people.email_exists(&updated.email).await? {
        return Err(ApiError::bad_request(EMAIL_TAKEN));
    }

    if !people.update(&updated, password.as_deref()).await? {
        return Err(not_found(role));
    }

    info!(id = %id, role = %role, "Person updated");
    Ok(Json(json!({
        "message": format!("{} updated", role.title()),
        "data": updated,
    })))
}

/// `DELETE /api/{role}/{id}`
pub async fn delete_person(
    State(state): State<AppState>,
    Path((role, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let role = path_role(&role)?;
    check_id(&id, "Invalid id")?;

    let removed = state.db.people().delete(role, &id).await?.ok_or_else(|| not_found(role))?;

    info!(id = %id, role = %role, "Person deleted");
    Ok(Json(json!({
        "message": format!("{} deleted", role.title()),
        "data": removed,
    })))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{send, state};
    use crate::AppState;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    fn staff(email: &str) -> Value {
        json!({
            "name": "Rafi", "phone": "017", "email": email, "password": "pw", "role": "staff",
            "branchName": "Mirpur", "branchId": { "$oid": "b1" }, "salaryPercentage": 12.5
        })
    }

    async fn create(state: &AppState, body: Value) -> (StatusCode, Value) {
        send(state, Method::POST, "/api/saveStaffOrManagerInfo", Some(body)).await
    }

    #[tokio::test]
    async fn test_save_staff() {
        let state = state().await;
        let (status, body) = create(&state, staff("a@x.com")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "staff info saved");
        assert_eq!(body["data"]["salaryPercentage"], 12.5);
        assert_eq!(body["data"]["branchId"]["$oid"], "b1");
        assert!(body["data"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_save_rejections() {
        let state = state().await;
        create(&state, staff("a@x.com")).await;

        let (status, body) = create(&state, staff("A@X.com")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email already exists. Try another Email");

        let mut bad_role = staff("b@x.com");
        bad_role["role"] = json!("owner");
        let (status, body) = create(&state, bad_role).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], r#"Invalid role. Must be "manager", "staff", or "admin"."#);

        let mut no_pct = staff("c@x.com");
        no_pct.as_object_mut().unwrap().remove("salaryPercentage");
        let (status, _) = create(&state, no_pct).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let manager = json!({
            "name": "Boss", "phone": "018", "email": "boss@x.com", "password": "pw", "role": "manager",
            "branchName": "Mirpur", "branchId": "b1"
        });
        let (status, body) = create(&state, manager).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("managerDailySalary"));
    }

    #[tokio::test]
    async fn test_get_update_delete() {
        let state = state().await;
        let (_, created) = create(&state, staff("a@x.com")).await;
        let id = created["data"]["_id"].as_str().unwrap().to_string();
        let uri = format!("/api/staff/{id}");

        let (status, body) = send(&state, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Rafi");

        let (status, body) = send(&state, Method::PUT, &uri, Some(json!({ "name": "Rafiq", "_id": "other" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Staff updated");
        assert_eq!(body["data"]["name"], "Rafiq");
        assert_eq!(body["data"]["_id"], id.as_str());
        assert_eq!(body["data"]["phone"], "017");

        let (status, _) = send(&state, Method::PUT, &uri, Some(json!({ "salaryPercentage": 140 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&state, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Staff deleted");

        let (status, body) = send(&state, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Staff not found");
    }

    #[tokio::test]
    async fn test_role_and_id_checks() {
        let state = state().await;
        let (_, created) = create(&state, staff("a@x.com")).await;
        let id = created["data"]["_id"].as_str().unwrap().to_string();

        // a staff id is not a manager id
        let (status, body) = send(&state, Method::GET, &format!("/api/manager/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Manager not found");

        let (status, body) = send(&state, Method::GET, "/api/admin/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid id");

        let (status, body) = send(&state, Method::GET, "/api/staff", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = send(&state, Method::GET, "/api/owners", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
