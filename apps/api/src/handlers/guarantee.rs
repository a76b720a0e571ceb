//! Guarantees: bulk create, replace for a ticket, search, deactivate.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use cpr_core::business_day::parse_instant;
use cpr_core::guarantee::{GuaranteeRecord, NewGuarantee};
use cpr_db::GuaranteeSearch;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{check_id, new_id, now, JsonObject};
use crate::AppState;

const INVALID_ID: &str = "Invalid guarantee id";
const NOT_FOUND: &str = "Guarantee not found";
const NONE_PROVIDED: &str = "No guarantees provided";

/// Normalizes submitted items, linking each to `ticket_id` when given.
fn normalize(items: Vec<Value>, ticket_id: Option<&str>) -> ApiResult<Vec<GuaranteeRecord>> {
    let now = now();
    items
        .into_iter()
        .map(|item| -> ApiResult<GuaranteeRecord> {
            let submission: NewGuarantee =
                serde_json::from_value(item).map_err(|e| ApiError::bad_request(e.to_string()))?;
            Ok(submission.into_record(new_id(), ticket_id, now)?)
        })
        .collect()
}

/// `POST /api/guarantees` with `{guarantees: [...]}`
pub async fn create_guarantees(State(state): State<AppState>, JsonObject(mut body): JsonObject) -> ApiResult<Json<Value>> {
    let items = match body.remove("guarantees") {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(ApiError::bad_request(NONE_PROVIDED)),
    };

    let records = normalize(items, None)?;
    state.db.guarantees().insert_many(&records).await?;

    info!(count = records.len(), "Guarantees saved");
    Ok(Json(json!({ "insertedCount": records.len(), "docs": records })))
}

/// `PUT /api/guarantees/{dailyCustomerDataId}`
///
/// Swaps every guarantee of a ticket for the submitted ones, which may be
/// an array or a single object.
pub async fn replace_for_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
    JsonObject(mut body): JsonObject,
) -> ApiResult<Json<Value>> {
    check_id(&ticket_id, "Invalid dailyCustomerDataId")?;

    let items = match body.remove("guarantees") {
        Some(Value::Array(items)) => items,
        Some(item @ Value::Object(_)) => vec![item],
        _ => return Err(ApiError::bad_request(NONE_PROVIDED)),
    };

    let records = normalize(items, Some(&ticket_id))?;
    let removed = state.db.guarantees().replace_for_ticket(&ticket_id, &records).await?;

    info!(ticket_id = %ticket_id, removed, inserted = records.len(), "Guarantees replaced");
    Ok(Json(json!({
        "message": "Guarantees replaced",
        "insertedCount": records.len(),
        "data": records,
    })))
}

/// `DELETE /api/guarantees/{id}`
pub async fn delete_guarantee(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    check_id(&id, INVALID_ID)?;

    if !state.db.guarantees().delete(&id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn bound(raw: Option<&str>, name: &str) -> ApiResult<Option<chrono::DateTime<chrono::Utc>>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_instant(s)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid {name} date"))),
    }
}

/// `GET /api/guarantees?search=&from=&to=`
pub async fn search_guarantees(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<GuaranteeRecord>>> {
    let filter = GuaranteeSearch {
        pattern: None,
        from: bound(params.from.as_deref(), "from")?,
        to: bound(params.to.as_deref(), "to")?,
    }
    .with_pattern(params.search.as_deref().unwrap_or_default())
    .map_err(|_| ApiError::bad_request("Invalid search pattern"))?;

    Ok(Json(state.db.guarantees().search(&filter).await?))
}

/// `GET /api/guarantees/{id}`
pub async fn get_guarantee(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<GuaranteeRecord>> {
    check_id(&id, INVALID_ID)?;

    state
        .db
        .guarantees()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

/// `PUT /api/deactivateGuarantee/{id}`
pub async fn deactivate_guarantee(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    check_id(&id, INVALID_ID)?;

    let guarantees = state.db.guarantees();
    let mut record = guarantees.get(&id).await?.ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    record.deactivate(now());

    if !guarantees.update(&record).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    info!(id = %id, "Guarantee deactivated");
    Ok(Json(json!({ "message": "Guarantee deactivated", "data": record })))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{send, state};
    use crate::AppState;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    fn item(name: &str, brand: &str, start: &str) -> Value {
        json!({
            "IdProvidedWhileCreatingData": format!("p-{name}"),
            "customer": { "name": name, "phone": "01711111111" },
            "device": { "brand": brand, "modelNo": "X1" },
            "guarantee": { "duration": "3 Months", "amount": "150", "startDate": start },
            "meta": { "branchId": { "$oid": "b1" }, "staffId": "s1" }
        })
    }

    async fn create(state: &AppState, items: Vec<Value>) -> (StatusCode, Value) {
        send(state, Method::POST, "/api/guarantees", Some(json!({ "guarantees": items }))).await
    }

    #[tokio::test]
    async fn test_bulk_create_defaults() {
        let state = state().await;
        let (status, body) = create(&state, vec![item("Karim", "Nokia", "2024-03-01")]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["insertedCount"], 1);

        let doc = &body["docs"][0];
        assert_eq!(doc["isActive"], true);
        assert_eq!(doc["guarantee"]["amount"], 150);
        assert_eq!(doc["part"]["partCost"], 0);
        assert!(doc["meta"]["createdAt"].is_string());
        assert!(doc["meta"]["issuedAt"].is_string());

        let (status, body) = create(&state, vec![]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No guarantees provided");
    }

    #[tokio::test]
    async fn test_get_deactivate_delete() {
        let state = state().await;
        let (_, body) = create(&state, vec![item("Karim", "Nokia", "2024-03-01")]).await;
        let id = body["docs"][0]["_id"].as_str().unwrap().to_string();

        let (status, body) = send(&state, Method::PUT, &format!("/api/deactivateGuarantee/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Guarantee deactivated");
        assert_eq!(body["data"]["isActive"], false);
        assert!(body["data"]["meta"]["updatedAt"].is_string());

        let (status, body) = send(&state, Method::GET, &format!("/api/guarantees/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isActive"], false);

        let (status, body) = send(&state, Method::DELETE, &format!("/api/guarantees/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = send(&state, Method::DELETE, &format!("/api/guarantees/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Guarantee not found");

        let (status, body) = send(&state, Method::GET, "/api/guarantees/nope", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid guarantee id");
    }

    #[tokio::test]
    async fn test_replace_for_ticket() {
        let state = state().await;
        let ticket = uuid::Uuid::new_v4().to_string();
        let uri = format!("/api/guarantees/{ticket}");

        let (status, body) = send(
            &state,
            Method::PUT,
            &uri,
            Some(json!({ "guarantees": [item("A", "Nokia", "2024-03-01"), item("B", "Nokia", "2024-03-02")] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["insertedCount"], 2);
        assert_eq!(body["data"][0]["dailyCustomerDataId"], ticket.as_str());

        // a single object replaces both
        let (status, body) = send(&state, Method::PUT, &uri, Some(json!({ "guarantees": item("C", "Nokia", "2024-03-03") }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Guarantees replaced");
        assert_eq!(body["insertedCount"], 1);

        let (_, all) = send(&state, Method::GET, "/api/guarantees", None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);
        assert_eq!(all[0]["customer"]["name"], "C");

        let (status, body) = send(&state, Method::PUT, "/api/guarantees/bad", Some(json!({ "guarantees": [] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid dailyCustomerDataId");
    }

    #[tokio::test]
    async fn test_search() {
        let state = state().await;
        create(
            &state,
            vec![
                item("Karim", "Nokia", "2024-03-01"),
                item("Rahim", "Samsung", "2024-03-05"),
                item("Karima", "Xiaomi", "2024-03-09"),
            ],
        )
        .await;

        let (status, body) = send(&state, Method::GET, "/api/guarantees?search=karim", None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body.as_array().unwrap().iter().map(|g| g["customer"]["name"].clone()).collect();
        assert_eq!(names, vec![json!("Karima"), json!("Karim")]);

        let (_, body) = send(&state, Method::GET, "/api/guarantees?from=2024-03-02&to=2024-03-09", None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, body) = send(&state, Method::GET, "/api/guarantees?search=%28", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid search pattern");

        let (status, _) = send(&state, Method::GET, "/api/guarantees?from=yesterday", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
