//! Daily branch report.

use axum::extract::State;
use axum::Json;
use tracing::info;

use cpr_core::business_day::parse_report_date;
use cpr_core::report::DailyReport;
use cpr_core::DayWindow;

use crate::error::{ApiError, ApiResult};
use crate::handlers::JsonObject;
use crate::services::ReportService;
use crate::AppState;

/// `POST /api/daily-report` with `{branchId, date: "YYYY-MM-DD", ...}`
///
/// Every other field in the body is echoed back under `meta`.
pub async fn daily_report(State(state): State<AppState>, body: JsonObject) -> ApiResult<Json<DailyReport>> {
    let (Some(branch_id), Some(date)) = (body.text("branchId"), body.text("date")) else {
        return Err(ApiError::bad_request("branchId and date are required"));
    };
    let window = DayWindow::for_report_date(parse_report_date(&date)?);

    let service = ReportService::new(state.db.clone(), state.policy);
    let report = service.daily_report(&branch_id, &window, body.0).await?;

    info!(
        branch_id = %branch_id,
        date = %date,
        staff = report.staff.len(),
        net_income = %report.totals.net_income,
        "Daily report built"
    );
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{send, state};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_fields() {
        let state = state().await;
        for body in [json!({ "date": "2024-03-10" }), json!({ "branchId": "b1" }), json!({ "branchId": " ", "date": "2024-03-10" })] {
            let (status, body) = send(&state, Method::POST, "/api/daily-report", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], "branchId and date are required");
        }
    }

    #[tokio::test]
    async fn test_malformed_date() {
        let state = state().await;
        let (status, _) = send(
            &state,
            Method::POST,
            "/api/daily-report",
            Some(json!({ "branchId": "b1", "date": "10/03/2024" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &state,
            Method::POST,
            "/api/daily-report",
            Some(json!({ "branchId": "b1", "date": "-262143-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_report_for_today() {
        let state = state().await;
        let ticket = json!({
            "customer": { "name": "Karim", "phone": "017" },
            "device": { "brand": "Samsung", "modelNo": "A50" },
            "problems": [{
                "IdProvidedWhileCreatingData": "p1",
                "workPart": "SCREEN",
                "problemDescription": "cracked",
                "extraPart": { "used": true, "partCost": 300 },
                "amounts": { "baseAmount": 1000 }
            }],
            "summary": { "netTotalCollected": 1100 },
            "meta": { "enteredBy": "Rafi", "staffId": "s1", "branchId": "b1" }
        });
        send(&state, Method::POST, "/api/daily-customer-data", Some(ticket)).await;

        let date = cpr_core::DayWindow::business_today(chrono::Utc::now()).date.to_string();

        let (status, body) = send(
            &state,
            Method::POST,
            "/api/daily-report",
            Some(json!({ "branchId": "b1", "date": date, "managerName": "Boss" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["managerName"], "Boss");
        assert_eq!(body["staff"][0]["name"], "Unknown");
        assert_eq!(body["staff"][0]["totalEarnings"], 1100);
        assert_eq!(body["machines"][0]["name"], "SCREEN");
        assert_eq!(body["expenses"], json!([]));
        assert_eq!(body["brands"][0]["brand"], "Samsung");
        // 1100 + 1000 + 300
        assert_eq!(body["totals"]["netIncome"], 2400);
    }
}
