//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::warn;

use crate::AppState;

/// `OK` while the database answers, 503 otherwise.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.db.health_check().await {
        (StatusCode::OK, "OK")
    } else {
        warn!("Health check failed: database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{send, state};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_health_ok_then_unavailable() {
        let state = state().await;
        let (status, _) = send(&state, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);

        state.db.close().await;
        let (status, _) = send(&state, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
