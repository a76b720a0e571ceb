//! # CPR API
//!
//! HTTP surface of the back office: branches, people and login, repair
//! tickets, guarantees and the daily branch report.
//!
//! ## Routes
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │  GET  /health                                      liveness              │
//! │  POST /api/login                                   plaintext login       │
//! │  GET  /api/branches            POST /api/branches                        │
//! │  POST /api/saveStaffOrManagerInfo                                        │
//! │  GET  /api/{staff|manager|admin}                                         │
//! │  GET|PUT|DELETE /api/{staff|manager|admin}/{id}                          │
//! │  POST /api/daily-customer-data                                           │
//! │  GET|PUT /api/daily-customer-data/{id}                                   │
//! │  POST /api/get-daily-customer-data-from-manager    today, one branch     │
//! │  GET|POST /api/guarantees      search / bulk create                      │
//! │  GET|PUT|DELETE /api/guarantees/{id}   (PUT: replace for ticket id)      │
//! │  PUT  /api/deactivateGuarantee/{id}                                      │
//! │  POST /api/daily-report                            branch day report     │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use cpr_core::ReportPolicy;
use cpr_db::Database;

use crate::handlers::{auth, branch, guarantee, health, people, report, ticket};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub policy: ReportPolicy,
}

impl AppState {
    pub fn new(db: Database, policy: ReportPolicy) -> Self {
        AppState { db, policy }
    }
}

/// Builds the full router with CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let directory = Router::new()
        .route("/api/branches", get(branch::list_branches).post(branch::create_branch))
        .route("/api/saveStaffOrManagerInfo", post(people::save_person))
        .route("/api/{role}", get(people::list_people))
        .route(
            "/api/{role}/{id}",
            get(people::get_person)
                .put(people::update_person)
                .delete(people::delete_person),
        );

    let tickets = Router::new()
        .route("/api/daily-customer-data", post(ticket::create_ticket))
        .route(
            "/api/daily-customer-data/{id}",
            get(ticket::get_ticket).put(ticket::update_ticket),
        )
        .route(
            "/api/get-daily-customer-data-from-manager",
            post(ticket::list_today_for_branch),
        );

    let guarantees = Router::new()
        .route(
            "/api/guarantees",
            get(guarantee::search_guarantees).post(guarantee::create_guarantees),
        )
        .route(
            "/api/guarantees/{id}",
            get(guarantee::get_guarantee)
                .put(guarantee::replace_for_ticket)
                .delete(guarantee::delete_guarantee),
        )
        .route("/api/deactivateGuarantee/{id}", put(guarantee::deactivate_guarantee));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/login", post(auth::login))
        .route("/api/daily-report", post(report::daily_report))
        .merge(directory)
        .merge(tickets)
        .merge(guarantees)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Test Support
// =============================================================================
