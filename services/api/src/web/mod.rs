pub mod counselling;
pub mod fees;
pub mod notes;
pub mod rest;
pub mod risk;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use self::state::AppState;

/// Builds the API router with every endpoint, the upload size limit and
/// per-request tracing. CORS and Swagger UI are layered on by the binary.
pub fn build_router(state: Arc<AppState>, upload_limit_bytes: usize) -> Router {
    Router::new()
        // Counselling lifecycle
        .route(
            "/meetrequest/{email}",
            post(counselling::request_counselling_handler),
        )
        .route(
            "/schedule/{studentEmail}",
            put(counselling::schedule_meeting_handler),
        )
        .route(
            "/addlink/{studentEmail}",
            put(counselling::add_meeting_link_handler),
        )
        .route(
            "/conclude/{studentEmail}",
            put(counselling::conclude_meeting_handler),
        )
        .route(
            "/satisfaction/{studentEmail}",
            put(counselling::update_satisfaction_handler),
        )
        .route(
            "/school/{schoolEmail}",
            get(counselling::get_counselling_by_school_handler),
        )
        // Notes log
        .route("/addCounselling", post(notes::add_counselling_handler))
        .route("/getCounsellings", get(notes::get_counsellings_handler))
        // Fees
        .route("/fees/{schoolId}/upload", post(fees::upload_fees_handler))
        .route("/fees/{schoolId}", get(fees::get_fee_ledger_handler))
        // Risk
        .route("/risk/{schoolId}", get(risk::assess_school_handler))
        .route("/health", get(rest::health_handler))
        .layer(DefaultBodyLimit::max(upload_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
