//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use dropout_tracker_core::ports::{DatabaseService, MentorAssignmentService, RiskInsightService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub mentors: Arc<dyn MentorAssignmentService>,
    /// `None` when no LLM key is configured; insight requests then report `disabled`.
    pub insights: Option<Arc<dyn RiskInsightService>>,
}
