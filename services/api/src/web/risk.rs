//! services/api/src/web/risk.rs
//!
//! Handler for the per-school dropout risk report.

use crate::{
    web::fees::invalid_school_id,
    web::rest::{port_error, rejected, ErrorResponse, HandlerError},
    web::state::AppState,
    workflow::{self, risk::Insights},
};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::Json,
};
use dropout_tracker_core::{domain::RiskAssessment, risk::DEFAULT_FEES_MONTHS_DENOM};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RiskQuery {
    /// Months of unpaid fees that count as the maximum fee risk. Defaults to 12.
    pub fees_months_denom: Option<u32>,
    /// Attach an LLM-written brief of the highest-risk students.
    pub with_insights: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RiskAssessmentResponse {
    pub student_id: Uuid,
    pub student_name: String,
    pub risk_score: u32,
    pub risk_level: String,
    pub risk_color: String,
    pub dropout_reason: String,
    pub dropout_probability: f64,
}

impl From<RiskAssessment> for RiskAssessmentResponse {
    fn from(a: RiskAssessment) -> Self {
        Self {
            student_id: a.student_id,
            student_name: a.student_name,
            risk_score: a.risk_score,
            risk_level: a.risk_level.as_str().to_string(),
            risk_color: a.risk_level.color().to_string(),
            dropout_reason: a.dropout_reason,
            dropout_probability: a.dropout_probability,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InsightsResponse {
    /// `ok`, `disabled` or `error`.
    pub status: String,
    pub text: String,
}

impl From<Insights> for InsightsResponse {
    fn from(insights: Insights) -> Self {
        Self {
            status: insights.status.as_str().to_string(),
            text: insights.text,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RiskReportResponse {
    pub count: usize,
    pub results: Vec<RiskAssessmentResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<InsightsResponse>,
}

/// Score every student of a school for dropout risk, highest first.
#[utoipa::path(
    get,
    path = "/risk/{schoolId}",
    params(("schoolId" = Uuid, Path, description = "School id"), RiskQuery),
    responses(
        (status = 200, description = "Risk report", body = RiskReportResponse),
        (status = 400, description = "Invalid school id or query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn assess_school_handler(
    State(state): State<Arc<AppState>>,
    school_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<RiskQuery>, QueryRejection>,
) -> Result<Json<RiskReportResponse>, HandlerError> {
    let Path(school_id) = school_id.map_err(invalid_school_id)?;
    let Query(query) = query.map_err(|e| rejected("Invalid query string", e.body_text()))?;
    let report = workflow::risk::assess_school(
        state.db.as_ref(),
        state.insights.as_deref(),
        school_id,
        query.fees_months_denom.unwrap_or(DEFAULT_FEES_MONTHS_DENOM),
        query.with_insights.unwrap_or(false),
    )
    .await
    .map_err(|e| port_error("Failed to assess dropout risk", e))?;

    Ok(Json(RiskReportResponse {
        count: report.results.len(),
        results: report.results.into_iter().map(Into::into).collect(),
        insights: report.insights.map(Into::into),
    }))
}
