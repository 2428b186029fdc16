//! services/api/src/web/rest.rs
//!
//! Shared pieces of the REST API: the master definition for the OpenAPI
//! specification, the JSON error body and the mapping from port errors to it.

use crate::web::{counselling, fees, notes, risk};
use axum::{http::StatusCode, response::Json};
use dropout_tracker_core::ports::PortError;
use serde::Serialize;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        counselling::request_counselling_handler,
        counselling::schedule_meeting_handler,
        counselling::add_meeting_link_handler,
        counselling::conclude_meeting_handler,
        counselling::update_satisfaction_handler,
        counselling::get_counselling_by_school_handler,
        notes::add_counselling_handler,
        notes::get_counsellings_handler,
        fees::upload_fees_handler,
        fees::get_fee_ledger_handler,
        risk::assess_school_handler,
        health_handler,
    ),
    components(
        schemas(
            ErrorResponse,
            counselling::MeetRequestPayload,
            counselling::SchedulePayload,
            counselling::MeetingLinkPayload,
            counselling::ConcludePayload,
            counselling::SatisfactionPayload,
            counselling::CounsellingRecordResponse,
            counselling::CounsellingRequestResponse,
            counselling::StudentDetailsResponse,
            counselling::CounsellingMutationResponse,
            notes::AddCounsellingPayload,
            notes::CounsellingNoteResponse,
            fees::FeeLedgerResponse,
            fees::FeeLineItemResponse,
            fees::ReconcileSummaryResponse,
            fees::SkippedRowResponse,
            fees::FeeUploadResponse,
            risk::RiskReportResponse,
            risk::RiskAssessmentResponse,
            risk::InsightsResponse,
        )
    ),
    tags(
        (name = "Dropout Tracker API", description = "Counselling workflow, fee reconciliation and dropout risk for schools.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Body
//=========================================================================================

/// The body of every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Converts a port error into the HTTP status and body sent to the client.
/// Unexpected errors are logged with `context`; their detail goes in `error`.
pub fn port_error(context: &str, e: PortError) -> HandlerError {
    match e {
        PortError::NotFound(message) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                message,
                error: None,
            }),
        ),
        PortError::InvalidInput(message) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                message,
                error: None,
            }),
        ),
        PortError::Unexpected(detail) => {
            error!("{}: {}", context, detail);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    message: "Internal server error".to_string(),
                    error: Some(detail),
                }),
            )
        }
    }
}

/// A request the extractors could not accept (bad JSON, wrong content type,
/// malformed path or query). The extractor's own text goes in `error`.
pub fn rejected(message: &str, detail: String) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            message: message.to_string(),
            error: Some(detail),
        }),
    )
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health_handler() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404_without_detail() {
        let (status, Json(body)) =
            port_error("test", PortError::NotFound("Student not found".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "Student not found");
        assert!(body.error.is_none());
    }

    #[test]
    fn invalid_input_maps_to_400() {
        let (status, _) = port_error("test", PortError::InvalidInput("empty".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unexpected_maps_to_500_with_detail() {
        let (status, Json(body)) =
            port_error("test", PortError::Unexpected("connection reset".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal server error");
        assert_eq!(body.error.as_deref(), Some("connection reset"));
    }

    #[test]
    fn rejections_map_to_400_with_detail() {
        let (status, Json(body)) =
            rejected("Invalid request body", "missing field `isSatisfied`".to_string());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Invalid request body");
        assert_eq!(body.error.as_deref(), Some("missing field `isSatisfied`"));
    }

    #[test]
    fn openapi_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/meetrequest/{email}",
            "/schedule/{studentEmail}",
            "/addlink/{studentEmail}",
            "/conclude/{studentEmail}",
            "/satisfaction/{studentEmail}",
            "/school/{schoolEmail}",
            "/addCounselling",
            "/getCounsellings",
            "/fees/{schoolId}/upload",
            "/fees/{schoolId}",
            "/risk/{schoolId}",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
