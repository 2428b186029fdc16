//! services/api/src/web/counselling.rs
//!
//! Handlers for the counselling lifecycle endpoints.

use crate::{
    web::rest::{port_error, rejected, ErrorResponse, HandlerError},
    web::state::AppState,
    workflow,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use dropout_tracker_core::{
    counselling::RequestUpdate,
    domain::{CounsellingRecord, CounsellingRequest},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct MeetRequestPayload {
    /// What the student wants to discuss. Optional.
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePayload {
    /// RFC 3339 timestamp of the meeting.
    pub schedule_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeetingLinkPayload {
    pub meeting_link: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConcludePayload {
    pub concluded_msg: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SatisfactionPayload {
    pub is_satisfied: bool,
}

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetailsResponse {
    pub name: String,
    pub phone: String,
    pub parent_phone: String,
    pub parent_email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CounsellingRequestResponse {
    pub student_email: String,
    pub student_details: StudentDetailsResponse,
    pub mentor_email: String,
    pub mentor_name: String,
    pub issue: String,
    pub created_at: DateTime<Utc>,
    pub schedule_date: Option<DateTime<Utc>>,
    pub meeting_link: Option<String>,
    pub concluded_message: Option<String>,
    pub is_contacted: bool,
    pub is_satisfied: bool,
    /// Furthest lifecycle step reached, e.g. `link_issued`.
    pub stage: String,
}

impl From<&CounsellingRequest> for CounsellingRequestResponse {
    fn from(request: &CounsellingRequest) -> Self {
        let details = &request.student_details;
        Self {
            student_email: request.student_email.clone(),
            student_details: StudentDetailsResponse {
                name: details.name.clone(),
                phone: details.phone.clone(),
                parent_phone: details.parent_phone.clone(),
                parent_email: details.parent_email.clone(),
            },
            mentor_email: request.mentor_email.clone(),
            mentor_name: request.mentor_name.clone(),
            issue: request.issue.clone(),
            created_at: request.created_at,
            schedule_date: request.schedule_date,
            meeting_link: request.meeting_link.clone(),
            concluded_message: request.concluded_message.clone(),
            is_contacted: request.is_contacted,
            is_satisfied: request.is_satisfied,
            stage: request.stage().as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CounsellingRecordResponse {
    /// Email of the school the record belongs to.
    pub school: String,
    pub requests: Vec<CounsellingRequestResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&CounsellingRecord> for CounsellingRecordResponse {
    fn from(record: &CounsellingRecord) -> Self {
        Self {
            school: record.school.clone(),
            requests: record.requests.iter().map(Into::into).collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CounsellingMutationResponse {
    pub message: String,
    pub counselling: CounsellingRecordResponse,
}

fn mutation(message: &str, record: &CounsellingRecord) -> Json<CounsellingMutationResponse> {
    Json(CounsellingMutationResponse {
        message: message.to_string(),
        counselling: record.into(),
    })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// File a counselling request for a student.
///
/// A mentor is assigned and the request is appended to the record of the
/// student's current school.
#[utoipa::path(
    post,
    path = "/meetrequest/{email}",
    params(("email" = String, Path, description = "Student email")),
    request_body = MeetRequestPayload,
    responses(
        (status = 201, description = "Request filed", body = CounsellingMutationResponse),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 404, description = "Student, mentor or school not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn request_counselling_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    payload: Result<Json<MeetRequestPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CounsellingMutationResponse>), HandlerError> {
    // The body is optional; only a body that is present but unreadable is refused.
    let message = match payload {
        Ok(Json(payload)) => payload.message,
        Err(JsonRejection::MissingJsonContentType(_)) => String::new(),
        Err(e) => return Err(rejected("Invalid request body", e.body_text())),
    };
    let record = workflow::counselling::create_request(
        state.db.as_ref(),
        state.mentors.as_ref(),
        &email,
        &message,
    )
    .await
    .map_err(|e| port_error("Failed to create counselling request", e))?;

    Ok((
        StatusCode::CREATED,
        mutation("Counselling request created successfully", &record),
    ))
}

fn invalid_body(e: JsonRejection) -> HandlerError {
    rejected("Invalid request body", e.body_text())
}

async fn apply_update(
    state: &AppState,
    student_email: &str,
    update: RequestUpdate,
    success: &str,
) -> Result<Json<CounsellingMutationResponse>, HandlerError> {
    let record = workflow::counselling::update_request(state.db.as_ref(), student_email, update)
        .await
        .map_err(|e| port_error("Failed to update counselling request", e))?;
    Ok(mutation(success, &record))
}

#[utoipa::path(
    put,
    path = "/schedule/{studentEmail}",
    params(("studentEmail" = String, Path, description = "Student email")),
    request_body = SchedulePayload,
    responses(
        (status = 200, description = "Meeting scheduled", body = CounsellingMutationResponse),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 404, description = "Counselling request not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn schedule_meeting_handler(
    State(state): State<Arc<AppState>>,
    Path(student_email): Path<String>,
    payload: Result<Json<SchedulePayload>, JsonRejection>,
) -> Result<Json<CounsellingMutationResponse>, HandlerError> {
    let Json(payload) = payload.map_err(invalid_body)?;
    apply_update(
        &state,
        &student_email,
        RequestUpdate::Schedule(payload.schedule_date),
        "Meeting scheduled successfully",
    )
    .await
}

#[utoipa::path(
    put,
    path = "/addlink/{studentEmail}",
    params(("studentEmail" = String, Path, description = "Student email")),
    request_body = MeetingLinkPayload,
    responses(
        (status = 200, description = "Meeting link added", body = CounsellingMutationResponse),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 404, description = "Counselling request not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn add_meeting_link_handler(
    State(state): State<Arc<AppState>>,
    Path(student_email): Path<String>,
    payload: Result<Json<MeetingLinkPayload>, JsonRejection>,
) -> Result<Json<CounsellingMutationResponse>, HandlerError> {
    let Json(payload) = payload.map_err(invalid_body)?;
    apply_update(
        &state,
        &student_email,
        RequestUpdate::MeetingLink(payload.meeting_link),
        "Meeting link added successfully",
    )
    .await
}

#[utoipa::path(
    put,
    path = "/conclude/{studentEmail}",
    params(("studentEmail" = String, Path, description = "Student email")),
    request_body = ConcludePayload,
    responses(
        (status = 200, description = "Meeting concluded", body = CounsellingMutationResponse),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 404, description = "Counselling request not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn conclude_meeting_handler(
    State(state): State<Arc<AppState>>,
    Path(student_email): Path<String>,
    payload: Result<Json<ConcludePayload>, JsonRejection>,
) -> Result<Json<CounsellingMutationResponse>, HandlerError> {
    let Json(payload) = payload.map_err(invalid_body)?;
    apply_update(
        &state,
        &student_email,
        RequestUpdate::Conclude(payload.concluded_msg),
        "Meeting concluded successfully",
    )
    .await
}

#[utoipa::path(
    put,
    path = "/satisfaction/{studentEmail}",
    params(("studentEmail" = String, Path, description = "Student email")),
    request_body = SatisfactionPayload,
    responses(
        (status = 200, description = "Satisfaction recorded", body = CounsellingMutationResponse),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 404, description = "Counselling request not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn update_satisfaction_handler(
    State(state): State<Arc<AppState>>,
    Path(student_email): Path<String>,
    payload: Result<Json<SatisfactionPayload>, JsonRejection>,
) -> Result<Json<CounsellingMutationResponse>, HandlerError> {
    let Json(payload) = payload.map_err(invalid_body)?;
    apply_update(
        &state,
        &student_email,
        RequestUpdate::Satisfaction(payload.is_satisfied),
        "Satisfaction updated successfully",
    )
    .await
}

/// Fetch the full counselling record of a school.
#[utoipa::path(
    get,
    path = "/school/{schoolEmail}",
    params(("schoolEmail" = String, Path, description = "School email")),
    responses(
        (status = 200, description = "Counselling record", body = CounsellingRecordResponse),
        (status = 404, description = "No counselling data for this school", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_counselling_by_school_handler(
    State(state): State<Arc<AppState>>,
    Path(school_email): Path<String>,
) -> Result<Json<CounsellingRecordResponse>, HandlerError> {
    let record = workflow::counselling::get_by_school(state.db.as_ref(), &school_email)
        .await
        .map_err(|e| port_error("Failed to fetch counselling record", e))?;
    Ok(Json((&record).into()))
}
