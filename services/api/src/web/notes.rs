//! services/api/src/web/notes.rs
//!
//! Handlers for the flat counselling notes log.

use crate::{
    web::rest::{port_error, rejected, ErrorResponse, HandlerError},
    web::state::AppState,
    workflow,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use dropout_tracker_core::domain::CounsellingNote;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCounsellingPayload {
    #[serde(default)]
    pub student_id: String,
    /// Defaults to the time of the request.
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CounsellingNoteResponse {
    pub id: Uuid,
    pub student_id: String,
    pub date: DateTime<Utc>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl From<CounsellingNote> for CounsellingNoteResponse {
    fn from(note: CounsellingNote) -> Self {
        Self {
            id: note.id,
            student_id: note.student_id,
            date: note.date,
            notes: note.notes,
            created_at: note.created_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/addCounselling",
    request_body = AddCounsellingPayload,
    responses(
        (status = 201, description = "Note stored", body = CounsellingNoteResponse),
        (status = 400, description = "Missing student_id or notes, or unreadable body", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn add_counselling_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AddCounsellingPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CounsellingNoteResponse>), HandlerError> {
    let Json(payload) =
        payload.map_err(|e| rejected("Invalid request body", e.body_text()))?;
    let note = workflow::notes::add_note(
        state.db.as_ref(),
        &payload.student_id,
        payload.date,
        &payload.notes,
    )
    .await
    .map_err(|e| port_error("Failed to add counselling note", e))?;
    Ok((StatusCode::CREATED, Json(note.into())))
}

/// List every counselling note, newest first.
#[utoipa::path(
    get,
    path = "/getCounsellings",
    responses(
        (status = 200, description = "All notes", body = [CounsellingNoteResponse]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_counsellings_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CounsellingNoteResponse>>, HandlerError> {
    let notes = workflow::notes::list_notes(state.db.as_ref())
        .await
        .map_err(|e| port_error("Failed to list counselling notes", e))?;
    Ok(Json(notes.into_iter().map(Into::into).collect()))
}
