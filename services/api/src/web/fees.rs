//! services/api/src/web/fees.rs
//!
//! Handlers for uploading a school's unpaid-fees sheet and reading the ledger.

use crate::{
    web::rest::{port_error, rejected, ErrorResponse, HandlerError},
    web::state::AppState,
    workflow,
};
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::PathRejection,
        Multipart, Path, State,
    },
    response::Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dropout_tracker_core::{
    domain::FeeLedger,
    fees::{ReconcileSummary, SkippedRow},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeeLineItemResponse {
    pub student_id: Uuid,
    pub student_name: String,
    pub unpaid_months: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeeLedgerResponse {
    pub school_id: Uuid,
    pub line_items: Vec<FeeLineItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&FeeLedger> for FeeLedgerResponse {
    fn from(ledger: &FeeLedger) -> Self {
        Self {
            school_id: ledger.school_id,
            line_items: ledger
                .line_items
                .iter()
                .map(|item| FeeLineItemResponse {
                    student_id: item.student_id,
                    student_name: item.student_name.clone(),
                    unpaid_months: item.unpaid_months,
                })
                .collect(),
            created_at: ledger.created_at,
            updated_at: ledger.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRowResponse {
    /// 1-based data row number in the uploaded sheet.
    pub row: usize,
    pub student_name: String,
    pub reason: String,
}

impl From<&SkippedRow> for SkippedRowResponse {
    fn from(skipped: &SkippedRow) -> Self {
        Self {
            row: skipped.row_number,
            student_name: skipped.student_name.clone(),
            reason: skipped.reason.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReconcileSummaryResponse {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub skipped: Vec<SkippedRowResponse>,
}

impl From<&ReconcileSummary> for ReconcileSummaryResponse {
    fn from(summary: &ReconcileSummary) -> Self {
        Self {
            added: summary.added,
            updated: summary.updated,
            removed: summary.removed,
            unchanged: summary.unchanged,
            skipped: summary.skipped.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeeUploadResponse {
    pub message: String,
    pub ledger: FeeLedgerResponse,
    pub summary: ReconcileSummaryResponse,
}

/// Upload a sheet of unpaid fees and reconcile it into the school's ledger.
///
/// Accepts a multipart/form-data request; the first part carrying a file is used.
/// The file may be a workbook (xlsx, xls, ods; first worksheet) or CSV.
/// Expected columns: `Name` and `Number of unpaid month`.
#[utoipa::path(
    post,
    path = "/fees/{schoolId}/upload",
    params(("schoolId" = Uuid, Path, description = "School id")),
    request_body(content_type = "multipart/form-data", description = "The fee sheet to upload."),
    responses(
        (status = 200, description = "Fees data processed", body = FeeUploadResponse),
        (status = 400, description = "Missing, empty or unreadable sheet", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn upload_fees_handler(
    State(state): State<Arc<AppState>>,
    school_id: Result<Path<Uuid>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FeeUploadResponse>, HandlerError> {
    let Path(school_id) = school_id.map_err(invalid_school_id)?;
    let mut multipart =
        multipart.map_err(|e| rejected("Expected a multipart/form-data upload", e.body_text()))?;
    let mut file: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to read multipart field: {}", e);
        rejected("Invalid multipart body", e.body_text())
    })? {
        if field.file_name().is_none() && field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let data = field.bytes().await.map_err(|e| {
            error!("Failed to read file bytes: {}", e);
            rejected("Could not read uploaded file", e.body_text())
        })?;
        info!("Received fee sheet '{}' ({} bytes) for {}", name, data.len(), school_id);
        file = Some(data);
        break;
    }

    let outcome =
        workflow::fees::upload_and_reconcile(state.db.as_ref(), school_id, file.as_deref())
            .await
            .map_err(|e| port_error("Failed to reconcile fees", e))?;

    Ok(Json(FeeUploadResponse {
        message: "Fees data processed successfully".to_string(),
        ledger: (&outcome.ledger).into(),
        summary: (&outcome.summary).into(),
    }))
}

/// Fetch a school's fee ledger.
#[utoipa::path(
    get,
    path = "/fees/{schoolId}",
    params(("schoolId" = Uuid, Path, description = "School id")),
    responses(
        (status = 200, description = "Fee ledger", body = FeeLedgerResponse),
        (status = 400, description = "Invalid school id", body = ErrorResponse),
        (status = 404, description = "No ledger for this school", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_fee_ledger_handler(
    State(state): State<Arc<AppState>>,
    school_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<FeeLedgerResponse>, HandlerError> {
    let Path(school_id) = school_id.map_err(invalid_school_id)?;
    let ledger = workflow::fees::get_ledger(state.db.as_ref(), school_id)
        .await
        .map_err(|e| port_error("Failed to fetch fee ledger", e))?;
    Ok(Json((&ledger).into()))
}

pub(crate) fn invalid_school_id(e: PathRejection) -> HandlerError {
    rejected("Invalid school id", e.body_text())
}
