//! services/api/src/workflow/fees.rs
//!
//! Upload-and-reconcile for a school's fee ledger. Rows are applied one by one;
//! rows that cannot be matched to a student of this school are skipped, and the
//! ledger is persisted once at the end.

use crate::adapters::spreadsheet::parse_fee_sheet;
use chrono::Utc;
use dropout_tracker_core::{
    domain::FeeLedger,
    fees::{check_enrolment, FeeRow, ReconcileSummary, RowOutcome, SkipReason},
    ports::{DatabaseService, PortError, PortResult},
};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub ledger: FeeLedger,
    pub summary: ReconcileSummary,
}

/// Parses the uploaded sheet and reconciles it against the school's ledger.
pub async fn upload_and_reconcile(
    db: &dyn DatabaseService,
    school_id: Uuid,
    file: Option<&[u8]>,
) -> PortResult<ReconcileOutcome> {
    let data = file.ok_or_else(|| PortError::InvalidInput("No file uploaded".to_string()))?;
    let rows = parse_fee_sheet(data).map_err(|e| PortError::InvalidInput(e.to_string()))?;
    reconcile(db, school_id, &rows).await
}

pub async fn reconcile(
    db: &dyn DatabaseService,
    school_id: Uuid,
    rows: &[FeeRow],
) -> PortResult<ReconcileOutcome> {
    if rows.is_empty() {
        return Err(PortError::InvalidInput(
            "Sheet contains no data rows".to_string(),
        ));
    }

    let now = Utc::now();
    let mut ledger = match db.get_fee_ledger(school_id).await {
        Ok(ledger) => ledger,
        Err(PortError::NotFound(_)) => FeeLedger::new(school_id, now),
        Err(e) => return Err(e),
    };

    let mut summary = ReconcileSummary::default();
    for row in rows {
        let outcome = apply_row(db, &mut ledger, school_id, row).await?;
        match outcome {
            RowOutcome::Skipped(reason) => info!(
                "Skipping row {} ({}): {}",
                row.row_number,
                row.student_name,
                reason.as_str()
            ),
            other => info!(
                "Row {} ({}): {:?}",
                row.row_number, row.student_name, other
            ),
        }
        summary.record(row, outcome);
    }

    ledger.updated_at = now;
    db.save_fee_ledger(&ledger).await?;
    info!(
        "Fee ledger for {} reconciled: {} added, {} updated, {} removed, {} skipped",
        school_id,
        summary.added,
        summary.updated,
        summary.removed,
        summary.skipped.len()
    );

    Ok(ReconcileOutcome { ledger, summary })
}

async fn apply_row(
    db: &dyn DatabaseService,
    ledger: &mut FeeLedger,
    school_id: Uuid,
    row: &FeeRow,
) -> PortResult<RowOutcome> {
    let unpaid_months = match row.validate() {
        Ok(months) => months,
        Err(reason) => return Ok(RowOutcome::Skipped(reason)),
    };

    let student = match db.find_student_by_name(row.student_name.trim()).await {
        Ok(student) => student,
        Err(PortError::NotFound(_)) => return Ok(RowOutcome::Skipped(SkipReason::StudentNotFound)),
        Err(e) => return Err(e),
    };

    if let Err(reason) = check_enrolment(&student, school_id) {
        return Ok(RowOutcome::Skipped(reason));
    }

    Ok(ledger.apply_row(&student, unpaid_months))
}

pub async fn get_ledger(db: &dyn DatabaseService, school_id: Uuid) -> PortResult<FeeLedger> {
    db.get_fee_ledger(school_id).await
}
