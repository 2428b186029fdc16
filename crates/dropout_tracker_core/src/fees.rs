//! crates/dropout_tracker_core/src/fees.rs
//!
//! Reconciliation of uploaded unpaid-month rows against a school's fee ledger.
//! Each row is applied independently; a row that cannot be matched is skipped
//! and reported rather than failing the batch.

use crate::domain::{FeeLedger, FeeLineItem, Student};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One data row of an uploaded fee sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeRow {
    /// 1-based position among the data rows, for reporting.
    pub row_number: usize,
    pub student_name: String,
    /// `None` when the cell held something other than a non-negative integer.
    pub unpaid_months: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyName,
    InvalidUnpaidMonths,
    StudentNotFound,
    NotEnrolledAtSchool,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::EmptyName => "empty student name",
            SkipReason::InvalidUnpaidMonths => "unpaid months is not a non-negative integer",
            SkipReason::StudentNotFound => "no student with this name",
            SkipReason::NotEnrolledAtSchool => "student's current school does not match",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Added,
    Updated,
    Removed,
    Unchanged,
    Skipped(SkipReason),
}

impl FeeRow {
    /// Checks the parts of a row that need no lookup.
    pub fn validate(&self) -> Result<u32, SkipReason> {
        if self.student_name.trim().is_empty() {
            return Err(SkipReason::EmptyName);
        }
        self.unpaid_months.ok_or(SkipReason::InvalidUnpaidMonths)
    }
}

/// A row may only touch the ledger of the school the student currently attends.
pub fn check_enrolment(student: &Student, school_id: Uuid) -> Result<(), SkipReason> {
    match student.current_school() {
        Some(current) if current == school_id => Ok(()),
        _ => Err(SkipReason::NotEnrolledAtSchool),
    }
}

impl FeeLedger {
    pub fn new(school_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            school_id,
            line_items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn item_for(&self, student_id: Uuid) -> Option<&FeeLineItem> {
        self.line_items.iter().find(|i| i.student_id == student_id)
    }

    /// Adds, overwrites or removes the student's line item.
    pub fn apply_row(&mut self, student: &Student, unpaid_months: u32) -> RowOutcome {
        let existing = self
            .line_items
            .iter()
            .position(|i| i.student_id == student.id);

        match (existing, unpaid_months) {
            (Some(index), 0) => {
                self.line_items.remove(index);
                RowOutcome::Removed
            }
            (None, 0) => RowOutcome::Unchanged,
            (Some(index), months) => {
                let item = &mut self.line_items[index];
                if item.unpaid_months == months {
                    RowOutcome::Unchanged
                } else {
                    item.unpaid_months = months;
                    RowOutcome::Updated
                }
            }
            (None, months) => {
                self.line_items.push(FeeLineItem {
                    student_id: student.id,
                    student_name: student.name.clone(),
                    unpaid_months: months,
                });
                RowOutcome::Added
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row_number: usize,
    pub student_name: String,
    pub reason: SkipReason,
}

/// Tally of what a reconciliation run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub skipped: Vec<SkippedRow>,
}

impl ReconcileSummary {
    pub fn record(&mut self, row: &FeeRow, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Added => self.added += 1,
            RowOutcome::Updated => self.updated += 1,
            RowOutcome::Removed => self.removed += 1,
            RowOutcome::Unchanged => self.unchanged += 1,
            RowOutcome::Skipped(reason) => self.skipped.push(SkippedRow {
                row_number: row.row_number,
                student_name: row.student_name.clone(),
                reason,
            }),
        }
    }
}
