//! crates/dropout_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{
    CounsellingNote, CounsellingRecord, FeeLedger, Mentor, RiskAssessment, School, Student,
};
use async_trait::async_trait;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Directory ---
    async fn get_student_by_email(&self, email: &str) -> PortResult<Student>;

    /// Returns the first student carrying exactly this name.
    async fn find_student_by_name(&self, name: &str) -> PortResult<Student>;

    async fn list_students_by_school(&self, school_id: Uuid) -> PortResult<Vec<Student>>;

    async fn get_school_by_id(&self, school_id: Uuid) -> PortResult<School>;

    async fn get_mentor_by_name(&self, name: &str) -> PortResult<Mentor>;

    async fn list_mentors(&self) -> PortResult<Vec<Mentor>>;

    // --- Counselling Workflow ---
    async fn get_counselling_by_school(&self, school: &str) -> PortResult<CounsellingRecord>;

    /// Returns the oldest record holding at least one request for `student_email`.
    async fn find_counselling_by_student(
        &self,
        student_email: &str,
    ) -> PortResult<CounsellingRecord>;

    /// Inserts or replaces the whole record, keyed by school.
    async fn save_counselling(&self, record: &CounsellingRecord) -> PortResult<()>;

    // --- Fees ---
    async fn get_fee_ledger(&self, school_id: Uuid) -> PortResult<FeeLedger>;

    /// Inserts or replaces the whole ledger, keyed by school.
    async fn save_fee_ledger(&self, ledger: &FeeLedger) -> PortResult<()>;

    // --- Counselling Notes ---
    async fn save_counselling_note(&self, note: CounsellingNote) -> PortResult<()>;

    async fn list_counselling_notes(&self) -> PortResult<Vec<CounsellingNote>>;
}

/// Chooses the mentor who will handle a new counselling request.
#[async_trait]
pub trait MentorAssignmentService: Send + Sync {
    async fn select_mentor(&self, student: &Student) -> PortResult<Mentor>;
}

#[async_trait]
pub trait RiskInsightService: Send + Sync {
    /// Writes a short narrative brief about the given (highest-risk first) students.
    async fn summarize_risk(
        &self,
        school_label: &str,
        assessments: &[RiskAssessment],
    ) -> PortResult<String>;
}
