//! crates/dropout_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A student as known to the school directory.
#[derive(Debug, Clone)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub contact_number: String,
    pub parent_phone: String,
    pub parent_email: String,
    /// Association history, oldest first. The last entry is the current school.
    pub school_ids: Vec<Uuid>,
    pub attendance_percentage: f64,
    pub test_score: Option<f64>,
    pub reasons: Option<String>,
}

impl Student {
    /// The school this student was most recently associated with.
    pub fn current_school(&self) -> Option<Uuid> {
        self.school_ids.last().copied()
    }

    pub fn is_enrolled_at(&self, school_id: Uuid) -> bool {
        self.school_ids.contains(&school_id)
    }
}

#[derive(Debug, Clone)]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mentor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Contact details copied onto a counselling request when it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDetails {
    pub name: String,
    pub phone: String,
    pub parent_phone: String,
    pub parent_email: String,
}

/// One student's counselling request inside a school's record.
#[derive(Debug, Clone, PartialEq)]
pub struct CounsellingRequest {
    pub student_email: String,
    pub student_details: StudentDetails,
    pub mentor_email: String,
    pub mentor_name: String,
    pub issue: String,
    pub created_at: DateTime<Utc>,
    pub schedule_date: Option<DateTime<Utc>>,
    pub meeting_link: Option<String>,
    pub concluded_message: Option<String>,
    pub is_contacted: bool,
    pub is_satisfied: bool,
}

/// All counselling requests raised by the students of one school.
#[derive(Debug, Clone)]
pub struct CounsellingRecord {
    /// The school email.
    pub school: String,
    /// Chronological: new requests are always appended.
    pub requests: Vec<CounsellingRequest>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A student's outstanding fees inside a school's ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeLineItem {
    pub student_id: Uuid,
    pub student_name: String,
    pub unpaid_months: u32,
}

#[derive(Debug, Clone)]
pub struct FeeLedger {
    pub school_id: Uuid,
    pub line_items: Vec<FeeLineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An entry in the flat counselling log, unrelated to the workflow record.
#[derive(Debug, Clone)]
pub struct CounsellingNote {
    pub id: Uuid,
    pub student_id: String,
    pub date: DateTime<Utc>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Green",
            RiskLevel::Medium => "Orange",
            RiskLevel::High => "Red",
        }
    }
}

/// The rule-based dropout risk for a single student.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub student_id: Uuid,
    pub student_name: String,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub dropout_reason: String,
    pub dropout_probability: f64,
}
