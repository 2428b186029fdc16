//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Counselling records and fee ledgers are aggregates: each is stored as a single
//! row whose nested sequence lives in a JSONB column, and is always read and
//! written whole.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dropout_tracker_core::domain::{
    CounsellingNote, CounsellingRecord, CounsellingRequest, FeeLedger, FeeLineItem, Mentor,
    School, Student, StudentDetails,
};
use dropout_tracker_core::ports::{DatabaseService, PortError, PortResult};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct StudentRecord {
    id: Uuid,
    name: String,
    email: String,
    contact_number: String,
    parent_phone: String,
    parent_email: String,
    school_ids: Vec<Uuid>,
    attendance_percentage: f64,
    test_score: Option<f64>,
    reasons: Option<String>,
}
impl StudentRecord {
    fn to_domain(self) -> Student {
        Student {
            id: self.id,
            name: self.name,
            email: self.email,
            contact_number: self.contact_number,
            parent_phone: self.parent_phone,
            parent_email: self.parent_email,
            school_ids: self.school_ids,
            attendance_percentage: self.attendance_percentage,
            test_score: self.test_score,
            reasons: self.reasons,
        }
    }
}

const STUDENT_COLUMNS: &str = "id, name, email, contact_number, parent_phone, parent_email, \
     school_ids, attendance_percentage, test_score, reasons";

#[derive(FromRow)]
struct SchoolRecord {
    id: Uuid,
    name: String,
    email: String,
}
impl SchoolRecord {
    fn to_domain(self) -> School {
        School {
            id: self.id,
            name: self.name,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct MentorRecord {
    id: Uuid,
    name: String,
    email: String,
}
impl MentorRecord {
    fn to_domain(self) -> Mentor {
        Mentor {
            id: self.id,
            name: self.name,
            email: self.email,
        }
    }
}

/// The JSON shape of one element of `counselling_records.requests`.
#[derive(Serialize, Deserialize)]
struct StoredRequest {
    student_email: String,
    student_name: String,
    phone: String,
    parent_phone: String,
    parent_email: String,
    mentor_email: String,
    mentor_name: String,
    #[serde(default)]
    issue: String,
    created_at: DateTime<Utc>,
    schedule_date: Option<DateTime<Utc>>,
    meeting_link: Option<String>,
    concluded_message: Option<String>,
    #[serde(default)]
    is_contacted: bool,
    #[serde(default)]
    is_satisfied: bool,
}
impl StoredRequest {
    fn from_domain(r: &CounsellingRequest) -> Self {
        Self {
            student_email: r.student_email.clone(),
            student_name: r.student_details.name.clone(),
            phone: r.student_details.phone.clone(),
            parent_phone: r.student_details.parent_phone.clone(),
            parent_email: r.student_details.parent_email.clone(),
            mentor_email: r.mentor_email.clone(),
            mentor_name: r.mentor_name.clone(),
            issue: r.issue.clone(),
            created_at: r.created_at,
            schedule_date: r.schedule_date,
            meeting_link: r.meeting_link.clone(),
            concluded_message: r.concluded_message.clone(),
            is_contacted: r.is_contacted,
            is_satisfied: r.is_satisfied,
        }
    }

    fn to_domain(self) -> CounsellingRequest {
        CounsellingRequest {
            student_email: self.student_email,
            student_details: StudentDetails {
                name: self.student_name,
                phone: self.phone,
                parent_phone: self.parent_phone,
                parent_email: self.parent_email,
            },
            mentor_email: self.mentor_email,
            mentor_name: self.mentor_name,
            issue: self.issue,
            created_at: self.created_at,
            schedule_date: self.schedule_date,
            meeting_link: self.meeting_link,
            concluded_message: self.concluded_message,
            is_contacted: self.is_contacted,
            is_satisfied: self.is_satisfied,
        }
    }
}

#[derive(FromRow)]
struct CounsellingDocument {
    school: String,
    requests: Json<Vec<StoredRequest>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl CounsellingDocument {
    fn to_domain(self) -> CounsellingRecord {
        CounsellingRecord {
            school: self.school,
            requests: self
                .requests
                .0
                .into_iter()
                .map(StoredRequest::to_domain)
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoredLineItem {
    student_id: Uuid,
    student_name: String,
    unpaid_months: u32,
}

#[derive(FromRow)]
struct FeeLedgerDocument {
    school_id: Uuid,
    line_items: Json<Vec<StoredLineItem>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl FeeLedgerDocument {
    fn to_domain(self) -> FeeLedger {
        FeeLedger {
            school_id: self.school_id,
            line_items: self
                .line_items
                .0
                .into_iter()
                .map(|i| FeeLineItem {
                    student_id: i.student_id,
                    student_name: i.student_name,
                    unpaid_months: i.unpaid_months,
                })
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct CounsellingNoteRecord {
    id: Uuid,
    student_id: String,
    date: DateTime<Utc>,
    notes: String,
    created_at: DateTime<Utc>,
}
impl CounsellingNoteRecord {
    fn to_domain(self) -> CounsellingNote {
        CounsellingNote {
            id: self.id,
            student_id: self.student_id,
            date: self.date,
            notes: self.notes,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_student_by_email(&self, email: &str) -> PortResult<Student> {
        let record = sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {} FROM students WHERE email = $1",
            STUDENT_COLUMNS
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Student {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn find_student_by_name(&self, name: &str) -> PortResult<Student> {
        let record = sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {} FROM students WHERE name = $1 ORDER BY created_at ASC LIMIT 1",
            STUDENT_COLUMNS
        ))
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Student named {} not found", name)))?;
        Ok(record.to_domain())
    }

    async fn list_students_by_school(&self, school_id: Uuid) -> PortResult<Vec<Student>> {
        let records = sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {} FROM students WHERE $1 = ANY(school_ids) ORDER BY name ASC",
            STUDENT_COLUMNS
        ))
        .bind(school_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_school_by_id(&self, school_id: Uuid) -> PortResult<School> {
        let record = sqlx::query_as::<_, SchoolRecord>(
            "SELECT id, name, email FROM schools WHERE id = $1",
        )
        .bind(school_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("School {} not found", school_id)))?;
        Ok(record.to_domain())
    }

    async fn get_mentor_by_name(&self, name: &str) -> PortResult<Mentor> {
        let record = sqlx::query_as::<_, MentorRecord>(
            "SELECT id, name, email FROM mentors WHERE name = $1 LIMIT 1",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Mentor {} not found", name)))?;
        Ok(record.to_domain())
    }

    async fn list_mentors(&self) -> PortResult<Vec<Mentor>> {
        let records = sqlx::query_as::<_, MentorRecord>(
            "SELECT id, name, email FROM mentors ORDER BY name ASC, email ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_counselling_by_school(&self, school: &str) -> PortResult<CounsellingRecord> {
        let document = sqlx::query_as::<_, CounsellingDocument>(
            "SELECT school, requests, created_at, updated_at FROM counselling_records WHERE school = $1",
        )
        .bind(school)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            not_found_or_unexpected(e, format!("No counselling data found for school {}", school))
        })?;
        Ok(document.to_domain())
    }

    async fn find_counselling_by_student(
        &self,
        student_email: &str,
    ) -> PortResult<CounsellingRecord> {
        let containment = serde_json::json!([{ "student_email": student_email }]);
        let document = sqlx::query_as::<_, CounsellingDocument>(
            "SELECT school, requests, created_at, updated_at FROM counselling_records \
             WHERE requests @> $1 ORDER BY created_at ASC LIMIT 1",
        )
        .bind(Json(containment))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            not_found_or_unexpected(
                e,
                format!("Counselling request for {} not found", student_email),
            )
        })?;
        Ok(document.to_domain())
    }

    async fn save_counselling(&self, record: &CounsellingRecord) -> PortResult<()> {
        let requests: Vec<StoredRequest> =
            record.requests.iter().map(StoredRequest::from_domain).collect();
        sqlx::query(
            "INSERT INTO counselling_records (school, requests, created_at, updated_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (school) DO UPDATE SET requests = EXCLUDED.requests, updated_at = EXCLUDED.updated_at",
        )
        .bind(&record.school)
        .bind(Json(requests))
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_fee_ledger(&self, school_id: Uuid) -> PortResult<FeeLedger> {
        let document = sqlx::query_as::<_, FeeLedgerDocument>(
            "SELECT school_id, line_items, created_at, updated_at FROM fee_ledgers WHERE school_id = $1",
        )
        .bind(school_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            not_found_or_unexpected(e, format!("Fee ledger for school {} not found", school_id))
        })?;
        Ok(document.to_domain())
    }

    async fn save_fee_ledger(&self, ledger: &FeeLedger) -> PortResult<()> {
        let items: Vec<StoredLineItem> = ledger
            .line_items
            .iter()
            .map(|i| StoredLineItem {
                student_id: i.student_id,
                student_name: i.student_name.clone(),
                unpaid_months: i.unpaid_months,
            })
            .collect();
        sqlx::query(
            "INSERT INTO fee_ledgers (school_id, line_items, created_at, updated_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (school_id) DO UPDATE SET line_items = EXCLUDED.line_items, updated_at = EXCLUDED.updated_at",
        )
        .bind(ledger.school_id)
        .bind(Json(items))
        .bind(ledger.created_at)
        .bind(ledger.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn save_counselling_note(&self, note: CounsellingNote) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO counselling_notes (id, student_id, date, notes, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(note.id)
        .bind(note.student_id)
        .bind(note.date)
        .bind(note.notes)
        .bind(note.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn list_counselling_notes(&self) -> PortResult<Vec<CounsellingNote>> {
        let records = sqlx::query_as::<_, CounsellingNoteRecord>(
            "SELECT id, student_id, date, notes, created_at FROM counselling_notes ORDER BY date DESC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
