//! services/api/src/adapters/memory.rs
//!
//! An in-process `DatabaseService` holding everything behind `tokio` mutexes.
//! Backs the workflow and HTTP test suites.

use async_trait::async_trait;
use dropout_tracker_core::domain::{
    CounsellingNote, CounsellingRecord, FeeLedger, Mentor, School, Student,
};
use dropout_tracker_core::ports::{DatabaseService, PortError, PortResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryStore {
    pub students: Mutex<Vec<Student>>,
    pub schools: Mutex<HashMap<Uuid, School>>,
    pub mentors: Mutex<Vec<Mentor>>,
    /// Kept in creation order so "oldest record first" lookups hold.
    pub counselling: Mutex<Vec<CounsellingRecord>>,
    pub ledgers: Mutex<HashMap<Uuid, FeeLedger>>,
    pub notes: Mutex<Vec<CounsellingNote>>,
    pub save_calls: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_student(&self, student: Student) {
        self.students.lock().await.push(student);
    }

    pub async fn insert_school(&self, school: School) {
        self.schools.lock().await.insert(school.id, school);
    }

    pub async fn insert_mentor(&self, mentor: Mentor) {
        self.mentors.lock().await.push(mentor);
    }

    /// Number of aggregate writes (counselling records and fee ledgers) so far.
    pub fn saves(&self) -> u64 {
        self.save_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DatabaseService for InMemoryStore {
    async fn get_student_by_email(&self, email: &str) -> PortResult<Student> {
        self.students
            .lock()
            .await
            .iter()
            .find(|s| s.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Student {} not found", email)))
    }

    async fn find_student_by_name(&self, name: &str) -> PortResult<Student> {
        self.students
            .lock()
            .await
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Student named {} not found", name)))
    }

    async fn list_students_by_school(&self, school_id: Uuid) -> PortResult<Vec<Student>> {
        let mut students: Vec<Student> = self
            .students
            .lock()
            .await
            .iter()
            .filter(|s| s.is_enrolled_at(school_id))
            .cloned()
            .collect();
        students.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(students)
    }

    async fn get_school_by_id(&self, school_id: Uuid) -> PortResult<School> {
        self.schools
            .lock()
            .await
            .get(&school_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("School {} not found", school_id)))
    }

    async fn get_mentor_by_name(&self, name: &str) -> PortResult<Mentor> {
        self.mentors
            .lock()
            .await
            .iter()
            .find(|m| m.name == name)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Mentor {} not found", name)))
    }

    async fn list_mentors(&self) -> PortResult<Vec<Mentor>> {
        let mut mentors = self.mentors.lock().await.clone();
        mentors.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.email.cmp(&b.email)));
        Ok(mentors)
    }

    async fn get_counselling_by_school(&self, school: &str) -> PortResult<CounsellingRecord> {
        self.counselling
            .lock()
            .await
            .iter()
            .find(|r| r.school == school)
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!("No counselling data found for school {}", school))
            })
    }

    async fn find_counselling_by_student(
        &self,
        student_email: &str,
    ) -> PortResult<CounsellingRecord> {
        self.counselling
            .lock()
            .await
            .iter()
            .find(|r| r.count_for(student_email) > 0)
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!(
                    "Counselling request for {} not found",
                    student_email
                ))
            })
    }

    async fn save_counselling(&self, record: &CounsellingRecord) -> PortResult<()> {
        let mut records = self.counselling.lock().await;
        match records.iter_mut().find(|r| r.school == record.school) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.save_calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn get_fee_ledger(&self, school_id: Uuid) -> PortResult<FeeLedger> {
        self.ledgers
            .lock()
            .await
            .get(&school_id)
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!("Fee ledger for school {} not found", school_id))
            })
    }

    async fn save_fee_ledger(&self, ledger: &FeeLedger) -> PortResult<()> {
        self.ledgers
            .lock()
            .await
            .insert(ledger.school_id, ledger.clone());
        self.save_calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn save_counselling_note(&self, note: CounsellingNote) -> PortResult<()> {
        self.notes.lock().await.push(note);
        Ok(())
    }

    async fn list_counselling_notes(&self) -> PortResult<Vec<CounsellingNote>> {
        let mut notes = self.notes.lock().await.clone();
        notes.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));
        Ok(notes)
    }
}
