//! services/api/src/workflow/counselling.rs
//!
//! The counselling lifecycle: a student raises a request, a mentor schedules,
//! shares a link, concludes, and the student records satisfaction. Every step is
//! a read-modify-write of the school's counselling record.

use chrono::Utc;
use dropout_tracker_core::{
    counselling::RequestUpdate,
    domain::{CounsellingRecord, CounsellingRequest},
    ports::{DatabaseService, MentorAssignmentService, PortError, PortResult},
};
use tracing::{info, warn};

/// Files a new counselling request for the student and returns the school's record.
pub async fn create_request(
    db: &dyn DatabaseService,
    mentors: &dyn MentorAssignmentService,
    student_email: &str,
    message: &str,
) -> PortResult<CounsellingRecord> {
    let student = db.get_student_by_email(student_email).await?;

    let mentor = mentors.select_mentor(&student).await?;
    info!("Assigned mentor {} to {}", mentor.name, student.email);

    let school_id = student.current_school().ok_or_else(|| {
        PortError::NotFound(format!(
            "Student {} is not associated with any school",
            student.email
        ))
    })?;
    let school = db.get_school_by_id(school_id).await?;

    let now = Utc::now();
    let mut record = match db.get_counselling_by_school(&school.email).await {
        Ok(record) => record,
        Err(PortError::NotFound(_)) => {
            info!("Creating counselling record for school {}", school.email);
            CounsellingRecord::new(&school.email, now)
        }
        Err(e) => return Err(e),
    };

    record.push_request(CounsellingRequest::new(&student, &mentor, message, now), now);
    db.save_counselling(&record).await?;

    info!(
        "Counselling request #{} filed for {} at {}",
        record.requests.len(),
        student.email,
        record.school
    );
    Ok(record)
}

/// Applies one lifecycle step to the first request filed under `student_email`.
pub async fn update_request(
    db: &dyn DatabaseService,
    student_email: &str,
    update: RequestUpdate,
) -> PortResult<CounsellingRecord> {
    let mut record = db.find_counselling_by_student(student_email).await?;
    let label = update.label();

    let matches = record.update_first(student_email, update, Utc::now())?;
    if matches > 1 {
        warn!(
            "{} requests for {} in {}; updated the earliest",
            matches, student_email, record.school
        );
    }

    db.save_counselling(&record).await?;
    info!("{} for {}", label, student_email);
    Ok(record)
}

pub async fn get_by_school(
    db: &dyn DatabaseService,
    school_email: &str,
) -> PortResult<CounsellingRecord> {
    db.get_counselling_by_school(school_email).await
}
