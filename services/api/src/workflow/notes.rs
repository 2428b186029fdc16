//! services/api/src/workflow/notes.rs
//!
//! The flat counselling log: free-form notes per student, kept apart from the
//! per-school counselling records.

use chrono::{DateTime, Utc};
use dropout_tracker_core::{
    domain::CounsellingNote,
    ports::{DatabaseService, PortError, PortResult},
};
use tracing::info;
use uuid::Uuid;

pub async fn add_note(
    db: &dyn DatabaseService,
    student_id: &str,
    date: Option<DateTime<Utc>>,
    notes: &str,
) -> PortResult<CounsellingNote> {
    if student_id.trim().is_empty() {
        return Err(PortError::InvalidInput("student_id is required".to_string()));
    }
    if notes.trim().is_empty() {
        return Err(PortError::InvalidInput("notes are required".to_string()));
    }

    let now = Utc::now();
    let note = CounsellingNote {
        id: Uuid::new_v4(),
        student_id: student_id.trim().to_string(),
        date: date.unwrap_or(now),
        notes: notes.to_string(),
        created_at: now,
    };
    db.save_counselling_note(note.clone()).await?;
    info!("Counselling note {} added for {}", note.id, note.student_id);
    Ok(note)
}

pub async fn list_notes(db: &dyn DatabaseService) -> PortResult<Vec<CounsellingNote>> {
    db.list_counselling_notes().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use chrono::TimeZone;

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let store = InMemoryStore::new();
        assert!(matches!(
            add_note(&store, " ", None, "met parents").await,
            Err(PortError::InvalidInput(_))
        ));
        assert!(matches!(
            add_note(&store, "S-17", None, "").await,
            Err(PortError::InvalidInput(_))
        ));
        assert!(list_notes(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn notes_are_listed_newest_first() {
        let store = InMemoryStore::new();
        let older = Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2025, 2, 5, 0, 0, 0).unwrap();
        add_note(&store, "S-17", Some(older), "first call").await.unwrap();
        add_note(&store, "S-17", Some(newer), "home visit").await.unwrap();

        let notes = list_notes(&store).await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].notes, "home visit");
        assert_eq!(notes[1].date, older);
    }
}
