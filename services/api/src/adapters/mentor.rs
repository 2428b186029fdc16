//! services/api/src/adapters/mentor.rs
//!
//! Mentor assignment strategies implementing the `MentorAssignmentService` port.

use async_trait::async_trait;
use dropout_tracker_core::domain::{Mentor, Student};
use dropout_tracker_core::ports::{
    DatabaseService, MentorAssignmentService, PortError, PortResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Assigns every request to one named mentor.
pub struct DesignatedMentorAdapter {
    db: Arc<dyn DatabaseService>,
    mentor_name: String,
}

impl DesignatedMentorAdapter {
    pub fn new(db: Arc<dyn DatabaseService>, mentor_name: String) -> Self {
        Self { db, mentor_name }
    }
}

#[async_trait]
impl MentorAssignmentService for DesignatedMentorAdapter {
    async fn select_mentor(&self, _student: &Student) -> PortResult<Mentor> {
        self.db
            .get_mentor_by_name(&self.mentor_name)
            .await
            .map_err(|e| match e {
                PortError::NotFound(_) => PortError::NotFound("No mentor available".to_string()),
                other => other,
            })
    }
}

/// Hands requests to mentors in turn, in name order.
pub struct RoundRobinMentorAdapter {
    db: Arc<dyn DatabaseService>,
    next: AtomicUsize,
}

impl RoundRobinMentorAdapter {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self {
            db,
            next: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MentorAssignmentService for RoundRobinMentorAdapter {
    async fn select_mentor(&self, _student: &Student) -> PortResult<Mentor> {
        let mut mentors = self.db.list_mentors().await?;
        if mentors.is_empty() {
            return Err(PortError::NotFound("No mentor available".to_string()));
        }
        let turn = self.next.fetch_add(1, Ordering::Relaxed);
        Ok(mentors.swap_remove(turn % mentors.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use uuid::Uuid;

    fn mentor(name: &str) -> Mentor {
        Mentor {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        }
    }

    fn student() -> Student {
        Student {
            id: Uuid::new_v4(),
            name: "Meera".to_string(),
            email: "meera@example.com".to_string(),
            contact_number: String::new(),
            parent_phone: String::new(),
            parent_email: String::new(),
            school_ids: vec![],
            attendance_percentage: 70.0,
            test_score: None,
            reasons: None,
        }
    }

    #[tokio::test]
    async fn designated_returns_named_mentor() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_mentor(mentor("Anita Rao")).await;
        store.insert_mentor(mentor("Rohan Verma")).await;
        let adapter = DesignatedMentorAdapter::new(store, "Rohan Verma".to_string());

        let picked = adapter.select_mentor(&student()).await.unwrap();
        assert_eq!(picked.name, "Rohan Verma");
    }

    #[tokio::test]
    async fn designated_missing_mentor_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let adapter = DesignatedMentorAdapter::new(store, "Rohan Verma".to_string());

        let result = adapter.select_mentor(&student()).await;
        assert!(matches!(result, Err(PortError::NotFound(msg)) if msg == "No mentor available"));
    }

    #[tokio::test]
    async fn round_robin_cycles_in_name_order() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_mentor(mentor("Zara Khan")).await;
        store.insert_mentor(mentor("Anita Rao")).await;
        let adapter = RoundRobinMentorAdapter::new(store);

        let s = student();
        let picks: Vec<String> = [
            adapter.select_mentor(&s).await.unwrap().name,
            adapter.select_mentor(&s).await.unwrap().name,
            adapter.select_mentor(&s).await.unwrap().name,
        ]
        .to_vec();
        assert_eq!(picks, vec!["Anita Rao", "Zara Khan", "Anita Rao"]);
    }

    #[tokio::test]
    async fn round_robin_without_mentors_is_not_found() {
        let adapter = RoundRobinMentorAdapter::new(Arc::new(InMemoryStore::new()));
        assert!(matches!(
            adapter.select_mentor(&student()).await,
            Err(PortError::NotFound(_))
        ));
    }
}
