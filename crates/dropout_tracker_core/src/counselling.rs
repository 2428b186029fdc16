//! crates/dropout_tracker_core/src/counselling.rs
//!
//! Pure operations on a school's counselling record: appending requests,
//! first-match updates keyed by student email, and stage derivation.

use crate::domain::{CounsellingRecord, CounsellingRequest, Mentor, Student, StudentDetails};
use crate::ports::{PortError, PortResult};
use chrono::{DateTime, Utc};

/// How far a request has progressed. Derived from which fields are populated;
/// the workflow does not forbid steps out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CounsellingStage {
    Requested,
    Contacted,
    LinkIssued,
    Concluded,
    SatisfactionRecorded,
}

impl CounsellingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounsellingStage::Requested => "requested",
            CounsellingStage::Contacted => "contacted",
            CounsellingStage::LinkIssued => "link_issued",
            CounsellingStage::Concluded => "concluded",
            CounsellingStage::SatisfactionRecorded => "satisfaction_recorded",
        }
    }
}

impl CounsellingRequest {
    /// Builds a fresh request, snapshotting the student's contact details.
    pub fn new(student: &Student, mentor: &Mentor, issue: &str, now: DateTime<Utc>) -> Self {
        Self {
            student_email: student.email.clone(),
            student_details: StudentDetails {
                name: student.name.clone(),
                phone: student.contact_number.clone(),
                parent_phone: student.parent_phone.clone(),
                parent_email: student.parent_email.clone(),
            },
            mentor_email: mentor.email.clone(),
            mentor_name: mentor.name.clone(),
            issue: issue.to_string(),
            created_at: now,
            schedule_date: None,
            meeting_link: None,
            concluded_message: None,
            is_contacted: false,
            is_satisfied: false,
        }
    }

    /// The furthest step whose field has been populated.
    pub fn stage(&self) -> CounsellingStage {
        if self.is_satisfied {
            CounsellingStage::SatisfactionRecorded
        } else if self.concluded_message.is_some() {
            CounsellingStage::Concluded
        } else if self.meeting_link.is_some() {
            CounsellingStage::LinkIssued
        } else if self.is_contacted {
            CounsellingStage::Contacted
        } else {
            CounsellingStage::Requested
        }
    }
}

/// A partial update applied to a single request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestUpdate {
    Schedule(DateTime<Utc>),
    MeetingLink(String),
    Conclude(String),
    Satisfaction(bool),
}

impl RequestUpdate {
    pub fn apply(self, request: &mut CounsellingRequest) {
        match self {
            RequestUpdate::Schedule(date) => {
                request.schedule_date = Some(date);
                request.is_contacted = true;
            }
            RequestUpdate::MeetingLink(link) => request.meeting_link = Some(link),
            RequestUpdate::Conclude(message) => request.concluded_message = Some(message),
            RequestUpdate::Satisfaction(satisfied) => request.is_satisfied = satisfied,
        }
    }

    /// A short label used in log lines and response messages.
    pub fn label(&self) -> &'static str {
        match self {
            RequestUpdate::Schedule(_) => "Meeting scheduled",
            RequestUpdate::MeetingLink(_) => "Meeting link added",
            RequestUpdate::Conclude(_) => "Meeting concluded",
            RequestUpdate::Satisfaction(_) => "Satisfaction updated",
        }
    }
}

impl CounsellingRecord {
    pub fn new(school: &str, now: DateTime<Utc>) -> Self {
        Self {
            school: school.to_string(),
            requests: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push_request(&mut self, request: CounsellingRequest, now: DateTime<Utc>) {
        self.requests.push(request);
        self.updated_at = now;
    }

    /// Number of requests filed for `student_email` in this record.
    pub fn count_for(&self, student_email: &str) -> usize {
        self.requests
            .iter()
            .filter(|r| r.student_email == student_email)
            .count()
    }

    /// Applies `update` to the first request (in insertion order) for `student_email`.
    ///
    /// Returns how many requests matched the key so callers can report ambiguity.
    /// Zero matches leaves the record untouched and yields `NotFound`.
    pub fn update_first(
        &mut self,
        student_email: &str,
        update: RequestUpdate,
        now: DateTime<Utc>,
    ) -> PortResult<usize> {
        let matches = self.count_for(student_email);
        let request = self
            .requests
            .iter_mut()
            .find(|r| r.student_email == student_email)
            .ok_or_else(|| {
                PortError::NotFound(format!(
                    "Counselling request for {} not found",
                    student_email
                ))
            })?;
        update.apply(request);
        self.updated_at = now;
        Ok(matches)
    }
}
