pub mod counselling;
pub mod domain;
pub mod fees;
pub mod ports;
pub mod risk;

pub use counselling::{CounsellingStage, RequestUpdate};
pub use domain::{
    CounsellingNote, CounsellingRecord, CounsellingRequest, FeeLedger, FeeLineItem, Mentor,
    RiskAssessment, RiskLevel, School, Student, StudentDetails,
};
pub use fees::{FeeRow, ReconcileSummary, RowOutcome, SkipReason, SkippedRow};
pub use ports::{
    DatabaseService, MentorAssignmentService, PortError, PortResult, RiskInsightService,
};
