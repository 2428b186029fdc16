//! services/api/src/workflow/risk.rs
//!
//! Per-school dropout risk report, optionally with an LLM-written brief.

use dropout_tracker_core::{
    domain::RiskAssessment,
    ports::{DatabaseService, PortError, PortResult, RiskInsightService},
    risk,
};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightStatus {
    Ok,
    Disabled,
    Error,
}

impl InsightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightStatus::Ok => "ok",
            InsightStatus::Disabled => "disabled",
            InsightStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Insights {
    pub status: InsightStatus,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct RiskReport {
    pub results: Vec<RiskAssessment>,
    pub insights: Option<Insights>,
}

pub async fn assess_school(
    db: &dyn DatabaseService,
    insight_service: Option<&dyn RiskInsightService>,
    school_id: Uuid,
    fees_months_denom: u32,
    with_insights: bool,
) -> PortResult<RiskReport> {
    let students = db.list_students_by_school(school_id).await?;
    let ledger = match db.get_fee_ledger(school_id).await {
        Ok(ledger) => Some(ledger),
        Err(PortError::NotFound(_)) => None,
        Err(e) => return Err(e),
    };

    let results = risk::assess_all(&students, ledger.as_ref(), fees_months_denom);
    info!("Assessed {} students for school {}", results.len(), school_id);

    let insights = if with_insights && !results.is_empty() {
        Some(brief(db, insight_service, school_id, &results).await)
    } else {
        None
    };

    Ok(RiskReport { results, insights })
}

/// Never fails the report: problems become a non-`ok` status.
async fn brief(
    db: &dyn DatabaseService,
    insight_service: Option<&dyn RiskInsightService>,
    school_id: Uuid,
    results: &[RiskAssessment],
) -> Insights {
    let Some(service) = insight_service else {
        return Insights {
            status: InsightStatus::Disabled,
            text: String::new(),
        };
    };

    let label = match db.get_school_by_id(school_id).await {
        Ok(school) => school.name,
        Err(_) => school_id.to_string(),
    };

    match service.summarize_risk(&label, results).await {
        Ok(text) => Insights {
            status: InsightStatus::Ok,
            text,
        },
        Err(e) => {
            error!("Risk insights for {} failed: {:?}", school_id, e);
            Insights {
                status: InsightStatus::Error,
                text: String::new(),
            }
        }
    }
}
