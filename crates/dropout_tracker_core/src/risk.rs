//! crates/dropout_tracker_core/src/risk.rs
//!
//! Rule-based dropout risk scoring from attendance, test performance and
//! the share of the year's fees left unpaid.

use crate::domain::{FeeLedger, RiskAssessment, RiskLevel, Student};

pub const DEFAULT_FEES_MONTHS_DENOM: u32 = 12;

/// The inputs the rules look at for a single student.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInputs {
    pub attendance_rate: f64,
    pub test_score: f64,
    /// Unpaid months over the denominator, clamped to `0.0..=1.0`.
    pub fees_fraction: f64,
}

impl RiskInputs {
    pub fn for_student(student: &Student, ledger: Option<&FeeLedger>, months_denom: u32) -> Self {
        let denom = if months_denom == 0 {
            DEFAULT_FEES_MONTHS_DENOM
        } else {
            months_denom
        };
        let unpaid = ledger
            .and_then(|l| l.item_for(student.id))
            .map(|i| i.unpaid_months)
            .unwrap_or(0);
        Self {
            attendance_rate: student.attendance_percentage,
            test_score: student.test_score.unwrap_or(0.0),
            fees_fraction: (f64::from(unpaid) / f64::from(denom)).clamp(0.0, 1.0),
        }
    }
}

/// Scores the inputs and returns `(score, reasons)`; the score is capped at 100.
pub fn score(inputs: &RiskInputs) -> (u32, Vec<&'static str>) {
    let mut score = 0u32;
    let mut reasons = Vec::with_capacity(3);

    if inputs.attendance_rate < 50.0 {
        score += 35;
        reasons.push("Low attendance");
    } else if inputs.attendance_rate < 75.0 {
        score += 25;
        reasons.push("Moderate attendance");
    } else {
        reasons.push("Good attendance");
    }

    if inputs.test_score < 40.0 {
        score += 35;
        reasons.push("Low test performance");
    } else if inputs.test_score < 60.0 {
        score += 20;
        reasons.push("Moderate test performance");
    } else {
        reasons.push("Good test performance");
    }

    if inputs.fees_fraction <= 0.3 {
        score += 5;
        reasons.push("Low risk fees");
    } else if inputs.fees_fraction <= 0.7 {
        score += 15;
        reasons.push("Moderate risk fees");
    } else {
        score += 30;
        reasons.push("High risk fees");
    }

    (score.min(100), reasons)
}

pub fn level_for(score: u32) -> RiskLevel {
    if score >= 60 {
        RiskLevel::High
    } else if score >= 30 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn assess(student: &Student, ledger: Option<&FeeLedger>, months_denom: u32) -> RiskAssessment {
    let inputs = RiskInputs::for_student(student, ledger, months_denom);
    let (risk_score, reasons) = score(&inputs);

    let mut dropout_reason = String::new();
    if let Some(own) = student.reasons.as_deref().map(str::trim) {
        if !own.is_empty() {
            dropout_reason.push_str(own);
            dropout_reason.push_str(", ");
        }
    }
    dropout_reason.push_str(&reasons.join(", "));

    RiskAssessment {
        student_id: student.id,
        student_name: student.name.clone(),
        risk_score,
        risk_level: level_for(risk_score),
        dropout_reason,
        dropout_probability: f64::from(risk_score) / 100.0,
    }
}

/// Assesses every student, highest score first (ties by student id).
pub fn assess_all(
    students: &[Student],
    ledger: Option<&FeeLedger>,
    months_denom: u32,
) -> Vec<RiskAssessment> {
    let mut results: Vec<RiskAssessment> = students
        .iter()
        .map(|s| assess(s, ledger, months_denom))
        .collect();
    results.sort_by(|a, b| {
        b.risk_score
            .cmp(&a.risk_score)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    results
}
