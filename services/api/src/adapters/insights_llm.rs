//! services/api/src/adapters/insights_llm.rs
//!
//! This module contains the adapter for the risk-insights LLM.
//! It implements the `RiskInsightService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use dropout_tracker_core::{
    domain::RiskAssessment,
    ports::{PortError, PortResult, RiskInsightService},
};

/// Most students described to the model in one brief.
pub const MAX_STUDENTS: usize = 10;
/// Longest brief returned to callers, in characters.
pub const MAX_CHARS: usize = 1800;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `RiskInsightService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiInsightsAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiInsightsAdapter {
    /// Creates a new `OpenAiInsightsAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// One line per student, highest risk first.
fn describe(assessments: &[RiskAssessment]) -> String {
    assessments
        .iter()
        .take(MAX_STUDENTS)
        .map(|a| {
            format!(
                "- {} | score {} ({}) | {}",
                a.student_name,
                a.risk_score,
                a.risk_level.as_str(),
                a.dropout_reason
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

//=========================================================================================
// `RiskInsightService` Trait Implementation
//=========================================================================================

#[async_trait]
impl RiskInsightService for OpenAiInsightsAdapter {
    /// Produces a short brief for school staff about the listed students.
    async fn summarize_risk(
        &self,
        school_label: &str,
        assessments: &[RiskAssessment],
    ) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(
                "You are an assistant for school administrators tracking dropout risk. Given a list of students with a rule-based risk score and the reasons behind it, write a short brief: the overall picture in one sentence, then one actionable suggestion per student (counselling, fee support, attendance follow-up). Plain text, no markdown headings.")
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!(
                    "SCHOOL: {}\n\nSTUDENTS:\n{}",
                    school_label,
                    describe(assessments)
                ))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Insights LLM response contained no text content.".to_string())
            })?;

        Ok(truncate_chars(content.trim(), MAX_CHARS))
    }
}
