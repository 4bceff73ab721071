use serde::{Deserialize, Serialize};

/// Structured breakdown of a request produced by the reasoning stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReasoningRecord {
    pub rationale: String,
    pub steps: Vec<String>,
    pub missing_information: Vec<String>,
    pub ambiguities: Vec<String>,
    pub needs_clarification: bool,
    /// LLM failure text when the call did not succeed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub raw_response: String,
}

impl ReasoningRecord {
    /// Record returned when the LLM call fails: nothing known, so clarification is required.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            needs_clarification: true,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn has_gaps(&self) -> bool {
        !self.missing_information.is_empty() || !self.ambiguities.is_empty()
    }
}

/// Implementation plan produced by the planning stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub plan: String,
    pub components: Vec<String>,
    pub requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub raw_response: String,
}

impl PlanRecord {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// One clarification question and the answer the user gave to it.
///
/// Answers are kept in a list; the position is the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationAnswer {
    pub question: String,
    pub answer: String,
}

impl ClarificationAnswer {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}
