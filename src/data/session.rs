use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    ClarificationAnswer, CorpusMatch, PlanRecord, ReasoningRecord, SourceSnippet,
    ValidationResult,
};

/// States of the generation pipeline, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Start,
    Reason,
    Clarify,
    Plan,
    Retrieve,
    Generate,
    Validate,
    Regenerate,
    Revalidate,
    Done,
}

impl PipelineStage {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Start => "Starting",
            PipelineStage::Reason => "Reasoning about the request",
            PipelineStage::Clarify => "Asking clarification questions",
            PipelineStage::Plan => "Planning the script",
            PipelineStage::Retrieve => "Retrieving examples and API snippets",
            PipelineStage::Generate => "Generating the script",
            PipelineStage::Validate => "Validating the script",
            PipelineStage::Regenerate => "Regenerating after failed validation",
            PipelineStage::Revalidate => "Validating the regenerated script",
            PipelineStage::Done => "Done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One workflow-generation attempt and every artifact it produced.
///
/// Fields are written once as the pipeline advances; only the two validation
/// slots fill in sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub timestamp: String,
    pub stage: PipelineStage,
    pub request: String,
    pub reasoning: Option<ReasoningRecord>,
    pub clarification_questions: Option<Vec<String>>,
    pub answers: Option<Vec<ClarificationAnswer>>,
    pub updated_request: Option<String>,
    pub plan: Option<PlanRecord>,
    pub corpus_results: Option<Vec<CorpusMatch>>,
    pub source_results: Option<Vec<SourceSnippet>>,
    pub generated_script: Option<String>,
    pub validation: Option<ValidationResult>,
    pub regenerated_script: Option<String>,
    pub final_validation: Option<ValidationResult>,
}

impl Session {
    pub fn new(request: impl Into<String>) -> Self {
        Self::started_at(Local::now(), request)
    }

    pub fn started_at(now: DateTime<Local>, request: impl Into<String>) -> Self {
        Self {
            id: now.format("%Y%m%d%H%M%S").to_string(),
            timestamp: now.to_rfc3339(),
            stage: PipelineStage::Start,
            request: request.into(),
            reasoning: None,
            clarification_questions: None,
            answers: None,
            updated_request: None,
            plan: None,
            corpus_results: None,
            source_results: None,
            generated_script: None,
            validation: None,
            regenerated_script: None,
            final_validation: None,
        }
    }

    /// The request as it stands after clarification.
    pub fn working_request(&self) -> &str {
        self.updated_request.as_deref().unwrap_or(&self.request)
    }

    /// Stores a generated script: the first goes to `generated_script`, a retry to `regenerated_script`.
    pub fn record_script(&mut self, script: &str, is_regenerated: bool) {
        if is_regenerated {
            self.regenerated_script = Some(script.to_string());
        } else {
            self.generated_script = Some(script.to_string());
        }
    }

    /// Fills the first empty validation slot.
    pub fn record_validation(&mut self, result: ValidationResult) {
        if self.validation.is_none() {
            self.validation = Some(result);
        } else {
            self.final_validation = Some(result);
        }
    }

    /// The script of the last generation attempt.
    pub fn final_script(&self) -> Option<&str> {
        self.regenerated_script
            .as_deref()
            .or(self.generated_script.as_deref())
    }
}
