use tracing::{debug, warn};

use super::llm_client::{CompletionRequest, LlmClient};
use super::section_scanner::{match_header, push_item, push_or_continue, push_text};
use crate::data::ReasoningRecord;

pub const STAGE: &str = "reasoning";

const HEADERS: &[&str] = &[
    "reasoning:",
    "steps:",
    "missing information:",
    "ambiguities:",
    "needs clarification:",
];

/// Section of a reasoning answer the scanner is currently filling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Reasoning,
    Steps,
    MissingInfo,
    Ambiguities,
}

/// Asks the model to decompose a request and flag what is missing or unclear.
pub struct ReasoningStage<L: LlmClient> {
    llm: L,
}

impl<L: LlmClient> ReasoningStage<L> {
    pub fn new(llm: L) -> Self {
        Self { llm }
    }

    /// Never fails: an unreachable model yields an empty record that demands clarification.
    pub fn reason(&self, request: &str) -> ReasoningRecord {
        let prompt = build_prompt(request);
        match self.llm.complete(&CompletionRequest::new(STAGE, prompt)) {
            Ok(content) => {
                let record = parse_reasoning(&content);
                debug!(
                    steps = record.steps.len(),
                    missing = record.missing_information.len(),
                    ambiguities = record.ambiguities.len(),
                    "parsed reasoning"
                );
                record
            }
            Err(e) => {
                warn!("reasoning call failed: {}", e);
                ReasoningRecord::failed(e.to_string())
            }
        }
    }
}

fn build_prompt(request: &str) -> String {
    format!(
        r#"I need to generate a YouTrack workflow script based on the following request:

"{request}"

Before I start coding, I want to think through this problem step by step to make sure I understand the requirements and identify any missing information or ambiguities.

Please help me with a chain-of-thought reasoning process by:

1. Analyzing what the user is asking for in terms of a YouTrack workflow script
2. Breaking down the problem into smaller steps
3. Identifying the key components needed (fields, conditions, actions, etc.)
4. Noting any missing information that I would need to ask the user about
5. Highlighting any ambiguities in the request
6. Determining if clarification is needed before proceeding

Format your response with these sections:
- Reasoning: Your step-by-step analysis of the request
- Steps: A numbered list of steps to implement the workflow script
- Missing Information: A list of any information that's missing from the request
- Ambiguities: A list of any ambiguous aspects of the request
- Needs Clarification: Yes/No - whether I should ask for clarification before proceeding
"#
    )
}

/// Scans a reasoning answer into a record.
///
/// Unmarked lines continue the previous step but become new entries under
/// missing information and ambiguities; models wrap long steps yet tend to
/// list gaps one per line without bullets.
pub fn parse_reasoning(content: &str) -> ReasoningRecord {
    let mut record = ReasoningRecord {
        raw_response: content.to_string(),
        ..ReasoningRecord::default()
    };
    let mut section = Section::None;

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some((idx, rest)) = match_header(line, HEADERS) {
            section = match idx {
                0 => {
                    record.rationale = rest.to_string();
                    Section::Reasoning
                }
                1 => Section::Steps,
                2 => Section::MissingInfo,
                3 => Section::Ambiguities,
                _ => {
                    record.needs_clarification = rest.to_lowercase().starts_with("yes");
                    Section::None
                }
            };
            if !rest.is_empty() {
                match section {
                    Section::Steps => push_or_continue(&mut record.steps, rest),
                    Section::MissingInfo => push_item(&mut record.missing_information, rest),
                    Section::Ambiguities => push_item(&mut record.ambiguities, rest),
                    Section::Reasoning | Section::None => {}
                }
            }
            continue;
        }

        match section {
            Section::None => {}
            Section::Reasoning => push_text(&mut record.rationale, line),
            Section::Steps => push_or_continue(&mut record.steps, line),
            Section::MissingInfo => push_item(&mut record.missing_information, line),
            Section::Ambiguities => push_item(&mut record.ambiguities, line),
        }
    }

    if record.has_gaps() {
        record.needs_clarification = true;
    }

    record
}
