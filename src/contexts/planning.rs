use tracing::{debug, warn};

use super::llm_client::{CompletionRequest, LlmClient};
use super::section_scanner::{match_header, push_item, push_text};
use crate::data::{PlanRecord, ReasoningRecord};

pub const STAGE: &str = "planning";

const HEADERS: &[&str] = &["plan:", "components:", "requirements:"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Plan,
    Components,
    Requirements,
}

/// Asks the model for an implementation plan.
pub struct PlanningStage<L: LlmClient> {
    llm: L,
}

impl<L: LlmClient> PlanningStage<L> {
    pub fn new(llm: L) -> Self {
        Self { llm }
    }

    /// Never fails: an unreachable model yields an empty plan.
    pub fn plan(&self, request: &str, reasoning: Option<&ReasoningRecord>) -> PlanRecord {
        let prompt = build_prompt(request, reasoning);
        match self.llm.complete(&CompletionRequest::new(STAGE, prompt)) {
            Ok(content) => {
                let plan = parse_plan(&content);
                debug!(
                    components = plan.components.len(),
                    requirements = plan.requirements.len(),
                    "parsed plan"
                );
                plan
            }
            Err(e) => {
                warn!("planning call failed: {}", e);
                PlanRecord::failed(e.to_string())
            }
        }
    }
}

fn build_prompt(request: &str, reasoning: Option<&ReasoningRecord>) -> String {
    let mut prompt = format!(
        "I need to create a detailed plan for generating a YouTrack workflow script based on the following request:\n\n\"{}\"\n",
        request
    );

    if let Some(reasoning) = reasoning {
        if !reasoning.rationale.is_empty() {
            prompt.push_str(&format!(
                "\n\nHere's my reasoning about the request:\n{}\n",
                reasoning.rationale
            ));
        }
        if !reasoning.steps.is_empty() {
            prompt.push_str("\n\nI've broken down the problem into these steps:\n");
            for (i, step) in reasoning.steps.iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", i + 1, step));
            }
        }
    }

    prompt.push_str(
        "
Now, I need a detailed plan for implementing this workflow script. Please help me create a plan that includes:

1. The overall approach to implementing the workflow script
2. The key components that need to be implemented (guard conditions, actions, etc.)
3. The specific requirements (fields, users, etc.) that need to be defined
4. Any edge cases or special considerations to handle

Format your response with these sections:
- Plan: A detailed, step-by-step plan for implementing the workflow script
- Components: A list of the key components that need to be implemented
- Requirements: A list of the specific requirements that need to be defined
",
    );

    prompt
}

/// Scans a planning answer into a record; every line of a list section is its own entry.
pub fn parse_plan(content: &str) -> PlanRecord {
    let mut record = PlanRecord {
        raw_response: content.to_string(),
        ..PlanRecord::default()
    };
    let mut section = Section::None;

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some((idx, rest)) = match_header(line, HEADERS) {
            section = match idx {
                0 => {
                    record.plan = rest.to_string();
                    Section::Plan
                }
                1 => Section::Components,
                _ => Section::Requirements,
            };
            match section {
                Section::Components if !rest.is_empty() => push_item(&mut record.components, rest),
                Section::Requirements if !rest.is_empty() => {
                    push_item(&mut record.requirements, rest)
                }
                _ => {}
            }
            continue;
        }

        match section {
            Section::None => {}
            Section::Plan => push_text(&mut record.plan, line),
            Section::Components => push_item(&mut record.components, line),
            Section::Requirements => push_item(&mut record.requirements, line),
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contexts::llm_client::LlmError;
    use std::cell::RefCell;

    struct RecordingClient {
        prompts: RefCell<Vec<String>>,
        fail: bool,
    }

    impl LlmClient for RecordingClient {
        fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            self.prompts.borrow_mut().push(request.prompt.clone());
            if self.fail {
                Err(LlmError::Status(503, "unavailable".to_string()))
            } else {
                Ok("Plan: Use an onChange rule.\n1. Guard on priority\nComponents:\n- guard\naction\nRequirements:\n* Priority field".to_string())
            }
        }
    }

    #[test]
    fn test_parse_plan_sections() {
        let record = parse_plan("Plan: Use an onChange rule.\n1. Guard on priority\nComponents:\n- guard\naction\nRequirements:\n* Priority field\n2. Team Lead user");
        assert_eq!(record.plan, "Use an onChange rule.\n1. Guard on priority");
        assert_eq!(record.components, vec!["guard", "action"]);
        assert_eq!(record.requirements, vec!["Priority field", "Team Lead user"]);
    }

    #[test]
    fn test_parse_plan_without_headers() {
        let record = parse_plan("I would write a rule.\n- with a guard");
        assert!(record.plan.is_empty());
        assert!(record.components.is_empty());
        assert!(record.requirements.is_empty());
    }

    #[test]
    fn test_prompt_includes_reasoning() {
        let client = RecordingClient {
            prompts: RefCell::new(Vec::new()),
            fail: false,
        };
        let reasoning = ReasoningRecord {
            rationale: "Critical issues need an owner".to_string(),
            steps: vec!["Guard".to_string(), "Assign".to_string()],
            ..ReasoningRecord::default()
        };

        let plan = PlanningStage::new(&client).plan("auto-assign", Some(&reasoning));
        assert_eq!(plan.components, vec!["guard", "action"]);

        let prompt = &client.prompts.borrow()[0];
        assert!(prompt.contains("\"auto-assign\""));
        assert!(prompt.contains("Critical issues need an owner"));
        assert!(prompt.contains("1. Guard\n2. Assign\n"));
    }

    #[test]
    fn test_plan_failure_returns_empty_record() {
        let client = RecordingClient {
            prompts: RefCell::new(Vec::new()),
            fail: true,
        };
        let plan = PlanningStage::new(&client).plan("auto-assign", None);
        assert!(plan.plan.is_empty());
        assert!(plan.components.is_empty());
        assert!(plan.error.as_deref().unwrap().contains("503"));
    }
}
