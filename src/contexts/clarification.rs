use tracing::{debug, warn};

use super::llm_client::{CompletionRequest, LlmClient};
use crate::data::{ClarificationAnswer, ReasoningRecord};

pub const STAGE: &str = "clarification";

/// Asked when the model cannot produce questions of its own
pub const FALLBACK_QUESTION: &str = "Could you please provide more details about your requirements?";

/// Answers that carry no information
const STOPLIST: &[&str] = &["yes", "no", "none", "n/a"];

/// Appended when none of the answers says anything useful
pub const ASSUMPTIONS_NOTE: &str = "Note: The user provided minimal responses to the clarification questions. \
Please generate a workflow script based on the original prompt and make reasonable assumptions where information is missing.";

/// Trait for collecting answers to clarification questions.
///
/// Blocks until every question has an answer; the returned list is in question order.
pub trait AnswerCollector {
    fn collect(&self, questions: &[String]) -> Vec<ClarificationAnswer>;
}

impl<T: AnswerCollector + ?Sized> AnswerCollector for &T {
    fn collect(&self, questions: &[String]) -> Vec<ClarificationAnswer> {
        (**self).collect(questions)
    }
}

/// Whether clarification questions should be asked for this reasoning.
///
/// Questions are always asked: the pipeline is interactive by nature and the
/// reasoning's own verdict is recorded but not consulted.
pub fn should_clarify(_reasoning: &ReasoningRecord) -> bool {
    true
}

/// Turns the gaps found during reasoning into questions for the user.
pub struct ClarificationStage<L: LlmClient> {
    llm: L,
}

impl<L: LlmClient> ClarificationStage<L> {
    pub fn new(llm: L) -> Self {
        Self { llm }
    }

    pub fn clarify(&self, reasoning: &ReasoningRecord) -> Vec<String> {
        let prompt = build_prompt(reasoning);
        match self.llm.complete(&CompletionRequest::new(STAGE, prompt)) {
            Ok(content) => {
                let questions = parse_questions(&content);
                debug!(count = questions.len(), "parsed clarification questions");
                questions
            }
            Err(e) => {
                warn!("clarification call failed: {}", e);
                vec![FALLBACK_QUESTION.to_string()]
            }
        }
    }
}

fn build_prompt(reasoning: &ReasoningRecord) -> String {
    let mut prompt = String::from(
        "Based on the user's request for a YouTrack workflow script, I need to ask some clarification questions.\n\n",
    );

    if !reasoning.rationale.is_empty() {
        prompt.push_str(&format!(
            "Here's my reasoning about the request:\n{}\n\n",
            reasoning.rationale
        ));
    }

    if !reasoning.missing_information.is_empty() {
        prompt.push_str("Missing information:\n");
        for item in &reasoning.missing_information {
            prompt.push_str(&format!("- {}\n", item));
        }
        prompt.push('\n');
    }

    if !reasoning.ambiguities.is_empty() {
        prompt.push_str("Ambiguities:\n");
        for item in &reasoning.ambiguities {
            prompt.push_str(&format!("- {}\n", item));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "Please generate 2-5 clear, concise clarification questions that would help me understand the user's requirements better.
The questions should:
1. Address the missing information and ambiguities
2. Be specific to YouTrack workflow scripts
3. Help gather details about fields, conditions, actions, and requirements
4. Be numbered (1., 2., etc.)
",
    );

    prompt
}

/// Picks the questions out of a model answer.
///
/// Keeps lines numbered `1.` to `9.` (marker removed) and lines ending in `?`.
/// When nothing qualifies the whole answer is one question.
pub fn parse_questions(content: &str) -> Vec<String> {
    let mut questions = Vec::new();

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let bytes = line.as_bytes();
        let numbered = bytes.len() >= 2 && (b'1'..=b'9').contains(&bytes[0]) && bytes[1] == b'.';
        if numbered {
            let question = line[2..].trim();
            if !question.is_empty() {
                questions.push(question.to_string());
            }
        } else if line.ends_with('?') {
            questions.push(line.to_string());
        }
    }

    if questions.is_empty() {
        let whole = content.trim();
        if whole.is_empty() {
            questions.push(FALLBACK_QUESTION.to_string());
        } else {
            questions.push(whole.to_string());
        }
    }

    questions
}

/// An answer says something if it is longer than three characters and not a stock reply.
pub fn is_substantive(answer: &str) -> bool {
    let trimmed = answer.trim();
    trimmed.chars().count() > 3 && !STOPLIST.contains(&trimmed.to_lowercase().as_str())
}

/// Folds the user's answers back into the request text.
pub fn fold_answers(request: &str, answers: &[ClarificationAnswer]) -> String {
    let mut text = String::from(request);
    text.push_str("\n\nClarification:\n");

    for answer in answers {
        text.push_str(&format!("Q: {}\nA: {}\n\n", answer.question, answer.answer));
    }

    if !answers.iter().any(|a| is_substantive(&a.answer)) {
        text.push_str(ASSUMPTIONS_NOTE);
        text.push_str("\n\n");
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contexts::llm_client::LlmError;
    use std::cell::RefCell;

    struct RecordingClient {
        prompts: RefCell<Vec<String>>,
        reply: Result<&'static str, ()>,
    }

    impl LlmClient for RecordingClient {
        fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            self.prompts.borrow_mut().push(request.prompt.clone());
            self.reply
                .map(str::to_string)
                .map_err(|_| LlmError::EmptyResponse)
        }
    }

    fn answers(values: &[&str]) -> Vec<ClarificationAnswer> {
        values
            .iter()
            .enumerate()
            .map(|(i, a)| ClarificationAnswer::new(format!("Question {}?", i + 1), *a))
            .collect()
    }

    #[test]
    fn test_parse_numbered_and_question_lines() {
        let content = "Here are my questions:\n1. Who is the team lead?\n2. Which project\nIs Critical the only priority?\nThanks.";
        assert_eq!(
            parse_questions(content),
            vec![
                "Who is the team lead?",
                "Which project",
                "Is Critical the only priority?",
            ]
        );
    }

    #[test]
    fn test_parse_without_matches_keeps_whole_answer() {
        assert_eq!(
            parse_questions("  Tell me about the fields.  "),
            vec!["Tell me about the fields."]
        );
        assert_eq!(parse_questions("   "), vec![FALLBACK_QUESTION]);
    }

    #[test]
    fn test_clarify_failure_returns_fallback() {
        let client = RecordingClient {
            prompts: RefCell::new(Vec::new()),
            reply: Err(()),
        };
        let questions = ClarificationStage::new(&client).clarify(&ReasoningRecord::default());
        assert_eq!(questions, vec![FALLBACK_QUESTION]);
    }

    #[test]
    fn test_prompt_embeds_gaps() {
        let client = RecordingClient {
            prompts: RefCell::new(Vec::new()),
            reply: Ok("1. Who?"),
        };
        let reasoning = ReasoningRecord {
            rationale: "Route critical issues".to_string(),
            missing_information: vec!["Lead name".to_string()],
            ambiguities: vec!["Overwrite assignee".to_string()],
            ..ReasoningRecord::default()
        };

        let questions = ClarificationStage::new(&client).clarify(&reasoning);
        assert_eq!(questions, vec!["Who?"]);

        let prompt = &client.prompts.borrow()[0];
        assert!(prompt.contains("Route critical issues"));
        assert!(prompt.contains("Missing information:\n- Lead name\n"));
        assert!(prompt.contains("Ambiguities:\n- Overwrite assignee\n"));
    }

    #[test]
    fn test_minimal_answers_add_assumptions_note() {
        let text = fold_answers("auto-assign", &answers(&["yes", "no", "  ok  "]));
        assert!(text.starts_with("auto-assign\n\nClarification:\n"));
        assert!(text.contains("Q: Question 3?\nA:   ok  \n"));
        assert!(text.contains("make reasonable assumptions"));
    }

    #[test]
    fn test_substantive_answer_drops_note() {
        let text = fold_answers("auto-assign", &answers(&["no", "The lead is jane.doe"]));
        assert!(text.contains("A: The lead is jane.doe"));
        assert!(!text.contains("make reasonable assumptions"));
    }

    #[test]
    fn test_is_substantive() {
        assert!(!is_substantive("N/A"));
        assert!(!is_substantive("  None "));
        assert!(!is_substantive("ok"));
        assert!(is_substantive("only Critical"));
        assert!(is_substantive("sure"));
    }

    #[test]
    fn test_policy_always_clarifies() {
        assert!(should_clarify(&ReasoningRecord::default()));
    }
}
