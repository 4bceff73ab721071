use tracing::{debug, warn};

use super::llm_client::LlmClient;
use crate::data::{CorpusMatch, PlanRecord, SourceSnippet, ValidationResult};

pub const STAGE: &str = "generation";

const MAX_EXAMPLES: usize = 3;
const MAX_SNIPPETS: usize = 5;

const OUTPUT_GUIDELINES: &str = "
Please generate a complete, working YouTrack workflow script that follows these guidelines:
1. Use the standard YouTrack workflow script format with exports.rule
2. Include appropriate guard conditions to ensure the rule only runs when needed
3. Include all necessary requirements
4. Add comments to explain complex logic
5. Handle edge cases appropriately
6. Use the YouTrack scripting API correctly (entities, workflow, etc.)
7. Return only the code without any additional explanations or markdown formatting
";

/// Everything the generator may draw on for one attempt
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationInput<'a> {
    pub request: &'a str,
    pub plan: Option<&'a PlanRecord>,
    pub examples: &'a [CorpusMatch],
    pub snippets: &'a [SourceSnippet],
    /// Validation verdict of the previous attempt when retrying
    pub prior_failure: Option<&'a ValidationResult>,
}

/// Asks the model to write the workflow script.
pub struct GenerationStage<L: LlmClient> {
    llm: L,
}

impl<L: LlmClient> GenerationStage<L> {
    pub fn new(llm: L) -> Self {
        Self { llm }
    }

    /// Always returns a script: when the model is unreachable a starter template
    /// carrying the error is produced instead.
    pub fn generate(&self, input: &GenerationInput<'_>) -> String {
        let prompt = build_prompt(input);
        debug!(
            prompt_len = prompt.len(),
            retry = input.prior_failure.is_some(),
            "requesting script"
        );

        match self.llm.complete_code(STAGE, &prompt) {
            Ok(code) => code,
            Err(e) => {
                warn!("generation call failed: {}", e);
                fallback_script(&e.to_string())
            }
        }
    }
}

/// Assembles the generation prompt: request, plan, examples, API snippets,
/// previous failure, output guidelines.
pub fn build_prompt(input: &GenerationInput<'_>) -> String {
    let mut prompt = format!(
        "Generate a YouTrack workflow script based on the following request:\n\n{}\n\n",
        input.request
    );

    if let Some(plan) = input.plan.filter(|p| !p.plan.is_empty()) {
        prompt.push_str(&format!("Plan:\n{}\n\n", plan.plan));
    }

    if !input.examples.is_empty() {
        prompt.push_str("Here are some relevant examples of YouTrack workflow scripts:\n\n");
        for (i, hit) in input.examples.iter().take(MAX_EXAMPLES).enumerate() {
            prompt.push_str(&format!("Example {}: {}\n", i + 1, hit.example.title));
            prompt.push_str(&format!("Description: {}\n", hit.example.description));
            prompt.push_str(&format!("Code:\n{}\n\n", hit.example.code));
        }
    }

    if !input.snippets.is_empty() {
        prompt.push_str("Here are some relevant code snippets from the YouTrack scripting API:\n\n");
        for (i, snippet) in input.snippets.iter().take(MAX_SNIPPETS).enumerate() {
            prompt.push_str(&format!(
                "Snippet {} from {}:\n{}\n\n",
                i + 1,
                snippet.file,
                snippet.code
            ));
        }
    }

    if let Some(failure) = input.prior_failure.filter(|r| !r.success) {
        prompt.push_str("The previous code generation had errors:\n");
        for issue in failure.issues() {
            prompt.push_str(&format!("- {}\n", issue));
        }
        prompt.push_str("Please fix these issues in the new code.\n\n");
    }

    prompt.push_str(OUTPUT_GUIDELINES);
    prompt
}

/// Starter script returned when generation fails.
pub fn fallback_script(error: &str) -> String {
    let error = error.replace('\n', " ");
    format!(
        r#"// Error generating code: {error}
// This is a basic template that you can modify to meet your requirements.

const entities = require('@jetbrains/youtrack-scripting-api/entities');

exports.rule = entities.Issue.onChange({{
  title: 'Basic Workflow Script',
  guard: (ctx) => {{
    const issue = ctx.issue;
    // Add your guard conditions here
    return true;
  }},
  action: (ctx) => {{
    const issue = ctx.issue;
    // Add your action logic here
    console.log('Workflow script executed for issue: ' + issue.id);
  }},
  requirements: {{
    // Add your requirements here
  }}
}});
"#
    )
}
