mod clarification;
mod command_runner;
mod corpus_search;
mod generation;
mod llm_client;
mod memory_cache;
mod orchestrator;
mod planning;
mod reasoning;
mod section_scanner;
mod source_search;
mod validation;

pub use clarification::{
    fold_answers, is_substantive, parse_questions, should_clarify, AnswerCollector,
    ClarificationStage, ASSUMPTIONS_NOTE, FALLBACK_QUESTION,
};
pub use command_runner::{CommandOutput, CommandRunner, ProcessRunner};
pub use corpus_search::{ExampleCorpus, ExampleRegistry};
pub use generation::{build_prompt as build_generation_prompt, fallback_script, GenerationInput, GenerationStage};
pub use llm_client::{
    extract_fenced_code, ChatCompletionsClient, CompletionRequest, LlmClient, LlmError, Model,
    ModelRegistry, CODE_SYSTEM_PROMPT, CODE_TEMPERATURE, DEFAULT_SYSTEM_PROMPT,
    DEFAULT_TEMPERATURE,
};
pub use memory_cache::MemoryCache;
pub use orchestrator::{
    NoopObserver, Orchestrator, PipelineOutcome, StageObserver, MAX_REGENERATIONS,
};
pub use planning::{parse_plan, PlanningStage};
pub use reasoning::{parse_reasoning, ReasoningStage};
pub use source_search::{EntityInfo, EntityMember, SourceSearch};
pub use validation::{lint, ScriptValidator};

/// Stage names used for model selection and logging
pub mod stages {
    pub use super::clarification::STAGE as CLARIFICATION;
    pub use super::generation::STAGE as GENERATION;
    pub use super::planning::STAGE as PLANNING;
    pub use super::reasoning::STAGE as REASONING;
}
