use tracing::{info, warn};

use super::clarification::{should_clarify, AnswerCollector, ClarificationStage, fold_answers};
use super::command_runner::CommandRunner;
use super::corpus_search::ExampleCorpus;
use super::generation::{GenerationInput, GenerationStage};
use super::llm_client::LlmClient;
use super::planning::PlanningStage;
use super::reasoning::ReasoningStage;
use super::source_search::SourceSearch;
use super::validation::ScriptValidator;
use crate::data::{Cache, PipelineStage, Session, ValidationResult};
use crate::session_store::SessionStore;

/// Extra generate/validate rounds allowed after a failed validation
pub const MAX_REGENERATIONS: usize = 1;

/// Trait for following the pipeline as it moves between stages
pub trait StageObserver {
    fn enter(&mut self, stage: PipelineStage);
}

/// Observer that ignores every transition
#[derive(Debug, Default)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {
    fn enter(&mut self, _stage: PipelineStage) {}
}

/// What a pipeline run hands back
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Script of the last attempt, whether or not it validated
    pub script: String,
    pub validation: ValidationResult,
    /// Number of generate/validate rounds performed
    pub attempts: usize,
    pub session: Session,
}

/// Collaborators a pipeline run needs
pub struct Orchestrator<'a, L, A, R, C>
where
    L: LlmClient,
    A: AnswerCollector,
    R: CommandRunner,
    C: Cache,
{
    llm: &'a L,
    answers: &'a A,
    corpus: &'a ExampleCorpus,
    sources: &'a SourceSearch<C>,
    validator: &'a ScriptValidator<R>,
    store: &'a SessionStore,
}

impl<'a, L, A, R, C> Orchestrator<'a, L, A, R, C>
where
    L: LlmClient,
    A: AnswerCollector,
    R: CommandRunner,
    C: Cache,
{
    pub fn new(
        llm: &'a L,
        answers: &'a A,
        corpus: &'a ExampleCorpus,
        sources: &'a SourceSearch<C>,
        validator: &'a ScriptValidator<R>,
        store: &'a SessionStore,
    ) -> Self {
        Self {
            llm,
            answers,
            corpus,
            sources,
            validator,
            store,
        }
    }

    /// Runs the whole pipeline for one request.
    ///
    /// Never fails: model outages degrade into default records and a failed
    /// validation is reported in the outcome, not raised.
    pub fn run(&self, request: &str, observer: &mut dyn StageObserver) -> PipelineOutcome {
        let mut session = Session::new(request);
        info!(session = %session.id, "starting workflow generation");
        self.advance(&mut session, PipelineStage::Start, observer);

        self.advance(&mut session, PipelineStage::Reason, observer);
        let reasoning = ReasoningStage::new(self.llm).reason(request);
        session.reasoning = Some(reasoning.clone());
        self.persist(&session);

        if should_clarify(&reasoning) {
            self.advance(&mut session, PipelineStage::Clarify, observer);
            let questions = ClarificationStage::new(self.llm).clarify(&reasoning);
            session.clarification_questions = Some(questions.clone());
            self.persist(&session);

            let answers = self.answers.collect(&questions);
            session.answers = Some(answers.clone());
            self.persist(&session);

            session.updated_request = Some(fold_answers(request, &answers));
            self.persist(&session);
        }

        let working_request = session.working_request().to_string();

        self.advance(&mut session, PipelineStage::Plan, observer);
        let plan = PlanningStage::new(self.llm).plan(&working_request, Some(&reasoning));
        session.plan = Some(plan.clone());
        self.persist(&session);

        self.advance(&mut session, PipelineStage::Retrieve, observer);
        let examples = self.corpus.search(&working_request);
        session.corpus_results = Some(examples.clone());
        self.persist(&session);
        let snippets = self.sources.search(&working_request);
        session.source_results = Some(snippets.clone());
        self.persist(&session);

        let generator = GenerationStage::new(self.llm);
        let mut prior_failure: Option<ValidationResult> = None;
        let mut attempts = 0;

        let (script, validation) = loop {
            let is_retry = attempts > 0;
            attempts += 1;

            let generate_stage = if is_retry {
                PipelineStage::Regenerate
            } else {
                PipelineStage::Generate
            };
            self.advance(&mut session, generate_stage, observer);
            let script = generator.generate(&GenerationInput {
                request: &working_request,
                plan: Some(&plan),
                examples: &examples,
                snippets: &snippets,
                prior_failure: prior_failure.as_ref(),
            });
            session.record_script(&script, is_retry);
            self.persist(&session);

            let validate_stage = if is_retry {
                PipelineStage::Revalidate
            } else {
                PipelineStage::Validate
            };
            self.advance(&mut session, validate_stage, observer);
            let validation = self.validator.validate(&script);
            session.record_validation(validation.clone());
            self.persist(&session);

            if validation.success || attempts > MAX_REGENERATIONS {
                break (script, validation);
            }

            info!(summary = %validation.summary(), "validation failed, regenerating");
            prior_failure = Some(validation);
        };

        self.advance(&mut session, PipelineStage::Done, observer);
        if validation.success {
            info!(session = %session.id, attempts, "script validated");
        } else {
            warn!(session = %session.id, attempts, "returning script that failed validation");
        }

        PipelineOutcome {
            script,
            validation,
            attempts,
            session,
        }
    }

    fn advance(&self, session: &mut Session, stage: PipelineStage, observer: &mut dyn StageObserver) {
        session.stage = stage;
        observer.enter(stage);
        self.persist(session);
    }

    /// Writes the session; a lost write is logged and the pipeline carries on.
    fn persist(&self, session: &Session) {
        if let Err(e) = self.store.save(session) {
            warn!("failed to persist session {}: {:#}", session.id, e);
        }
    }
}
