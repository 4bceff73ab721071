use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

mod console;
mod progress;

use console::Console;
use progress::ProgressIndicator;
use wfgen::config::Settings;
use wfgen::contexts::{
    AnswerCollector, ChatCompletionsClient, ExampleCorpus, LlmClient, Orchestrator,
    PipelineOutcome, ProcessRunner, ScriptValidator, SourceSearch,
};
use wfgen::registries::{FileExampleRegistry, FileModelRegistry};
use wfgen::session_store::SessionStore;

const RULE_WIDTH: usize = 60;
const PREVIEW_CHARS: usize = 80;

/// Options of the `generate` command
pub struct GenerateOptions {
    pub prompt: Option<String>,
    pub output: Option<PathBuf>,
    pub interactive: bool,
    pub api_key: Option<String>,
}

pub fn generate(options: GenerateOptions, settings: &Settings) -> Result<()> {
    let mut settings = settings.clone();
    if let Some(key) = options.api_key {
        settings.api_key = Some(key);
    }
    let api_key = settings.require_api_key()?.to_string();

    let console = Console::stdio();
    // Interactive mode asks for the request even when one was passed
    let request = match options.prompt {
        Some(prompt) if !options.interactive => prompt,
        _ => match console.ask_request() {
            Some(request) => request,
            None => {
                eprintln!("Exiting...");
                return Ok(());
            }
        },
    };
    if request.trim().is_empty() {
        bail!("No workflow request given. Pass --prompt or type the request when asked.");
    }

    let models = FileModelRegistry::new(&settings.model_registry_path, &settings.default_model);
    let llm = ChatCompletionsClient::new(&settings.api_url, api_key, models)
        .with_max_tokens(settings.max_tokens);
    let corpus =
        ExampleCorpus::from_registry(&FileExampleRegistry::new(settings.examples_path.clone()));
    let sources = SourceSearch::new(&settings.api_docs_dir, &settings.source_extension);
    let validator = build_validator(&settings);
    let store = SessionStore::new(&settings.sessions_dir);

    let orchestrator = Orchestrator::new(&llm, &console, &corpus, &sources, &validator, &store);

    let outcome = run_pipeline(&orchestrator, &request);
    report(&outcome, options.output.as_deref(), "Generated")?;

    if options.interactive {
        if let Some(changes) = console.code_feedback() {
            eprintln!("\nRegenerating workflow script based on your feedback...\n");
            let updated = format!("{}\n\nAdditional requirements: {}", request, changes);
            let outcome = run_pipeline(&orchestrator, &updated);
            report(&outcome, options.output.as_deref(), "Regenerated")?;
        }
    }

    Ok(())
}

fn run_pipeline<L, A, C>(
    orchestrator: &Orchestrator<'_, L, A, ProcessRunner, C>,
    request: &str,
) -> PipelineOutcome
where
    L: LlmClient,
    A: AnswerCollector,
    C: wfgen::data::Cache,
{
    let mut progress = ProgressIndicator::stderr();
    let outcome = orchestrator.run(request, &mut progress);
    info!(session = %outcome.session.id, attempts = outcome.attempts, "pipeline finished");
    outcome
}

fn report(outcome: &PipelineOutcome, output: Option<&Path>, heading: &str) -> Result<()> {
    eprintln!("\n=== {} Workflow Script ===\n", heading);
    println!("{}", outcome.script);
    eprintln!("\n{}", "=".repeat(RULE_WIDTH));

    if outcome.validation.success {
        eprintln!("✓ {}", outcome.validation.summary());
    } else {
        eprintln!("✗ {}", outcome.validation.summary());
    }
    eprintln!(
        "Session {} saved after {} attempt(s)",
        outcome.session.id, outcome.attempts
    );

    if let Some(path) = output {
        fs::write(path, &outcome.script)
            .with_context(|| format!("Failed to write script to {}", path.display()))?;
        eprintln!("Workflow script saved to {}", path.display());
    }
    Ok(())
}

fn build_validator(settings: &Settings) -> ScriptValidator<ProcessRunner> {
    ScriptValidator::new(
        ProcessRunner::new(None),
        &settings.syntax_checker.program,
        settings.syntax_checker.args.clone(),
    )
}

pub fn search(query: &str, entity: bool, settings: &Settings) -> Result<()> {
    let sources = SourceSearch::new(&settings.api_docs_dir, &settings.source_extension);

    if entity {
        let info = sources.search_entity(query);
        let rendered =
            serde_json::to_string_pretty(&info).context("Failed to render entity information")?;
        println!("{}", rendered);
        return Ok(());
    }

    let corpus =
        ExampleCorpus::from_registry(&FileExampleRegistry::new(settings.examples_path.clone()));
    let examples = corpus.search(query);
    println!("Examples ({}):", examples.len());
    for hit in &examples {
        println!("  [{}] {} - {}", hit.relevance, hit.example.id, hit.example.title);
    }

    let snippets = sources.search(query);
    println!("\nAPI snippets ({}):", snippets.len());
    if snippets.is_empty() && !sources.root().exists() {
        println!("  (no sources at {})", sources.root().display());
    }
    for snippet in &snippets {
        println!("  [{}] {}:{}", snippet.relevance, snippet.path, snippet.line);
        for line in snippet.code.lines() {
            println!("      {}", line);
        }
    }
    Ok(())
}

pub fn validate(file: &Path, settings: &Settings) -> Result<()> {
    let script = fs::read_to_string(file)
        .with_context(|| format!("Failed to read script {}", file.display()))?;

    let result = build_validator(settings).validate(&script);
    if result.success {
        println!("✓ {}", result.summary());
        Ok(())
    } else {
        eprintln!("✗ {}", result.summary());
        bail!("Validation failed for {}", file.display());
    }
}

pub fn history(similar: Option<&str>, limit: usize, settings: &Settings) -> Result<()> {
    let store = SessionStore::new(&settings.sessions_dir);

    match similar {
        Some(text) => {
            let matches = store.similar_requests(text, limit);
            if matches.is_empty() {
                println!("No earlier requests resemble '{}'", text);
            }
            for entry in matches {
                println!("{}  {}", entry.session_id, preview(&entry.request));
                if let Some(script) = entry.script {
                    println!("    script: {} line(s)", script.lines().count());
                }
            }
        }
        None => {
            let sessions = store.load_all();
            if sessions.is_empty() {
                println!("No sessions in {}", store.dir().display());
            }
            for session in sessions.iter().take(limit) {
                let verdict = match session.final_validation.as_ref().or(session.validation.as_ref()) {
                    Some(v) if v.success => "✓",
                    Some(_) => "✗",
                    None => "…",
                };
                println!(
                    "{} {}  [{}]  {}",
                    verdict,
                    session.id,
                    session.stage,
                    preview(&session.request)
                );
            }
        }
    }
    Ok(())
}

fn preview(text: &str) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= PREVIEW_CHARS {
        return single_line;
    }
    let cut: String = single_line.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut)
}
