use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use wfgen::config::Settings;

mod cli;

#[derive(Parser)]
#[command(name = "wfgen")]
#[command(about = "Generates YouTrack workflow scripts from natural-language requests", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Enable verbose debug output")]
    verbose: bool,

    #[arg(long, global = true, help = "Configuration file (defaults to wfgen.yml when present)")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Generate a workflow script from a request")]
    Generate {
        #[arg(long, help = "The request describing the desired workflow (asked for when absent)")]
        prompt: Option<String>,

        #[arg(long, help = "File to write the generated script to")]
        output: Option<PathBuf>,

        #[arg(long, help = "Ask for the request and for feedback on the result")]
        interactive: bool,

        #[arg(long, help = "API key for the LLM service (overrides WFGEN_API_KEY)")]
        api_key: Option<String>,
    },

    #[command(about = "Search the example corpus and the scripting API sources")]
    Search {
        #[arg(help = "Search terms, or an entity name with --entity")]
        query: String,

        #[arg(long, help = "Look up documentation, methods and properties of an API entity")]
        entity: bool,
    },

    #[command(about = "Check a workflow script for syntax errors and common mistakes")]
    Validate {
        #[arg(help = "Script file to validate")]
        file: PathBuf,
    },

    #[command(about = "List earlier generation sessions")]
    History {
        #[arg(long, help = "Only sessions whose request shares a word with this text")]
        similar: Option<String>,

        #[arg(long, default_value_t = 10, help = "Maximum number of sessions to list")]
        limit: usize,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = if verbose {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate {
            prompt,
            output,
            interactive,
            api_key,
        } => {
            let options = cli::GenerateOptions {
                prompt,
                output,
                interactive,
                api_key,
            };
            cli::generate(options, &settings)?;
        }
        Commands::Search { query, entity } => {
            cli::search(&query, entity, &settings)?;
        }
        Commands::Validate { file } => {
            cli::validate(&file, &settings)?;
        }
        Commands::History { similar, limit } => {
            cli::history(similar.as_deref(), limit, &settings)?;
        }
    }

    Ok(())
}
