use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{debug, warn};

use super::command_runner::CommandRunner;
use crate::data::{HeuristicCheck, SyntaxCheck, ValidationResult};

/// One structural rule of the lint: `violated` inspects the raw text
struct LintRule {
    violated: fn(&str) -> bool,
    issue: &'static str,
}

const RULES: &[LintRule] = &[
    LintRule {
        violated: |code| !entities_import_re().is_match(code),
        issue: "Missing required import: entities",
    },
    LintRule {
        violated: |code| !code.contains("exports.rule"),
        issue: "Missing exports.rule",
    },
    LintRule {
        violated: |code| !code.contains("title:"),
        issue: "Missing rule title",
    },
    LintRule {
        violated: |code| !code.contains("guard:"),
        issue: "Missing guard function",
    },
    LintRule {
        violated: |code| !code.contains("action:"),
        issue: "Missing action function",
    },
    LintRule {
        violated: |code| field_assignment_re().is_match(code) && !code.contains("requirements:"),
        issue: "Setting field values but missing requirements section",
    },
    LintRule {
        violated: |code| Keyword::While.regex().is_match(code) && !Keyword::Break.regex().is_match(code),
        issue: "Potential infinite loop: while loop without break statement",
    },
    LintRule {
        violated: |code| Keyword::Try.regex().is_match(code) && !Keyword::Catch.regex().is_match(code),
        issue: "Incomplete error handling: try without catch",
    },
];

fn entities_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"require\(\s*['"]@jetbrains/youtrack-scripting-api/entities['"]\s*\)"#)
            .expect("valid regex")
    })
}

fn field_assignment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.\s*fields\s*\.\s*\w+\s*=[^=]").expect("valid regex"))
}

/// Control-flow keywords the lint pairs up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    While,
    Break,
    Try,
    Catch,
}

impl Keyword {
    fn as_str(self) -> &'static str {
        match self {
            Keyword::While => "while",
            Keyword::Break => "break",
            Keyword::Try => "try",
            Keyword::Catch => "catch",
        }
    }

    /// Whole-word matcher for the keyword
    fn regex(self) -> &'static Regex {
        static WHILE: OnceLock<Regex> = OnceLock::new();
        static BREAK: OnceLock<Regex> = OnceLock::new();
        static TRY: OnceLock<Regex> = OnceLock::new();
        static CATCH: OnceLock<Regex> = OnceLock::new();
        let cell = match self {
            Keyword::While => &WHILE,
            Keyword::Break => &BREAK,
            Keyword::Try => &TRY,
            Keyword::Catch => &CATCH,
        };
        cell.get_or_init(|| Regex::new(&format!(r"\b{}\b", self.as_str())).expect("valid regex"))
    }
}

/// Structural lint over the raw script text.
///
/// Not a parser: rules look for the presence or absence of fragments, so false
/// positives and negatives happen. The result depends on the text alone.
pub fn lint(script: &str) -> HeuristicCheck {
    let issues: Vec<String> = RULES
        .iter()
        .filter(|rule| (rule.violated)(script))
        .map(|rule| rule.issue.to_string())
        .collect();

    HeuristicCheck {
        success: issues.is_empty(),
        issues,
    }
}

/// Checks generated scripts with an external syntax checker and the lint.
pub struct ScriptValidator<R: CommandRunner> {
    runner: R,
    program: String,
    args: Vec<String>,
    extension: String,
    scratch_dir: PathBuf,
}

impl<R: CommandRunner> ScriptValidator<R> {
    /// `program args.. <file>` is run for every script; exit status zero means valid syntax.
    pub fn new(runner: R, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            args,
            extension: "js".to_string(),
            scratch_dir: std::env::temp_dir(),
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = scratch_dir.into();
        self
    }

    pub fn validate(&self, script: &str) -> ValidationResult {
        let syntax = self.check_syntax(script);
        let heuristics = syntax.success.then(|| lint(script));
        let result = ValidationResult::from_checks(syntax, heuristics);
        debug!(success = result.success, issues = result.issues().len(), "validated script");
        result
    }

    fn check_syntax(&self, script: &str) -> SyntaxCheck {
        let path = self.scratch_path(script);
        if let Err(e) = fs::write(&path, script) {
            return SyntaxCheck {
                success: false,
                error: Some(format!("Failed to write {}: {}", path.display(), e)),
            };
        }

        let mut args = self.args.clone();
        args.push(path.to_string_lossy().into_owned());
        let output = self.runner.run(&self.program, &args);

        if let Err(e) = fs::remove_file(&path) {
            warn!("failed to remove {}: {}", path.display(), e);
        }

        if output.success {
            SyntaxCheck {
                success: true,
                error: None,
            }
        } else {
            SyntaxCheck {
                success: false,
                error: Some(output.stderr),
            }
        }
    }

    /// Scratch file named after the script's digest
    fn scratch_path(&self, script: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(script.as_bytes());
        let digest = hex::encode(hasher.finalize());
        self.scratch_dir
            .join(format!("wfgen-{}.{}", &digest[..16], self.extension))
    }
}
