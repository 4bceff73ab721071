//! Runtime settings
//!
//! Layered as: built-in defaults, then `wfgen.yml` (or the file passed with
//! `--config`), then environment variables, then command line flags applied by
//! the binary. A `.env` file in the working directory is loaded first.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "wfgen.yml";
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";

const ENV_API_KEY: &str = "WFGEN_API_KEY";
const ENV_API_URL: &str = "WFGEN_API_URL";
const ENV_MODEL: &str = "WFGEN_MODEL";

/// External program used for the syntax check; the script path is appended to `args`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyntaxChecker {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for SyntaxChecker {
    fn default() -> Self {
        Self {
            program: "node".to_string(),
            args: vec!["--check".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub default_model: String,
    pub max_tokens: u32,
    pub sessions_dir: PathBuf,
    /// Root of the scripting API sources searched for snippets
    pub api_docs_dir: PathBuf,
    pub source_extension: String,
    /// Example corpus file; the built-in examples are used when unset
    pub examples_path: Option<PathBuf>,
    pub model_registry_path: PathBuf,
    pub syntax_checker: SyntaxChecker,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            default_model: DEFAULT_MODEL.to_string(),
            max_tokens: 4000,
            sessions_dir: PathBuf::from(".wfgen/sessions"),
            api_docs_dir: PathBuf::from("youtrack-workflow-api"),
            source_extension: "js".to_string(),
            examples_path: None,
            model_registry_path: PathBuf::from("stage_models.yml"),
            syntax_checker: SyntaxChecker::default(),
        }
    }
}

impl Settings {
    /// Loads settings from the given file, or from `wfgen.yml` when it exists.
    ///
    /// An explicitly named file must exist; the default one is optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut settings = match config_path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        settings.apply_env(|name| env::var(name).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(settings)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file deserializes to unit, not a map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Overrides fields from the environment; blank values are ignored
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.default_model = model;
        }
    }

    /// The API key, or an error telling the user how to provide one
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => bail!(
                "No API key configured. Set {} or pass --api-key.",
                ENV_API_KEY
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.syntax_checker.program, "node");
        assert_eq!(settings.syntax_checker.args, vec!["--check"]);
        assert_eq!(settings.source_extension, "js");
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml(
            "default_model: local-coder\napi_docs_dir: vendor/api\nsyntax_checker:\n  program: deno\n",
        )
        .unwrap();

        assert_eq!(settings.default_model, "local-coder");
        assert_eq!(settings.api_docs_dir, PathBuf::from("vendor/api"));
        assert_eq!(settings.syntax_checker.program, "deno");
        assert_eq!(settings.syntax_checker.args, vec!["--check"]);
        assert_eq!(settings.max_tokens, 4000);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Settings::from_yaml("  \n").unwrap(), Settings::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wfgen.yml");
        fs::write(&path, "max_tokens: [1, 2").unwrap();
        assert!(Settings::from_file(&path).is_err());
        assert!(Settings::from_file(&dir.path().join("missing.yml")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("WFGEN_API_KEY", "sk-test"),
            ("WFGEN_API_URL", "http://localhost:8080/v1/chat/completions"),
            ("WFGEN_MODEL", "   "),
        ]);

        let mut settings = Settings::default();
        settings.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.api_url, "http://localhost:8080/v1/chat/completions");
        assert_eq!(settings.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_require_api_key() {
        let mut settings = Settings::default();
        assert!(settings.require_api_key().is_err());

        settings.api_key = Some(" ".to_string());
        assert!(settings.require_api_key().is_err());

        settings.api_key = Some("sk-test".to_string());
        assert_eq!(settings.require_api_key().unwrap(), "sk-test");
    }
}
