use super::RegistryError;
use crate::contexts::ExampleRegistry;
use crate::data::ExampleScript;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const BUILTIN_EXAMPLES: &str = include_str!("../../seed/examples.yml");

/// File-based implementation of ExampleRegistry
/// Loads example scripts from a JSON or YAML list, falling back to the built-in set
#[derive(Clone, Debug, Default)]
pub struct FileExampleRegistry {
    path: Option<PathBuf>,
}

impl FileExampleRegistry {
    /// Creates a new FileExampleRegistry
    ///
    /// # Arguments
    /// * `path` - Optional corpus file (`.json`, `.yml` or `.yaml`); `None` means built-in examples only
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl ExampleRegistry for FileExampleRegistry {
    fn load_examples(&self) -> Vec<ExampleScript> {
        let Some(path) = &self.path else {
            return builtin_examples();
        };

        match read_examples(path) {
            Ok(examples) => {
                debug!(count = examples.len(), path = %path.display(), "loaded example corpus");
                examples
            }
            Err(e) => {
                warn!(
                    "falling back to built-in examples, could not load {}: {}",
                    path.display(),
                    e
                );
                builtin_examples()
            }
        }
    }
}

/// The example scripts shipped with the binary
pub fn builtin_examples() -> Vec<ExampleScript> {
    match serde_yaml::from_str(BUILTIN_EXAMPLES) {
        Ok(examples) => examples,
        Err(e) => {
            warn!("built-in examples are unreadable: {}", e);
            Vec::new()
        }
    }
}

fn read_examples(path: &Path) -> Result<Vec<ExampleScript>, RegistryError> {
    let content = fs::read_to_string(path).map_err(|e| RegistryError::Unreadable(e.to_string()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).map_err(|e| RegistryError::Malformed(e.to_string()))
    } else {
        serde_yaml::from_str(&content).map_err(|e| RegistryError::Malformed(e.to_string()))
    }
}
