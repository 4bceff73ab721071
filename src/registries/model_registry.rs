use super::RegistryError;
use crate::contexts::{LlmError, Model, ModelRegistry};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Stage configuration from the registry
#[derive(Clone, Debug, PartialEq)]
pub struct StageConfig {
    pub model: String,
    pub temperature: Option<f32>,
}

/// File-based implementation of ModelRegistry
/// Loads stage-to-model mappings from a YAML file
#[derive(Clone, Debug)]
pub struct FileModelRegistry {
    registry_path: PathBuf,
    default_model: String,
}

impl FileModelRegistry {
    /// Creates a new FileModelRegistry
    ///
    /// # Arguments
    /// * `registry_path` - Path to the YAML mapping; a missing file means every stage uses the default
    /// * `default_model` - Model used for stages the file does not mention
    pub fn new(registry_path: impl Into<PathBuf>, default_model: impl Into<String>) -> Self {
        Self {
            registry_path: registry_path.into(),
            default_model: default_model.into(),
        }
    }

    /// Loads the registry from the file
    fn load_registry(&self) -> HashMap<String, StageConfig> {
        if !self.registry_path.exists() {
            return HashMap::new();
        }

        let content = match fs::read_to_string(&self.registry_path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "failed to read model registry {}: {}",
                    self.registry_path.display(),
                    e
                );
                return HashMap::new();
            }
        };

        match parse_registry(&content, &self.default_model) {
            Ok(registry) => registry,
            Err(e) => {
                warn!("ignoring model registry {}: {}", self.registry_path.display(), e);
                HashMap::new()
            }
        }
    }
}

impl ModelRegistry for FileModelRegistry {
    fn get_model(&self, stage: &str) -> Result<Model, LlmError> {
        let registry = self.load_registry();

        let model = match registry.get(stage) {
            Some(config) => Model {
                name: config.model.clone(),
                temperature: config.temperature,
            },
            None => Model {
                name: self.default_model.clone(),
                temperature: None,
            },
        };

        if model.name.trim().is_empty() {
            return Err(LlmError::ModelNotFound(stage.to_string()));
        }
        Ok(model)
    }
}

/// Parses the YAML registry file into a HashMap
/// Entries are either a model name or an object with `model` and `temperature`
fn parse_registry(
    yaml_content: &str,
    default_model: &str,
) -> Result<HashMap<String, StageConfig>, RegistryError> {
    use yaml_rust::{Yaml, YamlLoader};

    let docs = YamlLoader::load_from_str(yaml_content)
        .map_err(|e| RegistryError::Malformed(format!("Invalid registry YAML: {}", e)))?;

    if docs.is_empty() {
        return Ok(HashMap::new());
    }

    let doc = &docs[0];
    let mut registry = HashMap::new();

    if let Some(hash) = doc.as_hash() {
        for (key, value) in hash {
            let Some(stage) = key.as_str() else {
                continue;
            };

            let config = if let Some(model) = value.as_str() {
                StageConfig {
                    model: model.to_string(),
                    temperature: None,
                }
            } else if let Some(entry) = value.as_hash() {
                let model = entry
                    .get(&Yaml::String("model".to_string()))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| default_model.to_string());

                let temperature = entry
                    .get(&Yaml::String("temperature".to_string()))
                    .and_then(|v| v.as_f64().or_else(|| v.as_i64().map(|i| i as f64)))
                    .map(|t| t as f32);

                StageConfig { model, temperature }
            } else {
                continue;
            };

            registry.insert(stage.to_string(), config);
        }
    }

    Ok(registry)
}
