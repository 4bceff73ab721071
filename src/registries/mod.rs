mod example_registry;
mod model_registry;

use std::fmt;

pub use example_registry::{builtin_examples, FileExampleRegistry};
pub use model_registry::{FileModelRegistry, StageConfig};

/// Errors raised while reading a registry file
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    Unreadable(String),
    Malformed(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RegistryError::Unreadable(details) => write!(f, "Registry file unreadable: {}", details),
            RegistryError::Malformed(details) => write!(f, "Registry file is malformed: {}", details),
        }
    }
}

impl std::error::Error for RegistryError {}
