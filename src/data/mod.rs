mod cache;
mod records;
mod session;
mod snippet;
mod validation;

pub use cache::Cache;
pub use records::{ClarificationAnswer, PlanRecord, ReasoningRecord};
pub use session::{PipelineStage, Session};
pub use snippet::{CorpusMatch, ExampleScript, SnippetKind, SourceSnippet};
pub use validation::{HeuristicCheck, SyntaxCheck, ValidationResult};
