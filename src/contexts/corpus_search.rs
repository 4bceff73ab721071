use tracing::debug;

use crate::data::{CorpusMatch, ExampleScript};

const TITLE_WEIGHT: u32 = 3;
const DESCRIPTION_WEIGHT: u32 = 1;
const TAG_WEIGHT: u32 = 2;

/// Trait for loading the example-script corpus
pub trait ExampleRegistry {
    /// Load every example, in corpus order. Never fails; falls back to built-in data.
    fn load_examples(&self) -> Vec<ExampleScript>;
}

/// In-memory corpus of example workflow scripts searched by keyword overlap.
#[derive(Debug, Clone, Default)]
pub struct ExampleCorpus {
    examples: Vec<ExampleScript>,
}

impl ExampleCorpus {
    pub fn new(examples: Vec<ExampleScript>) -> Self {
        Self { examples }
    }

    pub fn from_registry<R: ExampleRegistry>(registry: &R) -> Self {
        Self::new(registry.load_examples())
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Ranks every example against the query; only examples with relevance above zero are kept.
    ///
    /// Each lowercased query token found in the title scores 3, in the
    /// description 1; each tag found anywhere in the query scores 2. Equal
    /// scores keep corpus order.
    pub fn search(&self, query: &str) -> Vec<CorpusMatch> {
        let query = query.to_lowercase();
        let terms: Vec<&str> = query.split_whitespace().collect();

        let mut matches: Vec<CorpusMatch> = self
            .examples
            .iter()
            .filter_map(|example| {
                let relevance = score(example, &query, &terms);
                (relevance > 0).then(|| CorpusMatch {
                    example: example.clone(),
                    relevance,
                })
            })
            .collect();

        // sort_by is stable, ties stay in corpus order
        matches.sort_by(|a, b| b.relevance.cmp(&a.relevance));

        debug!(query = %query, hits = matches.len(), "corpus search");
        matches
    }
}

fn score(example: &ExampleScript, query: &str, terms: &[&str]) -> u32 {
    let title = example.title.to_lowercase();
    let description = example.description.to_lowercase();

    let mut relevance = 0;
    for term in terms {
        if title.contains(term) {
            relevance += TITLE_WEIGHT;
        }
        if description.contains(term) {
            relevance += DESCRIPTION_WEIGHT;
        }
    }
    for tag in &example.tags {
        let tag = tag.to_lowercase();
        if !tag.is_empty() && query.contains(&tag) {
            relevance += TAG_WEIGHT;
        }
    }
    relevance
}
