use serde::{Deserialize, Serialize};

/// An example workflow script from the seed corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleScript {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub code: String,
}

/// A corpus example ranked against a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusMatch {
    #[serde(flatten)]
    pub example: ExampleScript,
    pub relevance: u32,
}

/// What part of a source file a snippet was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnippetKind {
    /// A doc-comment block plus the code that follows it
    CommentWithCode,
    /// A window of lines around a matching line
    Code,
}

/// A fragment of the scripting API sources ranked against a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSnippet {
    /// File name without directories
    pub file: String,
    pub path: String,
    /// 1-based line where the snippet's match starts
    pub line: usize,
    pub code: String,
    pub relevance: u32,
    pub kind: SnippetKind,
}
