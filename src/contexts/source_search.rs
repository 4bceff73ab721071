use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::memory_cache::MemoryCache;
use crate::data::{Cache, SnippetKind, SourceSnippet};

/// Lines of code kept after a matching doc comment
const LINES_AFTER_COMMENT: usize = 10;
/// Lines kept on each side of a matching code line
const CONTEXT_LINES: usize = 5;

const COMMENT_START: &str = "/**";
const COMMENT_END: &str = "*/";

/// What the scripting API sources say about one entity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityInfo {
    pub name: String,
    pub documentation: Option<String>,
    pub examples: Vec<String>,
    pub methods: Vec<EntityMember>,
    pub properties: Vec<EntityMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityMember {
    pub name: String,
    pub code: String,
}

/// Keyword search over a directory of scripting API sources.
///
/// The tree is walked on every query; file contents are cached by path.
pub struct SourceSearch<C: Cache = MemoryCache> {
    root: PathBuf,
    extension: String,
    cache: C,
}

impl SourceSearch<MemoryCache> {
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self::with_cache(root, extension, MemoryCache::new())
    }
}

impl<C: Cache> SourceSearch<C> {
    pub fn with_cache(root: impl Into<PathBuf>, extension: &str, cache: C) -> Self {
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
            cache,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ranked snippets for the query; empty when the directory is missing.
    pub fn search(&self, query: &str) -> Vec<SourceSnippet> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::new();
        for path in self.source_files() {
            let Some(content) = self.read(&path) else {
                continue;
            };
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            results.extend(search_text(&file, &path.to_string_lossy(), &content, &terms));
        }

        results.sort_by(|a, b| b.relevance.cmp(&a.relevance));
        debug!(query = %query, hits = results.len(), "source search");
        results
    }

    /// Collects documentation, examples, methods and properties of an API entity.
    pub fn search_entity(&self, entity_name: &str) -> EntityInfo {
        let mut info = EntityInfo {
            name: entity_name.to_string(),
            ..EntityInfo::default()
        };

        let member_re = match Regex::new(&format!(r"{}\.(\w+)", regex::escape(entity_name))) {
            Ok(re) => re,
            Err(e) => {
                warn!("invalid entity name {}: {}", entity_name, e);
                return info;
            }
        };
        let lower_name = entity_name.to_lowercase();

        for snippet in self.search(entity_name) {
            let code = snippet.code;

            let defines = [
                format!("class {}", entity_name),
                format!("function {}", entity_name),
                format!("const {}", entity_name),
            ];
            if defines.iter().any(|d| code.contains(d.as_str())) {
                info.documentation = Some(code.clone());
            }

            let lower_code = code.to_lowercase();
            if lower_code.contains("example") && lower_code.contains(&lower_name) {
                info.examples.push(code.clone());
            }

            if let Some(caps) = member_re.captures(&code) {
                let member = caps[1].to_string();
                let call = format!("{}.{}(", entity_name, member);
                let assignment = format!("{}.{} =", entity_name, member);
                let entry = EntityMember {
                    name: member,
                    code: code.clone(),
                };
                if code.contains(&call) || code.contains(&assignment) {
                    info.methods.push(entry);
                } else {
                    info.properties.push(entry);
                }
            }
        }

        info
    }

    fn source_files(&self) -> Vec<PathBuf> {
        if !self.root.is_dir() {
            debug!("source directory {} not found", self.root.display());
            return Vec::new();
        }

        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.to_string_lossy() == self.extension)
            })
            .collect()
    }

    fn read(&self, path: &Path) -> Option<String> {
        let key = path.to_string_lossy();
        if let Some(content) = self.cache.get(&key) {
            return Some(content);
        }

        match fs::read_to_string(path) {
            Ok(content) => {
                self.cache.set(&key, &content);
                Some(content)
            }
            Err(e) => {
                warn!("skipping unreadable source {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Lowercased, whitespace-separated query tokens without repeats.
fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in query.to_lowercase().split_whitespace() {
        if !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    }
    terms
}

fn relevance(text_lower: &str, terms: &[String]) -> u32 {
    terms.iter().filter(|t| text_lower.contains(t.as_str())).count() as u32
}

/// Matches one file's content against the query terms.
///
/// A doc comment mentioning a term yields the comment plus the code under it;
/// any other matching line yields a window of surrounding lines. Lines inside a
/// doc comment only count through their comment.
pub fn search_text(file: &str, path: &str, content: &str, terms: &[String]) -> Vec<SourceSnippet> {
    let lines: Vec<&str> = content.lines().collect();
    let mut results = Vec::new();

    let mut block: Vec<&str> = Vec::new();
    let mut block_start = 0;
    let mut in_block = false;

    for (i, &line) in lines.iter().enumerate() {
        let mut closes_block = false;
        let part_of_block = if in_block {
            block.push(line);
            closes_block = line.contains(COMMENT_END);
            true
        } else if let Some(pos) = line.find(COMMENT_START) {
            in_block = true;
            block = vec![line];
            block_start = i;
            closes_block = line[pos + COMMENT_START.len()..].contains(COMMENT_END);
            true
        } else {
            false
        };

        if closes_block {
            in_block = false;
            let score = relevance(&block.join("\n").to_lowercase(), terms);
            if score > 0 {
                let end = (i + 1 + LINES_AFTER_COMMENT).min(lines.len());
                let mut code_block = block.clone();
                code_block.extend_from_slice(&lines[i + 1..end]);
                results.push(SourceSnippet {
                    file: file.to_string(),
                    path: path.to_string(),
                    line: block_start + 1,
                    code: code_block.join("\n"),
                    relevance: score,
                    kind: SnippetKind::CommentWithCode,
                });
            }
            block.clear();
        }

        if part_of_block {
            continue;
        }

        let score = relevance(&line.to_lowercase(), terms);
        if score > 0 {
            let start = i.saturating_sub(CONTEXT_LINES);
            let end = (i + CONTEXT_LINES + 1).min(lines.len());
            results.push(SourceSnippet {
                file: file.to_string(),
                path: path.to_string(),
                line: i + 1,
                code: lines[start..end].join("\n"),
                relevance: score,
                kind: SnippetKind::Code,
            });
        }
    }

    results
}
