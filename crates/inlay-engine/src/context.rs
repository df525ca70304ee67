//! Context gathering and strength scoring
//!
//! A completion request carries more than the prefix and suffix: imported
//! files, semantically similar code, the intent of a comment the user
//! just wrote, and a bounded excerpt of the current file for style
//! matching. The gathered context also yields a strength score that
//! decides how short a prefix is still worth a network request.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use inlay_domain::{DocumentKey, SuggestionContext};

use crate::config::EngineConfig;
use crate::host::EditorHost;
use crate::transport::ContextFile;

/// Matches import-like statements across the supported language families
/// and captures the imported path or module token.
pub(crate) static IMPORT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^\s*(?:use\s+([\w:]+)|import\s+.*?from\s+["']([^"']+)["']|import\s+([\w./]+)|from\s+([\w.]+)\s+import|#include\s+["<]([^">]+)[">]|.*?require\(\s*["']([^"']+)["']\s*\))"#,
    )
    .expect("import pattern is valid")
});

/// Semantic code index seam
///
/// Backed by whatever indexing service the host provides; the engine only
/// needs availability and a bounded similarity search.
#[async_trait]
pub trait ContextIndex: Send + Sync {
    /// Whether the index is ready to serve queries
    fn is_available(&self) -> bool;

    /// Snippets semantically similar to `query` in the given language
    async fn search(&self, query: &str, language: &str, limit: usize) -> Vec<ContextFile>;
}

/// Index stub for hosts without semantic search
pub struct NullContextIndex;

#[async_trait]
impl ContextIndex for NullContextIndex {
    fn is_available(&self) -> bool {
        false
    }

    async fn search(&self, _query: &str, _language: &str, _limit: usize) -> Vec<ContextFile> {
        Vec::new()
    }
}

/// Everything gathered for one request beyond the prefix/suffix pair
#[derive(Debug, Default)]
pub struct GatheredContext {
    /// Resolved imported files
    pub imports: Vec<ContextFile>,
    /// Semantic search neighbors
    pub semantic: Vec<ContextFile>,
    /// Intent extracted from a trailing comment line, if any
    pub comment_intent: Option<String>,
    /// Bounded tail of the current file for style matching
    pub current_file_excerpt: Option<String>,
}

impl GatheredContext {
    /// Imports and semantic neighbors combined, imports first
    pub fn open_files(&self) -> Vec<ContextFile> {
        self.imports
            .iter()
            .chain(self.semantic.iter())
            .cloned()
            .collect()
    }
}

/// Gathers request context from the host and the semantic index
#[derive(Clone)]
pub struct ContextGatherer {
    host: Arc<dyn EditorHost>,
    index: Arc<dyn ContextIndex>,
    config: EngineConfig,
}

impl ContextGatherer {
    /// Create a gatherer over the given host and index
    pub fn new(
        host: Arc<dyn EditorHost>,
        index: Arc<dyn ContextIndex>,
        config: EngineConfig,
    ) -> Self {
        Self {
            host,
            index,
            config,
        }
    }

    /// Gather all context for one request
    pub async fn gather(
        &self,
        document: &DocumentKey,
        context: &SuggestionContext,
        language: &str,
    ) -> GatheredContext {
        let comment_intent = comment_intent(&context.prefix);
        let imports = self.resolve_imports(&context.prefix);
        let semantic = self.search_neighbors(context, comment_intent.as_deref(), language).await;
        let current_file_excerpt = current_file_excerpt(
            &context.prefix,
            self.config.current_file_excerpt_chars,
        );

        debug!(
            %document,
            imports = imports.len(),
            semantic = semantic.len(),
            has_intent = comment_intent.is_some(),
            "context gathered"
        );

        GatheredContext {
            imports,
            semantic,
            comment_intent,
            current_file_excerpt,
        }
    }

    /// Score how much context this request carries
    pub fn strength(
        &self,
        gathered: &GatheredContext,
        language: &str,
        document_switched: bool,
        document_lines: usize,
    ) -> u32 {
        let w = &self.config.weights;
        let mut score = 0;
        if !gathered.imports.is_empty() {
            score += w.imports;
        }
        if !gathered.semantic.is_empty() {
            score += w.semantic_matches;
        }
        if document_switched {
            score += w.document_switch;
        }
        if language != "plaintext" && !language.is_empty() {
            score += w.known_language;
        }
        if document_lines > self.config.file_structure_min_lines {
            score += w.file_structure;
        }
        score
    }

    /// Minimum trimmed prefix length the request must reach
    pub fn min_prefix(&self, strength: u32) -> usize {
        if strength >= self.config.weights.strong_threshold {
            0
        } else {
            self.config.min_prefix_chars
        }
    }

    fn resolve_imports(&self, prefix: &str) -> Vec<ContextFile> {
        let mut files = Vec::new();
        for capture in IMPORT_LINE.captures_iter(prefix) {
            let Some(token) = capture
                .iter()
                .skip(1)
                .flatten()
                .next()
                .map(|m| m.as_str())
            else {
                continue;
            };
            let key = DocumentKey::new(token);
            if let Some(mut content) = self.host.document_text(&key) {
                let cap = self.config.import_context_chars;
                if content.len() > cap {
                    // Snap to a char boundary at or below the cap.
                    let end = (0..=cap)
                        .rev()
                        .find(|i| content.is_char_boundary(*i))
                        .unwrap_or(0);
                    content.truncate(end);
                }
                files.push(ContextFile {
                    path: token.to_string(),
                    content,
                });
            }
            if files.len() >= self.config.import_context_files {
                break;
            }
        }
        files
    }

    async fn search_neighbors(
        &self,
        context: &SuggestionContext,
        comment_intent: Option<&str>,
        language: &str,
    ) -> Vec<ContextFile> {
        if !self.index.is_available() {
            return Vec::new();
        }
        let query = comment_intent
            .map(str::to_string)
            .unwrap_or_else(|| current_line(&context.prefix).trim().to_string());
        if query.len() <= 3 {
            return Vec::new();
        }
        self.index
            .search(&query, language, self.config.semantic_context_results)
            .await
    }
}

/// Intent of a trailing comment line, if the cursor sits at the end of one
///
/// A user finishing `// parse the header and return its length` is
/// describing what they want generated; that text seeds the semantic
/// search query and bypasses the minimum-prefix gate.
pub fn comment_intent(prefix: &str) -> Option<String> {
    let line = current_line(prefix).trim();
    let stripped = ["///", "//!", "//", "#", "--", "/*", "*"]
        .iter()
        .find_map(|marker| line.strip_prefix(marker))?;
    let intent = stripped.trim_end_matches("*/").trim();
    if intent.len() > 3 {
        Some(intent.to_string())
    } else {
        None
    }
}

fn current_line(prefix: &str) -> &str {
    match prefix.rfind('\n') {
        Some(idx) => &prefix[idx + 1..],
        None => prefix,
    }
}

fn current_file_excerpt(prefix: &str, max_chars: usize) -> Option<String> {
    if prefix.is_empty() {
        return None;
    }
    let start = prefix.len().saturating_sub(max_chars);
    // Snap to a char boundary below the cap.
    let start = (start..prefix.len())
        .find(|i| prefix.is_char_boundary(*i))
        .unwrap_or(prefix.len());
    Some(prefix[start..].to_string())
}
