//! Network and authentication seams
//!
//! The completion and fix backends are opaque asynchronous RPCs: request
//! in, candidates or a fix out, error otherwise. Wire formats, endpoints,
//! and retry policy belong to the transport implementation, not this
//! engine.

use async_trait::async_trait;

use inlay_domain::{Diagnostic, Fix};

use crate::error::Result;

/// A related file sent along as completion context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFile {
    /// Path or identifier of the file
    pub path: String,
    /// File content (possibly truncated by the gatherer)
    pub content: String,
}

/// One fill-in-the-middle completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Text before the cursor
    pub prefix: String,
    /// Text after the cursor
    pub suffix: String,
    /// Language identifier of the document
    pub language: String,
    /// Imported and semantically related files
    pub open_files: Vec<ContextFile>,
    /// Bounded tail of the current file for style matching
    pub current_file_excerpt: Option<String>,
    /// Comment intent extracted from the cursor line, if any
    pub comment_intent: Option<String>,
    /// How many candidate completions to generate
    pub candidates: usize,
}

/// One diagnostic-fix request
#[derive(Debug, Clone)]
pub struct FixRequest {
    /// The diagnostic to fix (nearest to the cursor)
    pub diagnostic: Diagnostic,
    /// Example snippets related to the diagnostic
    pub examples: Vec<ContextFile>,
    /// Full content of the document
    pub file_content: String,
}

/// Fill-in-the-middle completion backend
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Fetch up to `request.candidates` completion candidates
    async fn fetch_completions(&self, request: CompletionRequest) -> Result<Vec<String>>;
}

/// Diagnostic-fix backend
#[async_trait]
pub trait FixTransport: Send + Sync {
    /// Fetch a fix for the diagnostic, or `None` when the backend has no
    /// suggestion
    async fn fetch_fix(&self, request: FixRequest) -> Result<Option<Fix>>;
}

/// Authentication seam
///
/// Token retrieval is owned by the host process; the engine only asks
/// whether a token exists before doing any cache or network work.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current auth token, or `None` when the user is not signed in
    async fn token(&self) -> Option<String>;
}
