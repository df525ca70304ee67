//! Engine configuration
//!
//! All thresholds here are tunable policy, not contract: the context
//! strength weights in particular are heuristics carried over from field
//! behavior, exposed as configuration so deployments can adjust them.

use std::time::Duration;

/// Weights for scoring how much context a request carries
///
/// A request with strong context (imports resolved, semantic neighbors
/// found, a just-switched document) is worth issuing even on a very short
/// prefix; a bare request in an unknown language is not.
#[derive(Debug, Clone)]
pub struct ContextWeights {
    /// Imported files were resolved for context
    pub imports: u32,
    /// Semantic search returned neighbors
    pub semantic_matches: u32,
    /// The active document changed since the last request
    pub document_switch: u32,
    /// The language is known (not plaintext)
    pub known_language: u32,
    /// The document has meaningful structure (more than a few lines)
    pub file_structure: u32,
    /// Score at or above this drops the minimum-prefix gate to zero
    pub strong_threshold: u32,
}

impl Default for ContextWeights {
    fn default() -> Self {
        Self {
            imports: 3,
            semantic_matches: 2,
            document_switch: 2,
            known_language: 1,
            file_structure: 1,
            strong_threshold: 2,
        }
    }
}

/// Configuration for the suggestion engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum time between outbound requests for the same document;
    /// requests under the window are skipped, not delayed. An active
    /// document change always bypasses the window.
    pub debounce: Duration,
    /// One-time grace extension granted to still-pending race sources
    /// after the first outcome arrives
    pub race_grace: Duration,
    /// Capacity of the shared speculative fetch cache
    pub speculative_capacity: usize,
    /// Capacity of the rejection ledger across all documents
    pub rejection_capacity: usize,
    /// Minimum trimmed prefix length when context is weak
    pub min_prefix_chars: usize,
    /// Candidate completions to request on an automatic trigger
    pub automatic_candidates: usize,
    /// Candidate completions to request when cycling through alternatives
    pub cycling_candidates: usize,
    /// Cap on the current-file excerpt sent for style matching
    pub current_file_excerpt_chars: usize,
    /// How many imported files to resolve for context
    pub import_context_files: usize,
    /// Per-file content cap for imported-file context
    pub import_context_chars: usize,
    /// How many semantic search neighbors to request
    pub semantic_context_results: usize,
    /// How many trailing prefix lines a candidate may not echo back
    pub prefix_echo_window_lines: usize,
    /// Trimmed line length above which repetition counts as degenerate
    pub repeated_line_min_chars: usize,
    /// Fix targets farther than this many lines from the cursor get the
    /// distant rendering hint
    pub distant_edit_line_threshold: u32,
    /// Lines above which a document counts as having structure
    pub file_structure_min_lines: usize,
    /// Context strength weights
    pub weights: ContextWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(150),
            race_grace: Duration::from_secs(1),
            speculative_capacity: 1000,
            rejection_capacity: 20,
            min_prefix_chars: 2,
            automatic_candidates: 1,
            cycling_candidates: 5,
            current_file_excerpt_chars: 10_000,
            import_context_files: 3,
            import_context_chars: 500,
            semantic_context_results: 3,
            prefix_echo_window_lines: 10,
            repeated_line_min_chars: 10,
            distant_edit_line_threshold: 3,
            file_structure_min_lines: 10,
            weights: ContextWeights::default(),
        }
    }
}
