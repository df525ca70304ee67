//! # Inlay Domain
//!
//! Shared value types for the Inlay inline-suggestion engine: document
//! positions and ranges, diagnostics, document keys, and the immutable
//! per-request suggestion context.
//!
//! Everything here is a plain value type. Caches and coordinators live in
//! `inlay-cache` and `inlay-engine`; external collaborators (editor host,
//! network transport) are trait seams defined in `inlay-engine`.

pub mod types;

pub use types::{
    CompletionId, Diagnostic, DiagnosticSeverity, DocumentKey, Fix, Position, Range, RequestId,
    SuggestionContext, SuggestionId, TextEdit, TriggerKind,
};
