//! # Inlay Engine
//!
//! Request coordination for inline suggestions: a set of racing
//! suggestion sources behind one provider.
//!
//! ## Architecture
//!
//! - [`InlineSuggestionProvider`] is the single entry point. It gates on
//!   authentication, builds the per-request context, runs the race, and
//!   routes the editor's lifecycle events back to the winning source.
//! - [`RaceCoordinator`] runs every [`SuggestionSource`] concurrently
//!   under fixed priorities with one grace extension; losers keep
//!   running in the background to warm their caches.
//! - [`FimSource`] owns the completion cache ladder (forward typing,
//!   prefix-suffix, speculative fetch) and the debounced, mutually
//!   exclusive network path.
//! - [`DiagnosticFixSource`] serves a fix for the diagnostic nearest the
//!   cursor, cached by diagnostic-set content.
//!
//! The editor host, semantic index, and network backends are trait seams
//! ([`EditorHost`], [`ContextIndex`], [`CompletionTransport`],
//! [`FixTransport`], [`TokenProvider`]); the engine has no I/O of its
//! own.

pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod fim_source;
pub mod fix_source;
pub mod host;
pub mod provider;
pub mod race;
pub mod transport;

pub use config::{ContextWeights, EngineConfig};
pub use context::{ContextGatherer, ContextIndex, GatheredContext, NullContextIndex};
pub use error::{EngineError, Result};
pub use filter::filter_candidates;
pub use fim_source::FimSource;
pub use fix_source::DiagnosticFixSource;
pub use host::{position_offset, EditorHost};
pub use provider::{InlineSuggestionProvider, Suggestion, SuggestionKind};
pub use race::{RaceCoordinator, RaceResult, SuggestionSource};
pub use transport::{
    CompletionRequest, CompletionTransport, ContextFile, FixRequest, FixTransport, TokenProvider,
};
