//! # Inlay Cache
//!
//! Multi-tier in-memory caches for the Inlay inline-suggestion engine.
//!
//! ## Tiers
//!
//! In the order the request coordinator consults them:
//!
//! - [`ForwardTypingCache`]: one entry per document, answers "is the user
//!   typing forward through the currently displayed suggestion" in O(1)
//! - [`PrefixSuffixCache`]: per-document approximate-match cache keyed by
//!   (prefix, suffix) pairs, tolerant of typing, backspace, and whitespace
//!   boundary shifts
//! - [`SpeculativeFetchCache`]: globally shared LRU of one-shot fetch
//!   closures stashed when a suggestion is shown, resolved on demand
//! - [`RejectionLedger`]: bounded history of rejected (text, position)
//!   pairs used to suppress re-surfacing
//! - [`DiagnosticSnapshotCache`]: last diagnostic set by content plus the
//!   fix computed for it, with position translation across edits
//!
//! All state is process-lifetime and per-session; nothing is persisted.

pub mod diagnostics;
pub mod error;
pub mod forward_typing;
pub mod prefix_suffix;
pub mod rejection;
pub mod speculative;

pub use diagnostics::{DiagnosticSnapshot, DiagnosticSnapshotCache};
pub use error::{CacheError, Result};
pub use forward_typing::{ForwardTypingCache, ForwardTypingEntry};
pub use prefix_suffix::PrefixSuffixCache;
pub use rejection::{RejectedEdit, RejectionLedger};
pub use speculative::{FetchFn, FetchFuture, SpeculativeFetchCache};
