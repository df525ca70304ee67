//! Forward-typing fast path
//!
//! Holds the single currently displayed suggestion for a document and
//! answers "is the user typing forward through it" without any lookup
//! cost. This is the first tier consulted on every request and the only
//! zero-allocation path: a hit returns the remaining completion text with
//! no cache scan and no network call.

use inlay_domain::RequestId;

/// The currently displayed suggestion for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTypingEntry {
    /// Prefix at the moment the suggestion was shown
    pub prefix: String,
    /// Suffix at the moment the suggestion was shown
    pub suffix: String,
    /// The full completion text that was shown
    pub completion_text: String,
    /// Request that produced the suggestion
    pub origin_request_id: RequestId,
}

/// Per-document cache of the single displayed suggestion
///
/// Invariant: at most one entry exists at a time. A new shown suggestion
/// always replaces the previous entry; rejection, acceptance, and
/// unrelated document churn clear it.
#[derive(Debug, Default)]
pub struct ForwardTypingCache {
    entry: Option<ForwardTypingEntry>,
}

impl ForwardTypingCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the suggestion that is now displayed, replacing any previous one
    pub fn record_shown(
        &mut self,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        completion_text: impl Into<String>,
        origin_request_id: RequestId,
    ) {
        self.entry = Some(ForwardTypingEntry {
            prefix: prefix.into(),
            suffix: suffix.into(),
            completion_text: completion_text.into(),
            origin_request_id,
        });
    }

    /// Return the remaining completion if the user typed forward through
    /// the stored suggestion
    ///
    /// Hit conditions: the new suffix is byte-identical to the stored
    /// suffix (the cursor has not moved relative to trailing text), the
    /// new prefix strictly extends the stored prefix (typed forward, not
    /// backspace/paste/cut), and the stored completion starts with the
    /// typed text and is strictly longer than it.
    pub fn try_consume(&self, prefix: &str, suffix: &str) -> Option<String> {
        let entry = self.entry.as_ref()?;
        if suffix != entry.suffix {
            return None;
        }
        if prefix.len() <= entry.prefix.len() || !prefix.starts_with(&entry.prefix) {
            return None;
        }
        let typed = &prefix[entry.prefix.len()..];
        if entry.completion_text.len() <= typed.len() || !entry.completion_text.starts_with(typed) {
            return None;
        }
        Some(entry.completion_text[typed.len()..].to_string())
    }

    /// Current entry, if any
    pub fn entry(&self) -> Option<&ForwardTypingEntry> {
        self.entry.as_ref()
    }

    /// Drop the entry
    pub fn clear(&mut self) {
        self.entry = None;
    }
}
