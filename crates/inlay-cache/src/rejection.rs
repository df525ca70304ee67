//! Rejection ledger: never re-surface what the user dismissed
//!
//! Tracks previously rejected (text, position) pairs per document so the
//! engine can suppress identical or trivially related suggestions. The
//! matching rule is intentionally permissive: rejecting "foobar" also
//! suppresses "foo" and "foobarbaz" at the same position, because
//! re-showing a prefix or extension of a dismissed suggestion reads as
//! re-showing the same suggestion.
//!
//! History is bounded by a single eviction queue shared across all
//! documents; exceeding the cap disposes the oldest rejection anywhere.

use std::collections::{HashMap, VecDeque};

use inlay_domain::{DocumentKey, Position};

/// A rejected suggestion: its text and the position it was offered at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEdit {
    /// The suggestion text that was rejected
    pub text: String,
    /// Position the suggestion was offered at
    pub position: Position,
}

impl RejectedEdit {
    /// Matching rule: same position AND (exact text match OR one text is
    /// a prefix of the other)
    pub fn matches(&self, text: &str, position: Position) -> bool {
        self.position == position
            && (self.text == text || self.text.starts_with(text) || text.starts_with(&self.text))
    }
}

/// Bounded per-document history of rejected suggestions
#[derive(Debug)]
pub struct RejectionLedger {
    by_document: HashMap<DocumentKey, Vec<RejectedEdit>>,
    eviction_queue: VecDeque<(DocumentKey, RejectedEdit)>,
    capacity: usize,
}

impl RejectionLedger {
    /// Default rejection history cap shared across all documents
    pub const DEFAULT_CAPACITY: usize = 20;

    /// Create a ledger with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a ledger with an explicit capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            by_document: HashMap::new(),
            eviction_queue: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record a rejection
    ///
    /// No-op when an equivalent entry already exists under the matching
    /// rule. Inserting beyond the cap disposes the oldest rejection across
    /// all documents.
    pub fn reject(&mut self, document: &DocumentKey, text: impl Into<String>, position: Position) {
        let text = text.into();
        if self.is_rejected(document, &text, position) {
            return;
        }

        let entry = RejectedEdit {
            text,
            position,
        };
        self.by_document
            .entry(document.clone())
            .or_default()
            .push(entry.clone());
        self.eviction_queue.push_back((document.clone(), entry));

        while self.eviction_queue.len() > self.capacity {
            if let Some((doc, oldest)) = self.eviction_queue.pop_front() {
                if let Some(entries) = self.by_document.get_mut(&doc) {
                    if let Some(idx) = entries.iter().position(|e| *e == oldest) {
                        entries.remove(idx);
                    }
                    if entries.is_empty() {
                        self.by_document.remove(&doc);
                    }
                }
            }
        }
    }

    /// Whether an equivalent suggestion was previously rejected
    pub fn is_rejected(&self, document: &DocumentKey, text: &str, position: Position) -> bool {
        self.by_document
            .get(document)
            .map(|entries| entries.iter().any(|e| e.matches(text, position)))
            .unwrap_or(false)
    }

    /// Number of tracked rejections across all documents
    pub fn len(&self) -> usize {
        self.eviction_queue.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.eviction_queue.is_empty()
    }

    /// Drop all documents' entries and empty the eviction queue
    pub fn clear(&mut self) {
        self.by_document.clear();
        self.eviction_queue.clear();
    }
}

impl Default for RejectionLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> DocumentKey {
        DocumentKey::new(name)
    }

    #[test]
    fn test_rejection_is_prefix_symmetric() {
        let mut ledger = RejectionLedger::new();
        let d = doc("a.rs");
        let p = Position::new(3, 7);
        ledger.reject(&d, "foobar", p);

        assert!(ledger.is_rejected(&d, "foobar", p));
        assert!(ledger.is_rejected(&d, "foo", p));
        assert!(ledger.is_rejected(&d, "foobarbaz", p));
    }

    #[test]
    fn test_other_position_not_rejected() {
        let mut ledger = RejectionLedger::new();
        let d = doc("a.rs");
        ledger.reject(&d, "foobar", Position::new(3, 7));
        assert!(!ledger.is_rejected(&d, "foobar", Position::new(3, 8)));
    }

    #[test]
    fn test_other_document_not_rejected() {
        let mut ledger = RejectionLedger::new();
        let p = Position::new(0, 0);
        ledger.reject(&doc("a.rs"), "foobar", p);
        assert!(!ledger.is_rejected(&doc("b.rs"), "foobar", p));
    }

    #[test]
    fn test_reject_is_idempotent() {
        let mut ledger = RejectionLedger::new();
        let d = doc("a.rs");
        let p = Position::new(1, 1);
        ledger.reject(&d, "foobar", p);
        // Equivalent under the matching rule; must not grow the queue.
        ledger.reject(&d, "foobar", p);
        ledger.reject(&d, "foo", p);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut ledger = RejectionLedger::with_capacity(20);
        let d = doc("a.rs");
        for i in 0..21u32 {
            ledger.reject(&d, format!("suggestion-{i}"), Position::new(i, 0));
        }

        assert_eq!(ledger.len(), 20);
        assert!(!ledger.is_rejected(&d, "suggestion-0", Position::new(0, 0)));
        assert!(ledger.is_rejected(&d, "suggestion-20", Position::new(20, 0)));
    }

    #[test]
    fn test_eviction_spans_documents() {
        let mut ledger = RejectionLedger::with_capacity(2);
        let p = Position::new(0, 0);
        ledger.reject(&doc("a.rs"), "one", p);
        ledger.reject(&doc("b.rs"), "two", p);
        ledger.reject(&doc("c.rs"), "three", p);

        // Oldest entry came from a.rs; it is gone even though the caps
        // were exceeded by other documents.
        assert!(!ledger.is_rejected(&doc("a.rs"), "one", p));
        assert!(ledger.is_rejected(&doc("b.rs"), "two", p));
        assert!(ledger.is_rejected(&doc("c.rs"), "three", p));
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut ledger = RejectionLedger::new();
        ledger.reject(&doc("a.rs"), "x", Position::new(0, 0));
        ledger.clear();
        assert!(ledger.is_empty());
        assert!(!ledger.is_rejected(&doc("a.rs"), "x", Position::new(0, 0)));
    }
}
