//! Core value types shared across the Inlay engine
//!
//! Positions and ranges follow the editor convention: 0-based line and
//! character offsets, end-exclusive ranges.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Position in a document (line and character)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Line number (0-based)
    pub line: u32,
    /// Character offset (0-based)
    pub character: u32,
}

impl Position {
    /// Create a new position
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Range in a document (start and end positions, end-exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Range {
    /// Start position
    pub start: Position,
    /// End position
    pub end: Position,
}

impl Range {
    /// Create a new range
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A zero-width range at the given position
    pub fn at(position: Position) -> Self {
        Self::new(position, position)
    }

    /// Whether this range starts at or after the end of `other`
    pub fn is_strictly_after(&self, other: &Range) -> bool {
        self.start >= other.end
    }

    /// Whether this range ends at or before the start of `other`
    pub fn is_strictly_before(&self, other: &Range) -> bool {
        self.end <= other.start
    }
}

/// A single text replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    /// Range to replace
    pub range: Range,
    /// Replacement text
    pub new_text: String,
}

impl TextEdit {
    /// Create a new text edit
    pub fn new(range: Range, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticSeverity {
    /// Error severity
    Error,
    /// Warning severity
    Warning,
    /// Informational severity
    Information,
    /// Hint severity
    Hint,
}

/// Diagnostic reported by an external analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Range of the diagnostic
    pub range: Range,
    /// Severity level
    pub severity: DiagnosticSeverity,
    /// Diagnostic message
    pub message: String,
    /// Diagnostic code, if the analyzer provides one
    pub code: Option<String>,
    /// Source of the diagnostic (analyzer name)
    pub source: String,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(range: Range, severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            range,
            severity,
            message: message.into(),
            code: None,
            source: String::new(),
        }
    }
}

/// A diagnostic-derived fix: a single text replacement with a label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    /// The edit that applies the fix
    pub edit: TextEdit,
    /// Human-readable label describing the fix
    pub label: String,
}

/// Opaque, stable identifier for an open document
///
/// Derived from the document's canonical location by the host. All
/// per-document cache partitions are keyed by this. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey(Arc<str>);

impl DocumentKey {
    /// Create a key from a canonical document location
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// What prompted the suggestion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerKind {
    /// Regular automatic trigger while typing
    #[default]
    Automatic,
    /// User is cycling through alternatives (explicit next/previous)
    Cycling,
}

impl TriggerKind {
    /// Whether this trigger is a cycling request
    pub fn is_cycling(&self) -> bool {
        matches!(self, TriggerKind::Cycling)
    }
}

/// Immutable snapshot of the document around the cursor, taken once per
/// request and never mutated after capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionContext {
    /// Text before the cursor
    pub prefix: String,
    /// Text after the cursor
    pub suffix: String,
    /// Cursor position
    pub cursor: Position,
    /// Whether the request is cycling through alternatives
    pub trigger: TriggerKind,
}

impl SuggestionContext {
    /// Build a context by splitting full document text at a cursor offset
    ///
    /// `text` is the full document content, `cursor` the position whose
    /// byte offset within `text` is `offset`. Offsets past the end or
    /// inside a multi-byte character snap back to the nearest boundary.
    pub fn from_split(text: &str, offset: usize, cursor: Position, trigger: TriggerKind) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        Self {
            prefix: text[..offset].to_string(),
            suffix: text[offset..].to_string(),
            cursor,
            trigger,
        }
    }
}

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident, $display_prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($display_prefix, "-{}"), self.0)
            }
        }
    };
}

id_newtype!(
    /// Monotonically increasing id for one suggestion request
    RequestId,
    "req"
);
id_newtype!(
    /// Monotonically increasing id for one issued completion, used as the
    /// speculative-fetch cache key
    CompletionId,
    "completion"
);
id_newtype!(
    /// Id handed to the host for a returned suggestion; lifecycle events
    /// are reported against this id exactly once
    SuggestionId,
    "suggestion"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(1, 0) > Position::new(0, 99));
        assert!(Position::new(2, 3) > Position::new(2, 2));
    }

    #[test]
    fn test_range_strictly_after() {
        let edit = Range::new(Position::new(2, 0), Position::new(2, 5));
        let below = Range::new(Position::new(10, 0), Position::new(10, 4));
        assert!(below.is_strictly_after(&edit));
        assert!(!edit.is_strictly_after(&below));
    }

    #[test]
    fn test_document_key_equality() {
        let a = DocumentKey::new("file:///src/main.rs");
        let b = DocumentKey::new("file:///src/main.rs");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "file:///src/main.rs");
    }

    #[test]
    fn test_context_from_split() {
        let ctx = SuggestionContext::from_split(
            "hello world",
            5,
            Position::new(0, 5),
            TriggerKind::Automatic,
        );
        assert_eq!(ctx.prefix, "hello");
        assert_eq!(ctx.suffix, " world");
        assert!(!ctx.trigger.is_cycling());
    }

    #[test]
    fn test_context_from_split_snaps_to_char_boundary() {
        // "é" is two bytes; offset 1 lands inside it.
        let ctx =
            SuggestionContext::from_split("été", 1, Position::new(0, 1), TriggerKind::Automatic);
        assert_eq!(ctx.prefix, "");
        assert_eq!(ctx.suffix, "été");

        let ctx =
            SuggestionContext::from_split("été", 99, Position::new(0, 3), TriggerKind::Automatic);
        assert_eq!(ctx.prefix, "été");
        assert_eq!(ctx.suffix, "");
    }
}
