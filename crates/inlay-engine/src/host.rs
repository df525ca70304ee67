//! Editor host seam
//!
//! The engine consumes the host editor through this narrow interface
//! only: document text, cursor, diagnostics, language. Buffer management,
//! suggestion widgets, and edit application stay on the host's side.

use inlay_domain::{Diagnostic, DocumentKey, Position};

/// Narrow interface onto the host editor
pub trait EditorHost: Send + Sync {
    /// Full text of a tracked document, or `None` when it is no longer
    /// open
    fn document_text(&self, document: &DocumentKey) -> Option<String>;

    /// The active document and cursor position, if any editor is focused
    ///
    /// Speculative fetches read this at execution time, which is how a
    /// stashed fetch sees the state the user has typed since it was
    /// stashed.
    fn cursor(&self) -> Option<(DocumentKey, Position)>;

    /// Diagnostics currently published for the document
    fn diagnostics(&self, document: &DocumentKey) -> Vec<Diagnostic>;

    /// Language identifier for the document ("rust", "plaintext", ...)
    fn language_id(&self, document: &DocumentKey) -> String;
}

/// Byte offset of a (line, character) position within `text`
///
/// Characters are counted in `char`s on the target line; positions past
/// the end of a line or the document clamp to the nearest valid offset.
pub fn position_offset(text: &str, position: Position) -> usize {
    let mut offset = 0;
    for (line_idx, line) in text.split('\n').enumerate() {
        if line_idx == position.line as usize {
            let column = position.character as usize;
            let in_line: usize = line
                .char_indices()
                .nth(column)
                .map(|(i, _)| i)
                .unwrap_or(line.len());
            return offset + in_line;
        }
        offset += line.len() + 1;
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_on_first_line() {
        assert_eq!(position_offset("hello\nworld", Position::new(0, 3)), 3);
    }

    #[test]
    fn test_offset_on_second_line() {
        assert_eq!(position_offset("hello\nworld", Position::new(1, 2)), 8);
    }

    #[test]
    fn test_offset_clamps_past_line_end() {
        assert_eq!(position_offset("hi\nyo", Position::new(0, 99)), 2);
    }

    #[test]
    fn test_offset_clamps_past_document_end() {
        assert_eq!(position_offset("hi", Position::new(9, 0)), 2);
    }
}
