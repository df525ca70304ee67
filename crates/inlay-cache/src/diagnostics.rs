//! Diagnostic snapshot cache
//!
//! Diagnostics arrive from an external analyzer asynchronously, and
//! computing a fix for one is expensive. This cache remembers the last
//! diagnostic set *by content* together with the fix computed for it, so
//! an analyzer re-run with identical output does not invalidate the fix,
//! and translates diagnostic positions across edits so the cache survives
//! typing that does not touch the diagnostic's line.
//!
//! Edits that overlap a diagnostic's range leave the snapshot stale on
//! purpose: the analyzer's next publish will differ in content and the
//! next [`DiagnosticSnapshotCache::refresh_and_check`] detects it.

use std::cmp::Ordering;

use inlay_domain::{Diagnostic, Fix, Range};

/// Last seen diagnostic set and the fix computed for it
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSnapshot {
    /// Diagnostics, in the order the source provided them (distance from
    /// cursor)
    pub diagnostics: Vec<Diagnostic>,
    /// Fix computed for this snapshot, if any
    pub cached_fix: Option<Fix>,
}

/// Per-document, per-fix-source snapshot cache
#[derive(Debug, Default)]
pub struct DiagnosticSnapshotCache {
    snapshot: DiagnosticSnapshot,
}

impl DiagnosticSnapshotCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the new diagnostic set against the stored snapshot by
    /// content and replace it when they differ
    ///
    /// Content equality sorts both lists by range start and compares
    /// (message, range, severity) pointwise; array order and object
    /// identity are irrelevant. On change the snapshot is replaced and
    /// the cached fix is invalidated. Returns whether anything changed.
    pub fn refresh_and_check(&mut self, new_diagnostics: &[Diagnostic]) -> bool {
        if Self::content_equal(&self.snapshot.diagnostics, new_diagnostics) {
            return false;
        }
        self.snapshot = DiagnosticSnapshot {
            diagnostics: new_diagnostics.to_vec(),
            cached_fix: None,
        };
        true
    }

    /// Translate stored diagnostic ranges across a text edit
    ///
    /// Ranges strictly after the edit shift by the edit's net newline
    /// delta; when the edit is single-line and precedes a diagnostic on
    /// the same line, the diagnostic's columns shift by the net character
    /// delta. Ranges strictly before or overlapping the edit are left
    /// unmodified.
    pub fn translate_on_edit(&mut self, edit_range: Range, inserted_text: &str) {
        let inserted_newlines = inserted_text.matches('\n').count() as i64;
        let removed_newlines = (edit_range.end.line - edit_range.start.line) as i64;
        let line_delta = inserted_newlines - removed_newlines;

        let single_line_edit = inserted_newlines == 0 && removed_newlines == 0;
        let char_delta = if single_line_edit {
            inserted_text.chars().count() as i64
                - (edit_range.end.character - edit_range.start.character) as i64
        } else {
            0
        };

        for diagnostic in &mut self.snapshot.diagnostics {
            if !diagnostic.range.is_strictly_after(&edit_range) {
                continue;
            }
            diagnostic.range.start.line = shift(diagnostic.range.start.line, line_delta);
            diagnostic.range.end.line = shift(diagnostic.range.end.line, line_delta);
            if single_line_edit && diagnostic.range.start.line == edit_range.end.line {
                diagnostic.range.start.character =
                    shift(diagnostic.range.start.character, char_delta);
                if diagnostic.range.end.line == edit_range.end.line {
                    diagnostic.range.end.character =
                        shift(diagnostic.range.end.character, char_delta);
                }
            }
        }
    }

    /// Record the fix computed for the current snapshot
    pub fn set_fix(&mut self, fix: Fix) {
        self.snapshot.cached_fix = Some(fix);
    }

    /// Fix cached for the current snapshot, if any
    pub fn cached_fix(&self) -> Option<&Fix> {
        self.snapshot.cached_fix.as_ref()
    }

    /// Diagnostics of the current snapshot
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.snapshot.diagnostics
    }

    /// Drop the snapshot and its cached fix
    pub fn clear(&mut self) {
        self.snapshot = DiagnosticSnapshot::default();
    }

    fn content_equal(a: &[Diagnostic], b: &[Diagnostic]) -> bool {
        if a.len() != b.len() {
            return false;
        }
        let mut a: Vec<&Diagnostic> = a.iter().collect();
        let mut b: Vec<&Diagnostic> = b.iter().collect();
        a.sort_by(|x, y| Self::content_order(x, y));
        b.sort_by(|x, y| Self::content_order(x, y));
        a.iter().zip(b.iter()).all(|(x, y)| {
            x.message == y.message && x.range == y.range && x.severity == y.severity
        })
    }

    fn content_order(a: &Diagnostic, b: &Diagnostic) -> Ordering {
        a.range
            .start
            .cmp(&b.range.start)
            .then_with(|| a.range.end.cmp(&b.range.end))
            .then_with(|| a.message.cmp(&b.message))
            .then_with(|| a.severity.cmp(&b.severity))
    }
}

fn shift(value: u32, delta: i64) -> u32 {
    (value as i64 + delta).max(0) as u32
}
