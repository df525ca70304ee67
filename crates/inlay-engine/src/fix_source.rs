//! Diagnostic fix suggestion source
//!
//! Watches the host's diagnostics and offers a fix for the one nearest
//! the cursor. The per-document snapshot cache keeps the last diagnostic
//! set by content together with its computed fix, so an analyzer re-run
//! with identical output serves the cached fix without another fetch,
//! and edits elsewhere in the document only translate the stored ranges.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use inlay_cache::DiagnosticSnapshotCache;
use inlay_domain::{Diagnostic, DocumentKey, Range, SuggestionContext};

use crate::config::EngineConfig;
use crate::context::ContextIndex;
use crate::host::EditorHost;
use crate::race::{RaceResult, SuggestionSource};
use crate::transport::{ContextFile, FixRequest, FixTransport};

/// Suggestion source that turns the nearest diagnostic into a fix edit
pub struct DiagnosticFixSource {
    host: Arc<dyn EditorHost>,
    transport: Arc<dyn FixTransport>,
    index: Arc<dyn ContextIndex>,
    config: EngineConfig,
    snapshots: Mutex<HashMap<DocumentKey, DiagnosticSnapshotCache>>,
}

impl DiagnosticFixSource {
    /// Create a source over the given host, fix transport, and index
    pub fn new(
        host: Arc<dyn EditorHost>,
        transport: Arc<dyn FixTransport>,
        index: Arc<dyn ContextIndex>,
        config: EngineConfig,
    ) -> Self {
        Self {
            host,
            transport,
            index,
            config,
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    /// Diagnostics sorted by line distance from the cursor, nearest first
    fn sort_by_distance(diagnostics: &mut [Diagnostic], cursor_line: u32) {
        diagnostics.sort_by_key(|d| {
            let line = d.range.start.line;
            line.abs_diff(cursor_line)
        });
    }

    async fn fix_examples(&self, diagnostic: &Diagnostic, language: &str) -> Vec<ContextFile> {
        if !self.index.is_available() {
            return Vec::new();
        }
        self.index
            .search(
                &diagnostic.message,
                language,
                self.config.semantic_context_results,
            )
            .await
    }
}

#[async_trait]
impl SuggestionSource for DiagnosticFixSource {
    fn id(&self) -> &'static str {
        "diagnostic-fix"
    }

    fn rank(&self) -> u8 {
        1
    }

    async fn try_get(
        &self,
        document: &DocumentKey,
        context: &SuggestionContext,
        cancel: CancellationToken,
    ) -> Option<RaceResult> {
        let mut diagnostics = self.host.diagnostics(document);
        if diagnostics.is_empty() {
            let mut snapshots = self.snapshots.lock().unwrap();
            if let Some(snapshot) = snapshots.get_mut(document) {
                snapshot.clear();
            }
            return None;
        }
        Self::sort_by_distance(&mut diagnostics, context.cursor.line);

        // Content comparison against the snapshot; an unchanged set can
        // serve the previously computed fix without a fetch.
        let changed = {
            let mut snapshots = self.snapshots.lock().unwrap();
            let snapshot = snapshots.entry(document.clone()).or_default();
            let changed = snapshot.refresh_and_check(&diagnostics);
            if !changed {
                if let Some(fix) = snapshot.cached_fix() {
                    debug!(%document, "serving cached diagnostic fix");
                    return Some(RaceResult::Fix {
                        edit: fix.edit.clone(),
                        label: fix.label.clone(),
                    });
                }
            }
            changed
        };
        debug!(%document, count = diagnostics.len(), changed, "diagnostic fix request");

        let nearest = diagnostics[0].clone();
        let language = self.host.language_id(document);
        let examples = self.fix_examples(&nearest, &language).await;
        let file_content = self.host.document_text(document).unwrap_or_default();
        let request = FixRequest {
            diagnostic: nearest,
            examples,
            file_content,
        };
        let fix = match self.transport.fetch_fix(request).await {
            Ok(Some(fix)) => fix,
            Ok(None) => {
                debug!(%document, "fix backend had no suggestion");
                return None;
            }
            Err(error) => {
                warn!(%document, %error, "fix fetch failed");
                return None;
            }
        };

        // Cache before the cancellation check so a lost race still leaves
        // the fix behind for the next request.
        {
            let mut snapshots = self.snapshots.lock().unwrap();
            if let Some(snapshot) = snapshots.get_mut(document) {
                snapshot.set_fix(fix.clone());
            }
        }
        if cancel.is_cancelled() {
            debug!(%document, "cancelled after fix fetch, cache warmed");
            return None;
        }
        Some(RaceResult::Fix {
            edit: fix.edit,
            label: fix.label,
        })
    }

    fn handle_text_edit(&self, document: &DocumentKey, range: Range, inserted: &str) {
        let mut snapshots = self.snapshots.lock().unwrap();
        if let Some(snapshot) = snapshots.get_mut(document) {
            snapshot.translate_on_edit(range, inserted);
        }
    }

    fn handle_document_closed(&self, document: &DocumentKey) {
        let mut snapshots = self.snapshots.lock().unwrap();
        snapshots.remove(document);
    }
}
