//! Unified inline suggestion entry point
//!
//! One provider fronts all suggestion sources: it gates on
//! authentication, builds the request context from the host, runs the
//! race, suppresses previously rejected completions, and fans the
//! editor's lifecycle events (shown, accepted, rejected, ignored) back
//! to the source that produced the displayed suggestion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use inlay_cache::RejectionLedger;
use inlay_domain::{
    DocumentKey, Position, Range, SuggestionContext, SuggestionId, TextEdit, TriggerKind,
};

use crate::config::EngineConfig;
use crate::host::{position_offset, EditorHost};
use crate::race::{RaceCoordinator, RaceResult, SuggestionSource};
use crate::transport::TokenProvider;

/// What the editor renders for one winning suggestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionKind {
    /// Ghost-text completion at the cursor
    Completion {
        /// Primary candidate text
        text: String,
        /// Remaining candidates, for cycling
        alternatives: Vec<String>,
        /// Range the completion replaces
        range: Range,
    },
    /// Labelled fix edit derived from a diagnostic
    Fix {
        /// The edit that applies the fix
        edit: TextEdit,
        /// Human-readable label
        label: String,
        /// Whether the edit lands far from the cursor and should be
        /// presented as a jump rather than inline ghost text
        distant: bool,
    },
}

/// One suggestion handed to the editor, identified for lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Identifier the editor passes back to the lifecycle methods
    pub id: SuggestionId,
    /// Document the suggestion belongs to
    pub document: DocumentKey,
    /// What to render
    pub kind: SuggestionKind,
}

struct ActiveSuggestion {
    document: DocumentKey,
    source_index: usize,
    /// Primary text, for the rejection ledger
    text: String,
    /// Position the suggestion was offered at
    offered_at: Position,
    result: RaceResult,
}

struct ProviderState {
    suggestion_seq: u64,
    ledger: RejectionLedger,
    active: HashMap<SuggestionId, ActiveSuggestion>,
}

/// Inline suggestion provider over a set of racing sources
pub struct InlineSuggestionProvider {
    host: Arc<dyn EditorHost>,
    tokens: Arc<dyn TokenProvider>,
    race: RaceCoordinator,
    config: EngineConfig,
    state: Mutex<ProviderState>,
}

impl InlineSuggestionProvider {
    /// Create a provider racing the given sources
    pub fn new(
        host: Arc<dyn EditorHost>,
        tokens: Arc<dyn TokenProvider>,
        sources: Vec<Arc<dyn SuggestionSource>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            host,
            tokens,
            race: RaceCoordinator::new(sources, config.race_grace),
            state: Mutex::new(ProviderState {
                suggestion_seq: 0,
                ledger: RejectionLedger::with_capacity(config.rejection_capacity),
                active: HashMap::new(),
            }),
            config,
        }
    }

    /// Produce a suggestion for the cursor position, or `None`
    ///
    /// `None` covers every quiet outcome: signed out, no document text,
    /// all sources missed, the race was cancelled, or everything usable
    /// was previously rejected. The caller simply shows nothing.
    pub async fn suggest(
        &self,
        document: &DocumentKey,
        cursor: Position,
        trigger: TriggerKind,
        cancel: &CancellationToken,
    ) -> Option<Suggestion> {
        if self.tokens.token().await.is_none() {
            debug!(%document, "no auth token, skipping suggestion");
            return None;
        }
        let text = self.host.document_text(document)?;
        let offset = position_offset(&text, cursor);
        let context = SuggestionContext::from_split(&text, offset, cursor, trigger);

        let (source_index, result) = self.race.run(document, &context, cancel).await?;
        self.admit(document, cursor, source_index, result)
    }

    /// Apply rejection suppression and register the suggestion for
    /// lifecycle events
    fn admit(
        &self,
        document: &DocumentKey,
        cursor: Position,
        source_index: usize,
        result: RaceResult,
    ) -> Option<Suggestion> {
        let mut state = self.state.lock().unwrap();
        let kind = match &result {
            RaceResult::Fim { choices, range, .. } => {
                let surviving: Vec<String> = choices
                    .iter()
                    .filter(|choice| !state.ledger.is_rejected(document, choice, cursor))
                    .cloned()
                    .collect();
                let mut iter = surviving.into_iter();
                let Some(text) = iter.next() else {
                    debug!(%document, "all candidates previously rejected");
                    return None;
                };
                SuggestionKind::Completion {
                    text,
                    alternatives: iter.collect(),
                    range: *range,
                }
            }
            RaceResult::Fix { edit, label } => {
                if state
                    .ledger
                    .is_rejected(document, &edit.new_text, edit.range.start)
                {
                    debug!(%document, "fix previously rejected");
                    return None;
                }
                let distance = edit.range.start.line.abs_diff(cursor.line);
                SuggestionKind::Fix {
                    edit: edit.clone(),
                    label: label.clone(),
                    distant: distance > self.config.distant_edit_line_threshold,
                }
            }
        };

        state.suggestion_seq += 1;
        let id = SuggestionId(state.suggestion_seq);
        let (text, offered_at) = match &kind {
            SuggestionKind::Completion { text, .. } => (text.clone(), cursor),
            SuggestionKind::Fix { edit, .. } => (edit.new_text.clone(), edit.range.start),
        };
        state.active.insert(
            id,
            ActiveSuggestion {
                document: document.clone(),
                source_index,
                text,
                offered_at,
                result,
            },
        );
        debug!(%document, %id, "suggestion admitted");
        Some(Suggestion {
            id,
            document: document.clone(),
            kind,
        })
    }

    /// The editor displayed the suggestion
    pub fn on_shown(&self, id: SuggestionId) {
        let state = self.state.lock().unwrap();
        let Some(active) = state.active.get(&id) else {
            warn!(%id, "shown event for unknown suggestion");
            return;
        };
        let source = Arc::clone(&self.race.sources()[active.source_index]);
        let document = active.document.clone();
        let result = active.result.clone();
        drop(state);
        source.handle_shown(&document, &result);
    }

    /// The user accepted the suggestion
    pub fn on_accepted(&self, id: SuggestionId) {
        let Some(active) = self.take_active(id, "accepted") else {
            return;
        };
        self.race.sources()[active.source_index].handle_accepted(&active.document, &active.result);
    }

    /// The user explicitly dismissed the suggestion; it will not be
    /// offered again at this position
    pub fn on_rejected(&self, id: SuggestionId) {
        let Some(active) = self.take_active(id, "rejected") else {
            return;
        };
        {
            let mut state = self.state.lock().unwrap();
            state
                .ledger
                .reject(&active.document, active.text.clone(), active.offered_at);
        }
        self.race.sources()[active.source_index].handle_rejected(&active.document, &active.result);
    }

    /// The suggestion went away without an explicit decision
    pub fn on_ignored(&self, id: SuggestionId) {
        let Some(active) = self.take_active(id, "ignored") else {
            return;
        };
        self.race.sources()[active.source_index].handle_ignored(&active.document, &active.result);
    }

    /// The document's text changed; sources translate their cached state
    pub fn notify_text_edit(&self, document: &DocumentKey, range: Range, inserted: &str) {
        for source in self.race.sources() {
            source.handle_text_edit(document, range, inserted);
        }
    }

    /// The document closed; drop everything tracked for it
    pub fn clear_document(&self, document: &DocumentKey) {
        {
            let mut state = self.state.lock().unwrap();
            state.active.retain(|_, active| active.document != *document);
        }
        for source in self.race.sources() {
            source.handle_document_closed(document);
        }
    }

    /// Whether any suggestion was previously rejected with this text at
    /// this position
    pub fn is_rejected(&self, document: &DocumentKey, text: &str, position: Position) -> bool {
        self.state
            .lock()
            .unwrap()
            .ledger
            .is_rejected(document, text, position)
    }

    fn take_active(&self, id: SuggestionId, event: &str) -> Option<ActiveSuggestion> {
        let mut state = self.state.lock().unwrap();
        let active = state.active.remove(&id);
        if active.is_none() {
            warn!(%id, event, "lifecycle event for unknown suggestion");
        }
        active
    }
}
