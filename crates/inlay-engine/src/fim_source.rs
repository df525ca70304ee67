//! Fill-in-the-middle suggestion source
//!
//! The request coordinator for one completion backend. Per request it
//! walks the cache ladder before touching the network:
//!
//! 1. forward-typing cache (O(1), zero allocation, always first)
//! 2. prefix-suffix cache (compatibility match, also re-stashes a
//!    speculative fetch for the next keystroke)
//! 3. speculative fetch cache (consumed under the per-document in-flight
//!    lock so two concurrent requests cannot consume the same entry)
//! 4. debounce window (skip, not sleep; a document switch bypasses it)
//! 5. per-document in-flight lock (at most one outbound request per
//!    document for this source)
//! 6. context gathering and the outbound fetch
//! 7. on success: store candidates, stash the next speculative fetch
//!
//! Failures and cancellations release the lock via guard drop and return
//! no result; the next keystroke naturally retries. A cancelled request
//! still stores its candidates first, so a lost race warms the caches.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use inlay_cache::{FetchFn, ForwardTypingCache, PrefixSuffixCache, SpeculativeFetchCache};
use inlay_domain::{
    CompletionId, DocumentKey, Position, Range, RequestId, SuggestionContext, TriggerKind,
};

use crate::config::EngineConfig;
use crate::context::{ContextGatherer, ContextIndex};
use crate::filter::filter_candidates;
use crate::host::{position_offset, EditorHost};
use crate::race::{RaceResult, SuggestionSource};
use crate::transport::{CompletionRequest, CompletionTransport};

/// Context stored when a result is produced, consumed by `handle_shown`
/// to populate the forward-typing cache
#[derive(Debug, Clone)]
struct ShownContext {
    prefix: String,
    suffix: String,
    completion_text: String,
}

/// Per-document cache partition
struct DocumentEntry {
    forward_typing: ForwardTypingCache,
    completions: PrefixSuffixCache,
    last_completion_id: Option<CompletionId>,
    in_flight: Arc<tokio::sync::Mutex<()>>,
}

impl DocumentEntry {
    fn new() -> Self {
        Self {
            forward_typing: ForwardTypingCache::new(),
            completions: PrefixSuffixCache::new(),
            last_completion_id: None,
            in_flight: Arc::new(tokio::sync::Mutex::new(())),
        }
    }
}

/// Results awaiting `handle_shown` beyond this count are assumed to have
/// lost their race and are dropped, oldest first.
const SHOWN_CONTEXT_LIMIT: usize = 32;

/// Mutable coordinator state; the lock is never held across an await
struct FimState {
    request_seq: u64,
    completion_seq: u64,
    last_request_at: Option<Instant>,
    last_document: Option<DocumentKey>,
    shown_contexts: HashMap<RequestId, ShownContext>,
    documents: HashMap<DocumentKey, DocumentEntry>,
}

impl FimState {
    /// Track a produced result until `handle_shown` consumes it. Results
    /// that are never shown get pruned once the backlog passes the limit.
    fn remember_shown(&mut self, request_id: RequestId, shown: ShownContext) {
        self.shown_contexts.insert(request_id, shown);
        while self.shown_contexts.len() > SHOWN_CONTEXT_LIMIT {
            let Some(oldest) = self.shown_contexts.keys().min().copied() else {
                break;
            };
            self.shown_contexts.remove(&oldest);
        }
    }
}

/// Fill-in-the-middle completion source
pub struct FimSource {
    host: Arc<dyn EditorHost>,
    transport: Arc<dyn CompletionTransport>,
    gatherer: ContextGatherer,
    speculative: Arc<SpeculativeFetchCache>,
    config: EngineConfig,
    state: Mutex<FimState>,
}

impl FimSource {
    /// Create a source over the given host, transport, and semantic index
    pub fn new(
        host: Arc<dyn EditorHost>,
        transport: Arc<dyn CompletionTransport>,
        index: Arc<dyn ContextIndex>,
        config: EngineConfig,
    ) -> Self {
        let speculative = match SpeculativeFetchCache::with_capacity(config.speculative_capacity) {
            Ok(cache) => cache,
            Err(err) => {
                warn!(%err, "invalid speculative cache capacity, using the default");
                SpeculativeFetchCache::new()
            }
        };
        Self {
            gatherer: ContextGatherer::new(Arc::clone(&host), index, config.clone()),
            host,
            transport,
            speculative: Arc::new(speculative),
            config,
            state: Mutex::new(FimState {
                request_seq: 0,
                completion_seq: 0,
                last_request_at: None,
                last_document: None,
                shown_contexts: HashMap::new(),
                documents: HashMap::new(),
            }),
        }
    }

    /// Number of unconsumed speculative entries (shared across documents)
    pub fn speculative_len(&self) -> usize {
        self.speculative.len()
    }

    /// Number of results still waiting for their shown notification
    pub fn pending_shown_len(&self) -> usize {
        self.lock_state().shown_contexts.len()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, FimState> {
        self.state.lock().unwrap()
    }

    /// Steps 1 and 2 of the ladder: the synchronous cache checks
    fn check_sync_caches(
        &self,
        document: &DocumentKey,
        context: &SuggestionContext,
        request_id: RequestId,
    ) -> Option<RaceResult> {
        let mut state = self.lock_state();
        let entry = state
            .documents
            .entry(document.clone())
            .or_insert_with(DocumentEntry::new);

        // Forward typing: skipped when cycling so the user can reach
        // the alternative candidates instead of the displayed one.
        if !context.trigger.is_cycling() {
            if let Some(remainder) = entry
                .forward_typing
                .try_consume(&context.prefix, &context.suffix)
            {
                debug!(%document, %request_id, "forward-typing cache hit");
                let result = RaceResult::Fim {
                    choices: vec![remainder.clone()],
                    range: Range::at(context.cursor),
                    request_id,
                };
                state.remember_shown(
                    request_id,
                    ShownContext {
                        prefix: context.prefix.clone(),
                        suffix: context.suffix.clone(),
                        completion_text: remainder,
                    },
                );
                return Some(result);
            }
        }

        let cached = entry.completions.lookup(&context.prefix, &context.suffix);
        if !cached.is_empty() {
            debug!(%document, %request_id, candidates = cached.len(), "prefix-suffix cache hit");
            // A hit still schedules the speculative fetch for the next
            // keystroke.
            state.completion_seq += 1;
            let completion_id = CompletionId(state.completion_seq);
            if let Some(entry) = state.documents.get_mut(document) {
                entry.last_completion_id = Some(completion_id);
            }
            state.remember_shown(
                request_id,
                ShownContext {
                    prefix: context.prefix.clone(),
                    suffix: context.suffix.clone(),
                    completion_text: cached[0].clone(),
                },
            );
            drop(state);
            self.speculative
                .stash(completion_id, self.speculative_fetch(document.clone()));
            return Some(RaceResult::Fim {
                choices: cached,
                range: Range::at(context.cursor),
                request_id,
            });
        }

        None
    }

    /// Record a produced result so `handle_shown` can populate the
    /// forward-typing cache, then hand the candidates out
    fn finish_with_candidates(
        &self,
        document: &DocumentKey,
        context: &SuggestionContext,
        request_id: RequestId,
        candidates: Vec<String>,
        range: Range,
        stash_next: bool,
    ) -> RaceResult {
        let mut state = self.lock_state();
        let next_id = if stash_next {
            state.completion_seq += 1;
            Some(CompletionId(state.completion_seq))
        } else {
            None
        };
        {
            let entry = state
                .documents
                .entry(document.clone())
                .or_insert_with(DocumentEntry::new);
            entry
                .completions
                .store(context.prefix.clone(), context.suffix.clone(), candidates.clone());
            if let Some(id) = next_id {
                entry.last_completion_id = Some(id);
            }
        }
        state.remember_shown(
            request_id,
            ShownContext {
                prefix: context.prefix.clone(),
                suffix: context.suffix.clone(),
                completion_text: candidates[0].clone(),
            },
        );
        drop(state);
        if let Some(id) = next_id {
            self.speculative
                .stash(id, self.speculative_fetch(document.clone()));
        }
        RaceResult::Fim {
            choices: candidates,
            range,
            request_id,
        }
    }

    /// Build the lazy fetch for the next keystroke
    ///
    /// The closure reads the document's state when it runs, not when the
    /// suggestion was shown: by consume time the user has kept typing.
    fn speculative_fetch(&self, document: DocumentKey) -> FetchFn {
        let host = Arc::clone(&self.host);
        let transport = Arc::clone(&self.transport);
        let gatherer = self.gatherer.clone();
        let config = self.config.clone();
        Box::new(move || {
            Box::pin(async move {
                let Some((active, cursor)) = host.cursor() else {
                    return Vec::new();
                };
                if active != document {
                    return Vec::new();
                }
                let Some(text) = host.document_text(&document) else {
                    return Vec::new();
                };
                let offset = position_offset(&text, cursor);
                let context =
                    SuggestionContext::from_split(&text, offset, cursor, TriggerKind::Automatic);
                let language = host.language_id(&document);
                let gathered = gatherer.gather(&document, &context, &language).await;
                let request = CompletionRequest {
                    prefix: context.prefix.clone(),
                    suffix: context.suffix.clone(),
                    language,
                    open_files: gathered.open_files(),
                    current_file_excerpt: gathered.current_file_excerpt,
                    comment_intent: gathered.comment_intent,
                    candidates: config.automatic_candidates,
                };
                match transport.fetch_completions(request).await {
                    Ok(raw) => {
                        filter_candidates(raw, &context.prefix, &context.suffix, &config)
                    }
                    Err(error) => {
                        warn!(%document, %error, "speculative fetch failed");
                        Vec::new()
                    }
                }
            })
        })
    }

    fn replacement_range(context: &SuggestionContext) -> Range {
        let line_rest = context.suffix.split('\n').next().unwrap_or("");
        if line_rest.trim().is_empty() {
            Range::at(context.cursor)
        } else {
            // Trailing text on the cursor line: the completion replaces
            // through end of line.
            Range::new(
                context.cursor,
                Position::new(
                    context.cursor.line,
                    context.cursor.character + line_rest.chars().count() as u32,
                ),
            )
        }
    }
}

#[async_trait]
impl SuggestionSource for FimSource {
    fn id(&self) -> &'static str {
        "fim"
    }

    fn rank(&self) -> u8 {
        0
    }

    async fn try_get(
        &self,
        document: &DocumentKey,
        context: &SuggestionContext,
        cancel: CancellationToken,
    ) -> Option<RaceResult> {
        let request_id = {
            let mut state = self.lock_state();
            state.request_seq += 1;
            RequestId(state.request_seq)
        };
        debug!(%document, %request_id, cursor = ?context.cursor, "fim request");

        // Steps 1-2: synchronous cache ladder.
        if let Some(result) = self.check_sync_caches(document, context, request_id) {
            return Some(result);
        }

        let (in_flight, last_completion_id, document_changed) = {
            let mut state = self.lock_state();
            let document_changed = state.last_document.as_ref() != Some(document);
            let entry = state
                .documents
                .entry(document.clone())
                .or_insert_with(DocumentEntry::new);
            (
                Arc::clone(&entry.in_flight),
                entry.last_completion_id,
                document_changed,
            )
        };

        // Step 3: speculative fetch, consumed under the in-flight lock so
        // a concurrent request for this document cannot consume the same
        // entry twice.
        let mut held_guard = None;
        if let Some(completion_id) = last_completion_id {
            if self.speculative.contains(completion_id) {
                let guard = match Arc::clone(&in_flight).try_lock_owned() {
                    Ok(guard) => guard,
                    Err(_) => {
                        debug!(%document, %request_id, "request already in flight, skipping");
                        return None;
                    }
                };
                let raw = self.speculative.consume(completion_id).await;
                let candidates =
                    filter_candidates(raw, &context.prefix, &context.suffix, &self.config);
                if !candidates.is_empty() && !cancel.is_cancelled() {
                    debug!(%document, %request_id, "speculative cache hit");
                    {
                        let mut state = self.lock_state();
                        state.last_request_at = Some(Instant::now());
                        state.last_document = Some(document.clone());
                    }
                    return Some(self.finish_with_candidates(
                        document,
                        context,
                        request_id,
                        candidates,
                        Range::at(context.cursor),
                        true,
                    ));
                }
                // Speculative came back empty; keep the lock and fall
                // through to the network path.
                held_guard = Some(guard);
            }
        }

        // Step 4: debounce. A skipped request is not delayed; the next
        // keystroke retries.
        {
            let state = self.lock_state();
            if !document_changed {
                if let Some(last) = state.last_request_at {
                    let elapsed = Instant::now().saturating_duration_since(last);
                    if elapsed < self.config.debounce {
                        debug!(%document, %request_id, ?elapsed, "debounced");
                        return None;
                    }
                }
            }
        }

        // Step 5: the in-flight lock, unless the speculative path already
        // acquired it. Held to the end of the request via the guard.
        let _guard = match held_guard.take() {
            Some(guard) => guard,
            None => match Arc::clone(&in_flight).try_lock_owned() {
                Ok(guard) => guard,
                Err(_) => {
                    debug!(%document, %request_id, "request already in flight, skipping");
                    return None;
                }
            },
        };

        {
            let mut state = self.lock_state();
            state.last_request_at = Some(Instant::now());
            state.last_document = Some(document.clone());
        }

        if cancel.is_cancelled() {
            return None;
        }

        // Step 6: context gathering and the minimum-prefix gate.
        let language = self.host.language_id(document);
        let gathered = self.gatherer.gather(document, context, &language).await;
        let document_lines = context.prefix.lines().count() + context.suffix.lines().count();
        let strength =
            self.gatherer
                .strength(&gathered, &language, document_changed, document_lines);
        let min_prefix = self.gatherer.min_prefix(strength);
        if gathered.comment_intent.is_none() && context.prefix.trim().len() < min_prefix {
            debug!(%document, %request_id, strength, "prefix below gate");
            return None;
        }

        let candidates_wanted = if context.trigger.is_cycling() {
            self.config.cycling_candidates
        } else {
            self.config.automatic_candidates
        };
        let request = CompletionRequest {
            prefix: context.prefix.clone(),
            suffix: context.suffix.clone(),
            language,
            open_files: gathered.open_files(),
            current_file_excerpt: gathered.current_file_excerpt,
            comment_intent: gathered.comment_intent,
            candidates: candidates_wanted,
        };

        // Step 7: the outbound fetch. Failure means no result for this
        // request; the lock releases via the guard either way.
        let raw = match self.transport.fetch_completions(request).await {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%document, %request_id, %error, "completion fetch failed");
                return None;
            }
        };
        let candidates = filter_candidates(raw, &context.prefix, &context.suffix, &self.config);
        if candidates.is_empty() {
            debug!(%document, %request_id, "no usable candidates after filtering");
            return None;
        }

        let result = self.finish_with_candidates(
            document,
            context,
            request_id,
            candidates,
            Self::replacement_range(context),
            true,
        );

        // Cache warming already happened above: a cancelled (lost) race
        // still benefits the next request.
        if cancel.is_cancelled() {
            debug!(%document, %request_id, "cancelled after fetch, caches warmed");
            return None;
        }
        Some(result)
    }

    fn handle_shown(&self, document: &DocumentKey, result: &RaceResult) {
        let RaceResult::Fim { request_id, .. } = result else {
            return;
        };
        let mut state = self.lock_state();
        let Some(shown) = state.shown_contexts.remove(request_id) else {
            debug!(%document, %request_id, "shown event without pending context");
            return;
        };
        let entry = state
            .documents
            .entry(document.clone())
            .or_insert_with(DocumentEntry::new);
        entry.forward_typing.record_shown(
            shown.prefix,
            shown.suffix,
            shown.completion_text,
            *request_id,
        );
    }

    fn handle_accepted(&self, document: &DocumentKey, _result: &RaceResult) {
        // No longer pending; forward typing must not fire on the text
        // the acceptance just inserted.
        let mut state = self.lock_state();
        if let Some(entry) = state.documents.get_mut(document) {
            entry.forward_typing.clear();
        }
    }

    fn handle_rejected(&self, document: &DocumentKey, _result: &RaceResult) {
        let mut state = self.lock_state();
        if let Some(entry) = state.documents.get_mut(document) {
            entry.forward_typing.clear();
        }
    }

    fn handle_ignored(&self, document: &DocumentKey, _result: &RaceResult) {
        let mut state = self.lock_state();
        if let Some(entry) = state.documents.get_mut(document) {
            entry.forward_typing.clear();
        }
    }

    fn handle_document_closed(&self, document: &DocumentKey) {
        let mut state = self.lock_state();
        state.documents.remove(document);
        if state.last_document.as_ref() == Some(document) {
            state.last_document = None;
        }
    }
}
