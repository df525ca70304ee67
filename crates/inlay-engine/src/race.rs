//! Suggestion source racing
//!
//! Runs N independent suggestion sources concurrently and picks one
//! winner by fixed static priority, never by arrival order: a completion
//! source beats a fix source even when the fix resolved first.
//!
//! Cancellation policy ("cache-warming survives cancellation"): each
//! source runs under its own `CancellationToken`, deliberately not linked
//! to the parent request's token. Cancelling a source prevents its result
//! from being used here, but its in-flight network call runs to
//! completion and populates the source's caches for the next request. The
//! parent token only stops this coordinator from waiting.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use inlay_domain::{DocumentKey, Range, RequestId, SuggestionContext, TextEdit};

/// Result of one suggestion source; exactly one variant wins per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceResult {
    /// Fill-in-the-middle completion: ordered candidates and the range
    /// they replace
    Fim {
        /// Candidate completion texts, best first
        choices: Vec<String>,
        /// Range the completion replaces
        range: Range,
        /// Request that produced the candidates
        request_id: RequestId,
    },
    /// Diagnostic-derived fix: a single labelled text replacement
    Fix {
        /// The edit that applies the fix
        edit: TextEdit,
        /// Human-readable label
        label: String,
    },
}

/// A racing suggestion source
///
/// Implementations coordinate their own caches and network access;
/// failures are swallowed inside `try_get` and reported as `None` so a
/// failing source never blocks another source from winning.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Stable identifier for logging
    fn id(&self) -> &'static str;

    /// Fixed static priority; lower rank wins over higher rank whenever
    /// both produce a usable result
    fn rank(&self) -> u8;

    /// Produce a suggestion, or `None` for a miss, failure, or
    /// cancellation
    async fn try_get(
        &self,
        document: &DocumentKey,
        context: &SuggestionContext,
        cancel: CancellationToken,
    ) -> Option<RaceResult>;

    /// The suggestion from this source is now displayed
    fn handle_shown(&self, _document: &DocumentKey, _result: &RaceResult) {}

    /// The user accepted the suggestion
    fn handle_accepted(&self, _document: &DocumentKey, _result: &RaceResult) {}

    /// The user explicitly rejected the suggestion
    fn handle_rejected(&self, _document: &DocumentKey, _result: &RaceResult) {}

    /// The suggestion was superseded without an explicit rejection
    fn handle_ignored(&self, _document: &DocumentKey, _result: &RaceResult) {}

    /// The document's text changed
    fn handle_text_edit(&self, _document: &DocumentKey, _range: Range, _inserted: &str) {}

    /// The document is no longer tracked; drop its cache partitions
    fn handle_document_closed(&self, _document: &DocumentKey) {}
}

/// Races an ordered list of suggestion sources under a shared deadline
pub struct RaceCoordinator {
    sources: Vec<Arc<dyn SuggestionSource>>,
    grace: Duration,
}

impl RaceCoordinator {
    /// Create a coordinator over the given sources
    ///
    /// Sources are kept in rank order; any number of sources works, not
    /// just two.
    pub fn new(mut sources: Vec<Arc<dyn SuggestionSource>>, grace: Duration) -> Self {
        sources.sort_by_key(|s| s.rank());
        Self { sources, grace }
    }

    /// The racing sources, in rank order
    pub fn sources(&self) -> &[Arc<dyn SuggestionSource>] {
        &self.sources
    }

    /// Run all sources concurrently and return the winning source's index
    /// (into [`Self::sources`]) and result
    ///
    /// Protocol: wait for the first source to produce any outcome
    /// (usable or not); from that moment grant one grace extension to the
    /// still-pending sources; when it expires, cancel whatever has not
    /// resolved and pick the best-ranked usable result seen so far.
    pub async fn run(
        &self,
        document: &DocumentKey,
        context: &SuggestionContext,
        parent: &CancellationToken,
    ) -> Option<(usize, RaceResult)> {
        if self.sources.is_empty() {
            return None;
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, Option<RaceResult>)>();
        let mut tokens = Vec::with_capacity(self.sources.len());
        for (index, source) in self.sources.iter().enumerate() {
            // Independent scope per source: not a child of `parent`, so a
            // losing source still finishes and warms its caches.
            let token = CancellationToken::new();
            tokens.push(token.clone());
            let source = Arc::clone(source);
            let document = document.clone();
            let context = context.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = source.try_get(&document, &context, token).await;
                // The coordinator may have stopped listening; that is fine.
                let _ = tx.send((index, outcome));
            });
        }
        drop(tx);

        let mut outcomes: Vec<Option<Option<RaceResult>>> = vec![None; self.sources.len()];
        let mut deadline: Option<Instant> = None;

        loop {
            if let Some(winner) = self.decided(&outcomes) {
                return self.finish(winner, &mut outcomes, &tokens);
            }

            let received = match deadline {
                None => tokio::select! {
                    message = rx.recv() => Ok(message),
                    _ = parent.cancelled() => {
                        debug!("race abandoned: parent cancelled");
                        return None;
                    }
                },
                Some(deadline) => tokio::select! {
                    message = timeout_at(deadline, rx.recv()) => message,
                    _ = parent.cancelled() => {
                        debug!("race abandoned: parent cancelled");
                        return None;
                    }
                },
            };

            match received {
                Ok(Some((index, outcome))) => {
                    debug!(
                        source = self.sources[index].id(),
                        usable = outcome.is_some(),
                        "race outcome"
                    );
                    outcomes[index] = Some(outcome);
                    // First outcome arms the one-time grace extension for
                    // everything still pending.
                    if deadline.is_none() {
                        deadline = Some(Instant::now() + self.grace);
                    }
                }
                // All senders dropped: every source has resolved.
                Ok(None) => {
                    let winner = best_resolved(&outcomes)?;
                    return self.finish(winner, &mut outcomes, &tokens);
                }
                // Grace expired: force-cancel whatever has not resolved
                // and settle for the best usable result so far.
                Err(_) => {
                    for (index, outcome) in outcomes.iter().enumerate() {
                        if outcome.is_none() {
                            debug!(source = self.sources[index].id(), "grace expired, cancelling");
                            tokens[index].cancel();
                        }
                    }
                    let winner = best_resolved(&outcomes)?;
                    return self.finish(winner, &mut outcomes, &tokens);
                }
            }
        }
    }

    /// Winner index once every source ranked above the best usable result
    /// has resolved
    fn decided(&self, outcomes: &[Option<Option<RaceResult>>]) -> Option<usize> {
        for (index, outcome) in outcomes.iter().enumerate() {
            match outcome {
                // A higher-priority source is still pending; its result
                // would outrank anything below, keep waiting.
                None => return None,
                Some(Some(_)) => return Some(index),
                Some(None) => continue,
            }
        }
        None
    }

    fn finish(
        &self,
        winner: usize,
        outcomes: &mut [Option<Option<RaceResult>>],
        tokens: &[CancellationToken],
    ) -> Option<(usize, RaceResult)> {
        // Mark the losers superseded; their work continues in the
        // background and warms their caches.
        for (index, token) in tokens.iter().enumerate() {
            if index != winner && outcomes[index].is_none() {
                token.cancel();
            }
        }
        let result = outcomes[winner].take().flatten()?;
        debug!(source = self.sources[winner].id(), "race winner");
        Some((winner, result))
    }
}

/// Best-ranked usable result among resolved sources, if any
fn best_resolved(outcomes: &[Option<Option<RaceResult>>]) -> Option<usize> {
    outcomes
        .iter()
        .position(|outcome| matches!(outcome, Some(Some(_))))
}
