//! End-to-end flow across the whole stack: provider, racing sources,
//! caches, and lifecycle events, with the editor and network mocked at
//! the trait seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use inlay_domain::{
    Diagnostic, DiagnosticSeverity, DocumentKey, Fix, Position, Range, TextEdit, TriggerKind,
};
use inlay_engine::{
    CompletionRequest, CompletionTransport, DiagnosticFixSource, EditorHost, EngineConfig,
    FimSource, FixRequest, FixTransport, InlineSuggestionProvider, NullContextIndex,
    SuggestionKind, SuggestionSource, TokenProvider,
};

#[derive(Default)]
struct Workspace {
    texts: Mutex<HashMap<DocumentKey, String>>,
    diagnostics: Mutex<HashMap<DocumentKey, Vec<Diagnostic>>>,
}

impl Workspace {
    fn set_text(&self, document: &DocumentKey, text: &str) {
        self.texts
            .lock()
            .unwrap()
            .insert(document.clone(), text.to_string());
    }

    fn set_diagnostics(&self, document: &DocumentKey, diagnostics: Vec<Diagnostic>) {
        self.diagnostics
            .lock()
            .unwrap()
            .insert(document.clone(), diagnostics);
    }
}

impl EditorHost for Workspace {
    fn document_text(&self, document: &DocumentKey) -> Option<String> {
        self.texts.lock().unwrap().get(document).cloned()
    }

    fn cursor(&self) -> Option<(DocumentKey, Position)> {
        None
    }

    fn diagnostics(&self, document: &DocumentKey) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .unwrap()
            .get(document)
            .cloned()
            .unwrap_or_default()
    }

    fn language_id(&self, _document: &DocumentKey) -> String {
        "rust".to_string()
    }
}

struct Completions {
    responses: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl Completions {
    fn new(responses: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn set_responses(&self, responses: Vec<&str>) {
        *self.responses.lock().unwrap() = responses.into_iter().map(String::from).collect();
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionTransport for Completions {
    async fn fetch_completions(
        &self,
        _request: CompletionRequest,
    ) -> inlay_engine::Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.responses.lock().unwrap().clone())
    }
}

struct Fixes(Option<Fix>);

#[async_trait]
impl FixTransport for Fixes {
    async fn fetch_fix(&self, _request: FixRequest) -> inlay_engine::Result<Option<Fix>> {
        Ok(self.0.clone())
    }
}

struct SignedIn;

#[async_trait]
impl TokenProvider for SignedIn {
    async fn token(&self) -> Option<String> {
        Some("token".to_string())
    }
}

fn build_provider(
    workspace: Arc<Workspace>,
    completions: Arc<Completions>,
    fix: Option<Fix>,
) -> InlineSuggestionProvider {
    let config = EngineConfig {
        debounce: std::time::Duration::ZERO,
        ..EngineConfig::default()
    };
    let fim: Arc<dyn SuggestionSource> = Arc::new(FimSource::new(
        workspace.clone(),
        completions,
        Arc::new(NullContextIndex),
        config.clone(),
    ));
    let fixes: Arc<dyn SuggestionSource> = Arc::new(DiagnosticFixSource::new(
        workspace.clone(),
        Arc::new(Fixes(fix)),
        Arc::new(NullContextIndex),
        config.clone(),
    ));
    InlineSuggestionProvider::new(workspace, Arc::new(SignedIn), vec![fim, fixes], config)
}

#[tokio::test]
async fn test_completion_shown_then_typed_through() {
    let workspace = Arc::new(Workspace::default());
    let completions = Completions::new(vec!["se_input()"]);
    let d = DocumentKey::new("src/main.rs");
    workspace.set_text(&d, "let value = par");
    let provider = build_provider(Arc::clone(&workspace), Arc::clone(&completions), None);

    let first = provider
        .suggest(&d, Position::new(0, 15), TriggerKind::Automatic, &CancellationToken::new())
        .await
        .unwrap();
    let shown_text = match &first.kind {
        SuggestionKind::Completion { text, .. } => text.clone(),
        other => panic!("expected a completion, got {other:?}"),
    };
    assert_eq!(shown_text, "se_input()");
    assert_eq!(completions.calls(), 1);
    provider.on_shown(first.id);

    // The user types the first three characters of the ghost text; the
    // remainder comes out of the forward-typing cache.
    workspace.set_text(&d, "let value = parse_");
    let second = provider
        .suggest(&d, Position::new(0, 18), TriggerKind::Automatic, &CancellationToken::new())
        .await
        .unwrap();
    match &second.kind {
        SuggestionKind::Completion { text, .. } => assert_eq!(text, "input()"),
        other => panic!("expected a completion, got {other:?}"),
    }
    assert_eq!(completions.calls(), 1, "typing through must not refetch");

    provider.on_accepted(second.id);
}

#[tokio::test]
async fn test_diagnostic_fix_offered_when_completions_dry_up() {
    let workspace = Arc::new(Workspace::default());
    let completions = Completions::new(vec![]);
    let d = DocumentKey::new("src/broken.rs");
    workspace.set_text(&d, "let value = pra\n");
    workspace.set_diagnostics(
        &d,
        vec![Diagnostic::new(
            Range::new(Position::new(0, 12), Position::new(0, 15)),
            DiagnosticSeverity::Error,
            "unknown name `pra`",
        )],
    );
    let fix = Fix {
        edit: TextEdit::new(
            Range::new(Position::new(0, 12), Position::new(0, 15)),
            "par",
        ),
        label: "rename to `par`".to_string(),
    };
    let provider = build_provider(Arc::clone(&workspace), Arc::clone(&completions), Some(fix));

    let suggestion = provider
        .suggest(&d, Position::new(0, 15), TriggerKind::Automatic, &CancellationToken::new())
        .await
        .unwrap();
    match &suggestion.kind {
        SuggestionKind::Fix { edit, label, distant } => {
            assert_eq!(edit.new_text, "par");
            assert_eq!(label, "rename to `par`");
            assert!(!distant);
        }
        other => panic!("expected a fix, got {other:?}"),
    }
    provider.on_shown(suggestion.id);
    provider.on_ignored(suggestion.id);
}

#[tokio::test]
async fn test_rejection_survives_cache_hits_across_requests() {
    let workspace = Arc::new(Workspace::default());
    let completions = Completions::new(vec!["se_input()"]);
    let d = DocumentKey::new("src/main.rs");
    workspace.set_text(&d, "let value = par");
    let provider = build_provider(Arc::clone(&workspace), Arc::clone(&completions), None);
    let cursor = Position::new(0, 15);

    let suggestion = provider
        .suggest(&d, cursor, TriggerKind::Automatic, &CancellationToken::new())
        .await
        .unwrap();
    provider.on_rejected(suggestion.id);

    // The candidate cache still holds the text, but the ledger wins.
    completions.set_responses(vec![]);
    let again = provider
        .suggest(&d, cursor, TriggerKind::Automatic, &CancellationToken::new())
        .await;
    assert!(again.is_none());
}
