//! Shared mocks for the engine integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use inlay_domain::{Diagnostic, DocumentKey, Fix, Position};
use inlay_engine::{
    CompletionRequest, CompletionTransport, EditorHost, EngineConfig, EngineError, FixRequest,
    FixTransport, TokenProvider,
};

/// Config with debouncing disabled; tests that exercise the debounce
/// window override it back
pub fn test_config() -> EngineConfig {
    EngineConfig {
        debounce: Duration::ZERO,
        ..EngineConfig::default()
    }
}

/// In-memory editor host
#[derive(Default)]
pub struct MockHost {
    texts: Mutex<HashMap<DocumentKey, String>>,
    cursor: Mutex<Option<(DocumentKey, Position)>>,
    languages: Mutex<HashMap<DocumentKey, String>>,
    diagnostics: Mutex<HashMap<DocumentKey, Vec<Diagnostic>>>,
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_text(&self, document: &DocumentKey, text: impl Into<String>) {
        self.texts
            .lock()
            .unwrap()
            .insert(document.clone(), text.into());
    }

    pub fn set_cursor(&self, cursor: Option<(DocumentKey, Position)>) {
        *self.cursor.lock().unwrap() = cursor;
    }

    pub fn set_language(&self, document: &DocumentKey, language: impl Into<String>) {
        self.languages
            .lock()
            .unwrap()
            .insert(document.clone(), language.into());
    }

    pub fn set_diagnostics(&self, document: &DocumentKey, diagnostics: Vec<Diagnostic>) {
        self.diagnostics
            .lock()
            .unwrap()
            .insert(document.clone(), diagnostics);
    }
}

impl EditorHost for MockHost {
    fn document_text(&self, document: &DocumentKey) -> Option<String> {
        self.texts.lock().unwrap().get(document).cloned()
    }

    fn cursor(&self) -> Option<(DocumentKey, Position)> {
        self.cursor.lock().unwrap().clone()
    }

    fn diagnostics(&self, document: &DocumentKey) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .unwrap()
            .get(document)
            .cloned()
            .unwrap_or_default()
    }

    fn language_id(&self, document: &DocumentKey) -> String {
        self.languages
            .lock()
            .unwrap()
            .get(document)
            .cloned()
            .unwrap_or_else(|| "rust".to_string())
    }
}

/// Completion backend that counts calls and can block or fail on demand
#[derive(Default)]
pub struct CountingTransport {
    responses: Mutex<Vec<String>>,
    calls: AtomicUsize,
    failing: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl CountingTransport {
    pub fn new(responses: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_responses(&self, responses: Vec<&str>) {
        *self.responses.lock().unwrap() = responses.into_iter().map(String::from).collect();
    }

    /// Make every fetch park until [`Notify::notify_one`] on the returned
    /// handle
    pub fn gate(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&notify));
        notify
    }
}

#[async_trait]
impl CompletionTransport for CountingTransport {
    async fn fetch_completions(
        &self,
        request: CompletionRequest,
    ) -> inlay_engine::Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(EngineError::Transport("backend unavailable".to_string()));
        }
        let responses = self.responses.lock().unwrap().clone();
        Ok(responses.into_iter().take(request.candidates.max(1)).collect())
    }
}

/// Fix backend returning a preconfigured fix
#[derive(Default)]
pub struct MockFixTransport {
    fix: Mutex<Option<Fix>>,
    calls: AtomicUsize,
}

impl MockFixTransport {
    pub fn new(fix: Option<Fix>) -> Arc<Self> {
        Arc::new(Self {
            fix: Mutex::new(fix),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FixTransport for MockFixTransport {
    async fn fetch_fix(&self, _request: FixRequest) -> inlay_engine::Result<Option<Fix>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.fix.lock().unwrap().clone())
    }
}

/// Token provider with a fixed answer
pub struct StaticTokens(pub Option<String>);

impl StaticTokens {
    pub fn signed_in() -> Arc<Self> {
        Arc::new(Self(Some("token".to_string())))
    }

    pub fn signed_out() -> Arc<Self> {
        Arc::new(Self(None))
    }
}

#[async_trait]
impl TokenProvider for StaticTokens {
    async fn token(&self) -> Option<String> {
        self.0.clone()
    }
}
