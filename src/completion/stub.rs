//! Stub completion client for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{CompletionClient, CompletionRequest};
use crate::types::EngineError;

/// Scriptable completion client that records calls.
///
/// Unknown prompts echo back unchanged, which models "no correction needed".
pub struct StubCompletionClient {
    responses: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    system_prompts: Mutex<Vec<String>>,
    fail_with: Mutex<Option<EngineError>>,
    initialized: bool,
}

impl StubCompletionClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            delay: None,
            system_prompts: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
            initialized: true,
        }
    }

    /// A client that reports itself as missing its API key.
    pub fn uninitialized() -> Self {
        Self {
            initialized: false,
            ..Self::new()
        }
    }

    /// Delay every call, to widen race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Script a response for an exact user prompt.
    pub fn respond(&self, user_prompt: &str, response: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(user_prompt.to_string(), response.to_string());
    }

    /// Make every subsequent call fail with the given error.
    pub fn fail_with(&self, error: EngineError) {
        *self.fail_with.lock().unwrap() = Some(error);
    }

    /// Number of completion calls performed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// System prompts received, in call order.
    pub fn received_system_prompts(&self) -> Vec<String> {
        self.system_prompts.lock().unwrap().clone()
    }
}

impl Default for StubCompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for StubCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.system_prompts
            .lock()
            .unwrap()
            .push(request.system_prompt.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.fail_with.lock().unwrap().clone() {
            return Err(error);
        }

        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get(&request.user_prompt)
            .cloned();
        Ok(scripted.unwrap_or(request.user_prompt))
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}
