/*!
 * Mock translator for testing.
 *
 * - `MockTranslator::working()` - answers from a word list, or echoes
 * - `MockTranslator::failing()` - always fails with an error
 * - per-text delays let tests complete lookups out of order
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::Translator;
use crate::errors::ProviderError;

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
}

/// Mock translator with scripted answers
#[derive(Debug, Clone)]
pub struct MockTranslator {
    /// Behavior mode
    behavior: MockBehavior,
    /// Fixed answers by source text
    answers: Arc<HashMap<String, String>>,
    /// Artificial latency by source text
    delays: Arc<HashMap<String, Duration>>,
    /// Request counter
    request_count: Arc<AtomicUsize>,
    /// Every text requested, in call order
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            answers: Arc::new(HashMap::new()),
            delays: Arc::new(HashMap::new()),
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A translator that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// A translator that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// A translator that fails on every Nth request
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Answer `text` with `translation`
    pub fn with_answer(mut self, text: &str, translation: &str) -> Self {
        Arc::make_mut(&mut self.answers).insert(text.to_string(), translation.to_string());
        self
    }

    /// Delay answers for `text`
    pub fn with_delay(mut self, text: &str, delay: Duration) -> Self {
        Arc::make_mut(&mut self.delays).insert(text.to_string(), delay);
        self
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Texts requested so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    fn answer(&self, text: &str) -> String {
        self.answers
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("[TRANSLATED] {}", text))
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(text.to_string());

        if let Some(delay) = self.delays.get(text) {
            tokio::time::sleep(*delay).await;
        }

        match self.behavior {
            MockBehavior::Working => Ok(self.answer(text)),
            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        status_code: 503,
                        message: "Simulated intermittent failure".to_string(),
                    })
                } else {
                    Ok(self.answer(text))
                }
            }
            MockBehavior::Failing => Err(ProviderError::ConnectionError(
                "Simulated connection failure".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
