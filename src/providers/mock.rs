/*!
 * Mock provider implementations for testing.
 *
 * This module provides in-process providers that simulate different behaviors:
 * - `MockTranslator::working()` - Always succeeds with tagged text
 * - `MockTranslator::intermittent(n)` - Fails every Nth request
 * - `MockTranslator::failing()` - Always fails with an error
 * - `MockSummarizer` / `MockEmbedder` - same idea for the other capabilities
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;

use super::{EmbeddingModel, SummarizationModel, TranslationService};

/// Behavior mode for the mock providers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns an empty response
    Empty,
}

impl MockBehavior {
    fn failure(&self, count: usize) -> Option<ProviderError> {
        match *self {
            Self::Intermittent { fail_every } if fail_every > 0 && count % fail_every == fail_every - 1 => {
                Some(ProviderError::ApiError {
                    message: format!("Simulated intermittent failure (request #{})", count + 1),
                    status_code: 503,
                })
            }
            Self::Failing => Some(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),
            _ => None,
        }
    }
}

/// Mock translation service
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockBehavior,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Texts that always fail, regardless of behavior
    poisoned: Arc<Vec<String>>,
    /// Per-text delays, used to force out-of-order completion
    delays: Arc<HashMap<String, u64>>,
    /// Every text received, in call order
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            poisoned: Arc::new(Vec::new()),
            delays: Arc::new(HashMap::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working translator that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing translator
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a translator that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a translator that answers with empty text
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Fail every request whose text contains one of `needles`
    pub fn poisoned(mut self, needles: &[&str]) -> Self {
        self.poisoned = Arc::new(needles.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Delay requests whose text contains a key by the mapped milliseconds
    pub fn with_delays(mut self, delays: &[(&str, u64)]) -> Self {
        self.delays = Arc::new(delays.iter().map(|(k, v)| (k.to_string(), *v)).collect());
        self
    }

    /// Number of requests served so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Texts received so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// The deterministic output for a successful call
    pub fn render(text: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, text)
    }
}

#[async_trait]
impl TranslationService for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(text.to_string());

        let delay = self
            .delays
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map(|(_, ms)| *ms);
        if let Some(ms) = delay {
            tokio::time::sleep(tokio::time::Duration::from_millis(ms)).await;
        }

        if self.poisoned.iter().any(|needle| text.contains(needle.as_str())) {
            return Err(ProviderError::RequestFailed(format!("poisoned text: {}", text)));
        }

        if let Some(error) = self.behavior.failure(count) {
            return Err(error);
        }

        match self.behavior {
            MockBehavior::Empty => Ok(String::new()),
            _ => Ok(Self::render(text, target_language)),
        }
    }
}

/// Mock summarization model
#[derive(Debug, Clone)]
pub struct MockSummarizer {
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
    /// Fixed outputs keyed by a substring of the input
    scripted: Arc<Vec<(String, String)>>,
    /// Length of the last input received
    last_input_chars: Arc<AtomicUsize>,
}

impl MockSummarizer {
    /// Create a new mock summarizer with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            scripted: Arc::new(Vec::new()),
            last_input_chars: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working summarizer
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a summarizer that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Return `summary` whenever the input contains `needle`
    pub fn with_script(mut self, script: &[(&str, &str)]) -> Self {
        self.scripted = Arc::new(
            script
                .iter()
                .map(|(needle, summary)| (needle.to_string(), summary.to_string()))
                .collect(),
        );
        self
    }

    /// Number of requests served so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Character count of the most recent input
    pub fn last_input_chars(&self) -> usize {
        self.last_input_chars.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummarizationModel for MockSummarizer {
    async fn summarize(
        &self,
        text: &str,
        _min_tokens: u32,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.last_input_chars.store(text.chars().count(), Ordering::SeqCst);

        if let Some(error) = self.behavior.failure(count) {
            return Err(error);
        }
        if self.behavior == MockBehavior::Empty {
            return Ok(String::new());
        }

        if let Some((_, summary)) = self.scripted.iter().find(|(needle, _)| text.contains(needle.as_str())) {
            return Ok(summary.clone());
        }

        Ok(text
            .split_whitespace()
            .take(max_tokens as usize)
            .collect::<Vec<_>>()
            .join(" "))
    }
}

/// Mock embedding model returning fixed vectors
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    behavior: MockBehavior,
    /// Vectors keyed by the exact text
    vectors: Arc<HashMap<String, Vec<f32>>>,
    /// Vector returned for unknown texts
    fallback_dimensions: usize,
    /// Batches received
    batches: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockEmbedder {
    /// Create an embedder with fixed vectors
    pub fn with_vectors(vectors: &[(&str, Vec<f32>)]) -> Self {
        Self {
            behavior: MockBehavior::Working,
            vectors: Arc::new(vectors.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()),
            fallback_dimensions: vectors.first().map(|(_, v)| v.len()).unwrap_or(3),
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create an embedder that fails every batch
    pub fn failing() -> Self {
        Self {
            behavior: MockBehavior::Failing,
            ..Self::with_vectors(&[])
        }
    }

    /// Batches received so far
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }

    /// Deterministic vector for a text not in the table: one-hot on a hashed axis
    fn fallback(&self, text: &str) -> Vec<f32> {
        let dims = self.fallback_dimensions.max(1);
        let axis = text.bytes().fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize)) % dims;
        (0..dims).map(|i| if i == axis { 1.0 } else { 0.0 }).collect()
    }
}

#[async_trait]
impl EmbeddingModel for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.batches.lock().push(texts.to_vec());

        if let Some(error) = self.behavior.failure(0) {
            return Err(error);
        }

        Ok(texts
            .iter()
            .map(|t| self.vectors.get(t).cloned().unwrap_or_else(|| self.fallback(t)))
            .collect())
    }
}
