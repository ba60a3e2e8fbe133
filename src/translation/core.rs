/*!
 * Chunked translation stage.
 *
 * Long texts are split with `TextChunker`, every chunk is translated
 * independently with bounded retries, and the successful chunk translations
 * are joined back in original order. A chunk that exhausts its attempts is
 * dropped from the output rather than failing the document.
 */

use futures::stream::{self, StreamExt};
use log::{debug, error, warn};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::document::is_usable_text;
use crate::errors::StageFailure;
use crate::providers::TranslationService;

use super::cache::TranslationCache;
use super::chunker::TextChunker;

/// A translation direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Direction {
    /// Language of the input text
    pub source: String,
    /// Language to produce
    pub target: String,
}

impl Direction {
    /// Create a direction
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// The opposite direction
    pub fn reversed(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
        }
    }
}

/// Attempt budget and delays for one chunk.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per chunk, including the first
    pub max_attempts: u32,
    /// Backoff before retry `n` (0-based) is `backoff_unit * 2^n`
    pub backoff_unit: Duration,
    /// Lower bound of the random delay before every external call
    pub jitter_min: Duration,
    /// Upper bound of the random delay before every external call
    pub jitter_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
            jitter_min: Duration::from_millis(500),
            jitter_max: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_unit: Duration::ZERO,
            jitter_min: Duration::ZERO,
            jitter_max: Duration::ZERO,
        }
    }

    /// Backoff to wait after failed attempt `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Draw a jitter delay from the configured range
    pub fn jitter(&self) -> Duration {
        if self.jitter_max.is_zero() || self.jitter_max <= self.jitter_min {
            return self.jitter_min;
        }
        let min = self.jitter_min.as_millis() as u64;
        let max = self.jitter_max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

/// What the stage produced for one text.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    /// Successful chunk translations joined by a single space
    pub text: String,
    /// Chunks attempted
    pub chunks_total: usize,
    /// Chunks that exhausted their attempts
    pub chunks_dropped: usize,
}

impl TranslationOutcome {
    /// Whether some chunks are missing from `text`
    pub fn is_partial(&self) -> bool {
        self.chunks_dropped > 0
    }
}

/// Translation stage shared by both directions of the pipeline.
#[derive(Debug, Clone)]
pub struct TranslationStage {
    service: Arc<dyn TranslationService>,
    policy: RetryPolicy,
    max_chunk_chars: usize,
    concurrent_chunks: usize,
    cache: TranslationCache,
}

impl TranslationStage {
    /// Create a stage with default limits (4000-char chunks, 3 attempts, sequential chunks)
    pub fn new(service: Arc<dyn TranslationService>) -> Self {
        Self {
            service,
            policy: RetryPolicy::default(),
            max_chunk_chars: 4000,
            concurrent_chunks: 1,
            cache: TranslationCache::new(false),
        }
    }

    /// Set the retry policy
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the maximum chunk size in characters
    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars.max(1);
        self
    }

    /// Translate up to `n` chunks of one text at the same time
    pub fn with_concurrent_chunks(mut self, n: usize) -> Self {
        self.concurrent_chunks = n.max(1);
        self
    }

    /// Use a shared translation cache
    pub fn with_cache(mut self, cache: TranslationCache) -> Self {
        self.cache = cache;
        self
    }

    /// Cache in use
    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Translate `text`, returning the empty string when nothing could be translated.
    pub async fn translate(&self, text: Option<&str>, direction: &Direction) -> String {
        self.translate_detailed(text, direction)
            .await
            .map(|outcome| outcome.text)
            .unwrap_or_default()
    }

    /// Translate `text` and report how many chunks were lost.
    ///
    /// Fails only with `UnusableInput` or `AllChunksFailed`; partial results are `Ok`.
    pub async fn translate_detailed(
        &self,
        text: Option<&str>,
        direction: &Direction,
    ) -> Result<TranslationOutcome, StageFailure> {
        let text = match text {
            Some(t) if is_usable_text(Some(t)) => t,
            _ => {
                debug!("Text is absent or blank, skipping translation");
                return Err(StageFailure::UnusableInput);
            }
        };

        let chunker = TextChunker::new(text, self.max_chunk_chars);
        debug!(
            "Translating {} character(s) in {} chunk(s) ({} -> {})",
            text.chars().count(),
            chunker.count(),
            direction.source,
            direction.target
        );

        let mut results: Vec<(usize, Option<String>)> = stream::iter(chunker.chunks().enumerate())
            .map(|(index, chunk)| async move { (index, self.translate_chunk(chunk, direction).await) })
            .buffer_unordered(self.concurrent_chunks)
            .collect()
            .await;

        // Completion order is arbitrary; restore chunk order
        results.sort_by_key(|(index, _)| *index);

        let chunks_total = results.len();
        let translated: Vec<String> = results.into_iter().filter_map(|(_, t)| t).collect();
        let chunks_dropped = chunks_total - translated.len();

        if translated.is_empty() {
            return Err(StageFailure::AllChunksFailed { chunks: chunks_total });
        }
        if chunks_dropped > 0 {
            warn!(
                "Translation incomplete: {} of {} chunk(s) dropped, returning partial text",
                chunks_dropped, chunks_total
            );
        }

        Ok(TranslationOutcome {
            text: translated.join(" "),
            chunks_total,
            chunks_dropped,
        })
    }

    async fn translate_chunk(&self, chunk: &str, direction: &Direction) -> Option<String> {
        if let Some(cached) = self.cache.get(chunk, &direction.source, &direction.target) {
            return Some(cached);
        }

        let max_attempts = self.policy.max_attempts.max(1);
        for attempt in 0..max_attempts {
            let jitter = self.policy.jitter();
            if !jitter.is_zero() {
                tokio::time::sleep(jitter).await;
            }

            match self
                .service
                .translate(chunk, &direction.source, &direction.target)
                .await
            {
                Ok(translated) if !translated.trim().is_empty() => {
                    let translated = translated.trim().to_string();
                    self.cache
                        .store(chunk, &direction.source, &direction.target, &translated);
                    return Some(translated);
                }
                Ok(_) => warn!("Translation attempt {} returned empty text", attempt + 1),
                Err(e) => warn!("Translation attempt {} failed: {}", attempt + 1, e),
            }

            if attempt + 1 < max_attempts {
                let backoff = self.policy.backoff(attempt);
                if !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        error!(
            "Chunk translation failed after {} attempts, dropping chunk",
            max_attempts
        );
        None
    }
}
