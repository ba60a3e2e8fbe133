/*!
 * Capability interfaces for the external models the pipeline depends on.
 *
 * The stages never talk to a concrete backend. They hold one of these traits:
 * - `TranslationService`: stateless text translation, called once per chunk
 * - `SummarizationModel`: bounded-length abstractive summarization
 * - `EmbeddingModel`: batch text embedding
 *
 * Implementations:
 * - `ollama`: local Ollama server over HTTP
 * - `mock`: scripted in-process implementations for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Translates a piece of text between two languages.
#[async_trait]
pub trait TranslationService: Send + Sync + Debug {
    /// Translate `text` from `source_language` to `target_language`.
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or an error
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;
}

/// Produces an abstractive summary of a text.
#[async_trait]
pub trait SummarizationModel: Send + Sync + Debug {
    /// Summarize `text` into roughly `min_tokens..=max_tokens` tokens.
    ///
    /// Implementations should suppress short repeated phrase loops and stop
    /// at a natural completion point instead of always running to `max_tokens`.
    async fn summarize(
        &self,
        text: &str,
        min_tokens: u32,
        max_tokens: u32,
    ) -> Result<String, ProviderError>;
}

/// Maps texts to fixed-size vectors.
#[async_trait]
pub trait EmbeddingModel: Send + Sync + Debug {
    /// Embed every text of the batch. The output has one vector per input, in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

pub mod mock;
pub mod ollama;
