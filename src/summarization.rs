/*!
 * Abstractive summarization stage.
 *
 * Input is truncated to a character budget before the model call, the model
 * output is cleaned up, and any failure collapses to the empty sentinel.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::document::is_usable_text;
use crate::errors::StageFailure;
use crate::providers::SummarizationModel;

static SUMMARY_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(summary|resumo)\s*:\s*").expect("Invalid summary label regex")
});

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Trim model output, drop a leading `Summary:` label and collapse whitespace runs.
pub fn clean_summary(raw: &str) -> String {
    let without_label = SUMMARY_LABEL.replace(raw, "");
    WHITESPACE_RUN
        .replace_all(without_label.trim(), " ")
        .into_owned()
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Summarization stage
#[derive(Debug, Clone)]
pub struct SummarizationStage {
    model: Arc<dyn SummarizationModel>,
    input_chars: usize,
}

impl SummarizationStage {
    /// Create a stage with the default 10000-character input budget
    pub fn new(model: Arc<dyn SummarizationModel>) -> Self {
        Self {
            model,
            input_chars: 10_000,
        }
    }

    /// Set the input budget in characters
    pub fn with_input_chars(mut self, input_chars: usize) -> Self {
        self.input_chars = input_chars.max(1);
        self
    }

    /// Summarize `text`, returning `""` on unusable input or any model failure.
    pub async fn summarize(&self, text: Option<&str>, min_tokens: u32, max_tokens: u32) -> String {
        self.summarize_detailed(text, min_tokens, max_tokens)
            .await
            .unwrap_or_default()
    }

    /// Summarize `text` and keep the failure reason.
    pub async fn summarize_detailed(
        &self,
        text: Option<&str>,
        min_tokens: u32,
        max_tokens: u32,
    ) -> Result<String, StageFailure> {
        let text = match text {
            Some(t) if is_usable_text(Some(t)) => t,
            _ => return Err(StageFailure::UnusableInput),
        };

        let input = truncate_chars(text, self.input_chars);
        if input.len() < text.len() {
            debug!(
                "Truncated summarization input from {} to {} characters",
                text.chars().count(),
                self.input_chars
            );
        }

        let raw = self
            .model
            .summarize(input, min_tokens, max_tokens)
            .await
            .map_err(|e| {
                warn!("Summarization failed: {}", e);
                StageFailure::from(e)
            })?;

        let summary = clean_summary(&raw);
        if summary.is_empty() {
            warn!("Summarization model returned an empty result");
            return Err(StageFailure::EmptyOutput);
        }
        Ok(summary)
    }
}
