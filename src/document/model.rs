/*!
 * Core document model for the article pipeline.
 *
 * A `Document` is created by the ingestion side with its raw fields filled in,
 * then mutated stage by stage. Every stage field is `Option<String>`: `None`
 * means the stage has not run yet, `Some("")` means it ran and produced
 * nothing usable.
 */

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::StageFailure;

/// Returns true when `text` is present and holds something other than whitespace.
pub fn is_usable_text(text: Option<&str>) -> bool {
    text.is_some_and(|t| !t.trim().is_empty())
}

/// Position of a document in the per-document state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    /// Fresh from ingestion
    #[default]
    Raw,
    /// Translation attempted
    Translated,
    /// Summarization attempted
    Summarized,
    /// Removed by near-duplicate elimination
    Dropped,
    /// Summary rendered back into the source language
    BackTranslated,
    /// Emitted to persistence
    Final,
}

impl DocumentState {
    /// Whether stage recorders may still change this document.
    pub fn is_mutable(&self) -> bool {
        matches!(self, Self::Raw | Self::Translated | Self::Summarized)
    }
}

/// One news article moving through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable surrogate id; `0` means unassigned and is filled from the link on load
    #[serde(default)]
    pub id: u64,

    /// Unique business key
    pub link: String,

    /// Headline
    #[serde(default)]
    pub title: String,

    /// Category label
    #[serde(default)]
    pub segment: String,

    /// Publication timestamp as scraped
    #[serde(default)]
    pub published_at: Option<String>,

    /// Article body in the source language
    #[serde(default)]
    pub raw_text: Option<String>,

    /// Article body in the pivot language
    #[serde(default)]
    pub translated_text: Option<String>,

    /// Abstractive summary in the pivot language
    #[serde(default)]
    pub summary_translated: Option<String>,

    /// Summary rendered back into the source language
    #[serde(default)]
    pub summary_source_lang: Option<String>,

    /// Current pipeline state
    #[serde(default)]
    pub state: DocumentState,
}

impl Document {
    /// Create a raw document as handed over by ingestion.
    pub fn new(
        link: impl Into<String>,
        title: impl Into<String>,
        segment: impl Into<String>,
        raw_text: Option<String>,
    ) -> Self {
        let link = link.into();
        Self {
            id: Self::stable_id(&link),
            link,
            title: title.into(),
            segment: segment.into(),
            published_at: None,
            raw_text,
            translated_text: None,
            summary_translated: None,
            summary_source_lang: None,
            state: DocumentState::Raw,
        }
    }

    /// Derive a stable, non-zero id from a link.
    pub fn stable_id(link: &str) -> u64 {
        let digest = Sha256::digest(link.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(bytes).max(1)
    }

    /// Summary text eligible for similarity computation.
    pub fn usable_summary(&self) -> Option<&str> {
        self.summary_translated
            .as_deref()
            .filter(|s| is_usable_text(Some(s)))
    }

    /// Record the translation stage output. Raw -> Translated.
    pub fn record_translation(&mut self, text: String) -> Result<(), StageFailure> {
        self.advance("translation", DocumentState::Raw, DocumentState::Translated)?;
        self.translated_text = Some(text);
        Ok(())
    }

    /// Record the summarization stage output. Translated -> Summarized.
    pub fn record_summary(&mut self, summary: String) -> Result<(), StageFailure> {
        self.advance("summarization", DocumentState::Translated, DocumentState::Summarized)?;
        self.summary_translated = Some(summary);
        Ok(())
    }

    /// Mark the document as removed by dedup. Summarized -> Dropped.
    pub fn mark_dropped(&mut self) -> Result<(), StageFailure> {
        self.advance("dedup", DocumentState::Summarized, DocumentState::Dropped)
    }

    /// Record the back-translated summary. Summarized -> BackTranslated.
    pub fn record_back_translation(&mut self, summary: String) -> Result<(), StageFailure> {
        self.advance(
            "back-translation",
            DocumentState::Summarized,
            DocumentState::BackTranslated,
        )?;
        self.summary_source_lang = Some(summary);
        Ok(())
    }

    /// Seal the document for emission. BackTranslated -> Final.
    pub fn finalize(&mut self) -> Result<(), StageFailure> {
        self.advance("finalize", DocumentState::BackTranslated, DocumentState::Final)
    }

    fn advance(
        &mut self,
        stage: &'static str,
        expected: DocumentState,
        next: DocumentState,
    ) -> Result<(), StageFailure> {
        if self.state != expected {
            return Err(StageFailure::OutOfOrder {
                stage,
                state: self.state,
            });
        }
        self.state = next;
        Ok(())
    }
}
