/*!
 * Back-translation of pivot-language summaries into the source language.
 */

use log::debug;

use crate::errors::StageFailure;

use super::core::{Direction, TranslationOutcome, TranslationStage};

/// Runs the translation stage in the reverse direction.
#[derive(Debug, Clone)]
pub struct BackTranslationStage {
    stage: TranslationStage,
    direction: Direction,
}

impl BackTranslationStage {
    /// Build from the forward stage and forward direction
    pub fn new(stage: TranslationStage, forward: &Direction) -> Self {
        Self {
            stage,
            direction: forward.reversed(),
        }
    }

    /// Direction this stage translates in
    pub fn direction(&self) -> &Direction {
        &self.direction
    }

    /// Back-translate a summary. Empty or absent summaries give `""` without a call.
    pub async fn back_translate(&self, summary: Option<&str>) -> String {
        self.back_translate_detailed(summary)
            .await
            .map(|outcome| outcome.text)
            .unwrap_or_default()
    }

    /// Back-translate a summary and keep the chunk accounting.
    pub async fn back_translate_detailed(
        &self,
        summary: Option<&str>,
    ) -> Result<TranslationOutcome, StageFailure> {
        debug!(
            "Back-translating summary ({} -> {})",
            self.direction.source, self.direction.target
        );
        self.stage.translate_detailed(summary, &self.direction).await
    }
}
