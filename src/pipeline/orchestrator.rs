/*!
 * Pipeline orchestrator.
 *
 * Runs a batch of documents through the stage graph:
 * 1. Translate and summarize, independently per document
 * 2. Wait at the batch barrier, then remove near-duplicates over the whole batch
 * 3. Back-translate the surviving summaries and seal the documents
 *
 * No stage failure aborts the run. Failed stages leave the empty sentinel in
 * the document and a typed reason in the report.
 */

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::document::Document;
use crate::errors::StageFailure;
use crate::similarity::EmbeddingSimilarityEngine;
use crate::summarization::SummarizationStage;
use crate::translation::{BackTranslationStage, Direction, TranslationStage};

use super::report::{DocumentReport, PipelineReport, StageResult};
use super::stage::{PipelineStage, StageBarrier};

/// Run-level settings for the orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Language of the ingested articles
    pub source_language: String,

    /// Language the models work in
    pub pivot_language: String,

    /// Lower summary length bound, in tokens
    pub min_summary_tokens: u32,

    /// Upper summary length bound, in tokens
    pub max_summary_tokens: u32,

    /// Documents processed at the same time in per-document stages
    pub concurrent_documents: usize,

    /// Seed for dedup tie-breaks; `None` seeds from the OS
    pub dedup_seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_language: "pt".to_string(),
            pivot_language: "en".to_string(),
            min_summary_tokens: 50,
            max_summary_tokens: 200,
            concurrent_documents: 1,
            dedup_seed: None,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration for a language pair.
    pub fn new(source_language: &str, pivot_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            pivot_language: pivot_language.to_string(),
            ..Default::default()
        }
    }

    /// Set summary length bounds.
    pub fn with_summary_tokens(mut self, min_tokens: u32, max_tokens: u32) -> Self {
        self.min_summary_tokens = min_tokens;
        self.max_summary_tokens = max_tokens;
        self
    }

    /// Set per-document concurrency.
    pub fn with_concurrent_documents(mut self, n: usize) -> Self {
        self.concurrent_documents = n.max(1);
        self
    }

    /// Fix the dedup seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.dedup_seed = seed;
        self
    }

    /// Source to pivot direction.
    pub fn forward(&self) -> Direction {
        Direction::new(&self.source_language, &self.pivot_language)
    }
}

/// Progress of a per-document stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineProgress {
    /// Stage that advanced
    pub stage: PipelineStage,
    /// Documents done with this stage
    pub processed: usize,
    /// Documents this stage will see
    pub total: usize,
}

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(PipelineProgress) + Send + Sync>;

/// Result of a run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Final documents, in input order
    pub documents: Vec<Document>,
    /// Documents removed as near-duplicates, in input order
    pub dropped: Vec<Document>,
    /// What happened
    pub report: PipelineReport,
}

/// Drives documents through every stage.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    translation: TranslationStage,
    summarization: SummarizationStage,
    similarity: EmbeddingSimilarityEngine,
    back_translation: BackTranslationStage,
    progress_callback: Option<ProgressCallback>,
}

impl PipelineOrchestrator {
    /// Create an orchestrator. Back-translation reuses `translation` in the reverse direction.
    pub fn new(
        config: PipelineConfig,
        translation: TranslationStage,
        summarization: SummarizationStage,
        similarity: EmbeddingSimilarityEngine,
    ) -> Self {
        let back_translation = BackTranslationStage::new(translation.clone(), &config.forward());
        Self {
            config,
            translation,
            summarization,
            similarity,
            back_translation,
            progress_callback: None,
        }
    }

    /// Report progress after every document in every per-document stage.
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(PipelineProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run a batch, seeding dedup from the configuration or the OS.
    pub async fn run(&self, documents: Vec<Document>) -> PipelineOutput {
        let mut rng = match self.config.dedup_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.run_with_rng(documents, &mut rng).await
    }

    /// Run a batch with an explicit random source for dedup tie-breaks.
    pub async fn run_with_rng<R: Rng>(&self, documents: Vec<Document>, rng: &mut R) -> PipelineOutput {
        let start_time = Instant::now();
        let mut report = PipelineReport::start();
        let total = documents.len();
        info!(
            "Starting run {} with {} document(s) ({} -> {})",
            report.run_id, total, self.config.source_language, self.config.pivot_language
        );

        // Per-document translate + summarize; dedup is gated on every arrival
        let barrier = StageBarrier::new(total);
        let ((documents, mut entries), ()) =
            tokio::join!(self.prepare_all(documents, &barrier), barrier.wait());
        debug!(
            "All {} document(s) reached the {} barrier",
            barrier.arrived(),
            PipelineStage::Dedup
        );

        // Batch dedup
        let outcome = self.similarity.dedup(documents, rng).await;
        let dropped_links: HashSet<&str> = outcome.removed.iter().map(|d| d.link.as_str()).collect();
        for entry in entries.iter_mut() {
            entry.dropped = dropped_links.contains(entry.link.as_str());
        }
        report.dedup = outcome.report;

        let mut dropped = outcome.removed;
        for doc in dropped.iter_mut() {
            if let Err(e) = doc.mark_dropped() {
                warn!("Document {}: {}", doc.link, e);
            }
        }

        // Back-translate survivors
        let documents = self.finish_all(outcome.kept, &mut entries).await;

        report.documents = entries;
        report.cache = self.translation.cache().stats();
        if report.cache.enabled {
            debug!(
                "Translation cache: {} hit(s), {} miss(es), {:.0}% hit rate",
                report.cache.hits,
                report.cache.misses,
                report.cache.hit_rate() * 100.0
            );
        }
        report.finish(&documents, start_time.elapsed());
        info!("Run {} finished: {}", report.run_id, report.summary());

        PipelineOutput {
            documents,
            dropped,
            report,
        }
    }

    async fn prepare_all(
        &self,
        documents: Vec<Document>,
        barrier: &StageBarrier,
    ) -> (Vec<Document>, Vec<DocumentReport>) {
        let total = documents.len();
        let translated = AtomicUsize::new(0);
        let summarized = AtomicUsize::new(0);
        let counters = (&translated, &summarized);

        let mut prepared: Vec<(usize, Document, DocumentReport)> =
            stream::iter(documents.into_iter().enumerate())
                .map(move |(index, doc)| async move {
                    let (doc, entry) = self.prepare_document(doc, counters, total).await;
                    barrier.arrive();
                    (index, doc, entry)
                })
                .buffer_unordered(self.config.concurrent_documents.max(1))
                .collect()
                .await;

        prepared.sort_by_key(|(index, _, _)| *index);
        prepared
            .into_iter()
            .map(|(_, doc, entry)| (doc, entry))
            .unzip()
    }

    async fn prepare_document(
        &self,
        mut doc: Document,
        (translated, summarized): (&AtomicUsize, &AtomicUsize),
        total: usize,
    ) -> (Document, DocumentReport) {
        let mut entry = DocumentReport::new(&doc);

        let translation = self
            .translation
            .translate_detailed(doc.raw_text.as_deref(), &self.config.forward())
            .await;
        entry.translation = StageResult::from_translation(&translation);
        if let Err(StageFailure::AllChunksFailed { chunks }) = &translation {
            warn!("Document {}: all {} chunk(s) failed to translate", doc.link, chunks);
        }
        let text = translation.map(|o| o.text).unwrap_or_default();
        self.progress(PipelineStage::Translate, translated, total);

        if let Err(e) = doc.record_translation(text) {
            warn!("Document {}: {}", doc.link, e);
            entry.translation = StageResult::Failed { failure: e };
            self.progress(PipelineStage::Summarize, summarized, total);
            return (doc, entry);
        }

        let summary = self
            .summarization
            .summarize_detailed(
                doc.translated_text.as_deref(),
                self.config.min_summary_tokens,
                self.config.max_summary_tokens,
            )
            .await;
        entry.summarization = StageResult::from_summary(&summary);
        if let Err(e) = doc.record_summary(summary.unwrap_or_default()) {
            warn!("Document {}: {}", doc.link, e);
            entry.summarization = StageResult::Failed { failure: e };
        }
        self.progress(PipelineStage::Summarize, summarized, total);

        (doc, entry)
    }

    async fn finish_all(&self, kept: Vec<Document>, entries: &mut [DocumentReport]) -> Vec<Document> {
        let total = kept.len();
        let back_translated = AtomicUsize::new(0);
        let counter = &back_translated;

        let mut finished: Vec<(usize, Document, StageResult)> = stream::iter(kept.into_iter().enumerate())
            .map(move |(index, doc)| async move {
                let (doc, result) = self.finish_document(doc).await;
                self.progress(PipelineStage::BackTranslate, counter, total);
                (index, doc, result)
            })
            .buffer_unordered(self.config.concurrent_documents.max(1))
            .collect()
            .await;
        finished.sort_by_key(|(index, _, _)| *index);

        finished
            .into_iter()
            .map(|(_, doc, result)| {
                if let Some(entry) = entries.iter_mut().find(|e| e.link == doc.link) {
                    entry.back_translation = result;
                }
                doc
            })
            .collect()
    }

    async fn finish_document(&self, mut doc: Document) -> (Document, StageResult) {
        let back = self
            .back_translation
            .back_translate_detailed(doc.summary_translated.as_deref())
            .await;
        let mut result = StageResult::from_translation(&back);
        let text = back.map(|o| o.text).unwrap_or_default();

        let recorded = doc.record_back_translation(text).and_then(|_| doc.finalize());
        if let Err(e) = recorded {
            warn!("Document {}: {}", doc.link, e);
            result = StageResult::Failed { failure: e };
        }
        (doc, result)
    }

    fn progress(&self, stage: PipelineStage, counter: &AtomicUsize, total: usize) {
        let processed = counter.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("{}: {}/{}", stage, processed, total);
        if let Some(ref callback) = self.progress_callback {
            callback(PipelineProgress {
                stage,
                processed,
                total,
            });
        }
    }
}
