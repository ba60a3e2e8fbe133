/*!
 * Typed per-stage results and the batch report.
 *
 * Stages still write the empty-string sentinel into the document; the report
 * keeps the reason next to it so degraded records can be inspected after the run.
 */

use chrono::Local;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use crate::document::Document;
use crate::errors::StageFailure;
use crate::similarity::DedupReport;
use crate::translation::{CacheStats, TranslationOutcome};

/// Average adult reading speed used for reading-time estimates
pub const WORDS_PER_MINUTE: f64 = 180.0;

/// Result of one stage for one document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageResult {
    /// Stage did not run for this document
    NotRun,
    /// Stage produced a full result
    Completed,
    /// Some translation chunks were dropped
    Partial {
        /// Chunks that exhausted their attempts
        chunks_dropped: usize,
        /// Chunks attempted
        chunks_total: usize,
    },
    /// Stage produced the empty sentinel
    Failed {
        /// Why
        failure: StageFailure,
    },
}

impl StageResult {
    /// Map a translation result
    pub fn from_translation(result: &Result<TranslationOutcome, StageFailure>) -> Self {
        match result {
            Ok(outcome) if outcome.is_partial() => Self::Partial {
                chunks_dropped: outcome.chunks_dropped,
                chunks_total: outcome.chunks_total,
            },
            Ok(_) => Self::Completed,
            Err(failure) => Self::Failed {
                failure: failure.clone(),
            },
        }
    }

    /// Map a summarization result
    pub fn from_summary(result: &Result<String, StageFailure>) -> Self {
        match result {
            Ok(_) => Self::Completed,
            Err(failure) => Self::Failed {
                failure: failure.clone(),
            },
        }
    }

    /// Whether the stage produced the empty sentinel
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The failure reason, if any
    pub fn failure(&self) -> Option<&StageFailure> {
        match self {
            Self::Failed { failure } => Some(failure),
            _ => None,
        }
    }
}

/// Stage results for one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    /// Document id
    pub id: u64,
    /// Document link
    pub link: String,
    /// Source to pivot translation
    pub translation: StageResult,
    /// Summarization
    pub summarization: StageResult,
    /// Removed by dedup
    pub dropped: bool,
    /// Pivot to source translation of the summary
    pub back_translation: StageResult,
}

impl DocumentReport {
    /// Fresh report for a document
    pub fn new(document: &Document) -> Self {
        Self {
            id: document.id,
            link: document.link.clone(),
            translation: StageResult::NotRun,
            summarization: StageResult::NotRun,
            dropped: false,
            back_translation: StageResult::NotRun,
        }
    }

    /// Whether any stage fell back to the sentinel
    pub fn has_failures(&self) -> bool {
        self.translation.is_failed()
            || self.summarization.is_failed()
            || self.back_translation.is_failed()
    }
}

/// Reading-time estimate for a final collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReadingStats {
    /// Words in the full source articles
    pub article_words: usize,
    /// Words in the source-language summaries
    pub summary_words: usize,
    /// Minutes to read every summary
    pub summary_minutes: f64,
    /// Minutes saved compared with reading every article
    pub minutes_saved: f64,
}

impl ReadingStats {
    /// Compute the estimate for documents that have a source-language summary
    pub fn from_documents(documents: &[Document]) -> Self {
        let (article_words, summary_words) = documents
            .iter()
            .filter_map(|doc| {
                let summary = doc.summary_source_lang.as_deref()?;
                if summary.trim().is_empty() {
                    return None;
                }
                Some((
                    word_count(doc.raw_text.as_deref()),
                    word_count(Some(summary)),
                ))
            })
            .fold((0, 0), |(a, s), (da, ds)| (a + da, s + ds));

        Self {
            article_words,
            summary_words,
            summary_minutes: summary_words as f64 / WORDS_PER_MINUTE,
            minutes_saved: article_words.saturating_sub(summary_words) as f64 / WORDS_PER_MINUTE,
        }
    }

    /// Split fractional minutes into whole minutes and seconds
    pub fn minutes_and_seconds(minutes: f64) -> (u64, u64) {
        let whole = minutes.max(0.0).trunc();
        (whole as u64, ((minutes.max(0.0) - whole) * 60.0) as u64)
    }
}

fn word_count(text: Option<&str>) -> usize {
    text.map(|t| t.split_whitespace().count()).unwrap_or(0)
}

/// Everything that happened in one run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Unique id of this run
    pub run_id: Uuid,
    /// Local start time, RFC 3339
    pub started_at: String,
    /// Wall-clock duration in milliseconds
    pub elapsed_ms: u64,
    /// Documents handed to the pipeline
    pub total_documents: usize,
    /// Documents emitted
    pub kept_documents: usize,
    /// Documents removed by dedup
    pub dropped_documents: usize,
    /// Documents whose translation fell back to the sentinel
    pub translation_failures: usize,
    /// Documents whose summary fell back to the sentinel
    pub summarization_failures: usize,
    /// Survivors whose back-translation fell back to the sentinel
    pub back_translation_failures: usize,
    /// Dedup details
    pub dedup: DedupReport,
    /// Chunk cache usage across both translation directions
    pub cache: CacheStats,
    /// Reading-time estimate for the emitted documents
    pub reading: ReadingStats,
    /// Emitted documents per segment
    pub segments: BTreeMap<String, usize>,
    /// Per-document stage results, in input order
    pub documents: Vec<DocumentReport>,
}

impl PipelineReport {
    /// Start a report for a new run
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Local::now().to_rfc3339(),
            elapsed_ms: 0,
            total_documents: 0,
            kept_documents: 0,
            dropped_documents: 0,
            translation_failures: 0,
            summarization_failures: 0,
            back_translation_failures: 0,
            dedup: DedupReport::default(),
            cache: CacheStats::default(),
            reading: ReadingStats::default(),
            segments: BTreeMap::new(),
            documents: Vec::new(),
        }
    }

    /// Fill in totals from the per-document reports and the final collection
    pub fn finish(&mut self, emitted: &[Document], elapsed: Duration) {
        self.elapsed_ms = elapsed.as_millis() as u64;
        self.total_documents = self.documents.len();
        self.kept_documents = emitted.len();
        self.dropped_documents = self.documents.iter().filter(|d| d.dropped).count();
        self.translation_failures = self
            .documents
            .iter()
            .filter(|d| d.translation.is_failed())
            .count();
        self.summarization_failures = self
            .documents
            .iter()
            .filter(|d| d.summarization.is_failed())
            .count();
        self.back_translation_failures = self
            .documents
            .iter()
            .filter(|d| d.back_translation.is_failed())
            .count();
        self.reading = ReadingStats::from_documents(emitted);
        self.segments = emitted.iter().fold(BTreeMap::new(), |mut acc, doc| {
            *acc.entry(doc.segment.clone()).or_insert(0) += 1;
            acc
        });
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        let (minutes, seconds) = ReadingStats::minutes_and_seconds(self.reading.minutes_saved);
        format!(
            "{} in, {} kept, {} dropped as duplicates | failures: translation {}, summary {}, back-translation {} | {:.2}s | reading time saved: {} min {} s",
            self.total_documents,
            self.kept_documents,
            self.dropped_documents,
            self.translation_failures,
            self.summarization_failures,
            self.back_translation_failures,
            self.elapsed_ms as f64 / 1000.0,
            minutes,
            seconds
        )
    }
}
