/*!
 * Near-duplicate elimination over summary embeddings.
 *
 * Documents whose summaries are too similar form edges of a similarity graph.
 * The engine deletes vertices greedily until no edge is left: every
 * conflicting pair whose members are both still kept loses one member,
 * chosen by the caller-supplied random source.
 */

use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::document::Document;
use crate::errors::ProviderError;
use crate::providers::EmbeddingModel;

use super::matrix::SimilarityMatrix;

/// Default cosine threshold above which two summaries conflict
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// What dedup did to a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DedupReport {
    /// Documents handed to the engine
    pub input_count: usize,
    /// Documents with a usable summary
    pub valid_count: usize,
    /// Pairs above the threshold
    pub conflicting_pairs: usize,
    /// Ids of removed documents, in input order
    pub removed_ids: Vec<u64>,
    /// Why similarity was not computed, if it was not
    pub skipped: Option<String>,
}

/// Kept and removed documents, both in input order
#[derive(Debug, Clone)]
pub struct DedupOutcome {
    /// Documents without a usable summary plus surviving valid documents
    pub kept: Vec<Document>,
    /// Documents removed as near-duplicates
    pub removed: Vec<Document>,
    /// Summary of the run
    pub report: DedupReport,
}

/// Greedy randomized vertex deletion over the conflict graph.
///
/// Returns one flag per matrix row, `true` for rows that survive. No two
/// surviving rows have similarity above `threshold`.
pub fn select_survivors<R: Rng>(
    matrix: &SimilarityMatrix,
    threshold: f64,
    rng: &mut R,
) -> Vec<bool> {
    let mut keep = vec![true; matrix.len()];
    for (i, j) in matrix.conflicting_pairs(threshold) {
        if !(keep[i] && keep[j]) {
            continue;
        }
        let loser = if rng.random_bool(0.5) { i } else { j };
        keep[loser] = false;
    }
    keep
}

/// Reject batches that would compare as silently dissimilar.
///
/// Every vector must be non-empty, finite, non-zero and as long as the first.
fn check_embeddings(embeddings: &[Vec<f32>]) -> Result<(), ProviderError> {
    let dimensions = embeddings.first().map(Vec::len).unwrap_or_default();
    for (index, vector) in embeddings.iter().enumerate() {
        let reason = if vector.is_empty() {
            "empty vector".to_string()
        } else if vector.len() != dimensions {
            format!("{} dimensions, expected {}", vector.len(), dimensions)
        } else if vector.iter().any(|x| !x.is_finite()) {
            "non-finite component".to_string()
        } else if vector.iter().all(|x| *x == 0.0) {
            "zero vector".to_string()
        } else {
            continue;
        };
        return Err(ProviderError::InvalidEmbedding { index, reason });
    }
    Ok(())
}

/// Embedding-based similarity engine
#[derive(Debug, Clone)]
pub struct EmbeddingSimilarityEngine {
    model: Arc<dyn EmbeddingModel>,
    threshold: f64,
}

impl EmbeddingSimilarityEngine {
    /// Create an engine with the given threshold
    pub fn new(model: Arc<dyn EmbeddingModel>, threshold: f64) -> Self {
        Self { model, threshold }
    }

    /// Similarity threshold in use
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Remove near-duplicates from `documents`.
    ///
    /// Never fails: if the embedding model is unavailable every document is kept.
    pub async fn dedup<R: Rng>(&self, documents: Vec<Document>, rng: &mut R) -> DedupOutcome {
        let mut report = DedupReport {
            input_count: documents.len(),
            ..Default::default()
        };

        let valid: Vec<usize> = documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| doc.usable_summary().is_some())
            .map(|(index, _)| index)
            .collect();
        report.valid_count = valid.len();

        if valid.len() < 2 {
            debug!("Fewer than two usable summaries, nothing to compare");
            report.skipped = Some("fewer than two usable summaries".to_string());
            return Self::unchanged(documents, report);
        }

        let summaries: Vec<String> = valid
            .iter()
            .filter_map(|&index| documents[index].usable_summary().map(str::to_string))
            .collect();

        let embeddings = match self.embed(&summaries).await {
            Ok(embeddings) => embeddings,
            Err(e) => {
                warn!("Embedding failed, skipping deduplication: {}", e);
                report.skipped = Some(format!("embedding failed: {}", e));
                return Self::unchanged(documents, report);
            }
        };

        let matrix = SimilarityMatrix::from_embeddings(&embeddings);
        report.conflicting_pairs = matrix.conflicting_pairs(self.threshold).len();
        if report.conflicting_pairs == 0 {
            debug!("No summaries above similarity {}", self.threshold);
            return Self::unchanged(documents, report);
        }

        let survivors = select_survivors(&matrix, self.threshold, rng);
        let mut removed_flags = vec![false; documents.len()];
        for (position, &index) in valid.iter().enumerate() {
            removed_flags[index] = !survivors[position];
        }

        let mut kept = Vec::with_capacity(documents.len());
        let mut removed = Vec::new();
        for (doc, is_removed) in documents.into_iter().zip(removed_flags) {
            if is_removed {
                report.removed_ids.push(doc.id);
                removed.push(doc);
            } else {
                kept.push(doc);
            }
        }

        info!(
            "Deduplication removed {} of {} document(s) ({} conflicting pair(s) above {})",
            removed.len(),
            report.input_count,
            report.conflicting_pairs,
            self.threshold
        );

        DedupOutcome { kept, removed, report }
    }

    async fn embed(&self, summaries: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let embeddings = self.model.embed(summaries).await?;
        if embeddings.len() != summaries.len() {
            return Err(ProviderError::EmbeddingCountMismatch {
                expected: summaries.len(),
                actual: embeddings.len(),
            });
        }
        check_embeddings(&embeddings)?;
        Ok(embeddings)
    }

    fn unchanged(documents: Vec<Document>, report: DedupReport) -> DedupOutcome {
        DedupOutcome {
            kept: documents,
            removed: Vec::new(),
            report,
        }
    }
}
