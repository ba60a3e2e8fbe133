/*!
 * Tests for the similarity matrix and near-duplicate elimination
 */

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

use newsdigest::document::Document;
use newsdigest::errors::ProviderError;
use newsdigest::providers::EmbeddingModel;
use newsdigest::providers::mock::MockEmbedder;
use newsdigest::similarity::{
    EmbeddingSimilarityEngine, SimilarityMatrix, cosine_similarity, select_survivors,
};
use crate::common;

/// Embedder that loses one vector per batch
#[derive(Debug)]
struct ShortEmbedder;

#[async_trait]
impl EmbeddingModel for ShortEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().skip(1).map(|_| vec![1.0, 0.0]).collect())
    }
}

fn summarized(slug: &str, summary: &str) -> Document {
    let mut doc = common::article(slug, "Empresas", Some("texto"));
    doc.record_translation("text".to_string()).unwrap();
    doc.record_summary(summary.to_string()).unwrap();
    doc
}

/// Test that matrix entries are the cosine of the angle between unit vectors
#[test]
fn test_matrix_from_embeddings_should_match_angles() {
    let angles = [0.0f32, 0.5, 1.2];
    let embeddings: Vec<Vec<f32>> = angles.iter().map(|a| common::planar(*a)).collect();
    let matrix = SimilarityMatrix::from_embeddings(&embeddings);

    for i in 0..3 {
        for j in 0..3 {
            let expected = (angles[i] - angles[j]).cos() as f64;
            assert!((matrix.get(i, j).unwrap() - expected).abs() < 1e-5);
            assert!((cosine_similarity(&embeddings[i], &embeddings[j]) - expected).abs() < 1e-5);
        }
    }
}

/// Test that two independent duplicate pairs each keep one member
#[test]
fn test_select_survivors_with_two_pairs_should_keep_one_of_each() {
    // A-B 0.9, C-D 0.75, everything else 0.1
    let matrix = SimilarityMatrix::from_upper(4, vec![0.9, 0.1, 0.1, 0.1, 0.1, 0.75]).unwrap();
    assert_eq!(matrix.conflicting_pairs(0.7), vec![(0, 1), (2, 3)]);

    for seed in 0..32 {
        let keep = select_survivors(&matrix, 0.7, &mut StdRng::seed_from_u64(seed));
        assert!(keep[0] ^ keep[1]);
        assert!(keep[2] ^ keep[3]);
    }
}

/// Test that no two survivors stay above the threshold
#[test]
fn test_select_survivors_should_leave_no_conflict() {
    let matrix = SimilarityMatrix::from_upper(5, vec![
        0.9, 0.8, 0.2, 0.75, //
        0.85, 0.1, 0.3, //
        0.72, 0.2, //
        0.95,
    ])
    .unwrap();

    for seed in 0..64 {
        let keep = select_survivors(&matrix, 0.7, &mut StdRng::seed_from_u64(seed));
        for i in 0..5 {
            for j in (i + 1)..5 {
                if keep[i] && keep[j] {
                    assert!(matrix.get(i, j).unwrap() <= 0.7, "seed {} kept {} and {}", seed, i, j);
                }
            }
        }
        assert!(keep.iter().any(|k| *k));
    }
}

/// Test that the same seed gives the same survivors
#[test]
fn test_select_survivors_with_same_seed_should_be_reproducible() {
    let matrix = SimilarityMatrix::from_upper(3, vec![0.9, 0.9, 0.9]).unwrap();
    let first = select_survivors(&matrix, 0.7, &mut StdRng::seed_from_u64(11));
    let second = select_survivors(&matrix, 0.7, &mut StdRng::seed_from_u64(11));
    assert_eq!(first, second);
    assert_eq!(first.iter().filter(|k| **k).count(), 1);
}

/// Test that a value equal to the threshold is not a conflict
#[test]
fn test_conflicting_pairs_should_use_strict_comparison() {
    let matrix = SimilarityMatrix::from_upper(2, vec![0.7]).unwrap();
    assert!(matrix.conflicting_pairs(0.7).is_empty());
    assert_eq!(matrix.conflicting_pairs(0.69), vec![(0, 1)]);
}

/// Test that documents without a usable summary bypass comparison
#[tokio::test]
async fn test_dedup_should_pass_through_unsummarized_documents() {
    let embedder = MockEmbedder::with_vectors(&[
        ("oil up", common::planar(0.0)),
        ("oil higher", common::planar(0.1)),
    ]);
    let engine = EmbeddingSimilarityEngine::new(Arc::new(embedder.clone()), 0.7);

    let docs = vec![
        summarized("a", "oil up"),
        summarized("b", ""),
        summarized("c", "oil higher"),
    ];
    let outcome = engine.dedup(docs, &mut StdRng::seed_from_u64(3)).await;

    assert_eq!(outcome.kept.len(), 2);
    assert_eq!(outcome.removed.len(), 1);
    assert!(outcome.kept.iter().any(|d| d.link.ends_with("/b")));
    assert_eq!(embedder.batches(), vec![vec!["oil up".to_string(), "oil higher".to_string()]]);
    assert_eq!(outcome.report.valid_count, 2);
    assert_eq!(outcome.report.removed_ids, vec![outcome.removed[0].id]);
}

/// Test that a short embedding batch leaves the documents untouched
#[tokio::test]
async fn test_dedup_with_count_mismatch_should_keep_everything() {
    let engine = EmbeddingSimilarityEngine::new(Arc::new(ShortEmbedder), 0.7);
    let docs = vec![summarized("a", "x"), summarized("b", "y")];

    let outcome = engine.dedup(docs, &mut StdRng::seed_from_u64(0)).await;
    assert_eq!(outcome.kept.len(), 2);
    assert!(outcome.removed.is_empty());
    assert!(outcome.report.skipped.is_some());
}

/// Test that vectors of different length are a model failure, not a dissimilar pair
#[tokio::test]
async fn test_dedup_with_mixed_dimensions_should_keep_everything_and_say_why() {
    let embedder = MockEmbedder::with_vectors(&[
        ("oil up", vec![1.0, 0.0]),
        ("oil higher", vec![1.0, 0.0, 0.0]),
    ]);
    let engine = EmbeddingSimilarityEngine::new(Arc::new(embedder), 0.7);
    let docs = vec![summarized("a", "oil up"), summarized("b", "oil higher")];

    let outcome = engine.dedup(docs, &mut StdRng::seed_from_u64(0)).await;
    assert_eq!(outcome.kept.len(), 2);
    assert!(outcome.removed.is_empty());
    assert_eq!(outcome.report.conflicting_pairs, 0);
    let reason = outcome.report.skipped.unwrap();
    assert!(reason.contains("Invalid embedding at position 1"), "{}", reason);
}

/// Test that a zero vector is rejected the same way
#[tokio::test]
async fn test_dedup_with_zero_vector_should_skip_comparison() {
    let embedder = MockEmbedder::with_vectors(&[
        ("oil up", common::planar(0.0)),
        ("oil higher", vec![0.0; 4]),
    ]);
    let engine = EmbeddingSimilarityEngine::new(Arc::new(embedder), 0.7);
    let docs = vec![summarized("a", "oil up"), summarized("b", "oil higher")];

    let outcome = engine.dedup(docs, &mut StdRng::seed_from_u64(0)).await;
    assert_eq!(outcome.kept.len(), 2);
    assert!(outcome.report.skipped.is_some());
}

/// Test that unrelated summaries pass through untouched and in order
#[tokio::test]
async fn test_dedup_without_conflicts_should_return_input_unchanged() {
    let embedder = MockEmbedder::with_vectors(&[
        ("oil up", common::planar(0.0)),
        ("bitcoin down", common::planar(1.2)),
        ("rates on hold", common::offset_in_second_plane(1.0)),
    ]);
    let engine = EmbeddingSimilarityEngine::new(Arc::new(embedder), 0.7);
    let docs = vec![
        summarized("a", "oil up"),
        summarized("b", "bitcoin down"),
        summarized("c", "rates on hold"),
    ];

    let outcome = engine.dedup(docs.clone(), &mut StdRng::seed_from_u64(5)).await;
    assert_eq!(outcome.kept, docs);
    assert!(outcome.removed.is_empty());
    assert_eq!(outcome.report.conflicting_pairs, 0);
    assert!(outcome.report.skipped.is_none());
    assert!(outcome.report.removed_ids.is_empty());
}
