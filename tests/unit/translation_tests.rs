/*!
 * Tests for the retrying translation stage and back-translation
 */

use std::sync::Arc;

use newsdigest::errors::StageFailure;
use newsdigest::providers::mock::MockTranslator;
use newsdigest::translation::{
    BackTranslationStage, Direction, RetryPolicy, TranslationCache, TranslationStage,
};

fn stage(translator: &MockTranslator, chunk_chars: usize) -> TranslationStage {
    TranslationStage::new(Arc::new(translator.clone()))
        .with_retry_policy(RetryPolicy::immediate(3))
        .with_max_chunk_chars(chunk_chars)
}

/// Test that each chunk is translated and joined with a space
#[tokio::test]
async fn test_translate_with_long_text_should_join_chunks() {
    let translator = MockTranslator::working();
    let out = stage(&translator, 4)
        .translate(Some("juro alto"), &Direction::new("pt", "en"))
        .await;

    assert_eq!(out, "[en] juro [en]  alt [en] o");
    assert_eq!(translator.calls(), vec!["juro", " alt", "o"]);
}

/// Test that absent input returns the sentinel without calling the service
#[tokio::test]
async fn test_translate_with_absent_text_should_not_call_service() {
    let translator = MockTranslator::working();
    let stage = stage(&translator, 10);
    let direction = Direction::new("pt", "en");

    assert_eq!(stage.translate(None, &direction).await, "");
    assert_eq!(
        stage.translate_detailed(Some(" \n "), &direction).await,
        Err(StageFailure::UnusableInput)
    );
    assert_eq!(translator.request_count(), 0);
}

/// Test that a service that never answers yields the empty sentinel
#[tokio::test]
async fn test_translate_with_failing_service_should_return_empty() {
    let translator = MockTranslator::failing();
    let stage = stage(&translator, 100);
    let direction = Direction::new("pt", "en");

    assert_eq!(
        stage.translate_detailed(Some("texto"), &direction).await,
        Err(StageFailure::AllChunksFailed { chunks: 1 })
    );
    assert_eq!(stage.translate(Some("texto"), &direction).await, "");
    assert_eq!(translator.request_count(), 6);
}

/// Test that a lost chunk in a concurrent run leaves its neighbours in order
#[tokio::test]
async fn test_translate_detailed_with_concurrent_chunks_should_drop_only_failed_one() {
    let translator = MockTranslator::working()
        .poisoned(&["bbb"])
        .with_delays(&[("aaa", 40)]);
    let stage = stage(&translator, 3)
        .with_concurrent_chunks(4)
        .with_cache(TranslationCache::new(true));

    let outcome = stage
        .translate_detailed(Some("aaabbbcccaaa"), &Direction::new("pt", "en"))
        .await
        .unwrap();

    assert_eq!(outcome.text, "[en] aaa [en] ccc [en] aaa");
    assert_eq!(outcome.chunks_total, 4);
    assert_eq!(outcome.chunks_dropped, 1);
    // Failures are never cached
    assert_eq!(stage.cache().len(), 2);
}

/// Test that back-translation goes pivot to source
#[tokio::test]
async fn test_back_translate_should_reverse_direction() {
    let translator = MockTranslator::working();
    let back = BackTranslationStage::new(stage(&translator, 100), &Direction::new("pt", "en"));

    assert_eq!(back.direction(), &Direction::new("en", "pt"));
    assert_eq!(back.back_translate(Some("Oil rises")).await, "[pt] Oil rises");
    assert_eq!(back.back_translate(Some("")).await, "");
    assert_eq!(translator.request_count(), 1);
}
