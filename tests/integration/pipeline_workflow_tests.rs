/*!
 * End-to-end pipeline runs over mock providers
 */

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

use newsdigest::document::{Document, DocumentState};
use newsdigest::errors::StageFailure;
use newsdigest::pipeline::{PipelineConfig, PipelineOrchestrator, StageResult};
use newsdigest::providers::mock::{MockEmbedder, MockSummarizer, MockTranslator};
use crate::common;

fn four_stories() -> Vec<Document> {
    vec![
        common::article("a", "Empresas", Some("alpha petróleo sobe")),
        common::article("b", "Empresas", Some("beta petróleo em alta")),
        common::article("c", "Bitcoin", Some("gamma bitcoin cai")),
        common::article("d", "Bitcoin", Some("delta bitcoin recua")),
    ]
}

fn story_summarizer() -> MockSummarizer {
    MockSummarizer::working().with_script(&[
        ("alpha", "summary a"),
        ("beta", "summary b"),
        ("gamma", "summary c"),
        ("delta", "summary d"),
    ])
}

/// A-B at 0.9, C-D at 0.75, cross pairs at 0
fn story_embedder() -> MockEmbedder {
    MockEmbedder::with_vectors(&[
        ("summary a", common::planar(0.0)),
        ("summary b", common::planar(0.9f32.acos())),
        ("summary c", vec![0.0, 0.0, 1.0, 0.0]),
        ("summary d", common::offset_in_second_plane(0.75)),
    ])
}

fn story_pipeline(embedder: MockEmbedder) -> PipelineOrchestrator {
    common::orchestrator(
        PipelineConfig::new("pt", "en"),
        Arc::new(MockTranslator::working()),
        Arc::new(story_summarizer()),
        Arc::new(embedder),
        0.7,
    )
}

/// Test that each duplicate pair keeps exactly one member
#[tokio::test]
async fn test_run_with_two_duplicate_pairs_should_keep_two() {
    let pipeline = story_pipeline(story_embedder());

    for seed in 0..8 {
        let output = pipeline
            .run_with_rng(four_stories(), &mut StdRng::seed_from_u64(seed))
            .await;

        assert_eq!(output.documents.len(), 2);
        assert_eq!(output.dropped.len(), 2);
        let kept: Vec<&str> = output.documents.iter().map(|d| d.title.as_str()).collect();
        assert!(kept.contains(&"Title a") ^ kept.contains(&"Title b"));
        assert!(kept.contains(&"Title c") ^ kept.contains(&"Title d"));

        assert!(output.documents.iter().all(|d| d.state == DocumentState::Final));
        assert!(output.dropped.iter().all(|d| d.state == DocumentState::Dropped));
        assert_eq!(output.report.dedup.conflicting_pairs, 2);
        assert_eq!(output.report.dropped_documents, 2);
        assert_eq!(output.report.kept_documents, 2);
    }
}

/// Test that survivors carry every intermediate field
#[tokio::test]
async fn test_run_should_fill_every_stage_field() {
    let pipeline = story_pipeline(story_embedder());
    let output = pipeline
        .run_with_rng(four_stories(), &mut StdRng::seed_from_u64(1))
        .await;

    for doc in &output.documents {
        let summary = doc.summary_translated.as_deref().unwrap();
        assert!(doc.translated_text.as_deref().unwrap().starts_with("[en] "));
        assert_eq!(
            doc.summary_source_lang.as_deref(),
            Some(format!("[pt] {}", summary).as_str())
        );
    }
    assert_eq!(output.report.segments.get("Empresas"), Some(&1));
    assert_eq!(output.report.segments.get("Bitcoin"), Some(&1));
}

/// Test that an embedding outage keeps every document
#[tokio::test]
async fn test_run_with_failing_embedder_should_keep_everything() {
    let pipeline = story_pipeline(MockEmbedder::failing());
    let output = pipeline
        .run_with_rng(four_stories(), &mut StdRng::seed_from_u64(0))
        .await;

    assert_eq!(output.documents.len(), 4);
    assert!(output.dropped.is_empty());
    assert!(output.report.dedup.skipped.is_some());
    let titles: Vec<&str> = output.documents.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["Title a", "Title b", "Title c", "Title d"]);
}

/// Test that an article without text flows through with empty sentinels
#[tokio::test]
async fn test_run_with_missing_text_should_emit_sentinels() {
    let pipeline = story_pipeline(story_embedder());
    let docs = vec![
        common::article("vazio", "Economia", None),
        common::article("a", "Empresas", Some("alpha petróleo sobe")),
    ];

    let output = pipeline.run_with_rng(docs, &mut StdRng::seed_from_u64(0)).await;

    assert_eq!(output.documents.len(), 2);
    let empty = &output.documents[0];
    assert_eq!(empty.translated_text.as_deref(), Some(""));
    assert_eq!(empty.summary_translated.as_deref(), Some(""));
    assert_eq!(empty.summary_source_lang.as_deref(), Some(""));
    assert_eq!(empty.state, DocumentState::Final);

    let entry = &output.report.documents[0];
    assert_eq!(
        entry.translation,
        StageResult::Failed { failure: StageFailure::UnusableInput }
    );
    assert!(entry.has_failures());
    assert!(!output.report.documents[1].has_failures());
    assert_eq!(output.report.dedup.skipped.as_deref(), Some("fewer than two usable summaries"));
}

/// Test that a dead translation service degrades every field without aborting
#[tokio::test]
async fn test_run_with_failing_translator_should_not_abort() {
    common::init_test_logging();
    let pipeline = common::orchestrator(
        PipelineConfig::new("pt", "en"),
        Arc::new(MockTranslator::failing()),
        Arc::new(MockSummarizer::working()),
        Arc::new(MockEmbedder::failing()),
        0.7,
    );

    let output = pipeline.run(four_stories()).await;

    assert_eq!(output.documents.len(), 4);
    assert_eq!(output.report.translation_failures, 4);
    assert_eq!(output.report.summarization_failures, 4);
    assert_eq!(output.report.back_translation_failures, 4);
    assert!(output
        .documents
        .iter()
        .all(|d| d.summary_source_lang.as_deref() == Some("")));
    assert_eq!(output.report.reading.summary_words, 0);
}

/// Test that a fixed seed reproduces the same digest
#[tokio::test]
async fn test_run_with_seed_should_be_reproducible() {
    let config = PipelineConfig::new("pt", "en").with_seed(Some(17));
    let build = || {
        common::orchestrator(
            config.clone(),
            Arc::new(MockTranslator::working()),
            Arc::new(story_summarizer()),
            Arc::new(story_embedder()),
            0.7,
        )
    };

    let first = build().run(four_stories()).await;
    let second = build().run(four_stories()).await;
    let links = |docs: &[Document]| docs.iter().map(|d| d.link.clone()).collect::<Vec<_>>();
    assert_eq!(links(&first.documents), links(&second.documents));
}

/// Test that concurrent documents still come out in input order
#[tokio::test]
async fn test_run_with_concurrency_should_preserve_input_order() {
    let translator = MockTranslator::working().with_delays(&[("alpha", 60), ("beta", 30)]);
    let pipeline = common::orchestrator(
        PipelineConfig::new("pt", "en").with_concurrent_documents(4),
        Arc::new(translator),
        Arc::new(story_summarizer()),
        Arc::new(MockEmbedder::failing()),
        0.7,
    );

    let output = pipeline.run(four_stories()).await;
    let titles: Vec<&str> = output.documents.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["Title a", "Title b", "Title c", "Title d"]);
    let reported: Vec<&str> = output.report.documents.iter().map(|d| d.link.as_str()).collect();
    assert!(reported[0].ends_with("/a") && reported[3].ends_with("/d"));
}

/// Test the reading-time estimate on a known collection
#[tokio::test]
async fn test_run_should_estimate_reading_time() {
    let pipeline = common::orchestrator(
        PipelineConfig::new("pt", "en"),
        Arc::new(MockTranslator::working()),
        Arc::new(MockSummarizer::working().with_script(&[("palavra", "two words")])),
        Arc::new(MockEmbedder::failing()),
        0.7,
    );
    let body = vec!["palavra"; 360].join(" ");
    let docs = vec![common::article("longo", "Economia", Some(&body))];

    let output = pipeline.run(docs).await;
    let reading = output.report.reading;

    // "[pt] two words"
    assert_eq!(reading.summary_words, 3);
    assert_eq!(reading.article_words, 360);
    assert!((reading.minutes_saved - 357.0 / 180.0).abs() < 1e-9);
}
