/*!
 * Tests for the summarization stage
 */

use std::sync::Arc;

use newsdigest::errors::StageFailure;
use newsdigest::providers::mock::{MockBehavior, MockSummarizer};
use newsdigest::summarization::{SummarizationStage, clean_summary, truncate_chars};

/// Test that model output is cleaned
#[tokio::test]
async fn test_summarize_should_strip_label_and_whitespace() {
    let model = MockSummarizer::working().with_script(&[("oil", "Summary:  Oil   prices\nrise. ")]);
    let stage = SummarizationStage::new(Arc::new(model));

    let summary = stage.summarize(Some("oil news"), 50, 200).await;
    assert_eq!(summary, "Oil prices rise.");
}

/// Test that input beyond the budget is cut before the call
#[tokio::test]
async fn test_summarize_with_long_input_should_truncate() {
    let model = MockSummarizer::working();
    let stage = SummarizationStage::new(Arc::new(model.clone())).with_input_chars(10_000);

    let text = "á".repeat(12_000);
    let _ = stage.summarize(Some(&text), 50, 200).await;
    assert_eq!(model.last_input_chars(), 10_000);
}

/// Test that unusable input skips the model
#[tokio::test]
async fn test_summarize_with_blank_input_should_skip_model() {
    let model = MockSummarizer::working();
    let stage = SummarizationStage::new(Arc::new(model.clone()));

    assert_eq!(stage.summarize(None, 50, 200).await, "");
    assert_eq!(
        stage.summarize_detailed(Some("   "), 50, 200).await,
        Err(StageFailure::UnusableInput)
    );
    assert_eq!(model.request_count(), 0);
}

/// Test that model errors and empty answers become the sentinel
#[tokio::test]
async fn test_summarize_with_failing_model_should_return_empty() {
    let failing = SummarizationStage::new(Arc::new(MockSummarizer::failing()));
    assert!(matches!(
        failing.summarize_detailed(Some("texto"), 50, 200).await,
        Err(StageFailure::Provider(_))
    ));
    assert_eq!(failing.summarize(Some("texto"), 50, 200).await, "");

    let empty = SummarizationStage::new(Arc::new(MockSummarizer::new(MockBehavior::Empty)));
    assert_eq!(
        empty.summarize_detailed(Some("texto"), 50, 200).await,
        Err(StageFailure::EmptyOutput)
    );
}

/// Test the text helpers directly
#[test]
fn test_text_helpers_should_respect_char_boundaries() {
    assert_eq!(truncate_chars("ação", 2), "aç");
    assert_eq!(truncate_chars("ação", 10), "ação");
    assert_eq!(clean_summary("resumo: Bolsa fecha em alta"), "Bolsa fecha em alta");
    assert_eq!(clean_summary("  \n "), "");
}
