/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use std::sync::Arc;

use newsdigest::app_config::Config;
use newsdigest::app_controller::Controller;
use newsdigest::document::{Document, DocumentState};
use newsdigest::file_utils::FileManager;
use newsdigest::providers::mock::{MockEmbedder, MockSummarizer, MockTranslator};
use crate::common;

fn quiet_config() -> Config {
    let mut config = Config::default();
    config.pipeline.backoff_base_ms = 0;
    config.pipeline.jitter_min_ms = 0;
    config.pipeline.jitter_max_ms = 0;
    config.pipeline.dedup_seed = Some(1);
    config
}

/// Test the controller initialization with default config
#[test]
fn test_controller_with_default_config_should_build_pipeline() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;
    let orchestrator = controller.build_orchestrator()?;
    assert_eq!(orchestrator.config().source_language, "pt");
    assert_eq!(orchestrator.config().pivot_language, "en");
    Ok(())
}

/// Test a full run from the input file to the digest on disk
#[tokio::test]
async fn test_run_with_mock_providers_should_write_digest() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(
        temp_dir.path(),
        "articles.json",
        common::sample_articles_json(),
    )?;
    let out_dir = temp_dir.path().join("digests");

    let controller = Controller::with_config(quiet_config())?;
    let orchestrator = controller.build_orchestrator_with(
        Arc::new(MockTranslator::working()),
        Arc::new(MockSummarizer::working()),
        Arc::new(MockEmbedder::failing()),
    );

    let digest = controller.run_with(orchestrator, &input, &out_dir, true).await?;

    let written: Vec<Document> = serde_json::from_str(&FileManager::read_to_string(&digest)?)?;
    // The sponsored link is filtered at ingestion
    assert_eq!(written.len(), 4);
    assert!(written.iter().all(|d| d.state == DocumentState::Final));
    assert_eq!(
        written[0].summary_source_lang.as_deref(),
        Some("[pt] [en] Petróleo sobe forte")
    );
    assert_eq!(written[3].summary_source_lang.as_deref(), Some(""));

    let report: serde_json::Value =
        serde_json::from_str(&FileManager::read_to_string(FileManager::report_path(&digest))?)?;
    assert_eq!(report["total_documents"], 4);
    assert_eq!(report["translation_failures"], 1);
    Ok(())
}

/// Test that the report is only written on request
#[tokio::test]
async fn test_run_without_report_flag_should_write_digest_only() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "articles.json", "[]")?;

    let controller = Controller::with_config(quiet_config())?;
    let orchestrator = controller.build_orchestrator_with(
        Arc::new(MockTranslator::working()),
        Arc::new(MockSummarizer::working()),
        Arc::new(MockEmbedder::failing()),
    );

    let digest = controller
        .run_with(orchestrator, &input, temp_dir.path(), false)
        .await?;

    assert!(FileManager::file_exists(&digest));
    assert!(!FileManager::file_exists(FileManager::report_path(&digest)));
    Ok(())
}

/// Test that a missing input file is reported
#[test]
fn test_run_with_missing_input_should_fail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_config(quiet_config())?;
    let orchestrator = controller.build_orchestrator_with(
        Arc::new(MockTranslator::working()),
        Arc::new(MockSummarizer::working()),
        Arc::new(MockEmbedder::failing()),
    );

    let missing = temp_dir.path().join("missing.json");
    let result = tokio_test::block_on(async {
        controller
            .run_with(orchestrator, &missing, temp_dir.path(), false)
            .await
    });
    assert!(result.is_err());
    Ok(())
}
