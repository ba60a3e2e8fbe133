use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::document::IngestFilter;
use crate::file_utils::FileManager;
use crate::pipeline::{PipelineOrchestrator, PipelineProgress, PipelineStage, ReadingStats};
use crate::providers::ollama::Ollama;
use crate::providers::{EmbeddingModel, SummarizationModel, TranslationService};
use crate::similarity::EmbeddingSimilarityEngine;
use crate::summarization::SummarizationStage;
use crate::translation::{TranslationCache, TranslationStage};

/// Main application controller: load articles, run the pipeline, save the digest
pub struct Controller {
    config: Config,
}

impl Controller {
    /// Create a controller; the configuration is validated first
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the pipeline on top of the configured Ollama server
    pub fn build_orchestrator(&self) -> Result<PipelineOrchestrator> {
        let provider = &self.config.provider;
        let ollama = Ollama::new(&provider.endpoint, provider.timeout_secs)
            .context("Failed to create Ollama client")?
            .with_models(
                &provider.translation_model,
                &provider.summary_model,
                &provider.embedding_model,
            )
            .with_temperature(provider.temperature);
        let ollama = Arc::new(ollama);

        info!(
            "Models: translation {} | summary {} | embedding {} @ {}",
            provider.translation_model,
            provider.summary_model,
            provider.embedding_model,
            ollama.base_url()
        );

        Ok(self.build_orchestrator_with(ollama.clone(), ollama.clone(), ollama))
    }

    /// Build the pipeline on top of arbitrary capability implementations
    pub fn build_orchestrator_with(
        &self,
        translator: Arc<dyn TranslationService>,
        summarizer: Arc<dyn SummarizationModel>,
        embedder: Arc<dyn EmbeddingModel>,
    ) -> PipelineOrchestrator {
        let settings = &self.config.pipeline;
        let translation = TranslationStage::new(translator)
            .with_retry_policy(settings.retry_policy())
            .with_max_chunk_chars(settings.max_chunk_chars)
            .with_concurrent_chunks(settings.concurrent_chunks)
            .with_cache(TranslationCache::new(settings.enable_cache));
        let summarization =
            SummarizationStage::new(summarizer).with_input_chars(settings.summary_input_chars);
        let similarity = EmbeddingSimilarityEngine::new(embedder, settings.similarity_threshold);

        PipelineOrchestrator::new(
            self.config.pipeline_config(),
            translation,
            summarization,
            similarity,
        )
    }

    /// Run the whole workflow against the configured backend; returns the digest path
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, write_report: bool) -> Result<PathBuf> {
        let orchestrator = self.build_orchestrator()?;
        self.run_with(orchestrator, &input_file, &output_dir, write_report)
            .await
    }

    /// Run the workflow with a prepared orchestrator
    pub async fn run_with(
        &self,
        orchestrator: PipelineOrchestrator,
        input_file: &Path,
        output_dir: &Path,
        write_report: bool,
    ) -> Result<PathBuf> {
        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        FileManager::ensure_dir(output_dir)?;

        let filter = IngestFilter::new(&self.config.ingest.excluded_link_keywords);
        let documents = FileManager::load_documents(input_file, &filter)?;
        if documents.is_empty() {
            warn!("No articles left to process after filtering");
        }

        let multi_progress = MultiProgress::new();
        let bars = StageBars::new(&multi_progress, documents.len() as u64);
        let callback_bars = bars.clone();
        let orchestrator =
            orchestrator.with_progress_callback(move |progress| callback_bars.update(progress));

        let output = orchestrator.run(documents).await;
        bars.finish();

        let report = write_report.then_some(&output.report);
        let digest = FileManager::save_digest(output_dir, &output.documents, report)?;

        let reading = &output.report.reading;
        let (read_min, read_sec) = ReadingStats::minutes_and_seconds(reading.summary_minutes);
        let (saved_min, saved_sec) = ReadingStats::minutes_and_seconds(reading.minutes_saved);
        info!(
            "Estimated reading time: {} min {} s (saved {} min {} s)",
            read_min, read_sec, saved_min, saved_sec
        );
        for (segment, count) in &output.report.segments {
            info!("  {}: {}", segment, count);
        }
        info!(
            "Success: {} ({} article(s), {})",
            digest.display(),
            output.documents.len(),
            Self::format_duration(output.report.elapsed_ms)
        );

        Ok(digest)
    }

    // Format duration in a human-readable format
    fn format_duration(elapsed_ms: u64) -> String {
        let total_seconds = elapsed_ms / 1000;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, elapsed_ms % 1000)
        }
    }
}

/// One progress bar per per-document stage
#[derive(Clone)]
struct StageBars {
    translate: ProgressBar,
    summarize: ProgressBar,
    back_translate: ProgressBar,
}

impl StageBars {
    fn new(multi_progress: &MultiProgress, total: u64) -> Self {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{bar:40}] {pos}/{len} {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░");

        let bar = |message: &'static str| {
            let bar = multi_progress.add(ProgressBar::new(total));
            bar.set_style(style.clone());
            bar.set_message(message);
            bar
        };

        Self {
            translate: bar("translating"),
            summarize: bar("summarizing"),
            back_translate: bar("back-translating"),
        }
    }

    fn update(&self, progress: PipelineProgress) {
        let bar = match progress.stage {
            PipelineStage::Translate => &self.translate,
            PipelineStage::Summarize => &self.summarize,
            PipelineStage::BackTranslate => &self.back_translate,
            PipelineStage::Dedup | PipelineStage::Finalize => return,
        };
        bar.set_length(progress.total as u64);
        bar.set_position(progress.processed as u64);
    }

    fn finish(&self) {
        self.translate.finish_and_clear();
        self.summarize.finish_and_clear();
        self.back_translate.finish_and_clear();
    }
}
