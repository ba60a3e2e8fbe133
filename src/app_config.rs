use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::language_utils::{language_codes_match, validate_language_code};
use crate::pipeline::PipelineConfig;
use crate::translation::RetryPolicy;

/// Application configuration module
///
/// Loaded from a JSON file, overridden from the command line, then validated
/// before anything talks to a model.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language of the ingested articles (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Language the models work in (ISO)
    #[serde(default = "default_pivot_language")]
    pub pivot_language: String,

    /// Model backend
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Stage limits and delays
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Ingestion filter
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Ollama backend configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Service endpoint URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Model used for translation
    #[serde(default = "default_translation_model")]
    pub translation_model: String,

    /// Model used for summaries
    #[serde(default = "default_summary_model")]
    pub summary_model: String,

    /// Model used for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            translation_model: default_translation_model(),
            summary_model: default_summary_model(),
            embedding_model: default_embedding_model(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

/// Stage limits, retry timing and concurrency
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineSettings {
    /// Cosine similarity above which two summaries are duplicates
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Maximum translation chunk size in characters
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Attempts per translation chunk
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Lower summary length bound in tokens
    #[serde(default = "default_min_summary_tokens")]
    pub min_summary_tokens: u32,

    /// Upper summary length bound in tokens
    #[serde(default = "default_max_summary_tokens")]
    pub max_summary_tokens: u32,

    /// Summarization input budget in characters
    #[serde(default = "default_summary_input_chars")]
    pub summary_input_chars: usize,

    /// Backoff unit in milliseconds, doubled on each retry
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Lower bound of the random delay before each translation call
    #[serde(default = "default_jitter_min_ms")]
    pub jitter_min_ms: u64,

    /// Upper bound of the random delay before each translation call
    #[serde(default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,

    /// Documents processed at the same time
    #[serde(default = "default_concurrency")]
    pub concurrent_documents: usize,

    /// Chunks of one document translated at the same time
    #[serde(default = "default_concurrency")]
    pub concurrent_chunks: usize,

    /// Fixed seed for dedup tie-breaks
    #[serde(default)]
    pub dedup_seed: Option<u64>,

    /// Reuse translations of identical chunks within a run
    #[serde(default = "default_true")]
    pub enable_cache: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            max_chunk_chars: default_max_chunk_chars(),
            max_attempts: default_max_attempts(),
            min_summary_tokens: default_min_summary_tokens(),
            max_summary_tokens: default_max_summary_tokens(),
            summary_input_chars: default_summary_input_chars(),
            backoff_base_ms: default_backoff_base_ms(),
            jitter_min_ms: default_jitter_min_ms(),
            jitter_max_ms: default_jitter_max_ms(),
            concurrent_documents: default_concurrency(),
            concurrent_chunks: default_concurrency(),
            dedup_seed: None,
            enable_cache: true,
        }
    }
}

impl PipelineSettings {
    /// Retry policy for translation chunks
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_unit: Duration::from_millis(self.backoff_base_ms),
            jitter_min: Duration::from_millis(self.jitter_min_ms),
            jitter_max: Duration::from_millis(self.jitter_max_ms),
        }
    }
}

/// Ingestion filter configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IngestConfig {
    /// Articles whose link contains one of these are discarded
    #[serde(default = "default_excluded_link_keywords")]
    pub excluded_link_keywords: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            excluded_link_keywords: default_excluded_link_keywords(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "pt".to_string()
}

fn default_pivot_language() -> String {
    "en".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_translation_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_summary_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.2
}

fn default_similarity_threshold() -> f64 {
    0.7
}

fn default_max_chunk_chars() -> usize {
    4000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_min_summary_tokens() -> u32 {
    50
}

fn default_max_summary_tokens() -> u32 {
    200
}

fn default_summary_input_chars() -> usize {
    10_000
}

fn default_backoff_base_ms() -> u64 {
    1000 // doubled on each retry
}

fn default_jitter_min_ms() -> u64 {
    500
}

fn default_jitter_max_ms() -> u64 {
    2000
}

fn default_concurrency() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_excluded_link_keywords() -> Vec<String> {
    [
        "patrocinado",
        "day-trade",
        "conteudo-de-marca",
        "xpromo",
        "empiricus",
        "eleicoes",
        "prefeito",
        "eleicao",
        "eleito",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        validate_language_code(&self.source_language)
            .context("Invalid source language")?;
        validate_language_code(&self.pivot_language)
            .context("Invalid pivot language")?;
        if language_codes_match(&self.source_language, &self.pivot_language) {
            return Err(anyhow!(
                "Pivot language '{}' is the same as source language '{}'",
                self.pivot_language,
                self.source_language
            ));
        }

        if self.provider.endpoint.trim().is_empty() {
            return Err(anyhow!("Provider endpoint must not be empty"));
        }

        let p = &self.pipeline;
        if !(-1.0..=1.0).contains(&p.similarity_threshold) {
            return Err(anyhow!(
                "Similarity threshold must be within [-1, 1], got {}",
                p.similarity_threshold
            ));
        }
        if p.max_chunk_chars == 0 {
            return Err(anyhow!("max_chunk_chars must be greater than 0"));
        }
        if p.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be greater than 0"));
        }
        if p.min_summary_tokens > p.max_summary_tokens {
            return Err(anyhow!(
                "min_summary_tokens ({}) exceeds max_summary_tokens ({})",
                p.min_summary_tokens,
                p.max_summary_tokens
            ));
        }
        if p.summary_input_chars == 0 {
            return Err(anyhow!("summary_input_chars must be greater than 0"));
        }
        if p.jitter_min_ms > p.jitter_max_ms {
            return Err(anyhow!(
                "jitter_min_ms ({}) exceeds jitter_max_ms ({})",
                p.jitter_min_ms,
                p.jitter_max_ms
            ));
        }

        Ok(())
    }

    /// Orchestrator settings
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new(&self.source_language, &self.pivot_language)
            .with_summary_tokens(
                self.pipeline.min_summary_tokens,
                self.pipeline.max_summary_tokens,
            )
            .with_concurrent_documents(self.pipeline.concurrent_documents)
            .with_seed(self.pipeline.dedup_seed)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            pivot_language: default_pivot_language(),
            provider: ProviderConfig::default(),
            pipeline: PipelineSettings::default(),
            ingest: IngestConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
