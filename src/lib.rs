/*!
 * # newsdigest
 *
 * A batch pipeline that turns a day's scraped news articles into a short,
 * de-duplicated digest in the articles' own language.
 *
 * ## Features
 *
 * - Chunked source-to-pivot translation with bounded retries and jitter
 * - Abstractive summarization in the pivot language
 * - Near-duplicate removal over summary embeddings
 * - Back-translation of the surviving summaries
 * - Per-document failure isolation with typed stage results
 * - Reading-time statistics for the final digest
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: The article record, its state machine and the ingestion filter
 * - `providers`: Capability traits for the external models and their backends:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::mock`: scripted providers for tests
 * - `translation`: Chunking, the retrying translation stage and back-translation
 * - `summarization`: The summarization stage
 * - `similarity`: Cosine similarity matrix and the dedup engine
 * - `pipeline`: Stage graph, batch barrier, orchestrator and run report
 * - `file_utils`: JSON input and digest output
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod pipeline;
pub mod providers;
pub mod similarity;
pub mod summarization;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use document::{Document, DocumentState};
pub use errors::{AppError, ProviderError, StageFailure};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use pipeline::{PipelineConfig, PipelineOrchestrator, PipelineOutput, PipelineReport};
pub use similarity::EmbeddingSimilarityEngine;
pub use summarization::SummarizationStage;
pub use translation::{BackTranslationStage, TextChunker, TranslationStage};
