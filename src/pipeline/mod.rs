/*!
 * Batch pipeline: translate, summarize, deduplicate, back-translate.
 *
 * - `stage`: stage dependency graph and the barrier before dedup
 * - `report`: typed per-stage results and the run report
 * - `orchestrator`: drives a batch through every stage
 */

pub mod orchestrator;
pub mod report;
pub mod stage;

pub use orchestrator::{
    PipelineConfig, PipelineOrchestrator, PipelineOutput, PipelineProgress, ProgressCallback,
};
pub use report::{DocumentReport, PipelineReport, ReadingStats, StageResult, WORDS_PER_MINUTE};
pub use stage::{PipelineStage, StageBarrier};
