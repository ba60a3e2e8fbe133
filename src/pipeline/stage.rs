/*!
 * Stage dependency graph and the batch barrier in front of deduplication.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Source text to pivot language
    Translate,
    /// Pivot text to pivot summary
    Summarize,
    /// Near-duplicate elimination over the whole batch
    Dedup,
    /// Pivot summary back to the source language
    BackTranslate,
    /// Seal and emit
    Finalize,
}

impl PipelineStage {
    /// All stages in execution order
    pub const ALL: [PipelineStage; 5] = [
        Self::Translate,
        Self::Summarize,
        Self::Dedup,
        Self::BackTranslate,
        Self::Finalize,
    ];

    /// Stages that must be complete before this one starts
    pub fn depends_on(&self) -> &'static [PipelineStage] {
        match self {
            Self::Translate => &[],
            Self::Summarize => &[Self::Translate],
            Self::Dedup => &[Self::Summarize],
            Self::BackTranslate => &[Self::Dedup],
            Self::Finalize => &[Self::BackTranslate],
        }
    }

    /// Whether the stage needs every document, not just its own, to be done
    /// with its dependencies
    pub fn is_batch_barrier(&self) -> bool {
        matches!(self, Self::Dedup)
    }

    /// Check that `order` lists every stage after all of its dependencies
    pub fn is_valid_order(order: &[PipelineStage]) -> bool {
        order.iter().enumerate().all(|(position, stage)| {
            stage
                .depends_on()
                .iter()
                .all(|dep| order[..position].contains(dep))
        })
    }

    /// Short lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Translate => "translate",
            Self::Summarize => "summarize",
            Self::Dedup => "dedup",
            Self::BackTranslate => "back-translate",
            Self::Finalize => "finalize",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Releases waiters once `expected` documents have arrived.
///
/// A document arrives when it has finished summarization, successfully or not.
#[derive(Debug)]
pub struct StageBarrier {
    expected: usize,
    arrived: AtomicUsize,
    notify: Notify,
}

impl StageBarrier {
    /// Create a barrier for a batch of `expected` documents
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            arrived: AtomicUsize::new(0),
            notify: Notify::new(),
        }
    }

    /// Record one arrival; returns the number of arrivals so far
    pub fn arrive(&self) -> usize {
        let arrived = self.arrived.fetch_add(1, Ordering::AcqRel) + 1;
        if arrived >= self.expected {
            self.notify.notify_waiters();
        }
        arrived
    }

    /// Arrivals so far
    pub fn arrived(&self) -> usize {
        self.arrived.load(Ordering::Acquire)
    }

    /// Whether every expected document has arrived
    pub fn is_released(&self) -> bool {
        self.arrived() >= self.expected
    }

    /// Wait until the barrier is released
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_released() {
                return;
            }
            notified.await;
        }
    }
}
