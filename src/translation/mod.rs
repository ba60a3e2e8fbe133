/*!
 * Chunked, retrying translation.
 *
 * - `chunker`: bounded-size text splitting
 * - `core`: the translation stage, retry policy and direction
 * - `back_translation`: the same stage run from pivot back to source
 * - `cache`: per-run chunk cache shared by both directions
 */

pub use self::back_translation::BackTranslationStage;
pub use self::cache::{CacheStats, TranslationCache};
pub use self::chunker::TextChunker;
pub use self::core::{Direction, RetryPolicy, TranslationOutcome, TranslationStage};

pub mod back_translation;
pub mod cache;
pub mod chunker;
pub mod core;
