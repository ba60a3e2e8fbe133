/*!
 * Summary similarity and near-duplicate elimination.
 */

pub use self::engine::{
    DEFAULT_SIMILARITY_THRESHOLD, DedupOutcome, DedupReport, EmbeddingSimilarityEngine,
    select_survivors,
};
pub use self::matrix::{SimilarityMatrix, cosine_similarity};

pub mod engine;
pub mod matrix;
