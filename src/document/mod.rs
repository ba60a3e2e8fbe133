/*!
 * Article document model.
 *
 * - `model`: the `Document` record and its stage state machine
 * - `filter`: ingestion-side filtering and link uniqueness checks
 */

pub mod filter;
pub mod model;

pub use filter::{IngestFilter, ensure_unique_links};
pub use model::{Document, DocumentState, is_usable_text};
