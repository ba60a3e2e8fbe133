/*!
 * Ingestion-side filtering.
 *
 * These checks run before a batch enters the pipeline: unwanted links are
 * dropped by keyword and the link uniqueness invariant is enforced.
 */

use log::{debug, warn};
use std::collections::HashSet;

use crate::errors::AppError;

use super::model::Document;

/// Drops documents whose link contains an excluded keyword.
#[derive(Debug, Clone, Default)]
pub struct IngestFilter {
    excluded_keywords: Vec<String>,
}

impl IngestFilter {
    /// Create a filter from a keyword list; matching is case-insensitive.
    pub fn new(keywords: &[String]) -> Self {
        Self {
            excluded_keywords: keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Whether a link should be kept.
    pub fn accepts(&self, link: &str) -> bool {
        let link = link.to_lowercase();
        !self.excluded_keywords.iter().any(|k| link.contains(k.as_str()))
    }

    /// Remove excluded documents, preserving the order of the rest.
    pub fn apply(&self, documents: Vec<Document>) -> Vec<Document> {
        let before = documents.len();
        let kept: Vec<Document> = documents
            .into_iter()
            .filter(|d| self.accepts(&d.link))
            .collect();
        debug!("Link filter applied. {} record(s) removed.", before - kept.len());
        kept
    }
}

/// Fail if two documents share a link.
pub fn ensure_unique_links(documents: &[Document]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for doc in documents {
        if !seen.insert(doc.link.as_str()) {
            warn!("Duplicate link in ingested batch: {}", doc.link);
            return Err(AppError::Ingestion(format!("duplicate link: {}", doc.link)));
        }
    }
    Ok(())
}
