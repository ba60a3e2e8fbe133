use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use log::{debug, info};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::{Document, IngestFilter, ensure_unique_links};
use crate::pipeline::PipelineReport;

/// Loads ingested articles and writes the digest.
pub struct FileManager;

impl FileManager {
    /// Checks file existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    /// Create a directory and its parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file, creating the parent directory
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }
        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
    }

    /// Parse a JSON array of articles.
    ///
    /// Missing ids are derived from the link. Repeated links are an ingestion
    /// error.
    pub fn parse_documents(json: &str) -> Result<Vec<Document>> {
        let mut documents: Vec<Document> =
            serde_json::from_str(json).context("Failed to parse document list")?;
        for doc in documents.iter_mut().filter(|d| d.id == 0) {
            doc.id = Document::stable_id(&doc.link);
        }
        ensure_unique_links(&documents)?;
        Ok(documents)
    }

    /// Load articles and apply the ingestion filter
    pub fn load_documents<P: AsRef<Path>>(path: P, filter: &IngestFilter) -> Result<Vec<Document>> {
        let path = path.as_ref();
        let content = Self::read_to_string(path)?;
        let documents = Self::parse_documents(&content)
            .with_context(|| format!("Invalid document file: {:?}", path))?;
        let loaded = documents.len();
        let documents = filter.apply(documents);
        info!(
            "Loaded {} article(s) from {:?} ({} after filtering)",
            loaded,
            path,
            documents.len()
        );
        Ok(documents)
    }

    /// Output path for a digest produced on `date`
    pub fn digest_path<P: AsRef<Path>>(output_dir: P, date: NaiveDate) -> PathBuf {
        output_dir
            .as_ref()
            .join(format!("digest_{}.json", date.format("%Y-%m-%d")))
    }

    /// Report path next to a digest
    pub fn report_path(digest_path: &Path) -> PathBuf {
        digest_path.with_extension("report.json")
    }

    /// Write `value` as pretty JSON
    pub fn save_json<P: AsRef<Path>, T: Serialize + ?Sized>(path: P, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        Self::write_to_file(&path, &json)?;
        debug!("Wrote {:?}", path.as_ref());
        Ok(())
    }

    /// Write today's digest, and the report when given; returns the digest path
    pub fn save_digest<P: AsRef<Path>>(
        output_dir: P,
        documents: &[Document],
        report: Option<&PipelineReport>,
    ) -> Result<PathBuf> {
        let digest = Self::digest_path(&output_dir, Local::now().date_naive());
        Self::save_json(&digest, documents)?;
        if let Some(report) = report {
            Self::save_json(Self::report_path(&digest), report)?;
        }
        Ok(digest)
    }
}
