//! Drive a connector end to end: enumerate, fetch, partition, write, clean up.

use crate::cleanup::CleanupGuard;
use crate::connector::Connector;
use crate::lifecycle::IngestDoc;
use crate::process::{DocProcessor, ProcessedDocument};
use chrono::Utc;
use docflow_common::Result;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

/// What happened to one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocOutcome {
    Processed { locator: String, elements: usize },
    /// Output already existed and reprocessing was off
    Skipped { locator: String },
    Failed { locator: String, error: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocFailure {
    pub locator: String,
    pub error: String,
}

/// Totals for one connector run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub elements: usize,
    pub failures: Vec<DocFailure>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, outcome: DocOutcome) {
        match outcome {
            DocOutcome::Processed { elements, .. } => {
                self.processed += 1;
                self.elements += elements;
            },
            DocOutcome::Skipped { .. } => self.skipped += 1,
            DocOutcome::Failed { locator, error } => {
                self.failures.push(DocFailure { locator, error });
            },
        }
    }
}

/// Run every document of `connector` through `processor`.
///
/// Documents are processed `concurrency` at a time. Each one is cleaned up
/// as soon as it finishes, the connector once all are done. A failing
/// document is recorded in the summary and does not stop the run; only
/// initialization and enumeration errors are returned.
pub async fn run_connector<C: Connector>(
    connector: &C,
    processor: &dyn DocProcessor,
) -> Result<RunSummary> {
    let connector = CleanupGuard::new(connector);
    let settings = connector.settings();

    connector.initialize().await?;
    let docs = connector.ingest_docs().await?;
    info!(
        connector = connector.name(),
        docs = docs.len(),
        concurrency = settings.concurrency,
        "Starting ingest"
    );

    let pb = progress_bar(docs.len() as u64, connector.name());
    let reprocess = settings.reprocess;

    let outcomes: Vec<DocOutcome> = stream::iter(docs)
        .map(|doc| process_doc(doc, processor, reprocess))
        .buffer_unordered(settings.concurrency.max(1))
        .inspect(|_| pb.inc(1))
        .collect()
        .await;
    pb.finish_and_clear();

    let mut summary = RunSummary::default();
    for outcome in outcomes {
        summary.record(outcome);
    }

    info!(
        connector = connector.name(),
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed(),
        "Ingest finished"
    );
    Ok(summary)
}

/// Fetch, partition and write one document. The staged file is removed on
/// every path out of this function, including cancellation.
pub async fn process_doc<D: IngestDoc>(
    doc: D,
    processor: &dyn DocProcessor,
    reprocess: bool,
) -> DocOutcome {
    let locator = doc.locator().to_string();
    let mut doc = CleanupGuard::new(doc);

    if !reprocess && doc.has_output() {
        info!(locator = %locator, "Output exists, skipping");
        return DocOutcome::Skipped { locator };
    }

    match partition_doc(&mut *doc, processor).await {
        Ok(elements) => {
            debug!(locator = %locator, elements, "Processed document");
            DocOutcome::Processed { locator, elements }
        },
        Err(e) => {
            error!(locator = %locator, error = %e, "Failed to process document");
            DocOutcome::Failed {
                locator,
                error: e.to_string(),
            }
        },
    }
}

async fn partition_doc<D: IngestDoc>(doc: &mut D, processor: &dyn DocProcessor) -> Result<usize> {
    doc.fetch().await?;
    let metadata = doc.metadata().await?;

    let staged = doc.staging_path();
    let elements = processor.process(&staged, doc.locator())?;
    let count = elements.len();

    let output = ProcessedDocument {
        source_locator: doc.locator().to_string(),
        filename: staged
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        metadata,
        processed_at: Utc::now(),
        elements,
    };
    write_output(&doc.output_path(), &output)?;
    Ok(count)
}

/// Write JSON through a temporary file so readers never see partial output
pub fn write_output(path: &Path, document: &ProcessedDocument) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, document)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn progress_bar(total: u64, connector: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(connector.to_string());
    pb
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_record() {
        let mut summary = RunSummary::default();
        summary.record(DocOutcome::Processed {
            locator: "a".to_string(),
            elements: 3,
        });
        summary.record(DocOutcome::Skipped {
            locator: "b".to_string(),
        });
        summary.record(DocOutcome::Failed {
            locator: "c".to_string(),
            error: "boom".to_string(),
        });

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.elements, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_write_output_creates_parent() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("out/nested/C01.json");
        let doc = ProcessedDocument {
            source_locator: "C01".to_string(),
            filename: "C01.xml".to_string(),
            metadata: docflow_common::FileMeta::empty(),
            processed_at: Utc::now(),
            elements: vec![],
        };

        write_output(&path, &doc).unwrap();

        let written: ProcessedDocument =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, doc);
    }
}
