//! Folder ingestion: extract, chunk, embed and insert, one file at a time per worker.
//!
//! A file that fails at any step is recorded as skipped with the reason and
//! never affects the other files in the batch.

use std::{
  path::PathBuf,
  sync::Arc,
  time::{Duration, Instant},
};

use db::VectorIndex;
use docagent_core::{NewDocument, SourceFile};
use embedding::Embedder;
use extract::Extractor;
use futures::{StreamExt, stream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::Chunker;

// ============================================================================
// Report Types
// ============================================================================

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
  Indexed { chunks: usize },
  Skipped { reason: String },
}

impl FileOutcome {
  fn skipped(reason: impl Into<String>) -> Self {
    FileOutcome::Skipped { reason: reason.into() }
  }

  pub fn is_indexed(&self) -> bool {
    matches!(self, FileOutcome::Indexed { .. })
  }
}

#[derive(Debug, Clone)]
pub struct FileReport {
  pub path: PathBuf,
  pub outcome: FileOutcome,
}

/// Summary of one ingestion pass
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
  /// Files fully indexed
  pub indexed: usize,
  /// Files skipped for any reason
  pub skipped: usize,
  /// Chunks stored for indexed files
  pub chunks: usize,
  /// Per-file outcomes in completion order
  pub outcomes: Vec<FileReport>,
  /// Files never started because the pass was cancelled
  pub not_started: usize,
  pub duration: Duration,
}

impl IngestReport {
  fn record(&mut self, report: FileReport) {
    match &report.outcome {
      FileOutcome::Indexed { chunks } => {
        self.indexed += 1;
        self.chunks += chunks;
      }
      FileOutcome::Skipped { .. } => self.skipped += 1,
    }
    self.outcomes.push(report);
  }

  pub fn skipped_files(&self) -> impl Iterator<Item = (&PathBuf, &str)> {
    self.outcomes.iter().filter_map(|r| match &r.outcome {
      FileOutcome::Skipped { reason } => Some((&r.path, reason.as_str())),
      FileOutcome::Indexed { .. } => None,
    })
  }
}

// ============================================================================
// Ingestor
// ============================================================================

pub struct Ingestor {
  extractor: Extractor,
  chunker: Chunker,
  embedder: Embedder,
  index: Arc<dyn VectorIndex>,
  workers: usize,
}

impl Ingestor {
  pub fn new(extractor: Extractor, chunker: Chunker, embedder: Embedder, index: Arc<dyn VectorIndex>) -> Self {
    Self {
      extractor,
      chunker,
      embedder,
      index,
      workers: 1,
    }
  }

  /// Files processed concurrently by [`Ingestor::ingest_all`]
  pub fn with_workers(mut self, workers: usize) -> Self {
    self.workers = workers.max(1);
    self
  }

  /// Run one file through extract, chunk, embed and insert, strictly in that order
  #[tracing::instrument(level = "debug", skip(self, file), fields(path = %file.path.display()))]
  pub async fn ingest_file(&self, file: &SourceFile) -> FileOutcome {
    let text = match self.extractor.extract(file.path()).await {
      Ok(text) => text,
      Err(e) => return FileOutcome::skipped(format!("extraction failed: {e}")),
    };

    let chunks = self.chunker.chunk(&text);
    if chunks.is_empty() {
      return FileOutcome::skipped("no indexable text");
    }

    let texts: Vec<String> = chunks.into_iter().map(|c| c.content).collect();
    let vectors = match self.embedder.embed(&texts).await {
      Ok(vectors) => vectors,
      Err(e) => return FileOutcome::skipped(format!("embedding failed: {e}")),
    };

    let filename = file.filename();
    let total = texts.len();
    for (stored, (content, vector)) in texts.into_iter().zip(vectors).enumerate() {
      let doc = NewDocument::new(filename.clone(), file.source.clone(), content, vector);
      if let Err(e) = self.index.insert(doc).await {
        return FileOutcome::skipped(format!("insert failed after {stored} of {total} chunks: {e}"));
      }
    }

    debug!(chunks = total, "File indexed");
    FileOutcome::Indexed { chunks: total }
  }

  /// Ingest every file, up to `workers` at a time.
  ///
  /// Cancelling `cancel` stops new files from starting; files already in
  /// progress run to completion.
  pub async fn ingest_all(&self, files: Vec<SourceFile>, cancel: &CancellationToken) -> IngestReport {
    let start = Instant::now();
    let total = files.len();
    info!(files = total, workers = self.workers, "Starting ingestion");

    let mut report = IngestReport::default();
    let mut outcomes = stream::iter(files)
      .take_while(|_| std::future::ready(!cancel.is_cancelled()))
      .map(|file| async move {
        let outcome = self.ingest_file(&file).await;
        FileReport {
          path: file.path,
          outcome,
        }
      })
      .buffer_unordered(self.workers);

    while let Some(file_report) = outcomes.next().await {
      match &file_report.outcome {
        FileOutcome::Indexed { chunks } => info!(path = %file_report.path.display(), chunks, "Indexed"),
        FileOutcome::Skipped { reason } => warn!(path = %file_report.path.display(), reason = %reason, "Skipped file"),
      }
      report.record(file_report);
    }

    report.not_started = total - report.outcomes.len();
    report.duration = start.elapsed();
    if report.not_started > 0 {
      warn!(not_started = report.not_started, "Ingestion cancelled");
    }
    info!(
      indexed = report.indexed,
      skipped = report.skipped,
      chunks = report.chunks,
      elapsed_ms = report.duration.as_millis() as u64,
      "Ingestion complete"
    );
    report
  }
}
