use std::path::Path;

use anyhow::{Context, Result};
use docagent_core::{Config, SourceFile, SourceTag};
use extract::Extractor;
use index::{Chunker, ChunkerConfig, IngestReport, Ingestor, scan_folder};
use tracing::info;

use super::{cancel_on_ctrl_c, embedder, open_index};

/// Ingest every eligible file under `path`
pub async fn cmd_index(config: &Config, path: &Path, source: Option<String>, workers: Option<usize>) -> Result<()> {
  let source = SourceTag::new(source.unwrap_or_else(|| config.ingest.source.clone()));
  let workers = workers.unwrap_or(config.ingest.workers);
  if workers == 0 {
    anyhow::bail!("--workers must be at least 1");
  }

  let paths = scan_folder(path, &config.ingest.extensions)?;
  info!(root = %path.display(), files = paths.len(), source = %source, "Scanned folder");
  if paths.is_empty() {
    println!("No eligible files under {}", path.display());
    return Ok(());
  }

  let chunker = Chunker::new(ChunkerConfig::from(&config.chunking)).context("Invalid chunking config")?;
  let ingestor = Ingestor::new(
    Extractor::from_config(&config.ocr),
    chunker,
    embedder(config).await,
    open_index(config).await?,
  )
  .with_workers(workers);

  let files = paths
    .into_iter()
    .map(|p| SourceFile::new(p, source.clone()))
    .collect();
  let report = ingestor.ingest_all(files, &cancel_on_ctrl_c()).await;

  print_report(&report);
  Ok(())
}

fn print_report(report: &IngestReport) {
  println!(
    "Indexed {} file(s), {} chunk(s); skipped {} in {:.1}s",
    report.indexed,
    report.chunks,
    report.skipped,
    report.duration.as_secs_f64()
  );
  for (path, reason) in report.skipped_files() {
    println!("  skipped {}: {}", path.display(), reason);
  }
  if report.not_started > 0 {
    println!("Interrupted: {} file(s) not started", report.not_started);
  }
}
