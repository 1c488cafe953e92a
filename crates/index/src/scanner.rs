use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::IngestError;

/// Check whether `path` carries one of `extensions` (case-insensitive, leading dot optional)
pub fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
  let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
    return false;
  };
  extensions
    .iter()
    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

/// Recursively collect the files under `root` eligible for ingestion.
///
/// Unreadable entries are logged and skipped. The result is sorted.
pub fn scan_folder(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, IngestError> {
  if !root.exists() {
    return Err(IngestError::RootNotFound(root.to_path_buf()));
  }

  let mut files = Vec::new();
  for entry in WalkDir::new(root) {
    let entry = match entry {
      Ok(entry) => entry,
      Err(e) => {
        warn!(err = %e, "Skipping unreadable entry");
        continue;
      }
    };
    if entry.file_type().is_file() && has_allowed_extension(entry.path(), extensions) {
      files.push(entry.into_path());
    }
  }

  files.sort();
  debug!(root = %root.display(), files = files.len(), "Folder scan complete");
  Ok(files)
}
