use std::path::Path;

use crate::Result;

/// Read a text or markdown file. Invalid UTF-8 sequences become U+FFFD.
pub async fn read_text_file(path: &Path) -> Result<String> {
  let bytes = tokio::fs::read(path).await?;
  Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_reads_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.md");
    std::fs::write(&path, "# Title\n\n  body with spaces  \n").unwrap();
    assert_eq!(read_text_file(&path).await.unwrap(), "# Title\n\n  body with spaces  \n");
  }

  #[tokio::test]
  async fn test_invalid_utf8_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.txt");
    std::fs::write(&path, [b'o', b'k', 0xff, b'!']).unwrap();
    assert_eq!(read_text_file(&path).await.unwrap(), "ok\u{fffd}!");
  }

  #[tokio::test]
  async fn test_missing_file_is_io_error() {
    let err = read_text_file(Path::new("/nonexistent/nope.txt")).await.unwrap_err();
    assert!(matches!(err, crate::ExtractError::Io(_)));
  }
}
