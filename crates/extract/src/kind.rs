use std::path::Path;

use crate::ExtractError;

/// Extensions the extractor understands, lower-case and without the dot
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md", "png", "jpg", "jpeg"];

/// Extraction strategy selected from a file's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
  Text,
  Pdf,
  Image,
}

impl FileKind {
  /// Classify by extension, ignoring case
  pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
    let ext = path
      .extension()
      .and_then(|e| e.to_str())
      .map(|e| e.to_ascii_lowercase())
      .unwrap_or_default();

    match ext.as_str() {
      "txt" | "md" => Ok(FileKind::Text),
      "pdf" => Ok(FileKind::Pdf),
      "png" | "jpg" | "jpeg" => Ok(FileKind::Image),
      _ => Err(ExtractError::UnsupportedType(if ext.is_empty() {
        path.display().to_string()
      } else {
        format!(".{}", ext)
      })),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      FileKind::Text => "text",
      FileKind::Pdf => "pdf",
      FileKind::Image => "image",
    }
  }
}

impl std::fmt::Display for FileKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_path_by_extension() {
    assert_eq!(FileKind::from_path(Path::new("a.txt")).unwrap(), FileKind::Text);
    assert_eq!(FileKind::from_path(Path::new("notes/b.md")).unwrap(), FileKind::Text);
    assert_eq!(FileKind::from_path(Path::new("scan.pdf")).unwrap(), FileKind::Pdf);
    assert_eq!(FileKind::from_path(Path::new("photo.jpeg")).unwrap(), FileKind::Image);
    assert_eq!(FileKind::from_path(Path::new("photo.jpg")).unwrap(), FileKind::Image);
    assert_eq!(FileKind::from_path(Path::new("shot.png")).unwrap(), FileKind::Image);
  }

  #[test]
  fn test_from_path_ignores_case() {
    assert_eq!(FileKind::from_path(Path::new("REPORT.PDF")).unwrap(), FileKind::Pdf);
    assert_eq!(FileKind::from_path(Path::new("Readme.Md")).unwrap(), FileKind::Text);
  }

  #[test]
  fn test_unsupported_extension() {
    match FileKind::from_path(Path::new("archive.zip")) {
      Err(ExtractError::UnsupportedType(ext)) => assert_eq!(ext, ".zip"),
      other => panic!("expected unsupported type, got {:?}", other),
    }
    assert!(matches!(
      FileKind::from_path(Path::new("Makefile")),
      Err(ExtractError::UnsupportedType(_))
    ));
  }

  #[test]
  fn test_supported_extensions_all_classify() {
    for ext in SUPPORTED_EXTENSIONS {
      let name = format!("file.{ext}");
      assert!(FileKind::from_path(Path::new(&name)).is_ok(), "{ext} should be supported");
    }
  }
}
