//! Configuration for the document agent.
//!
//! Config priority: explicit path > $DOCAGENT_CONFIG > ./docagent.toml > user (~/.config/docagent/config.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{DEFAULT_SOURCE_TAG, Error, Result};

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "docagent.toml";

/// Env var naming an explicit config file
pub const CONFIG_ENV: &str = "DOCAGENT_CONFIG";

// ============================================================================
// Embedding Configuration
// ============================================================================

/// Embedding backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
  /// Model name sent with every request
  pub model: String,

  /// Embedding dimensions (must match model output)
  pub dimensions: usize,

  /// Ollama server URL
  pub ollama_url: String,

  /// Per-request timeout in seconds
  pub timeout_secs: u64,

  /// Retries for transient failures (0 disables retrying)
  pub max_retries: u32,

  /// Embedding requests kept in flight at once
  pub concurrency: usize,
}

impl Default for EmbeddingConfig {
  fn default() -> Self {
    Self {
      model: "nomic-embed-text".to_string(),
      dimensions: 768,
      ollama_url: "http://localhost:11434".to_string(),
      timeout_secs: 60,
      max_retries: 0,
      concurrency: 1,
    }
  }
}

// ============================================================================
// Generation Configuration
// ============================================================================

/// Streaming generation backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
  pub model: String,
  pub ollama_url: String,
  /// Whole-request timeout in seconds, stream included
  pub timeout_secs: u64,
}

impl Default for GenerationConfig {
  fn default() -> Self {
    Self {
      model: "llama3".to_string(),
      ollama_url: "http://localhost:11434".to_string(),
      timeout_secs: 300,
    }
  }
}

// ============================================================================
// Chunking Configuration
// ============================================================================

/// Chunk size policy, measured in characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
  /// Maximum characters per chunk (default: 1000)
  pub max_chars: usize,

  /// Characters shared by consecutive windows of a long paragraph (default: 200)
  pub overlap: usize,
}

impl Default for ChunkingConfig {
  fn default() -> Self {
    Self {
      max_chars: 1000,
      overlap: 200,
    }
  }
}

// ============================================================================
// Index Configuration
// ============================================================================

/// Vector index location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
  /// LanceDB directory (default: <data dir>/lancedb)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<PathBuf>,

  /// Table holding document chunks
  pub table: String,
}

impl Default for IndexConfig {
  fn default() -> Self {
    Self {
      path: None,
      table: "documents".to_string(),
    }
  }
}

impl IndexConfig {
  pub fn resolved_path(&self) -> PathBuf {
    self.path.clone().unwrap_or_else(|| default_data_dir().join("lancedb"))
  }
}

// ============================================================================
// Ingest Configuration
// ============================================================================

/// Folder ingestion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
  /// Source tag recorded on every stored chunk
  pub source: String,

  /// Files processed concurrently (default: 1)
  pub workers: usize,

  /// File extensions eligible for ingestion (without the dot)
  pub extensions: Vec<String>,
}

impl Default for IngestConfig {
  fn default() -> Self {
    Self {
      source: DEFAULT_SOURCE_TAG.to_string(),
      workers: 1,
      extensions: ["pdf", "txt", "md", "png", "jpg", "jpeg"]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    }
  }
}

// ============================================================================
// OCR Configuration
// ============================================================================

/// External tools used for text-layer retry and optical recognition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
  pub tesseract_path: String,
  pub pdftoppm_path: String,
  pub pdftotext_path: String,

  /// Tesseract language pack
  pub language: String,

  /// Retry an empty PDF text layer with pdftotext before rasterising
  pub use_pdftotext: bool,
}

impl Default for OcrConfig {
  fn default() -> Self {
    Self {
      tesseract_path: "tesseract".to_string(),
      pdftoppm_path: "pdftoppm".to_string(),
      pdftotext_path: "pdftotext".to_string(),
      language: "eng".to_string(),
      use_pdftotext: true,
    }
  }
}

// ============================================================================
// Retrieval Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
  /// Documents fetched per query (default: 5)
  pub top_k: usize,
}

impl Default for RetrievalConfig {
  fn default() -> Self {
    Self { top_k: 5 }
  }
}

// ============================================================================
// Log Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Log level: error, warn, info, debug, trace
  pub level: String,

  /// Directory for a log file; console only when unset
  #[serde(skip_serializing_if = "Option::is_none")]
  pub directory: Option<PathBuf>,

  /// File rotation: daily, hourly, never
  pub rotation: String,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      directory: None,
      rotation: "daily".to_string(),
    }
  }
}

// ============================================================================
// Main Configuration
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub embedding: EmbeddingConfig,
  pub generation: GenerationConfig,
  pub chunking: ChunkingConfig,
  pub index: IndexConfig,
  pub ingest: IngestConfig,
  pub ocr: OcrConfig,
  pub retrieval: RetrievalConfig,
  pub log: LogConfig,
}

impl Config {
  /// Load and validate config, honouring the priority order above.
  ///
  /// An explicit path must exist; discovered files that fail to parse are errors too.
  pub fn load(explicit: Option<&Path>) -> Result<Self> {
    let config = match Self::discover(explicit)? {
      Some(path) => Self::from_file(&path)?,
      None => Self::default(),
    };
    config.validate()?;
    Ok(config)
  }

  /// Parse a config file without validating it
  pub fn from_file(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|source| Error::ConfigParse {
      path: path.display().to_string(),
      source,
    })
  }

  /// Find the config file that applies, if any
  pub fn discover(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    Self::discover_with(explicit, std::env::var_os(CONFIG_ENV).map(PathBuf::from))
  }

  /// Discovery with the `DOCAGENT_CONFIG` value passed in. A named file must exist.
  fn discover_with(explicit: Option<&Path>, from_env: Option<PathBuf>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
      if !path.exists() {
        return Err(Error::Validation(format!("config file not found: {}", path.display())));
      }
      return Ok(Some(path.to_path_buf()));
    }

    if let Some(path) = from_env {
      if !path.exists() {
        return Err(Error::Validation(format!(
          "{CONFIG_ENV} points to a missing file: {}",
          path.display()
        )));
      }
      return Ok(Some(path));
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
      return Ok(Some(local));
    }

    Ok(Self::user_config_path().filter(|p| p.exists()))
  }

  /// Get the user-level config path
  pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CONFIG_DIR") {
      return Some(PathBuf::from(path).join("config.toml"));
    }

    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
      return Some(PathBuf::from(path).join("docagent").join("config.toml"));
    }

    dirs::config_dir().map(|p: PathBuf| p.join("docagent").join("config.toml"))
  }

  /// Reject settings the pipeline cannot run with
  pub fn validate(&self) -> Result<()> {
    if self.chunking.max_chars == 0 {
      return Err(Error::Validation("chunking.max_chars must be greater than 0".into()));
    }
    if self.chunking.overlap >= self.chunking.max_chars {
      return Err(Error::Validation(format!(
        "chunking.overlap ({}) must be less than chunking.max_chars ({})",
        self.chunking.overlap, self.chunking.max_chars
      )));
    }
    if self.embedding.dimensions == 0 {
      return Err(Error::Validation("embedding.dimensions must be greater than 0".into()));
    }
    if self.embedding.concurrency == 0 {
      return Err(Error::Validation("embedding.concurrency must be at least 1".into()));
    }
    if self.retrieval.top_k == 0 {
      return Err(Error::Validation("retrieval.top_k must be at least 1".into()));
    }
    if self.ingest.workers == 0 {
      return Err(Error::Validation("ingest.workers must be at least 1".into()));
    }
    Ok(())
  }

  /// Serialize the effective config
  pub fn to_toml(&self) -> Result<String> {
    Ok(toml::to_string_pretty(self)?)
  }

  /// Generate a default config file as a string
  pub fn generate_template() -> String {
    r#"# Document agent configuration
# Place in ./docagent.toml or ~/.config/docagent/config.toml

# ============================================================================
# Embedding Backend
# ============================================================================

[embedding]
model = "nomic-embed-text"

# Must match model output; vectors of any other length are rejected
dimensions = 768

ollama_url = "http://localhost:11434"
timeout_secs = 60

# Retries for timeouts and 429/502/503/504 (0 = fail on first error)
max_retries = 0

# Requests kept in flight per file
concurrency = 1

# ============================================================================
# Generation Backend
# ============================================================================

[generation]
model = "llama3"
ollama_url = "http://localhost:11434"
timeout_secs = 300

# ============================================================================
# Chunking
# ============================================================================

[chunking]
# Maximum chunk size (characters)
max_chars = 1000

# Overlap between windows of a long paragraph; must be less than max_chars
overlap = 200

# ============================================================================
# Vector Index
# ============================================================================

[index]
# path = "/var/lib/docagent/lancedb"
table = "documents"

# ============================================================================
# Ingestion
# ============================================================================

[ingest]
source = "local"
workers = 1
extensions = ["pdf", "txt", "md", "png", "jpg", "jpeg"]

# ============================================================================
# OCR
# ============================================================================

[ocr]
tesseract_path = "tesseract"
pdftoppm_path = "pdftoppm"
pdftotext_path = "pdftotext"
language = "eng"
use_pdftotext = true

# ============================================================================
# Retrieval
# ============================================================================

[retrieval]
top_k = 5

# ============================================================================
# Logging
# ============================================================================

[log]
level = "info"
# directory = "/var/log/docagent"
rotation = "daily"
"#
    .to_string()
  }
}

/// Get the data directory (respects $DATA_DIR)
pub fn default_data_dir() -> PathBuf {
  if let Ok(path) = std::env::var("DATA_DIR") {
    return PathBuf::from(path);
  }

  dirs::data_local_dir()
    .map(|p| p.join("docagent"))
    .unwrap_or_else(|| PathBuf::from(".docagent"))
}
