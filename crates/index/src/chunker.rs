use docagent_core::{ChunkingConfig, TextChunk};
use regex::Regex;
use thiserror::Error;

/// Two or more consecutive newlines separate paragraphs
const PARAGRAPH_BREAK: &str = r"\n{2,}";

#[derive(Error, Debug)]
pub enum ChunkError {
  #[error("max_chars must be greater than 0")]
  ZeroMax,
  #[error("overlap ({overlap}) must be less than max_chars ({max_chars})")]
  OverlapTooLarge { overlap: usize, max_chars: usize },
  #[error("invalid paragraph pattern: {0}")]
  Pattern(#[from] regex::Error),
}

/// Configuration for the chunker. Sizes are in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
  /// Longest chunk emitted
  pub max_chars: usize,
  /// Characters shared by consecutive windows of an oversized paragraph
  pub overlap: usize,
}

impl Default for ChunkerConfig {
  fn default() -> Self {
    Self {
      max_chars: 1000,
      overlap: 200,
    }
  }
}

impl From<&ChunkingConfig> for ChunkerConfig {
  fn from(config: &ChunkingConfig) -> Self {
    Self {
      max_chars: config.max_chars,
      overlap: config.overlap,
    }
  }
}

/// Paragraph chunker
///
/// Splits text on blank lines, emitting each trimmed paragraph as one chunk.
/// Paragraphs longer than `max_chars` are cut into overlapping windows.
#[derive(Debug, Clone)]
pub struct Chunker {
  config: ChunkerConfig,
  paragraph_break: Regex,
}

impl Chunker {
  pub fn new(config: ChunkerConfig) -> Result<Self, ChunkError> {
    if config.max_chars == 0 {
      return Err(ChunkError::ZeroMax);
    }
    if config.overlap >= config.max_chars {
      return Err(ChunkError::OverlapTooLarge {
        overlap: config.overlap,
        max_chars: config.max_chars,
      });
    }

    Ok(Self {
      config,
      paragraph_break: Regex::new(PARAGRAPH_BREAK)?,
    })
  }

  pub fn config(&self) -> ChunkerConfig {
    self.config
  }

  /// Chunk `text` in source order. Never yields empty or whitespace-only chunks.
  pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
    let mut pieces = Vec::new();

    for paragraph in self.paragraph_break.split(text) {
      let paragraph = paragraph.trim();
      if paragraph.is_empty() {
        continue;
      }
      if paragraph.chars().count() <= self.config.max_chars {
        pieces.push(paragraph);
      } else {
        self.windows(paragraph, &mut pieces);
      }
    }

    pieces
      .into_iter()
      .enumerate()
      .map(|(index, content)| TextChunk::new(index, content))
      .collect()
  }

  fn windows<'a>(&self, paragraph: &'a str, out: &mut Vec<&'a str>) {
    // Byte offset of every char boundary, plus the end of the string
    let bounds: Vec<usize> = paragraph
      .char_indices()
      .map(|(i, _)| i)
      .chain(std::iter::once(paragraph.len()))
      .collect();
    let len = bounds.len() - 1;
    let step = self.config.max_chars - self.config.overlap;

    let mut start = 0;
    loop {
      let end = (start + self.config.max_chars).min(len);
      let window = paragraph[bounds[start]..bounds[end]].trim();
      if !window.is_empty() {
        out.push(window);
      }
      if end == len {
        break;
      }
      start += step;
    }
  }
}
