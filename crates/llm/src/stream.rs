use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{LlmError, Result};

/// Raw response body, in whatever pieces the transport delivers
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// One line of a line-delimited JSON generation response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Fragment {
  #[serde(default)]
  pub response: String,
  #[serde(default)]
  pub done: bool,
  #[serde(default)]
  error: Option<String>,
}

impl Fragment {
  pub fn new(response: impl Into<String>, done: bool) -> Self {
    Self {
      response: response.into(),
      done,
      error: None,
    }
  }
}

/// Decodes answer fragments from a streaming body.
///
/// Single consumer. Reading stops after the first fragment flagged `done`,
/// even if the body carries more data.
pub struct FragmentStream {
  body: ByteStream,
  buffer: Vec<u8>,
  body_ended: bool,
  finished: bool,
}

impl FragmentStream {
  pub fn new(body: ByteStream) -> Self {
    Self {
      body,
      buffer: Vec::new(),
      body_ended: false,
      finished: false,
    }
  }

  /// Build a stream from any source of byte chunks
  pub fn from_stream<S, B>(body: S) -> Self
  where
    S: Stream<Item = Result<B>> + Send + 'static,
    B: AsRef<[u8]>,
  {
    Self::new(Box::pin(body.map(|chunk| chunk.map(|b| b.as_ref().to_vec()))))
  }

  /// Next fragment in arrival order.
  ///
  /// `Ok(None)` once the completion flag was seen or the body ended. A line
  /// that is not valid JSON is an error, as is `cancel` firing while waiting.
  pub async fn next_fragment(&mut self, cancel: &CancellationToken) -> Result<Option<Fragment>> {
    loop {
      if self.finished {
        return Ok(None);
      }
      if cancel.is_cancelled() {
        self.finished = true;
        return Err(LlmError::Cancelled);
      }

      if let Some(line) = self.next_line() {
        if line.iter().all(u8::is_ascii_whitespace) {
          continue;
        }
        return self.decode(&line).map(Some);
      }

      if self.body_ended {
        self.finished = true;
        return Ok(None);
      }

      tokio::select! {
        biased;
        _ = cancel.cancelled() => {
          self.finished = true;
          return Err(LlmError::Cancelled);
        }
        chunk = self.body.next() => match chunk {
          Some(Ok(bytes)) => {
            trace!(bytes = bytes.len(), "Received generation chunk");
            self.buffer.extend_from_slice(&bytes);
          }
          Some(Err(e)) => {
            self.finished = true;
            return Err(e);
          }
          None => self.body_ended = true,
        },
      }
    }
  }

  /// Concatenate every remaining fragment
  pub async fn collect_text(mut self, cancel: &CancellationToken) -> Result<String> {
    let mut text = String::new();
    let mut fragments = 0usize;
    while let Some(fragment) = self.next_fragment(cancel).await? {
      text.push_str(&fragment.response);
      fragments += 1;
    }
    debug!(fragments, chars = text.chars().count(), "Generation stream complete");
    Ok(text)
  }

  /// Pop one complete line, or the unterminated remainder once the body has ended
  fn next_line(&mut self) -> Option<Vec<u8>> {
    if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
      let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
      line.pop();
      return Some(line);
    }
    if self.body_ended && !self.buffer.is_empty() {
      return Some(std::mem::take(&mut self.buffer));
    }
    None
  }

  fn decode(&mut self, line: &[u8]) -> Result<Fragment> {
    let fragment: Fragment = serde_json::from_slice(line).map_err(|source| {
      self.finished = true;
      LlmError::Decode {
        line: String::from_utf8_lossy(line).into_owned(),
        source,
      }
    })?;

    if let Some(message) = fragment.error {
      self.finished = true;
      return Err(LlmError::Backend(message));
    }
    if fragment.done {
      self.finished = true;
    }
    Ok(fragment)
  }
}
