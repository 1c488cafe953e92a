use std::{ffi::OsStr, process::Stdio};

use tokio::process::Command;
use tracing::{debug, trace};

use crate::{ExtractError, Result};

/// Run an external converter to completion and return its stdout
pub(crate) async fn run_tool<I, S>(program: &str, args: I) -> Result<Vec<u8>>
where
  I: IntoIterator<Item = S>,
  S: AsRef<OsStr>,
{
  let mut cmd = Command::new(program);
  cmd
    .args(args)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

  trace!(program, "Spawning external tool");
  let output = match cmd.output().await {
    Ok(output) => output,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      debug!(program, "External tool not found");
      return Err(ExtractError::ToolMissing(program.to_string()));
    }
    Err(e) => return Err(e.into()),
  };

  if !output.status.success() {
    return Err(ExtractError::ToolFailed {
      tool: program.to_string(),
      status: output.status.code().unwrap_or(-1),
      stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    });
  }

  Ok(output.stdout)
}
