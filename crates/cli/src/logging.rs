//! Logging setup driven by the `[log]` config section

use docagent_core::LogConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

const LOG_FILE_NAME: &str = "docagent.log";

/// Parse log level from config string
fn parse_log_level(level: &str) -> LevelFilter {
  match level.to_lowercase().as_str() {
    "off" => LevelFilter::OFF,
    "error" => LevelFilter::ERROR,
    "warn" => LevelFilter::WARN,
    "info" => LevelFilter::INFO,
    "debug" => LevelFilter::DEBUG,
    "trace" => LevelFilter::TRACE,
    _ => LevelFilter::INFO,
  }
}

/// `-v` raises the configured level to debug, `-vv` to trace
fn effective_level(config: &LogConfig, verbose: u8) -> LevelFilter {
  match verbose {
    0 => parse_log_level(&config.level),
    1 => LevelFilter::DEBUG.max(parse_log_level(&config.level)),
    _ => LevelFilter::TRACE,
  }
}

/// Initialize logging.
///
/// Logs go to stderr, leaving stdout for answers. With `log.directory` set they
/// go to a rolling file there instead. `RUST_LOG` overrides the level.
///
/// Returns the guard that must be kept alive for the duration of the program
pub fn init_logging(config: &LogConfig, verbose: u8) -> Option<WorkerGuard> {
  let env_filter = EnvFilter::builder()
    .with_default_directive(effective_level(config, verbose).into())
    .from_env_lossy();

  let Some(log_dir) = config.directory.as_ref() else {
    tracing_subscriber::fmt()
      .with_env_filter(env_filter)
      .with_writer(std::io::stderr)
      .init();
    return None;
  };

  if let Err(e) = std::fs::create_dir_all(log_dir) {
    // Fall back to console-only logging
    tracing_subscriber::fmt()
      .with_env_filter(env_filter)
      .with_writer(std::io::stderr)
      .init();
    tracing::warn!(dir = %log_dir.display(), err = %e, "Cannot create log directory, logging to stderr");
    return None;
  }

  let file_appender = match config.rotation.as_str() {
    "hourly" => tracing_appender::rolling::hourly(log_dir, LOG_FILE_NAME),
    "never" => tracing_appender::rolling::never(log_dir, LOG_FILE_NAME),
    _ => tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME),
  };
  let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(true)
    .with_ansi(false)
    .with_writer(file_writer)
    .init();

  Some(guard)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_log_level() {
    assert_eq!(parse_log_level("WARN"), LevelFilter::WARN);
    assert_eq!(parse_log_level("error"), LevelFilter::ERROR);
    assert_eq!(parse_log_level("nonsense"), LevelFilter::INFO);
  }

  #[test]
  fn test_off_disables_logging() {
    let quiet = LogConfig {
      level: "off".to_string(),
      ..LogConfig::default()
    };
    assert_eq!(effective_level(&quiet, 0), LevelFilter::OFF);
    // -v still overrides a silenced config
    assert_eq!(effective_level(&quiet, 1), LevelFilter::DEBUG);
  }

  #[test]
  fn test_verbose_raises_level() {
    let config = LogConfig::default();
    assert_eq!(effective_level(&config, 0), LevelFilter::INFO);
    assert_eq!(effective_level(&config, 1), LevelFilter::DEBUG);
    assert_eq!(effective_level(&config, 3), LevelFilter::TRACE);

    let chatty = LogConfig {
      level: "trace".to_string(),
      ..LogConfig::default()
    };
    assert_eq!(effective_level(&chatty, 1), LevelFilter::TRACE);
  }
}
