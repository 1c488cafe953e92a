use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use docagent_core::{Config, config::LOCAL_CONFIG_FILE};

/// Write the config template to `target` (default: ./docagent.toml)
pub fn cmd_config_init(target: Option<&Path>, force: bool) -> Result<()> {
  let path = target.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
  if path.exists() && !force {
    anyhow::bail!("Config file already exists: {} (use --force to overwrite)", path.display());
  }

  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
  }
  std::fs::write(&path, Config::generate_template()).with_context(|| format!("Failed to write {}", path.display()))?;

  println!("Created config: {}", path.display());
  println!("Edit the file to customize settings.");
  Ok(())
}

/// Print the effective configuration and where it came from
pub fn cmd_config_show(config: &Config, explicit: Option<&Path>) -> Result<()> {
  match Config::discover(explicit)? {
    Some(path) => println!("# Loaded from {}", path.display()),
    None => println!("# No config file found, using defaults"),
  }
  println!("# Index location: {}", config.index.resolved_path().display());
  println!();
  print!("{}", config.to_toml()?);
  Ok(())
}
