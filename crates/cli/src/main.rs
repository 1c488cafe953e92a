//! docagent CLI - index local documents and answer questions over them

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use docagent_core::Config;

mod commands;
mod logging;

use commands::{cmd_config_init, cmd_config_show, cmd_index, cmd_query};
use logging::init_logging;

#[derive(Parser)]
#[command(name = "docagent")]
#[command(about = "Index local documents and answer questions grounded in them")]
#[command(after_help = "\
QUICK START:
  docagent config init            # Write ./docagent.toml
  docagent index --path ./data    # Extract, chunk, embed and store
  docagent query -q \"question\"    # Retrieve, summarize, critique")]
struct Cli {
  /// Config file (default: $DOCAGENT_CONFIG, ./docagent.toml, user config dir)
  #[arg(long, global = true, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Increase log verbosity (-v debug, -vv trace)
  #[arg(short, long, global = true, action = ArgAction::Count)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Ingest every eligible file under a folder
  Index {
    /// Folder to ingest
    #[arg(short, long, default_value = "./data")]
    path: PathBuf,
    /// Source tag stored with every chunk (default: ingest.source)
    #[arg(long)]
    source: Option<String>,
    /// Files processed concurrently (default: ingest.workers)
    #[arg(long)]
    workers: Option<usize>,
  },
  /// Answer a question from the indexed documents
  Query {
    /// The question
    #[arg(short, long, value_parser = non_blank)]
    q: String,
    /// Documents retrieved (default: retrieval.top_k)
    #[arg(long)]
    top_k: Option<usize>,
    /// Print `{answer, sources}` as JSON
    #[arg(long)]
    json: bool,
  },
  /// Manage configuration
  Config {
    #[command(subcommand)]
    command: ConfigCommand,
  },
}

#[derive(Subcommand)]
enum ConfigCommand {
  /// Write a commented config template
  Init {
    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
  },
  /// Print the effective configuration
  Show,
}

fn non_blank(value: &str) -> Result<String, String> {
  if value.trim().is_empty() {
    return Err("query must not be empty".to_string());
  }
  Ok(value.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  // Init must work even when the existing config does not parse
  if let Commands::Config {
    command: ConfigCommand::Init { force },
  } = &cli.command
  {
    return cmd_config_init(cli.config.as_deref(), *force);
  }

  let config = Config::load(cli.config.as_deref())?;
  let _guard = init_logging(&config.log, cli.verbose);

  match cli.command {
    Commands::Index { path, source, workers } => cmd_index(&config, &path, source, workers).await,
    Commands::Query { q, top_k, json } => cmd_query(&config, &q, top_k, json).await,
    Commands::Config { command } => match command {
      ConfigCommand::Show => cmd_config_show(&config, cli.config.as_deref()),
      ConfigCommand::Init { .. } => Ok(()),
    },
  }
}
