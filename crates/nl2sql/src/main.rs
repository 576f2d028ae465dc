use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use nl2sql::{commands, AppConfig};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "nl2sql")]
#[command(about = "NL2SQL - route natural-language questions to a table and answer them with SQL")]
#[command(version)]
struct Cli {
  /// Path to a JSON or YAML config file
  #[arg(short, long, global = true, env = "NL2SQL_CONFIG")]
  config: Option<PathBuf>,

  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// List configured topics
  Topics,
  /// Show which topic a question routes to
  Route {
    /// Print every topic's score
    #[arg(short, long)]
    scores: bool,
    /// The question (space-separated)
    #[arg(required = true)]
    query: Vec<String>,
  },
  /// Route a question, translate it to SQL and run it
  Ask {
    /// Print the SQL without executing it
    #[arg(long)]
    dry_run: bool,
    /// The question (space-separated)
    #[arg(required = true)]
    query: Vec<String>,
  },
  /// Route a labelled query set and write a report
  Evaluate {
    /// JSON array of {query, category}
    #[arg(short, long, default_value = "queries.json")]
    queries: PathBuf,
    /// Where to write the report
    #[arg(short, long, default_value = "report.json")]
    output: PathBuf,
  },
}

fn init_logging(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(filter)
    .init();
}

async fn handle(command: Command, config: &AppConfig) -> Result<()> {
  match command {
    Command::Topics => commands::list_topics(config),
    Command::Route { scores, query } => commands::route(config, &query.join(" "), scores).await,
    Command::Ask { dry_run, query } => commands::ask(config, &query.join(" "), dry_run).await,
    Command::Evaluate { queries, output } => commands::evaluate(config, &queries, &output).await,
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let config = AppConfig::load(cli.config.as_deref())?;
  handle(cli.command, &config).await
}
