use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Result};
use colored::*;
use router::decision::decide;
use router::Catalog;
use translator::QueryResult;

use crate::config::AppConfig;
use crate::orchestrator::{Answer, Pipeline};
use crate::report;

/// List topics and their utterance counts. Never touches the network.
pub fn list_topics(config: &AppConfig) -> Result<()> {
  let catalog = Catalog::from_config(&config.topics()?)?;

  for topic in catalog.topics() {
    let table = config.database.tables.get(topic.name()).map(String::as_str).unwrap_or("-");
    println!(
      "{} {} ({} utterances) -> {}",
      "📂".cyan(),
      topic.name().blue().bold(),
      topic.utterances().len(),
      table.yellow()
    );
  }
  Ok(())
}

pub async fn route(config: &AppConfig, query: &str, show_scores: bool) -> Result<()> {
  let pipeline = Pipeline::from_config(config)?;
  pipeline.prepare().await?;

  let decision = if show_scores {
    let scores = pipeline.scores(query).await?;
    let threshold = pipeline.engine().settings().score_threshold;
    for score in &scores {
      let line = format!("  {:<20} {:.4}", score.topic, score.score);
      if score.score >= threshold {
        println!("{}", line.green());
      } else {
        println!("{}", line.dimmed());
      }
    }
    decide(&scores, threshold)
  } else {
    pipeline.route(query).await?
  };

  if decision.is_matched() {
    println!("{}", decision.to_string().green().bold());
  } else {
    println!("{}", decision.to_string().yellow());
  }
  Ok(())
}

pub async fn ask(config: &AppConfig, query: &str, dry_run: bool) -> Result<()> {
  let pipeline = Pipeline::from_config(config)?;
  pipeline.prepare().await?;

  match pipeline.ask(query, dry_run).await? {
    Answer::Unmatched => {
      println!("{} No table matches this question.", "✗".yellow());
    }
    Answer::Translated { topic, table, sql, result } => {
      eprintln!("{} {} -> {}", "✓".green(), topic.cyan(), table.yellow());
      println!("{sql}");
      if let Some(result) = result {
        println!();
        print_rows(&result);
      }
    }
  }
  Ok(())
}

fn print_rows(result: &QueryResult) {
  println!("{}", result.columns.join(" | ").bold());
  for row in &result.rows {
    let cells: Vec<String> = row.iter().map(cell_text).collect();
    println!("{}", cells.join(" | "));
  }
  println!("{}", format!("({} rows)", result.rows.len()).dimmed());
}

fn cell_text(value: &serde_json::Value) -> String {
  match value {
    serde_json::Value::String(text) => text.clone(),
    serde_json::Value::Null => "NULL".to_string(),
    other => other.to_string(),
  }
}

pub async fn evaluate(config: &AppConfig, queries: &Path, output: &Path) -> Result<()> {
  let items = report::read_queries(queries)?;
  if items.is_empty() {
    bail!("{} contains no queries", queries.display());
  }

  let pipeline = Pipeline::from_config(config)?;
  pipeline.prepare().await?;

  let started = Instant::now();
  let total = items.len();
  let entries = report::evaluate(pipeline.engine(), &items, |position, entry| {
    let mark = if entry.is_correct() { "✓".green() } else { "✗".red() };
    eprintln!(
      "[{position}/{total}] {mark} {} {}",
      entry.route.to_string().cyan(),
      entry.query.dimmed()
    );
  })
  .await?;
  report::write_report(output, &entries)?;

  let accuracy = report::Accuracy::of(&entries);
  eprintln!(
    "{} Routed {} queries in {:.1?}, accuracy {}/{} ({:.1}%)",
    "✓".green(),
    accuracy.total,
    started.elapsed(),
    accuracy.correct,
    accuracy.total,
    accuracy.ratio() * 100.0
  );
  eprintln!("Report written to {}", output.display().to_string().cyan());
  Ok(())
}
