use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use crate::error::SweepError;
use crate::grid::Grid;
use crate::interp;
use crate::metrics::{extract_metrics, MetricMap};
use crate::parser::parse_source;
use crate::query;
use crate::rewrite::{apply_combination, render_script};
use crate::store::{ResultsStore, DEFAULT_RESULTS_FILE};
use crate::sweep::{self, describe_combination, format_float, Combination};

// Call names eligible for argument rewriting out of the box; the config file
// and --allow extend this set.
pub const SUPPORTED_FUNCTIONS: &[&str] = &[
  "Model",
  "train",
  "fit",
  "evaluate",
  "simulate",
  "train_test_split",
];

#[derive(Parser)]
#[command(name = "gridtune", version, about = "Run tune scripts across parameter sweeps")]
pub struct Cli {
  /// Script to sweep (.tune)
  script: Option<PathBuf>,
  /// Inline name=value assignments
  params: Vec<String>,
  #[arg(long)]
  param_file: Option<PathBuf>,
  #[arg(long)]
  range: Option<PathBuf>,
  #[arg(long)]
  query: Option<String>,
  #[arg(long)]
  results: Option<PathBuf>,
  #[arg(long)]
  allow: Option<String>,
  #[arg(long)]
  show_rewritten: bool,
}

#[derive(Default, serde::Deserialize)]
struct Config {
  allow_functions: Option<Vec<String>>,
  results_file: Option<String>,
}

pub fn run() -> Result<()> {
  let cli = Cli::parse();
  let config = load_config();
  let store = ResultsStore::new(results_path(&cli, &config));

  if let Some(condition) = &cli.query {
    return run_query_cmd(&store, condition);
  }

  let Some(script_path) = cli.script.as_deref() else {
    return Err(usage("missing script argument; expected a .tune script"));
  };
  if script_path.extension().and_then(|e| e.to_str()) != Some("tune")
    || !script_path.exists()
  {
    return Err(usage(&format!(
      "the first argument must be an existing .tune script, got '{}'",
      script_path.display()
    )));
  }
  let source = fs::read_to_string(script_path)
    .with_context(|| format!("Failed to read {:?}", script_path))?;

  let mut modes = 0;
  if !cli.params.is_empty() {
    modes += 1;
  }
  if cli.param_file.is_some() {
    modes += 1;
  }
  if cli.range.is_some() {
    modes += 1;
  }
  if modes > 1 {
    return Err(usage(
      "inline parameters, --param-file and --range are mutually exclusive",
    ));
  }

  let allowed = allow_list(&cli, &config);

  if let Some(path) = &cli.param_file {
    if !path.exists() {
      return Err(usage(&format!("parameter file '{}' not found", path.display())));
    }
    let text = fs::read_to_string(path)
      .with_context(|| format!("Failed to read {:?}", path))?;
    let combos = sweep::parse_param_file(&text)?;
    run_sweep(&source, combos, &store, &allowed, cli.show_rewritten)
  } else if let Some(path) = &cli.range {
    if !path.exists() {
      return Err(usage(&format!("range file '{}' not found", path.display())));
    }
    let text = fs::read_to_string(path)
      .with_context(|| format!("Failed to read {:?}", path))?;
    let spec = sweep::parse_range_file(&text)?;
    let grid = Grid::new(&spec);
    run_sweep(&source, grid.combinations(), &store, &allowed, cli.show_rewritten)
  } else {
    let combo = sweep::parse_inline_args(&cli.params)?;
    run_sweep(&source, [combo], &store, &allowed, cli.show_rewritten)
  }
}

// One combination is fully rewritten, executed, scraped and stored before
// the next begins; the first record of a sweep clears the store.
fn run_sweep(
  source: &str,
  combos: impl IntoIterator<Item = Combination>,
  store: &ResultsStore,
  allowed: &HashSet<String>,
  show_rewritten: bool,
) -> Result<()> {
  let script = parse_source(source)?;
  let mut clear = true;
  let mut id = 0usize;
  for combo in combos {
    id += 1;
    println!("Running script with parameters: {}", describe_combination(&combo));
    let mut variant = script.clone();
    apply_combination(&mut variant, &combo, allowed);
    let rewritten = render_script(&variant);
    if show_rewritten {
      println!("{}", rewritten);
    }
    let output = interp::run_source(&rewritten)?;
    let metrics = extract_metrics(&output);
    store.append(id, &combo, &metrics, clear)?;
    println!(
      "Stored results - id: {}, params: [{}], metrics: [{}]",
      id,
      describe_combination(&combo),
      describe_metrics(&metrics)
    );
    clear = false;
  }
  debug!(runs = id, "sweep finished");
  Ok(())
}

fn run_query_cmd(store: &ResultsStore, condition: &str) -> Result<()> {
  println!("Querying with condition: {}", condition);
  match query::run_query(store, condition) {
    Ok(matches) => {
      if matches.is_empty() {
        println!("No results found matching the query.");
      } else {
        for params in matches {
          println!("Input Params: {}", params);
        }
      }
      Ok(())
    }
    // Query faults are reported, never fatal.
    Err(SweepError::Query(message)) => {
      println!("{}", message);
      Ok(())
    }
    Err(other) => Err(other.into()),
  }
}

fn usage(message: &str) -> anyhow::Error {
  SweepError::Usage(message.to_string()).into()
}

fn describe_metrics(metrics: &MetricMap) -> String {
  metrics
    .iter()
    .map(|(key, value)| format!("{}: {}", key, format_float(value)))
    .collect::<Vec<_>>()
    .join(", ")
}

fn allow_list(cli: &Cli, config: &Config) -> HashSet<String> {
  let mut allowed: HashSet<String> =
    SUPPORTED_FUNCTIONS.iter().map(|name| name.to_string()).collect();
  if let Some(names) = &config.allow_functions {
    allowed.extend(names.iter().cloned());
  }
  if let Some(names) = &cli.allow {
    allowed.extend(names.split(',').map(|name| name.trim().to_string()));
  }
  allowed
}

fn results_path(cli: &Cli, config: &Config) -> PathBuf {
  if let Some(path) = &cli.results {
    return path.clone();
  }
  if let Some(path) = &config.results_file {
    return PathBuf::from(path);
  }
  PathBuf::from(DEFAULT_RESULTS_FILE)
}

fn load_config() -> Config {
  let path = Path::new("gridtune.config.json");
  if let Ok(data) = fs::read_to_string(path) {
    if let Ok(cfg) = serde_json::from_str::<Config>(&data) {
      return cfg;
    }
  }
  Config::default()
}
