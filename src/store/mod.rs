use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::metrics::MetricMap;
use crate::sweep::{describe_combination, format_float, Combination};

pub const DEFAULT_RESULTS_FILE: &str = "results.csv";

/// Handle on the append-only results table. The file is opened, written and
/// closed once per record; no handle survives between runs.
#[derive(Debug, Clone)]
pub struct ResultsStore {
  path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
  pub header: Vec<String>,
  pub rows: Vec<Vec<String>>,
}

impl ResultsStore {
  pub fn new(path: impl Into<PathBuf>) -> ResultsStore {
    ResultsStore { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  // The header is fixed by the metric keys of the record that creates (or
  // clears) the file. Later records append their values in their own key
  // order even when their key set differs from the header.
  pub fn append(
    &self,
    id: usize,
    combo: &Combination,
    metrics: &MetricMap,
    clear: bool,
  ) -> Result<()> {
    let existed = self.path.exists();
    if clear && existed {
      fs::write(&self.path, format!("{}\n", encode_row(&self.header_row(metrics))))?;
    }
    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)?;
    if !existed {
      writeln!(file, "{}", encode_row(&self.header_row(metrics)))?;
    }
    let mut row = vec![id.to_string(), describe_combination(combo)];
    row.extend(metrics.values().map(format_float));
    writeln!(file, "{}", encode_row(&row))?;
    debug!(id, path = %self.path.display(), "stored run record");
    Ok(())
  }

  pub fn load(&self) -> Result<Table> {
    let text = fs::read_to_string(&self.path)?;
    let mut records = parse_csv(&text);
    let header = if records.is_empty() { Vec::new() } else { records.remove(0) };
    Ok(Table { header, rows: records })
  }

  fn header_row(&self, metrics: &MetricMap) -> Vec<String> {
    let mut header = vec!["ID".to_string(), "Input Parameters".to_string()];
    header.extend(metrics.keys().map(str::to_string));
    header
  }
}

fn encode_row(fields: &[String]) -> String {
  fields
    .iter()
    .map(|field| encode_field(field))
    .collect::<Vec<_>>()
    .join(",")
}

fn encode_field(field: &str) -> String {
  if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
    format!("\"{}\"", field.replace('"', "\"\""))
  } else {
    field.to_string()
  }
}

fn parse_csv(text: &str) -> Vec<Vec<String>> {
  let mut records = Vec::new();
  let mut row = Vec::new();
  let mut field = String::new();
  let mut in_quotes = false;
  let mut chars = text.chars().peekable();
  let mut saw_any = false;

  while let Some(c) = chars.next() {
    saw_any = true;
    if in_quotes {
      match c {
        '"' => {
          if chars.peek() == Some(&'"') {
            chars.next();
            field.push('"');
          } else {
            in_quotes = false;
          }
        }
        _ => field.push(c),
      }
      continue;
    }
    match c {
      '"' => in_quotes = true,
      ',' => row.push(std::mem::take(&mut field)),
      '\r' => {}
      '\n' => {
        row.push(std::mem::take(&mut field));
        records.push(std::mem::take(&mut row));
        saw_any = false;
      }
      _ => field.push(c),
    }
  }
  if saw_any || !field.is_empty() || !row.is_empty() {
    row.push(field);
    records.push(row);
  }
  records
}
