use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::{Result, SweepError};
use crate::store::ResultsStore;

lazy_static! {
    static ref CLAUSE: Regex =
        Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\s*(>=|<=|>|<|=)\s*([0-9]*\.?[0-9]+)")
            .expect("clause pattern");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Ge,
    Le,
    Gt,
    Lt,
    Eq,
}

impl Comparator {
    fn from_text(text: &str) -> Comparator {
        match text {
            ">=" => Comparator::Ge,
            "<=" => Comparator::Le,
            ">" => Comparator::Gt,
            "<" => Comparator::Lt,
            _ => Comparator::Eq,
        }
    }

    fn holds(self, left: f64, right: f64) -> bool {
        match self {
            Comparator::Ge => left >= right,
            Comparator::Le => left <= right,
            Comparator::Gt => left > right,
            Comparator::Lt => left < right,
            Comparator::Eq => left == right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryClause {
    pub name: String,
    pub comparator: Comparator,
    pub threshold: f64,
}

// Every `identifier comparator number` substring becomes one clause; the
// surrounding text is ignored and clauses are implicitly ANDed.
pub fn parse_query(query: &str) -> Vec<QueryClause> {
    CLAUSE
        .captures_iter(query)
        .filter_map(|caps| {
            let threshold = caps[3].parse::<f64>().ok()?;
            Some(QueryClause {
                name: caps[1].to_string(),
                comparator: Comparator::from_text(&caps[2]),
                threshold,
            })
        })
        .collect()
}

/// Filters the stored table and returns the "Input Parameters" field of
/// every matching row.
pub fn run_query(store: &ResultsStore, query: &str) -> Result<Vec<String>> {
    let clauses = parse_query(query);
    if clauses.is_empty() {
        return Err(SweepError::Query(
            "invalid query format, expected one or more '<name> <comparator> <number>' conditions"
                .into(),
        ));
    }
    debug!(clauses = clauses.len(), "running query");

    let table = store.load()?;
    let mut columns = Vec::with_capacity(clauses.len());
    for clause in &clauses {
        let Some(index) = table.header.iter().position(|h| h == &clause.name) else {
            return Err(SweepError::Query(format!(
                "column '{}' not found in the results",
                clause.name
            )));
        };
        columns.push(index);
    }
    let params_index = table
        .header
        .iter()
        .position(|h| h == "Input Parameters")
        .ok_or_else(|| {
            SweepError::Query("results file has no 'Input Parameters' column".into())
        })?;

    let mut matches = Vec::new();
    for row in &table.rows {
        let mut keep = true;
        for (clause, &index) in clauses.iter().zip(&columns) {
            // A short or empty cell fails the clause; a non-numeric cell is
            // an error, the way coercing a displaced column fails.
            let cell = row.get(index).map(String::as_str).unwrap_or("");
            if cell.is_empty() {
                keep = false;
                continue;
            }
            let value = cell.parse::<f64>().map_err(|_| {
                SweepError::Query(format!(
                    "could not interpret value '{}' in column '{}' as a number",
                    cell, clause.name
                ))
            })?;
            if !clause.comparator.holds(value, clause.threshold) {
                keep = false;
            }
        }
        if keep {
            if let Some(params) = row.get(params_index) {
                matches.push(params.clone());
            }
        }
    }
    Ok(matches)
}
