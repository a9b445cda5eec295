use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Optional sign, optional decimal point, at least one digit.
    static ref NUMERIC_TOKEN: Regex =
        Regex::new(r"[-+]?[0-9]*\.?[0-9]+").expect("numeric token pattern");
}

/// Ordered metric-name -> value map; first-seen key order, last value wins
/// when a key repeats within one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricMap {
    entries: Vec<(String, f64)>,
}

impl MetricMap {
    pub fn new() -> MetricMap {
        MetricMap { entries: Vec::new() }
    }

    pub fn insert(&mut self, key: &str, value: f64) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key.to_string(), value));
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Scrapes `key: value` lines out of captured output. The key is everything
// before the first ':', lower-cased; the value is the first numeric token
// after it. Lines without either are skipped, never an error.
pub fn extract_metrics(output: &str) -> MetricMap {
    let mut metrics = MetricMap::new();
    for line in output.lines() {
        let line = line.trim();
        let Some(split) = line.find(':') else {
            continue;
        };
        let key = line[..split].trim().to_lowercase();
        let raw_value = line[split + 1..].trim();
        if let Some(token) = NUMERIC_TOKEN.find(raw_value) {
            if let Ok(value) = token.as_str().parse::<f64>() {
                metrics.insert(&key, value);
            }
        }
    }
    metrics
}
