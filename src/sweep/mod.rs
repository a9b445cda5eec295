use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SweepError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Float(x) => write!(f, "{}", format_float(*x)),
            Scalar::Str(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Scalar(Scalar),
    IntRange { start: i64, end: i64 },
    FloatRange { start: f64, end: f64 },
    List(Vec<Scalar>),
}

/// Declared sweep input, declaration order preserved.
pub type ParameterSpec = Vec<(String, ParamValue)>;

/// One fully-resolved scalar parameter set for a single run.
pub type Combination = Vec<(String, Scalar)>;

// Token typing rule: all digits -> integer, contains '.' and parses -> float,
// anything else -> trimmed string.
pub fn scalar_from_token(raw: &str) -> Scalar {
    let token = raw.trim();
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = token.parse::<i64>() {
            return Scalar::Int(n);
        }
    }
    if token.contains('.') {
        if let Ok(x) = token.parse::<f64>() {
            return Scalar::Float(x);
        }
    }
    Scalar::Str(token.to_string())
}

pub fn parse_param_line(line: &str) -> Result<Combination> {
    let mut combo = Vec::new();
    for part in line.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            return Err(SweepError::Parse(format!(
                "parameter assignment '{}' is missing '='",
                part.trim()
            )));
        };
        combo.push((key.trim().to_string(), scalar_from_token(value)));
    }
    Ok(combo)
}

// Inline CLI arguments may be space-separated, comma-separated, or both.
// No arguments at all means one unmodified run.
pub fn parse_inline_args(args: &[String]) -> Result<Combination> {
    if args.is_empty() {
        return Ok(Vec::new());
    }
    parse_param_line(&args.join(","))
}

// One full assignment list per non-blank line; reading stops at the first
// blank line.
pub fn parse_param_file(text: &str) -> Result<Vec<Combination>> {
    let mut runs = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        runs.push(parse_param_line(line)?);
    }
    Ok(runs)
}

pub fn parse_range_line(line: &str) -> Result<(String, ParamValue)> {
    let Some((key, value)) = line.split_once('=') else {
        return Err(SweepError::Parse(format!(
            "range definition '{}' is missing '='",
            line.trim()
        )));
    };
    let key = key.trim().to_string();
    let value = value.trim();

    if value.starts_with('[') || value.ends_with(']') {
        let inner = value
            .strip_prefix('[')
            .and_then(|v| v.strip_suffix(']'))
            .ok_or_else(|| {
                SweepError::Parse(format!("mismatched brackets in '{}'", value))
            })?;
        let items = inner
            .split(',')
            .map(|item| scalar_from_token(item.trim().trim_matches('\'').trim_matches('"')))
            .collect();
        return Ok((key, ParamValue::List(items)));
    }

    let bounds: Vec<&str> = value.split(',').map(str::trim).collect();
    if bounds.len() != 2 {
        return Err(SweepError::Parse(format!(
            "range for '{}' must be 'start,end' or '[v1,v2,...]'",
            key
        )));
    }
    let integer_looking =
        |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if integer_looking(bounds[0]) && integer_looking(bounds[1]) {
        let start = bounds[0].parse::<i64>().map_err(|_| {
            SweepError::Parse(format!("invalid range bound '{}'", bounds[0]))
        })?;
        let end = bounds[1].parse::<i64>().map_err(|_| {
            SweepError::Parse(format!("invalid range bound '{}'", bounds[1]))
        })?;
        return Ok((key, ParamValue::IntRange { start, end }));
    }
    let start = bounds[0].parse::<f64>().map_err(|_| {
        SweepError::Parse(format!("non-numeric range bound '{}'", bounds[0]))
    })?;
    let end = bounds[1].parse::<f64>().map_err(|_| {
        SweepError::Parse(format!("non-numeric range bound '{}'", bounds[1]))
    })?;
    Ok((key, ParamValue::FloatRange { start, end }))
}

pub fn parse_range_file(text: &str) -> Result<ParameterSpec> {
    let mut spec = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        spec.push(parse_range_line(line)?);
    }
    Ok(spec)
}

// Rendered as `name: value` fragments; this is both the progress line and the
// "Input Parameters" field of a stored row.
pub fn describe_combination(combo: &Combination) -> String {
    combo
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}

// Floats keep a decimal point so a re-lexed literal stays a float.
pub fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
