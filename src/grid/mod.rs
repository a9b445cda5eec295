use crate::sweep::{Combination, ParamValue, ParameterSpec, Scalar};

const FLOAT_STEP: f64 = 0.1;

/// Expanded sweep axes: static entries plus the varying axes in product
/// order (ranges in declaration order, then lists in declaration order).
#[derive(Debug, Clone)]
pub struct Grid {
    statics: Combination,
    axes: Vec<(String, Vec<Scalar>)>,
}

impl Grid {
    pub fn new(spec: &ParameterSpec) -> Grid {
        let mut statics = Vec::new();
        let mut range_axes = Vec::new();
        let mut list_axes = Vec::new();
        for (name, value) in spec {
            match value {
                ParamValue::Scalar(scalar) => {
                    statics.push((name.clone(), scalar.clone()));
                }
                ParamValue::IntRange { start, end } => {
                    range_axes.push((name.clone(), int_range_values(*start, *end)));
                }
                ParamValue::FloatRange { start, end } => {
                    range_axes.push((name.clone(), float_range_values(*start, *end)));
                }
                ParamValue::List(items) => {
                    list_axes.push((name.clone(), items.clone()));
                }
            }
        }
        let mut axes = range_axes;
        axes.append(&mut list_axes);
        Grid { statics, axes }
    }

    pub fn len(&self) -> usize {
        self.axes.iter().map(|(_, values)| values.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fresh lazy iteration over the cartesian product; calling again
    /// restarts from the first combination.
    pub fn combinations(&self) -> Combinations<'_> {
        Combinations {
            grid: self,
            indices: vec![0; self.axes.len()],
            done: self.axes.iter().any(|(_, values)| values.is_empty()),
        }
    }
}

pub struct Combinations<'a> {
    grid: &'a Grid,
    indices: Vec<usize>,
    done: bool,
}

impl Iterator for Combinations<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        if self.done {
            return None;
        }
        let mut combo = self.grid.statics.clone();
        for (axis, (name, values)) in self.grid.axes.iter().enumerate() {
            combo.push((name.clone(), values[self.indices[axis]].clone()));
        }
        // Odometer advance, right-most axis cycling fastest.
        let mut pos = self.indices.len();
        loop {
            if pos == 0 {
                self.done = true;
                break;
            }
            pos -= 1;
            self.indices[pos] += 1;
            if self.indices[pos] < self.grid.axes[pos].1.len() {
                break;
            }
            self.indices[pos] = 0;
        }
        Some(combo)
    }
}

fn int_range_values(start: i64, end: i64) -> Vec<Scalar> {
    (start..=end).map(Scalar::Int).collect()
}

// Inclusive enumeration with step 0.1, each value rounded to one decimal.
fn float_range_values(start: f64, end: f64) -> Vec<Scalar> {
    let count = ((end - start) / FLOAT_STEP + 1e-9).trunc() as i64 + 1;
    if count <= 0 {
        return Vec::new();
    }
    (0..count)
        .map(|i| Scalar::Float(round_one_decimal(start + FLOAT_STEP * i as f64)))
        .collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
