//! Weighted SAW (min-max) normalization of the decision matrix.

use log::{debug, warn};

pub const CRITERION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Higher raw values are better.
    Benefit,
    /// Lower raw values are better.
    Cost,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Criterion {
    pub name: &'static str,
    pub polarity: Polarity,
    pub weight: f64,
}

/// Ranking criteria in matrix column order. Weights sum to 1.0.
pub const CRITERIA: [Criterion; CRITERION_COUNT] = [
    Criterion {
        name: "Jumlah Tanggungan",
        polarity: Polarity::Benefit,
        weight: 0.30,
    },
    Criterion {
        name: "Usia",
        polarity: Polarity::Benefit,
        weight: 0.20,
    },
    Criterion {
        name: "Pekerjaan",
        polarity: Polarity::Cost,
        weight: 0.30,
    },
    Criterion {
        name: "Status",
        polarity: Polarity::Benefit,
        weight: 0.20,
    },
];

pub type MatrixRow = [f64; CRITERION_COUNT];

/// Per-column minimum and maximum. Empty input yields `(+inf, -inf)` bounds.
pub fn column_bounds(matrix: &[MatrixRow]) -> ([f64; CRITERION_COUNT], [f64; CRITERION_COUNT]) {
    let mut min = [f64::INFINITY; CRITERION_COUNT];
    let mut max = [f64::NEG_INFINITY; CRITERION_COUNT];
    for row in matrix {
        for (c, value) in row.iter().enumerate() {
            min[c] = min[c].min(*value);
            max[c] = max[c].max(*value);
        }
    }
    (min, max)
}

/// Min-max normalizes every column by its polarity and scales it by its weight.
///
/// A column that is constant across the batch (always the case for a single
/// row) has no spread to normalize against; every value in it becomes `0.0`.
pub fn weighted_matrix(matrix: &[MatrixRow]) -> Vec<MatrixRow> {
    if matrix.is_empty() {
        return Vec::new();
    }
    let (min, max) = column_bounds(matrix);
    for (c, criterion) in CRITERIA.iter().enumerate() {
        if max[c] == min[c] {
            warn!(
                "Criterion '{}' is constant ({}) across the batch; normalized to 0",
                criterion.name, min[c]
            );
        }
    }

    let weighted = matrix
        .iter()
        .map(|row| {
            let mut out = [0.0; CRITERION_COUNT];
            for (c, criterion) in CRITERIA.iter().enumerate() {
                if max[c] == min[c] {
                    continue;
                }
                let normalized = match criterion.polarity {
                    Polarity::Benefit => unit_position(row[c], min[c], max[c]),
                    Polarity::Cost => unit_position(row[c], max[c], min[c]),
                };
                out[c] = normalized * criterion.weight;
            }
            out
        })
        .collect::<Vec<_>>();
    debug!("Built weighted matrix for {} row(s)", weighted.len());
    weighted
}

/// `(value - from) / (to - from)` for `value` between `from` and `to`.
///
/// Finite bounds far apart (e.g. `-1e308` and `1e308`) overflow the difference
/// to infinity; halving every operand keeps it finite without changing the ratio.
fn unit_position(value: f64, from: f64, to: f64) -> f64 {
    let spread = to - from;
    if spread.is_finite() {
        (value - from) / spread
    } else {
        (value / 2.0 - from / 2.0) / (to / 2.0 - from / 2.0)
    }
}

/// Composite SAW score: the row sums of the weighted matrix.
pub fn saw_scores(weighted: &[MatrixRow]) -> Vec<f64> {
    weighted.iter().map(|row| row.iter().sum()).collect()
}
