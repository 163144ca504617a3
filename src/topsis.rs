//! TOPSIS closeness scoring and "minimum" rank assignment.
//!
//! The weighted matrix is compared against an ideal point (best value per
//! column) and an anti-ideal point (worst value per column). The closeness
//! coefficient `D- / (D+ + D-)` lies in `[0, 1]`; higher is better.

use log::debug;

use crate::saw::{CRITERIA, CRITERION_COUNT, MatrixRow, Polarity, column_bounds};

/// Ideal (`A+`) and anti-ideal (`A-`) points of the weighted matrix.
pub fn ideal_points(weighted: &[MatrixRow]) -> (MatrixRow, MatrixRow) {
    let (min, max) = column_bounds(weighted);
    let mut ideal = [0.0; CRITERION_COUNT];
    let mut anti_ideal = [0.0; CRITERION_COUNT];
    for (c, criterion) in CRITERIA.iter().enumerate() {
        match criterion.polarity {
            Polarity::Benefit => {
                ideal[c] = max[c];
                anti_ideal[c] = min[c];
            }
            Polarity::Cost => {
                ideal[c] = min[c];
                anti_ideal[c] = max[c];
            }
        }
    }
    (ideal, anti_ideal)
}

fn distance(a: &MatrixRow, b: &MatrixRow) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Closeness coefficient for every row of the weighted matrix.
///
/// A row whose distances to both reference points are zero (the matrix
/// collapses to a single point) scores `0.0`.
pub fn closeness(weighted: &[MatrixRow]) -> Vec<f64> {
    if weighted.is_empty() {
        return Vec::new();
    }
    let (ideal, anti_ideal) = ideal_points(weighted);
    debug!("TOPSIS ideal {ideal:?}, anti-ideal {anti_ideal:?}");
    weighted
        .iter()
        .map(|row| {
            let to_ideal = distance(&ideal, row);
            let to_anti_ideal = distance(row, &anti_ideal);
            let total = to_ideal + to_anti_ideal;
            if total == 0.0 {
                0.0
            } else {
                to_anti_ideal / total
            }
        })
        .collect()
}

/// Ranks scores descending; ties share the smallest rank of their group.
///
/// Each rank is one plus the number of strictly higher scores, so
/// `[0.9, 0.9, 0.5]` ranks as `[1, 1, 3]`.
pub fn min_ranks(scores: &[f64]) -> Vec<u32> {
    let mut order = (0..scores.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut ranks = vec![0u32; scores.len()];
    let mut current_rank = 0u32;
    let mut previous: Option<f64> = None;
    for (position, &row) in order.iter().enumerate() {
        if previous != Some(scores[row]) {
            current_rank = position as u32 + 1;
            previous = Some(scores[row]);
        }
        ranks[row] = current_rank;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_column_ideal_is_the_minimum() {
        let (ideal, anti_ideal) = ideal_points(&[[0.0, 0.0, 0.3, 0.0], [0.3, 0.2, 0.0, 0.2]]);
        assert_eq!(ideal, [0.3, 0.2, 0.0, 0.2]);
        assert_eq!(anti_ideal, [0.0, 0.0, 0.3, 0.0]);
    }

    #[test]
    fn closeness_is_one_at_ideal_and_zero_at_anti_ideal() {
        let scores = closeness(&[[0.0, 0.0, 0.3, 0.0], [0.3, 0.2, 0.0, 0.2]]);
        assert_eq!(scores, vec![0.0, 1.0]);
    }

    #[test]
    fn collapsed_matrix_scores_zero() {
        assert_eq!(closeness(&[[0.0; CRITERION_COUNT]]), vec![0.0]);
        assert_eq!(
            closeness(&[[0.1, 0.1, 0.1, 0.1], [0.1, 0.1, 0.1, 0.1]]),
            vec![0.0, 0.0]
        );
    }

    #[test]
    fn min_ranks_share_the_lowest_rank_on_ties() {
        assert_eq!(min_ranks(&[0.9, 0.9, 0.5]), vec![1, 1, 3]);
        assert_eq!(min_ranks(&[0.2, 0.8, 0.8, 0.1, 0.5]), vec![4, 1, 1, 5, 3]);
    }

    #[test]
    fn min_ranks_handles_empty_and_single_inputs() {
        assert!(min_ranks(&[]).is_empty());
        assert_eq!(min_ranks(&[0.0]), vec![1]);
    }
}
