//! Composition of SAW normalization and TOPSIS scoring into a ranked result.

use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{saw, schema::CanonicalTable, topsis};

/// One household in the ranking output. Field names match the exported columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    #[serde(rename = "RW")]
    pub rw: String,
    #[serde(rename = "RT")]
    pub rt: String,
    #[serde(rename = "Dusun")]
    pub dusun: String,
    #[serde(rename = "NIK")]
    pub nik: String,
    #[serde(rename = "Nama")]
    pub name: String,
    #[serde(rename = "SAW_Normalisasi_Berbobot")]
    pub saw_score: f64,
    #[serde(rename = "Nilai_TOPSIS")]
    pub topsis_score: f64,
    #[serde(rename = "Ranking")]
    pub rank: u32,
}

pub const RESULT_HEADERS: [&str; 8] = [
    "RW",
    "RT",
    "Dusun",
    "NIK",
    "Nama",
    "SAW_Normalisasi_Berbobot",
    "Nilai_TOPSIS",
    "Ranking",
];

/// Rows sorted by `Ranking` ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub rows: Vec<RankedRow>,
}

impl RankedResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedRow> {
        self.rows.iter()
    }
}

/// Ranks a validated batch. Ties keep their input order.
pub fn rank(table: &CanonicalTable) -> RankedResult {
    if table.is_empty() {
        warn!("Ranking requested for an empty batch");
        return RankedResult::default();
    }

    let weighted = saw::weighted_matrix(&table.decision_matrix());
    let saw_scores = saw::saw_scores(&weighted);
    let closeness = topsis::closeness(&weighted);
    let ranks = topsis::min_ranks(&closeness);

    let rows = table
        .iter()
        .enumerate()
        .map(|(idx, record)| RankedRow {
            rw: record.rw.clone(),
            rt: record.rt.clone(),
            dusun: record.dusun.clone(),
            nik: record.nik.clone(),
            name: record.name.clone(),
            saw_score: saw_scores[idx],
            topsis_score: closeness[idx],
            rank: ranks[idx],
        })
        .sorted_by_key(|row| row.rank)
        .collect::<Vec<_>>();

    info!("Ranked {} household(s)", rows.len());
    RankedResult { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SubjectRecord;

    fn record(name: &str, criteria: [f64; 4]) -> SubjectRecord {
        SubjectRecord {
            rw: "1".into(),
            rt: "2".into(),
            dusun: "Krajan".into(),
            nik: "0001".into(),
            name: name.into(),
            criteria,
        }
    }

    #[test]
    fn closer_subject_to_ideal_ranks_first() {
        let table = CanonicalTable {
            records: vec![
                record("A", [2.0, 30.0, 2.0, 1.0]),
                record("B", [4.0, 50.0, 4.0, 3.0]),
            ],
        };
        let result = rank(&table);
        let names = result.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(result.rows[0].rank, 1);
        assert_eq!(result.rows[1].rank, 2);
        assert!((result.rows[0].saw_score - 0.7).abs() < 1e-12);
        assert!((result.rows[1].saw_score - 0.3).abs() < 1e-12);
    }

    #[test]
    fn identical_subjects_tie_in_input_order() {
        let table = CanonicalTable {
            records: vec![
                record("low", [1.0, 20.0, 5.0, 1.0]),
                record("twin-a", [5.0, 60.0, 1.0, 3.0]),
                record("twin-b", [5.0, 60.0, 1.0, 3.0]),
            ],
        };
        let result = rank(&table);
        let ranked = result
            .iter()
            .map(|r| (r.name.as_str(), r.rank))
            .collect::<Vec<_>>();
        assert_eq!(ranked, vec![("twin-a", 1), ("twin-b", 1), ("low", 3)]);
    }

    #[test]
    fn single_row_batch_scores_zero_and_ranks_first() {
        let table = CanonicalTable {
            records: vec![record("solo", [3.0, 45.0, 2.0, 2.0])],
        };
        let result = rank(&table);
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows[0].saw_score, 0.0);
        assert_eq!(result.rows[0].topsis_score, 0.0);
        assert_eq!(result.rows[0].rank, 1);
    }

    #[test]
    fn empty_batch_yields_empty_result() {
        assert!(rank(&CanonicalTable::default()).is_empty());
    }
}
