//! Canonical household schema, header reconciliation, and batch validation.
//!
//! Incoming spreadsheets rarely use the exact canonical headers, so every
//! canonical field carries an ordered list of candidate substrings. Headers
//! are lowercased and trimmed, then each field binds to the first header that
//! contains one of its candidates (candidates tried in order, headers scanned
//! in their original order). Once bound, a field is never rebound.
//!
//! After binding, the four ranking criteria are checked for completeness and
//! numeric content, and the categorical criteria (`Pekerjaan`, `Status`) are
//! checked against their domains. Any failure rejects the whole batch with a
//! [`ValidationError`] that names every offending field; no partial table is
//! ever produced.

use std::fmt;

use itertools::Itertools;
use log::debug;
use thiserror::Error;

use crate::{
    data::{Cell, RawTable},
    saw::{CRITERIA, CRITERION_COUNT},
};

pub const FIELD_RW: &str = "RW";
pub const FIELD_RT: &str = "RT";
pub const FIELD_DUSUN: &str = "Dusun";
pub const FIELD_NIK: &str = "NIK";
pub const FIELD_NAME: &str = "Nama Kepala Keluarga";
pub const FIELD_DEPENDENTS: &str = "Jumlah Tanggungan";
pub const FIELD_AGE: &str = "Usia";
pub const FIELD_OCCUPATION: &str = "Pekerjaan";
pub const FIELD_STATUS: &str = "Status";

pub const NIK_PAD_WIDTH: usize = 16;
pub const NIK_DISPLAY_DIGITS: usize = 4;

/// Canonical field plus the substrings that may identify it in a raw header.
#[derive(Debug, Clone, Copy)]
pub struct FieldPattern {
    pub field: &'static str,
    pub candidates: &'static [&'static str],
}

/// Canonical schema in output order. Candidate order is significant.
pub const FIELD_PATTERNS: [FieldPattern; 9] = [
    FieldPattern {
        field: FIELD_RW,
        candidates: &["rw"],
    },
    FieldPattern {
        field: FIELD_RT,
        candidates: &["rt"],
    },
    FieldPattern {
        field: FIELD_DUSUN,
        candidates: &["dusun", "dusun/desa", "desa"],
    },
    FieldPattern {
        field: FIELD_NIK,
        candidates: &["nik", "no nik", "nomor nik"],
    },
    FieldPattern {
        field: FIELD_NAME,
        candidates: &["nama", "nama kk", "nama kepala keluarga"],
    },
    FieldPattern {
        field: FIELD_DEPENDENTS,
        candidates: &["tanggungan", "jumlah tanggungan", "jml tanggungan"],
    },
    FieldPattern {
        field: FIELD_AGE,
        candidates: &["usia", "umur"],
    },
    FieldPattern {
        field: FIELD_OCCUPATION,
        candidates: &["pekerjaan", "job", "kerja"],
    },
    FieldPattern {
        field: FIELD_STATUS,
        candidates: &["status", "perkawinan", "status kawin"],
    },
];

/// Inclusive domains of the categorical criteria.
pub const RANGE_RULES: [(&str, i64, i64); 2] = [(FIELD_OCCUPATION, 1, 5), (FIELD_STATUS, 1, 3)];

pub fn canonical_fields() -> Vec<&'static str> {
    FIELD_PATTERNS.iter().map(|pattern| pattern.field).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataProblem {
    Empty,
    NonNumeric,
}

impl fmt::Display for DataProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataProblem::Empty => write!(f, "empty value"),
            DataProblem::NonNumeric => write!(f, "non-numeric value"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnProblem {
    pub column: String,
    pub reason: DataProblem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeField {
    pub column: String,
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("required column(s) not found: {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },
    #[error("invalid data in column(s): {}", describe_problems(.problems))]
    DataQuality { problems: Vec<ColumnProblem> },
    #[error("categorical value(s) out of range: {}", describe_ranges(.fields))]
    RangeViolation { fields: Vec<RangeField> },
}

impl ValidationError {
    /// Canonical field names the error refers to, in canonical order.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ValidationError::SchemaMismatch { missing } => {
                missing.iter().map(String::as_str).collect()
            }
            ValidationError::DataQuality { problems } => {
                problems.iter().map(|p| p.column.as_str()).collect()
            }
            ValidationError::RangeViolation { fields } => {
                fields.iter().map(|f| f.column.as_str()).collect()
            }
        }
    }
}

fn describe_problems(problems: &[ColumnProblem]) -> String {
    problems
        .iter()
        .map(|problem| format!("{} ({})", problem.column, problem.reason))
        .join(", ")
}

fn describe_ranges(fields: &[RangeField]) -> String {
    fields
        .iter()
        .map(|field| format!("{} must be {}-{}", field.column, field.min, field.max))
        .join(", ")
}

/// A canonical field bound to a column of the raw table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundColumn {
    pub field: &'static str,
    pub index: usize,
    pub header: String,
}

/// The complete binding of all canonical fields, in canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinding {
    pub columns: Vec<BoundColumn>,
}

impl ColumnBinding {
    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|column| column.field == field)
            .map(|column| column.index)
    }

    fn require(&self, field: &str) -> usize {
        // Every canonical field is bound once construction succeeded.
        self.index_of(field).unwrap_or_default()
    }
}

pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Binds every canonical field to an input header, reporting all unbound fields at once.
pub fn bind_columns(headers: &[String]) -> Result<ColumnBinding, ValidationError> {
    let normalized = headers
        .iter()
        .map(|header| normalize_header(header))
        .collect::<Vec<_>>();
    let mut columns = Vec::with_capacity(FIELD_PATTERNS.len());
    let mut missing = Vec::new();

    for pattern in &FIELD_PATTERNS {
        let found = pattern.candidates.iter().find_map(|candidate| {
            normalized
                .iter()
                .position(|header| header.contains(candidate))
        });
        match found {
            Some(index) => {
                debug!(
                    "Bound '{}' to input column '{}' (position {})",
                    pattern.field,
                    headers[index].trim(),
                    index + 1
                );
                columns.push(BoundColumn {
                    field: pattern.field,
                    index,
                    header: headers[index].clone(),
                });
            }
            None => missing.push(pattern.field.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(ColumnBinding { columns })
    } else {
        Err(ValidationError::SchemaMismatch { missing })
    }
}

/// One validated household. `nik` is already reduced to its display form.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRecord {
    pub rw: String,
    pub rt: String,
    pub dusun: String,
    pub nik: String,
    pub name: String,
    pub criteria: [f64; CRITERION_COUNT],
}

/// Validated batch in input row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalTable {
    pub records: Vec<SubjectRecord>,
}

impl CanonicalTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubjectRecord> {
        self.records.iter()
    }

    /// Decision matrix `X`, one row per record in criterion order.
    pub fn decision_matrix(&self) -> Vec<[f64; CRITERION_COUNT]> {
        self.records.iter().map(|record| record.criteria).collect()
    }

    /// Renders the table back into raw form under canonical headers.
    pub fn to_raw(&self) -> RawTable {
        let headers = canonical_fields()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let rows = self
            .records
            .iter()
            .map(|record| {
                let mut row = vec![
                    Cell::from_text(&record.rw),
                    Cell::from_text(&record.rt),
                    Cell::from_text(&record.dusun),
                    Cell::from_text(&record.nik),
                    Cell::from_text(&record.name),
                ];
                row.extend(record.criteria.iter().map(|value| Cell::Number(*value)));
                row
            })
            .collect();
        RawTable::new(headers, rows)
    }
}

/// Display form of a national ID: drop a trailing `.0`, zero-pad to 16, keep the last 4.
///
/// The result is lossy and must never be used to identify a household.
pub fn display_nik(cell: &Cell) -> String {
    let rendered = cell.as_display();
    let trimmed = rendered.strip_suffix(".0").unwrap_or(&rendered);
    let length = trimmed.chars().count();
    let padded = if length < NIK_PAD_WIDTH {
        format!("{}{}", "0".repeat(NIK_PAD_WIDTH - length), trimmed)
    } else {
        trimmed.to_string()
    };
    let skip = padded.chars().count().saturating_sub(NIK_DISPLAY_DIGITS);
    padded.chars().skip(skip).collect()
}

/// Maps `raw` onto the canonical schema and validates it for ranking.
pub fn reconcile_and_validate(raw: &RawTable) -> Result<CanonicalTable, ValidationError> {
    let binding = bind_columns(&raw.headers)?;

    let criterion_columns = CRITERIA.map(|criterion| binding.require(criterion.name));
    let mut problems = Vec::new();
    for (criterion, column) in CRITERIA.iter().zip(criterion_columns) {
        let reason = if raw.column(column).any(Cell::is_empty) {
            Some(DataProblem::Empty)
        } else if raw.column(column).any(|cell| parse_criterion(cell).is_none()) {
            Some(DataProblem::NonNumeric)
        } else {
            None
        };
        if let Some(reason) = reason {
            problems.push(ColumnProblem {
                column: criterion.name.to_string(),
                reason,
            });
        }
    }
    if !problems.is_empty() {
        return Err(ValidationError::DataQuality { problems });
    }

    let mut violations = Vec::new();
    for (field, min, max) in RANGE_RULES {
        let column = binding.require(field);
        let out_of_range = raw.column(column).any(|cell| {
            parse_criterion(cell).is_some_and(|value| value < min as f64 || value > max as f64)
        });
        if out_of_range {
            violations.push(RangeField {
                column: field.to_string(),
                min,
                max,
            });
        }
    }
    if !violations.is_empty() {
        return Err(ValidationError::RangeViolation { fields: violations });
    }

    let rw = binding.require(FIELD_RW);
    let rt = binding.require(FIELD_RT);
    let dusun = binding.require(FIELD_DUSUN);
    let nik = binding.require(FIELD_NIK);
    let name = binding.require(FIELD_NAME);
    let records = (0..raw.row_count())
        .map(|row| SubjectRecord {
            rw: raw.cell(row, rw).as_display(),
            rt: raw.cell(row, rt).as_display(),
            dusun: raw.cell(row, dusun).as_display(),
            nik: display_nik(raw.cell(row, nik)),
            name: raw.cell(row, name).as_display(),
            criteria: criterion_columns
                .map(|column| parse_criterion(raw.cell(row, column)).unwrap_or_default()),
        })
        .collect::<Vec<_>>();
    debug!("Validated {} household record(s)", records.len());
    Ok(CanonicalTable { records })
}

fn parse_criterion(cell: &Cell) -> Option<f64> {
    cell.as_real().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn bind_columns_is_case_and_whitespace_insensitive() {
        let binding = bind_columns(&headers(&[
            "  NO RW ",
            "No RT",
            "Desa",
            "Nomor NIK",
            "Nama KK",
            "Jml Tanggungan",
            "UMUR",
            "Pekerjaan Utama",
            "Status Kawin",
        ]))
        .expect("binding");
        let indices = binding
            .columns
            .iter()
            .map(|column| column.index)
            .collect::<Vec<_>>();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn first_binding_wins_over_later_candidates() {
        // "dusun" is tried before "desa", so the later "desa" header is ignored.
        let binding = bind_columns(&headers(&[
            "rw", "rt", "desa", "dusun", "nik", "nama", "tanggungan", "usia", "pekerjaan",
            "status",
        ]))
        .expect("binding");
        assert_eq!(binding.index_of(FIELD_DUSUN), Some(3));
    }

    #[test]
    fn bind_columns_reports_every_missing_field() {
        let err = bind_columns(&headers(&["rw", "rt", "dusun", "nik", "nama"])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::SchemaMismatch {
                missing: vec![
                    FIELD_DEPENDENTS.to_string(),
                    FIELD_AGE.to_string(),
                    FIELD_OCCUPATION.to_string(),
                    FIELD_STATUS.to_string(),
                ]
            }
        );
    }

    #[test]
    fn criteria_are_canonical_fields_in_schema_order() {
        let fields = canonical_fields();
        let names = CRITERIA.map(|criterion| criterion.name);
        assert_eq!(&fields[5..], &names[..]);
    }

    #[test]
    fn display_nik_pads_and_truncates() {
        assert_eq!(display_nik(&Cell::Text("3201234567890123".into())), "0123");
        assert_eq!(display_nik(&Cell::Text("3201234567890123.0".into())), "0123");
        assert_eq!(display_nik(&Cell::Number(3201234567891234.0)), "1234");
        assert_eq!(display_nik(&Cell::Text("12".into())), "0012");
        assert_eq!(display_nik(&Cell::Empty), "0000");
    }

    #[test]
    fn error_messages_name_fields_and_reasons() {
        let err = ValidationError::DataQuality {
            problems: vec![
                ColumnProblem {
                    column: FIELD_AGE.into(),
                    reason: DataProblem::Empty,
                },
                ColumnProblem {
                    column: FIELD_STATUS.into(),
                    reason: DataProblem::NonNumeric,
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("Usia (empty value)"));
        assert!(message.contains("Status (non-numeric value)"));
        assert_eq!(err.fields(), vec![FIELD_AGE, FIELD_STATUS]);
    }
}
