//! File plumbing around the ranking core.
//!
//! - **Delimiter resolution**: extension based (`.tsv` → tab, otherwise comma)
//!   with manual override.
//! - **Encoding**: CSV input is decoded through `encoding_rs_io`, defaulting to
//!   UTF-8 (a BOM, if present, wins).
//! - **Spreadsheets**: `.xlsx`/`.xlsm`/`.xls`/`.ods` input is read with
//!   `calamine`, keeping numeric cells numeric.
//! - **Output**: ranked results and the blank template are written as CSV;
//!   default file names carry a `YYYYmmddHHMMSS` timestamp.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use calamine::{DataType, Range, Reader, open_workbook_auto};
use chrono::{DateTime, Local};
use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;
use log::debug;

use crate::{
    data::{Cell, RawTable},
    ranking::{RESULT_HEADERS, RankedResult},
    schema,
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';
pub const RESULT_PREFIX: &str = "Hasil_Ranking";
pub const FILTER_PREFIX: &str = "Hasil_Filter";

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Options for turning an input file into a [`RawTable`].
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions<'a> {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    pub sheet: Option<&'a str>,
}

impl Default for ReadOptions<'_> {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
            sheet: None,
        }
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match extension(path).as_deref() {
        Some("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn is_spreadsheet(path: &Path) -> bool {
    extension(path).is_some_and(|ext| SPREADSHEET_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

/// Reads a CSV/TSV or spreadsheet file into a raw table with its header row.
pub fn read_raw_table(path: &Path, options: &ReadOptions<'_>) -> Result<RawTable> {
    if !is_dash(path) && is_spreadsheet(path) {
        read_spreadsheet(path, options.sheet)
    } else {
        let delimiter = resolve_input_delimiter(path, options.delimiter);
        debug!(
            "Reading {:?} as delimited text (delimiter '{}', encoding {})",
            path,
            printable_delimiter(delimiter),
            options.encoding.name()
        );
        let source: Box<dyn Read> = if is_dash(path) {
            Box::new(std::io::stdin().lock())
        } else {
            Box::new(BufReader::new(
                File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
            ))
        };
        read_csv_table(source, delimiter, options.encoding)
    }
}

/// Parses delimited text with a header row. Short rows are allowed.
pub fn read_csv_table<R: Read>(
    source: R,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<RawTable> {
    let decoded = DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .build(source);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(decoded);
    let headers = reader
        .headers()
        .context("Reading header row")?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 2))?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(RawTable::new(headers, rows))
}

fn read_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<RawTable> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Opening spreadsheet {path:?}"))?;
    let range: Range<DataType> = match sheet {
        Some(name) => workbook
            .worksheet_range(name)
            .ok_or_else(|| anyhow!("Worksheet '{name}' not found in {path:?}"))?
            .with_context(|| format!("Reading worksheet '{name}' from {path:?}"))?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| anyhow!("Spreadsheet {path:?} contains no worksheets"))?
            .with_context(|| format!("Reading first worksheet from {path:?}"))?,
    };
    debug!(
        "Reading {:?} worksheet {:?} ({} x {})",
        path,
        sheet.unwrap_or("#1"),
        range.height(),
        range.width()
    );

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header.iter().map(|cell| cell.to_string()).collect(),
        None => bail!("Spreadsheet {path:?} is empty"),
    };
    let mut rows = rows
        .map(|row| row.iter().map(spreadsheet_cell).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    // Interior blank rows are kept for validation to report; trailing ones are dropped.
    while rows
        .last()
        .is_some_and(|row| row.iter().all(Cell::is_empty))
    {
        rows.pop();
    }
    Ok(RawTable::new(headers, rows))
}

fn spreadsheet_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::Empty => Cell::Empty,
        DataType::Int(value) => Cell::Number(*value as f64),
        DataType::Float(value) => Cell::Number(*value),
        DataType::String(text) => Cell::from_text(text),
        other => Cell::from_text(&other.to_string()),
    }
}

/// `<prefix>_<YYYYmmddHHMMSS>.csv` inside `dir`.
pub fn timestamped_path(dir: &Path, prefix: &str, now: DateTime<Local>) -> PathBuf {
    dir.join(format!("{prefix}_{}.csv", now.format("%Y%m%d%H%M%S")))
}

fn open_writer(path: &Path, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let sink: Box<dyn Write> = if is_dash(path) {
        Box::new(std::io::stdout())
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating output directory {parent:?}"))?;
        }
        Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
        ))
    };
    Ok(csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_writer(sink))
}

/// Writes the ranked rows with the canonical result headers.
pub fn write_ranked_csv(path: &Path, result: &RankedResult, delimiter: u8) -> Result<()> {
    let mut writer = open_writer(path, delimiter)?;
    if result.is_empty() {
        writer.write_record(RESULT_HEADERS)?;
    }
    for row in result.iter() {
        writer
            .serialize(row)
            .with_context(|| format!("Writing ranked row to {path:?}"))?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a ranking CSV previously produced by [`write_ranked_csv`].
pub fn read_ranked_csv(path: &Path, delimiter: u8) -> Result<RankedResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("Opening ranking file {path:?}"))?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Parsing ranking file {path:?}"))?;
    Ok(RankedResult { rows })
}

/// Writes a header-only CSV with the canonical input columns.
pub fn write_template(path: &Path, delimiter: u8) -> Result<()> {
    let mut writer = open_writer(path, delimiter)?;
    writer.write_record(schema::canonical_fields())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn delimiter_follows_extension_unless_overridden() {
        assert_eq!(resolve_input_delimiter(Path::new("a.TSV"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("a.csv"), None), b',');
        assert_eq!(resolve_input_delimiter(Path::new("a.csv"), Some(b';')), b';');
    }

    #[test]
    fn spreadsheet_detection_is_case_insensitive() {
        assert!(is_spreadsheet(Path::new("data/warga.XLSX")));
        assert!(!is_spreadsheet(Path::new("data/warga.csv")));
    }

    #[test]
    fn timestamped_path_uses_compact_timestamp() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            timestamped_path(Path::new("out"), RESULT_PREFIX, now),
            Path::new("out").join("Hasil_Ranking_20240309070501.csv")
        );
    }

    #[test]
    fn csv_reader_keeps_blank_fields_empty_and_decodes_latin1() {
        let bytes = b"Nama,Usia\nJos\xe9,\nAni, 40\n";
        let encoding = resolve_encoding(Some("latin1")).unwrap();
        let table = read_csv_table(&bytes[..], b',', encoding).unwrap();
        assert_eq!(table.headers, vec!["Nama", "Usia"]);
        assert_eq!(table.cell(0, 0), &Cell::Text("José".into()));
        assert_eq!(table.cell(0, 1), &Cell::Empty);
        assert_eq!(table.cell(1, 1).as_real(), Some(40.0));
    }

    fn workbook_fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/warga.xlsx")
    }

    #[test]
    fn spreadsheet_numbers_stay_numeric_and_trailing_blank_rows_drop() {
        let table = read_raw_table(&workbook_fixture(), &ReadOptions::default()).unwrap();
        assert_eq!(table.headers[1], "RW");
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.cell(0, 1), &Cell::Number(1.0));
        assert_eq!(table.cell(0, 1).as_display(), "1");
        assert_eq!(table.cell(2, 4), &Cell::Number(3201010101017003.0));
        assert_eq!(table.cell(2, 5), &Cell::Text("Suparmi".into()));
    }

    #[test]
    fn spreadsheet_keeps_interior_blank_rows() {
        let options = ReadOptions {
            sheet: Some("Kosong"),
            ..ReadOptions::default()
        };
        let table = read_raw_table(&workbook_fixture(), &options).unwrap();
        assert_eq!(table.row_count(), 3);
        assert!((0..10).all(|col| table.cell(1, col).is_empty()));
        assert_eq!(table.cell(2, 5), &Cell::Text("Suparmi".into()));
    }

    #[test]
    fn unknown_worksheet_is_an_error() {
        let options = ReadOptions {
            sheet: Some("Tidak Ada"),
            ..ReadOptions::default()
        };
        let err = read_raw_table(&workbook_fixture(), &options).unwrap_err();
        assert!(err.to_string().contains("Worksheet 'Tidak Ada' not found"));
    }
}
