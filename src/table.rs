use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{
    data::format_score,
    ranking::{RESULT_HEADERS, RankedResult},
    schema::{ColumnBinding, FIELD_PATTERNS},
};

/// Plain-text table of a ranking, one line per household.
pub fn render_ranking(result: &RankedResult) -> String {
    let headers = RESULT_HEADERS.map(str::to_string);
    let rows = result
        .iter()
        .map(|row| {
            vec![
                row.rw.clone(),
                row.rt.clone(),
                row.dusun.clone(),
                row.nik.clone(),
                row.name.clone(),
                format_score(row.saw_score),
                format_score(row.topsis_score),
                row.rank.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

/// Which input header each canonical field was read from.
pub fn render_binding(binding: &ColumnBinding) -> String {
    let headers = ["field", "input column", "position"].map(str::to_string);
    let rows = FIELD_PATTERNS
        .iter()
        .filter_map(|pattern| {
            binding
                .columns
                .iter()
                .find(|column| column.field == pattern.field)
        })
        .map(|column| {
            vec![
                column.field.to_string(),
                column.header.trim().to_string(),
                (column.index + 1).to_string(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(single_line(cell).chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(headers, &widths));
    let rule = widths
        .iter()
        .map(|width| "-".repeat((*width).max(1)))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_line(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_line(row, &widths));
    }
    output
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", single_line(cell), width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn single_line(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
