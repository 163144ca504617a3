use std::fmt;

/// A single spreadsheet cell as read from the input file.
///
/// CSV input only ever yields [`Cell::Empty`] or [`Cell::Text`]; XLSX input
/// keeps numeric cells as [`Cell::Number`] so identifiers such as NIK can be
/// rendered without float artifacts.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Builds a cell from a raw text field, treating whitespace-only input as empty.
    pub fn from_text(value: &str) -> Self {
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Parses the cell as a real number. Empty cells and unparsable text yield `None`.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Number(value) => Some(*value),
            Cell::Text(text) => text.trim().parse::<f64>().ok(),
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.trim().to_string(),
            Cell::Number(value) => format_number(*value),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Renders integral numbers without a fractional part (`3.0` -> `3`).
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e17 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Renders a score with a fixed number of decimals for console output.
pub fn format_score(value: f64) -> String {
    format!("{value:.4}")
}

/// Headers plus rows of cells, exactly as they came out of the input file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the cell at `row`/`column`, treating missing trailing cells as empty.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(EMPTY)
    }

    /// Iterates every cell of one column, padding short rows with empty cells.
    pub fn column(&self, column: usize) -> impl Iterator<Item = &Cell> + '_ {
        (0..self.rows.len()).map(move |row| self.cell(row, column))
    }
}
