use crate::error::{CutoffError, Result};

/// A single spreadsheet cell as seen by the extractors.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

pub type Row = Vec<Cell>;

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Numeric reading of the cell. Text is parsed after trimming; blanks and
    /// anything unparsable give `None`. NaN and infinities are passed through,
    /// callers decide whether they are acceptable.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(text) => text.trim().parse::<f64>().ok(),
            Cell::Empty => None,
        }
    }

    /// A cutoff must be a finite number; anything else is a value-level
    /// parse failure, which callers treat as "no data".
    pub fn cutoff_value(&self) -> Result<f64> {
        match self.as_number() {
            Some(value) if value.is_finite() => Ok(value),
            _ => Err(CutoffError::Parse(self.to_display_string())),
        }
    }

    /// Text form used for identifiers: whole numbers lose their `.0`, so a
    /// branch code stored as `30316.0` reads back as `30316`.
    pub fn to_display_string(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.trim().to_string(),
            Cell::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            Cell::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// One worksheet: its tab name and its rows in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Tabular sheets carry their column labels in the first row.
    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn data_rows(&self) -> &[Row] {
        self.rows.get(1..).unwrap_or(&[])
    }
}

/// Position of the first cell in `row` whose trimmed text equals `label`.
pub fn find_label(row: &[Cell], label: &str) -> Option<usize> {
    row.iter()
        .position(|cell| cell.as_text().is_some_and(|text| text.trim() == label))
}
