use std::fmt;

use thiserror::Error;

/// Errors raised while extracting and reconciling cutoff tables.
#[derive(Error, Debug)]
pub enum CutoffError {
    /// A required column or identity marker is missing from a source.
    #[error("{source_name}: missing required column(s) {}", .missing.join(", "))]
    Schema {
        source_name: String,
        missing: Vec<String>,
    },

    #[error("not found: {0}")]
    NotFound(String),

    /// A cutoff cell could not be read as a finite number.
    #[error("cannot parse cutoff value '{0}'")]
    Parse(String),

    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: String, message: String },

    #[error("failed to write {path}: {message}")]
    Output { path: String, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A source was read but contributed no institution rows.
    #[error("no cutoff rows extracted")]
    EmptySource,

    #[error("no usable cutoff data was produced from any source")]
    NoData,
}

pub type Result<T> = std::result::Result<T, CutoffError>;

impl CutoffError {
    pub fn schema(source_name: impl Into<String>, missing: Vec<String>) -> Self {
        Self::Schema {
            source_name: source_name.into(),
            missing,
        }
    }
}

/// A sheet- or source-level failure that was recovered by skipping the unit.
#[derive(Debug)]
pub struct SourceWarning {
    pub source_name: String,
    pub error: CutoffError,
}

impl SourceWarning {
    pub fn new(source_name: impl Into<String>, error: CutoffError) -> Self {
        Self {
            source_name: source_name.into(),
            error,
        }
    }
}

impl fmt::Display for SourceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} skipped: {}", self.source_name, self.error)
    }
}
