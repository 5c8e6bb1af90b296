//! Admission cutoff aggregation.
//!
//! Pulls per-college, per-program cutoff ranks out of KCET and COMEDK
//! spreadsheet exports, folds them into one row per college, and reconciles
//! several admission rounds into a single table where the latest round wins
//! and earlier rounds fill the gaps.

pub mod aggregator;
pub mod catalog;
pub mod error;
pub mod merger;
pub mod models;
pub mod pipeline;
pub mod policy;
pub mod scanner;
pub mod sheet;
pub mod table;
pub mod tabular;
pub mod workbook;
pub mod writer;

pub use aggregator::TableAggregator;
pub use catalog::{CatalogColumns, CourseCatalog, CourseCode};
pub use error::{CutoffError, SourceWarning};
pub use merger::{MergeOutcome, MultiSourceMerger};
pub use models::{Authority, Config, CutoffRecord};
pub use pipeline::{discover_inputs, Pipeline, RunOutcome, SourceTable};
pub use policy::InstitutionPolicy;
pub use scanner::{ScanSettings, SectionScanner};
pub use sheet::{Cell, Row, Sheet};
pub use table::{WideRow, WideTable};
pub use tabular::TabularExtractor;
pub use workbook::{CalamineReader, WorkbookSheets, WorkbookSource};
