use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{CutoffError, Result};
use crate::sheet::{Cell, Row, Sheet};

/// What a workbook yielded: the sheets that could be read, in workbook order,
/// and the name and error of each sheet that could not.
#[derive(Debug, Default)]
pub struct WorkbookSheets {
    pub sheets: Vec<Sheet>,
    pub failures: Vec<(String, CutoffError)>,
}

impl From<Vec<Sheet>> for WorkbookSheets {
    fn from(sheets: Vec<Sheet>) -> Self {
        Self {
            sheets,
            failures: Vec::new(),
        }
    }
}

/// Anything that can hand over the sheets of a workbook.
///
/// `Err` means the workbook as a whole is unusable; a single unreadable sheet
/// is reported in [`WorkbookSheets::failures`] instead.
pub trait WorkbookSource {
    fn read_sheets(&self, path: &Path) -> Result<WorkbookSheets>;
}

/// Reads xlsx/xlsm/xlsb/xls/ods files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalamineReader;

impl WorkbookSource for CalamineReader {
    fn read_sheets(&self, path: &Path) -> Result<WorkbookSheets> {
        if !path.exists() {
            return Err(CutoffError::NotFound(path.display().to_string()));
        }

        let workbook_error = |e: calamine::Error| CutoffError::Workbook {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

        let mut read = WorkbookSheets::default();
        for sheet_name in sheet_names {
            let range = match workbook.worksheet_range(&sheet_name) {
                Ok(range) => range,
                Err(e) => {
                    log::debug!("cannot read sheet '{}' from {}: {}", sheet_name, path.display(), e);
                    read.failures.push((sheet_name, workbook_error(e)));
                    continue;
                }
            };
            let rows: Vec<Row> = range
                .rows()
                .map(|row| row.iter().map(convert_cell).collect())
                .collect();
            log::debug!("read sheet '{}' from {} ({} rows)", sheet_name, path.display(), rows.len());
            read.sheets.push(Sheet::new(sheet_name, rows));
        }
        Ok(read)
    }
}

/// In-memory workbooks keyed by path, handy when the sheets are produced by
/// something other than a file.
impl WorkbookSource for HashMap<PathBuf, Vec<Sheet>> {
    fn read_sheets(&self, path: &Path) -> Result<WorkbookSheets> {
        self.get(path)
            .cloned()
            .map(WorkbookSheets::from)
            .ok_or_else(|| CutoffError::NotFound(path.display().to_string()))
    }
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        // Dates stay serial numbers, same as the other numeric cells.
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}
