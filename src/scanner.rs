use regex::Regex;
use std::slice;

use crate::catalog::CourseCatalog;
use crate::error::{CutoffError, Result};
use crate::models::{CutoffRecord, ScanConfig};
use crate::policy::InstitutionPolicy;
use crate::sheet::{find_label, Cell, Row, Sheet};

/// Compiled form of [`ScanConfig`].
#[derive(Debug, Clone)]
pub struct ScanSettings {
    header_pattern: Regex,
    cutoff_marker: String,
    code_separator: String,
}

impl ScanSettings {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let header_pattern = Regex::new(&config.header_pattern).map_err(|e| {
            CutoffError::Config(format!("header_pattern '{}': {}", config.header_pattern, e))
        })?;
        if header_pattern.captures_len() < 3 {
            return Err(CutoffError::Config(format!(
                "header_pattern '{}' must capture an institution code and name",
                config.header_pattern
            )));
        }

        Ok(Self {
            header_pattern,
            cutoff_marker: config.cutoff_marker.clone(),
            code_separator: config.code_separator.clone(),
        })
    }
}

/// One institution's stretch of rows, opened by a header line.
#[derive(Debug, Clone, PartialEq)]
pub struct InstitutionSection {
    pub code: String,
    pub name: String,
    /// Resolved from the first row carrying the cutoff marker, then kept for
    /// the rest of the section.
    pub cutoff_column: Option<usize>,
    included: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum ScanState {
    SeekingSection,
    InSection(InstitutionSection),
}

/// Recovers institution sections and per-program cutoffs from a sheet where
/// the institution is announced by a header line rather than a column.
pub struct SectionScanner<'a> {
    catalog: &'a CourseCatalog,
    policy: &'a InstitutionPolicy,
    settings: &'a ScanSettings,
}

impl<'a> SectionScanner<'a> {
    pub fn new(catalog: &'a CourseCatalog, policy: &'a InstitutionPolicy, settings: &'a ScanSettings) -> Self {
        Self {
            catalog,
            policy,
            settings,
        }
    }

    /// Lazily scan `rows`. Each call starts from a fresh state.
    pub fn scan<'r>(&'r self, rows: &'r [Row]) -> SectionScan<'r> {
        SectionScan {
            scanner: self,
            rows: rows.iter(),
            state: ScanState::SeekingSection,
        }
    }

    pub fn scan_sheet(&self, sheet: &Sheet) -> Vec<CutoffRecord> {
        let records: Vec<CutoffRecord> = self.scan(&sheet.rows).collect();
        log::info!("sheet '{}': {} cutoff record(s)", sheet.name, records.len());
        records
    }

    fn open_section(&self, row: &[Cell]) -> Option<InstitutionSection> {
        let text = row.first()?.as_text()?;
        let caps = self.settings.header_pattern.captures(text)?;
        let code = caps.name("code").or_else(|| caps.get(1))?.as_str().trim();
        let name = caps.name("name").or_else(|| caps.get(2))?.as_str().trim();

        let included = self.policy.is_included(name);
        if included {
            log::debug!("section {} {}", code, name);
        } else {
            log::debug!("skip college {} {}", code, name);
        }

        Some(InstitutionSection {
            code: code.to_string(),
            name: name.to_string(),
            cutoff_column: None,
            included,
        })
    }

    fn read_program_row(&self, section: &InstitutionSection, column: usize, row: &[Cell]) -> Option<CutoffRecord> {
        let candidate = row.first()?.as_text()?;
        let course = self
            .catalog
            .match_program(candidate, &self.settings.code_separator)?;

        let value = row.get(column)?.cutoff_value().ok()?;
        CutoffRecord::new(&section.code, &section.name, course.bracket_label(), value)
    }
}

/// Iterator over the cutoff records of one sheet.
pub struct SectionScan<'r> {
    scanner: &'r SectionScanner<'r>,
    rows: slice::Iter<'r, Row>,
    state: ScanState,
}

impl Iterator for SectionScan<'_> {
    type Item = CutoffRecord;

    fn next(&mut self) -> Option<CutoffRecord> {
        for row in self.rows.by_ref() {
            // A header line always ends the current section.
            if let Some(section) = self.scanner.open_section(row) {
                self.state = ScanState::InSection(section);
                continue;
            }

            let ScanState::InSection(section) = &mut self.state else {
                continue;
            };
            if !section.included {
                continue;
            }

            let Some(column) = section.cutoff_column else {
                section.cutoff_column = find_label(row, &self.scanner.settings.cutoff_marker);
                continue;
            };

            if let Some(record) = self.scanner.read_program_row(section, column, row) {
                return Some(record);
            }
        }
        None
    }
}
