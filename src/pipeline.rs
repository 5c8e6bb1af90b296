use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregator::TableAggregator;
use crate::catalog::CourseCatalog;
use crate::error::{CutoffError, Result, SourceWarning};
use crate::merger::MultiSourceMerger;
use crate::models::{Authority, Config, WORKBOOK_EXTENSIONS};
use crate::scanner::{ScanSettings, SectionScanner};
use crate::sheet::Sheet;
use crate::table::WideTable;
use crate::tabular::TabularExtractor;
use crate::workbook::WorkbookSource;

/// The table extracted from one input workbook.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub name: String,
    pub path: PathBuf,
    pub table: WideTable,
}

#[derive(Debug)]
pub struct RunOutcome {
    /// Usable per-source tables, in input order.
    pub sources: Vec<SourceTable>,
    pub reconciled: WideTable,
    /// Sheets and sources that were skipped, with the reason.
    pub warnings: Vec<SourceWarning>,
}

/// Extraction and reconciliation for one authority's batch of workbooks.
pub struct Pipeline<R: WorkbookSource> {
    config: Config,
    reader: R,
    catalog: CourseCatalog,
    settings: ScanSettings,
}

impl<R: WorkbookSource> Pipeline<R> {
    /// Loads the course catalog from the first sheet of `config.catalog_file`.
    pub fn new(config: Config, reader: R) -> Result<Self> {
        let catalog_path = Path::new(&config.catalog_file);
        let mut read = reader.read_sheets(catalog_path)?;
        if read.sheets.is_empty() {
            if let Some((_, error)) = read.failures.pop() {
                return Err(error);
            }
        }
        let first = read.sheets.first().ok_or_else(|| {
            CutoffError::schema(
                &config.catalog_file,
                vec![
                    config.catalog_columns.code.clone(),
                    config.catalog_columns.name.clone(),
                    config.catalog_columns.interested.clone(),
                ],
            )
        })?;
        let catalog = CourseCatalog::load(first, &config.catalog_columns)?;
        Self::with_catalog(config, reader, catalog)
    }

    pub fn with_catalog(config: Config, reader: R, catalog: CourseCatalog) -> Result<Self> {
        let settings = ScanSettings::new(&config.scan)?;
        Ok(Self {
            config,
            reader,
            catalog,
            settings,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &CourseCatalog {
        &self.catalog
    }

    /// Build one source's table from its sheets. Sheet-level problems are
    /// returned as warnings; the remaining sheets still count.
    pub fn extract_sheets(&self, source_name: &str, sheets: &[Sheet]) -> (WideTable, Vec<SourceWarning>) {
        match self.config.authority {
            Authority::Kcet => {
                let scanner = SectionScanner::new(&self.catalog, &self.config.institutions, &self.settings);
                let records = sheets.iter().flat_map(|sheet| scanner.scan_sheet(sheet));
                let aggregator =
                    TableAggregator::new(&self.config.tabular.code_column, &self.config.tabular.name_column);
                (aggregator.aggregate(records), Vec::new())
            }
            Authority::Comedk => {
                let extractor = TabularExtractor::new(&self.catalog, &self.config.tabular);
                let mut warnings = Vec::new();
                let mut tables = Vec::new();
                for sheet in sheets {
                    let sheet_name = format!("{}/{}", source_name, sheet.name);
                    match extractor.extract(sheet) {
                        Ok(table) => tables.push((sheet_name, table)),
                        Err(e) => {
                            let warning = SourceWarning::new(sheet_name, e);
                            log::warn!("{}", warning);
                            warnings.push(warning);
                        }
                    }
                }
                let merged = MultiSourceMerger::new(extractor.base_columns()).merge(tables);
                warnings.extend(merged.warnings);
                (merged.table, warnings)
            }
        }
    }

    /// Process `inputs` in order (earliest round first) and reconcile them.
    ///
    /// Missing, unreadable or empty sources are skipped and reported. The run
    /// only fails when nothing usable came out of any source.
    pub fn run<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<RunOutcome> {
        let mut sources = Vec::new();
        let mut warnings = Vec::new();

        for input in inputs {
            let path = input.as_ref();
            let name = source_name(path);
            log::info!("processing {} source {}", self.config.authority, path.display());

            let read = match self.reader.read_sheets(path) {
                Ok(read) => read,
                Err(e) => {
                    let warning = SourceWarning::new(name, e);
                    log::warn!("{}", warning);
                    warnings.push(warning);
                    continue;
                }
            };

            for (sheet_name, error) in read.failures {
                let warning = SourceWarning::new(format!("{}/{}", name, sheet_name), error);
                log::warn!("{}", warning);
                warnings.push(warning);
            }

            let (table, sheet_warnings) = self.extract_sheets(&name, &read.sheets);
            warnings.extend(sheet_warnings);

            if table.is_empty() {
                let warning = SourceWarning::new(name, CutoffError::EmptySource);
                log::warn!("{}", warning);
                warnings.push(warning);
                continue;
            }

            log::info!(
                "{}: {} institution(s), {} program column(s)",
                name,
                table.len(),
                table.program_columns().len()
            );
            sources.push(SourceTable {
                name,
                path: path.to_path_buf(),
                table,
            });
        }

        let merger = MultiSourceMerger::new(self.config.base_columns());
        let merged = merger.merge(sources.iter().map(|s| (s.name.clone(), s.table.clone())));
        warnings.extend(merged.warnings);

        if merged.table.is_empty() {
            return Err(CutoffError::NoData);
        }

        Ok(RunOutcome {
            sources,
            reconciled: merged.table,
            warnings,
        })
    }
}

/// Display name of a source: its file stem.
pub fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NameChunk {
    /// Digit run without leading zeros, ordered by length first so the
    /// comparison is numeric.
    Number(usize, String),
    Text(String),
}

/// File name sort key in which digit runs compare by value (`R2` < `R10`).
fn natural_key(path: &Path) -> Vec<NameChunk> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut chunks = Vec::new();
    let mut rest = name.as_str();
    while let Some(first) = rest.chars().next() {
        let digits = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        chunks.push(if digits {
            let value = run.trim_start_matches('0');
            NameChunk::Number(value.len(), value.to_string())
        } else {
            NameChunk::Text(run.to_string())
        });
        rest = tail;
    }
    chunks
}

/// Input workbooks for a run: the configured `input_files` (relative to the
/// data directory) in their given order, or every workbook in the data
/// directory in natural file name order, so round 10 comes after round 2.
pub fn discover_inputs(config: &Config) -> Result<Vec<PathBuf>> {
    let data_dir = Path::new(config.data_dir());

    if !config.input_files.is_empty() {
        return Ok(config.input_files.iter().map(|f| data_dir.join(f)).collect());
    }

    let entries = fs::read_dir(data_dir).map_err(|_| CutoffError::NotFound(data_dir.display().to_string()))?;
    let catalog = Path::new(&config.catalog_file).file_name().map(|n| n.to_os_string());

    let mut inputs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| WORKBOOK_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        // Excel lock files and the catalog itself are not rounds.
        .filter(|path| {
            let file_name = path.file_name().map(|n| n.to_os_string());
            let lock_file = file_name
                .as_ref()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("~$"));
            !lock_file && file_name != catalog
        })
        .collect();
    inputs.sort_by_cached_key(|path| natural_key(path));
    Ok(inputs)
}
