use crate::error::{CutoffError, SourceWarning};
use crate::table::WideTable;

/// Result of reconciling several per-source tables.
#[derive(Debug)]
pub struct MergeOutcome {
    pub table: WideTable,
    pub warnings: Vec<SourceWarning>,
}

/// Outer-joins per-source tables on the institution code.
///
/// Sources are given earliest first. For a cell present in several sources
/// the latest value wins; a cell missing from a later source keeps the
/// earlier value. Columns keep the order in which their label was first seen.
pub struct MultiSourceMerger {
    base_columns: Vec<String>,
}

impl MultiSourceMerger {
    pub fn new(base_columns: Vec<String>) -> Self {
        Self { base_columns }
    }

    /// Sources lacking a base column are skipped and reported as warnings.
    pub fn merge<I, S>(&self, sources: I) -> MergeOutcome
    where
        I: IntoIterator<Item = (S, WideTable)>,
        S: Into<String>,
    {
        let mut accumulator: Option<WideTable> = None;
        let mut warnings = Vec::new();

        for (name, table) in sources {
            let name = name.into();
            let table = match table.project(&self.base_columns) {
                Ok(table) => table,
                Err(missing) => {
                    let warning = SourceWarning::new(name.clone(), CutoffError::schema(name, missing));
                    log::warn!("{}", warning);
                    warnings.push(warning);
                    continue;
                }
            };

            match accumulator.as_mut() {
                None => accumulator = Some(table),
                Some(acc) => {
                    log::debug!("coalescing '{}' ({} rows) into {} rows", name, table.len(), acc.len());
                    coalesce_into(acc, table);
                }
            }
        }

        MergeOutcome {
            table: accumulator.unwrap_or_else(|| WideTable::new(self.base_columns.clone())),
            warnings,
        }
    }
}

/// Fold `later` into `acc`, later values overriding earlier ones.
fn coalesce_into(acc: &mut WideTable, later: WideTable) {
    for label in later.program_columns() {
        acc.add_column(label);
    }

    for row in later.rows() {
        let idx = acc.upsert_row(row.base.clone());
        for label in later.program_columns() {
            if let Some(value) = row.get(label) {
                acc.set_value(idx, label, value);
            }
        }
    }
}
