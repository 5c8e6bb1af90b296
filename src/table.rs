use std::collections::HashMap;

/// One institution's row: its base column values and its program cells.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    /// Values aligned with the owning table's base columns. The first one is
    /// the institution code and acts as the row key.
    pub base: Vec<String>,
    pub cells: HashMap<String, f64>,
}

impl WideRow {
    pub fn key(&self) -> &str {
        self.base.first().map(String::as_str).unwrap_or_default()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.cells.get(label).copied()
    }
}

/// Rectangular cutoff table: one row per institution, one column per program.
///
/// Rows keep insertion order and are unique by institution code. Cells only
/// ever hold finite values; a missing cell means "no data".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    base_columns: Vec<String>,
    program_columns: Vec<String>,
    rows: Vec<WideRow>,
    index: HashMap<String, usize>,
}

impl WideTable {
    pub fn new(base_columns: Vec<String>) -> Self {
        Self {
            base_columns,
            ..Default::default()
        }
    }

    pub fn base_columns(&self) -> &[String] {
        &self.base_columns
    }

    pub fn program_columns(&self) -> &[String] {
        &self.program_columns
    }

    /// All column labels: base columns first, then program columns.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.base_columns
            .iter()
            .chain(self.program_columns.iter())
            .map(String::as_str)
    }

    pub fn rows(&self) -> &[WideRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, key: &str) -> Option<&WideRow> {
        self.index.get(key).map(|&idx| &self.rows[idx])
    }

    pub fn value(&self, key: &str, label: &str) -> Option<f64> {
        self.row(key).and_then(|row| row.get(label))
    }

    pub fn has_column(&self, label: &str) -> bool {
        self.program_columns.iter().any(|c| c == label)
    }

    /// Register a program column; already known labels keep their position.
    pub fn add_column(&mut self, label: &str) {
        if !self.has_column(label) {
            self.program_columns.push(label.to_string());
        }
    }

    /// Index of the row keyed by `base[0]`, appending it when new. The base
    /// values of an existing row are left untouched (first seen wins).
    pub fn upsert_row(&mut self, base: Vec<String>) -> usize {
        let key = base.first().cloned().unwrap_or_default();
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.rows.len();
        self.rows.push(WideRow {
            base,
            cells: HashMap::new(),
        });
        self.index.insert(key, idx);
        idx
    }

    /// Overwrite a cell. Non-finite values are ignored.
    pub fn set_value(&mut self, row: usize, label: &str, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.add_column(label);
        self.rows[row].cells.insert(label.to_string(), value);
    }

    pub fn sort_program_columns(&mut self) {
        self.program_columns.sort();
    }

    /// Copy of this table restricted to `base_columns` (in that order).
    ///
    /// Fails with the list of missing columns when the table lacks any of them.
    pub fn project(&self, base_columns: &[String]) -> Result<WideTable, Vec<String>> {
        let mut positions = Vec::with_capacity(base_columns.len());
        let mut missing = Vec::new();
        for column in base_columns {
            match self.base_columns.iter().position(|c| c == column) {
                Some(pos) => positions.push(pos),
                None => missing.push(column.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(missing);
        }

        let mut projected = WideTable::new(base_columns.to_vec());
        projected.program_columns = self.program_columns.clone();
        for row in &self.rows {
            let base = positions
                .iter()
                .map(|&pos| row.base.get(pos).cloned().unwrap_or_default())
                .collect();
            let idx = projected.upsert_row(base);
            projected.rows[idx].cells.extend(row.cells.iter().map(|(k, v)| (k.clone(), *v)));
        }
        Ok(projected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(code: &str, name: &str) -> Vec<String> {
        vec![code.to_string(), name.to_string()]
    }

    fn columns() -> Vec<String> {
        vec!["College Code".to_string(), "College Name".to_string()]
    }

    #[test]
    fn upsert_deduplicates_by_code() {
        let mut table = WideTable::new(columns());
        let a = table.upsert_row(base("E001", "Example College"));
        let b = table.upsert_row(base("E001", "Example College (renamed)"));
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].base[1], "Example College");
    }

    #[test]
    fn set_value_overwrites_and_registers_columns() {
        let mut table = WideTable::new(columns());
        let row = table.upsert_row(base("E001", "Example College"));
        table.set_value(row, "CS [Computer Science]", 1500.0);
        table.set_value(row, "CS [Computer Science]", 1400.0);
        assert_eq!(table.value("E001", "CS [Computer Science]"), Some(1400.0));
        assert_eq!(table.program_columns(), ["CS [Computer Science]"]);
    }

    #[test]
    fn non_finite_values_are_dropped() {
        let mut table = WideTable::new(columns());
        let row = table.upsert_row(base("E001", "Example College"));
        table.set_value(row, "CS", f64::NAN);
        table.set_value(row, "EC", f64::INFINITY);
        assert!(table.program_columns().is_empty());
        assert_eq!(table.value("E001", "CS"), None);
    }

    #[test]
    fn columns_list_base_then_programs() {
        let mut table = WideTable::new(columns());
        let row = table.upsert_row(base("E001", "Example College"));
        table.set_value(row, "EC", 1.0);
        table.set_value(row, "CS", 2.0);
        table.sort_program_columns();
        let cols: Vec<_> = table.columns().collect();
        assert_eq!(cols, vec!["College Code", "College Name", "CS", "EC"]);
    }

    #[test]
    fn project_reorders_and_drops_base_columns() {
        let mut table = WideTable::new(vec![
            "College Name".to_string(),
            "College Code".to_string(),
            "Seat Category".to_string(),
        ]);
        let row = table.upsert_row(vec!["Example".into(), "E001".into(), "GM".into()]);
        table.set_value(row, "CS", 10.0);

        let projected = table.project(&columns()).unwrap();
        assert_eq!(projected.rows()[0].base, base("E001", "Example"));
        assert_eq!(projected.value("E001", "CS"), Some(10.0));
    }

    #[test]
    fn project_reports_missing_columns() {
        let table = WideTable::new(vec!["College Code".to_string()]);
        let missing = table.project(&columns()).unwrap_err();
        assert_eq!(missing, vec!["College Name".to_string()]);
    }
}
