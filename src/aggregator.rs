use crate::models::CutoffRecord;
use crate::table::WideTable;

/// Folds cutoff records into a wide table, one row per institution code.
pub struct TableAggregator {
    code_column: String,
    name_column: String,
}

impl Default for TableAggregator {
    fn default() -> Self {
        Self::new("College Code", "College Name")
    }
}

impl TableAggregator {
    pub fn new(code_column: impl Into<String>, name_column: impl Into<String>) -> Self {
        Self {
            code_column: code_column.into(),
            name_column: name_column.into(),
        }
    }

    /// Rows appear in first-seen order and keep the first name seen for their
    /// code. A repeated (institution, program) pair keeps the later value.
    /// Program columns are sorted by label.
    pub fn aggregate<I>(&self, records: I) -> WideTable
    where
        I: IntoIterator<Item = CutoffRecord>,
    {
        let mut table = WideTable::new(vec![self.code_column.clone(), self.name_column.clone()]);

        for record in records {
            let value = record.value();
            let row = table.upsert_row(vec![record.institution_code, record.institution_name]);
            table.set_value(row, &record.program_label, value);
        }

        table.sort_program_columns();
        table
    }
}
