use crate::catalog::CourseCatalog;
use crate::error::{CutoffError, Result};
use crate::models::TabularLayout;
use crate::sheet::{find_label, Cell, Sheet};
use crate::table::WideTable;

/// Reads sheets that are already tabular: a header row, one row per
/// institution and seat category, one column per program.
pub struct TabularExtractor<'a> {
    catalog: &'a CourseCatalog,
    layout: &'a TabularLayout,
}

impl<'a> TabularExtractor<'a> {
    pub fn new(catalog: &'a CourseCatalog, layout: &'a TabularLayout) -> Self {
        Self { catalog, layout }
    }

    pub fn base_columns(&self) -> Vec<String> {
        vec![
            self.layout.code_column.clone(),
            self.layout.name_column.clone(),
            self.layout.category_column.clone(),
        ]
    }

    /// Category column position, accepting any configured alias.
    fn category_index(&self, header: &[Cell]) -> Option<usize> {
        find_label(header, &self.layout.category_column).or_else(|| {
            self.layout
                .category_aliases
                .iter()
                .find_map(|alias| find_label(header, alias))
        })
    }

    pub fn extract(&self, sheet: &Sheet) -> Result<WideTable> {
        let header = sheet.header().map(Vec::as_slice).unwrap_or(&[]);

        let code_idx = find_label(header, &self.layout.code_column);
        let name_idx = find_label(header, &self.layout.name_column);
        let category_idx = self.category_index(header);

        let (code_idx, name_idx, category_idx) = match (code_idx, name_idx, category_idx) {
            (Some(c), Some(n), Some(s)) => (c, n, s),
            _ => {
                let missing = self
                    .base_columns()
                    .into_iter()
                    .zip([code_idx, name_idx, category_idx])
                    .filter(|(_, idx)| idx.is_none())
                    .map(|(column, _)| column)
                    .collect();
                return Err(CutoffError::schema(&sheet.name, missing));
            }
        };

        let programs: Vec<(String, usize)> = self
            .catalog
            .interested()
            .filter_map(|course| {
                let label = course.dash_label();
                find_label(header, &label).map(|idx| (label, idx))
            })
            .collect();

        let mut table = WideTable::new(self.base_columns());
        for (label, _) in &programs {
            table.add_column(label);
        }

        let text = |row: &[Cell], idx: usize| row.get(idx).map(Cell::to_display_string).unwrap_or_default();

        for row in sheet.data_rows() {
            let row = row.as_slice();
            let category = text(row, category_idx);
            if category != self.layout.category_filter {
                continue;
            }
            let code = text(row, code_idx);
            if code.is_empty() {
                continue;
            }

            let idx = table.upsert_row(vec![code, text(row, name_idx), category]);
            for (label, col) in &programs {
                if let Some(Ok(value)) = row.get(*col).map(Cell::cutoff_value) {
                    table.set_value(idx, label, value);
                }
            }
        }

        log::info!(
            "sheet '{}': {} {} row(s), {} program column(s)",
            sheet.name,
            table.len(),
            self.layout.category_filter,
            programs.len()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CourseCode;

    fn catalog() -> CourseCatalog {
        CourseCatalog::new(vec![
            CourseCode::new("30316", "Aeronautical Engineering", true),
            CourseCode::new("30301", "Computer Science", true),
            CourseCode::new("30399", "Mining", false),
        ])
    }

    fn row(cells: &[Cell]) -> Vec<Cell> {
        cells.to_vec()
    }

    fn t(s: &str) -> Cell {
        Cell::from(s)
    }

    fn n(v: f64) -> Cell {
        Cell::Number(v)
    }

    #[test]
    fn keeps_gm_rows_and_interested_columns() {
        let sheet = Sheet::new(
            "R1",
            vec![
                row(&[
                    t("College Code"),
                    t("College Name"),
                    t("Seat Category"),
                    t("30301-Computer Science"),
                    t("30399-Mining"),
                    t("30316-Aeronautical Engineering"),
                ]),
                row(&[t("E101"), t("Alpha Institute"), t("GM"), n(2100.0), n(50000.0), n(8000.0)]),
                row(&[t("E101"), t("Alpha Institute"), t("KKR"), n(9.0), n(9.0), n(9.0)]),
                row(&[t("E102"), t("Beta Institute"), t("GM"), t("--"), n(1.0), Cell::Empty]),
            ],
        );
        let layout = TabularLayout::default();
        let catalog = catalog();
        let table = TabularExtractor::new(&catalog, &layout).extract(&sheet).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.program_columns(),
            ["30316-Aeronautical Engineering", "30301-Computer Science"]
        );
        assert_eq!(table.value("E101", "30301-Computer Science"), Some(2100.0));
        assert_eq!(table.value("E101", "30316-Aeronautical Engineering"), Some(8000.0));
        assert_eq!(table.value("E102", "30301-Computer Science"), None);
        assert_eq!(table.rows()[1].base, vec!["E102", "Beta Institute", "GM"]);
    }

    #[test]
    fn seat_type_alias_is_accepted() {
        let sheet = Sheet::new(
            "R2",
            vec![
                row(&[t("College Code"), t("College Name"), t("Seat type"), t("30301-Computer Science")]),
                row(&[t("E101"), t("Alpha Institute"), t("GM"), n(1900.0)]),
            ],
        );
        let layout = TabularLayout::default();
        let catalog = catalog();
        let table = TabularExtractor::new(&catalog, &layout).extract(&sheet).unwrap();
        assert_eq!(table.base_columns()[2], "Seat Category");
        assert_eq!(table.value("E101", "30301-Computer Science"), Some(1900.0));
    }

    #[test]
    fn missing_base_columns_are_a_schema_error() {
        let sheet = Sheet::new(
            "Notes",
            vec![row(&[t("College Code"), t("Remarks")])],
        );
        let layout = TabularLayout::default();
        let catalog = catalog();
        let err = TabularExtractor::new(&catalog, &layout).extract(&sheet).unwrap_err();
        match err {
            CutoffError::Schema { source_name, missing } => {
                assert_eq!(source_name, "Notes");
                assert_eq!(missing, vec!["College Name", "Seat Category"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn numeric_college_codes_are_normalised() {
        let sheet = Sheet::new(
            "R1",
            vec![
                row(&[t("College Code"), t("College Name"), t("Seat Category"), t("30301-Computer Science")]),
                row(&[n(101.0), t("Alpha Institute"), t("GM"), n(1900.0)]),
                row(&[Cell::Empty, t("Orphan row"), t("GM"), n(1.0)]),
            ],
        );
        let layout = TabularLayout::default();
        let catalog = catalog();
        let table = TabularExtractor::new(&catalog, &layout).extract(&sheet).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.value("101", "30301-Computer Science"), Some(1900.0));
    }
}
