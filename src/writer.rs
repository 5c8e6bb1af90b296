use csv::Writer;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{CutoffError, Result};
use crate::table::WideTable;

const HEADER_FILL: u32 = 0xD3D3D3;
const FONT_NAME: &str = "Arial";
const FONT_SIZE: f64 = 10.0;
const CODE_WIDTH: f64 = 10.0;
const NAME_WIDTH: f64 = 90.0;
const DEFAULT_WIDTH: f64 = 18.0;
const MAX_SHEET_NAME: usize = 31;

/// Write every `(tab name, table)` pair as a styled worksheet, in order.
pub fn write_workbook(path: &Path, tabs: &[(&str, &WideTable)]) -> Result<()> {
    let output_error = |e: XlsxError| CutoffError::Output {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let mut used_names = HashSet::new();

    for (name, table) in tabs {
        let sheet_name = unique_sheet_name(name, &mut used_names);
        let worksheet = workbook.add_worksheet().set_name(&sheet_name).map_err(output_error)?;
        write_table(worksheet, table).map_err(output_error)?;
    }

    workbook.save(path).map_err(output_error)?;
    log::info!("wrote {} tab(s) to {}", tabs.len(), path.display());
    Ok(())
}

fn write_table(worksheet: &mut Worksheet, table: &WideTable) -> std::result::Result<(), XlsxError> {
    let body = Format::new()
        .set_font_name(FONT_NAME)
        .set_font_size(FONT_SIZE)
        .set_border(FormatBorder::Thin)
        .set_text_wrap()
        .set_align(FormatAlign::Top);
    let header = body
        .clone()
        .set_bold()
        .set_background_color(Color::RGB(HEADER_FILL));

    for (col, label) in table.columns().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, label, &header)?;
        let width = match col {
            0 => CODE_WIDTH,
            1 => NAME_WIDTH,
            _ => DEFAULT_WIDTH,
        };
        worksheet.set_column_width(col, width)?;
    }

    let base_count = table.base_columns().len();
    for (i, row) in table.rows().iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, value) in row.base.iter().enumerate() {
            worksheet.write_string_with_format(r, col as u16, value, &body)?;
        }
        for (offset, label) in table.program_columns().iter().enumerate() {
            let col = (base_count + offset) as u16;
            match row.get(label) {
                Some(value) => worksheet.write_number_with_format(r, col, value, &body)?,
                None => worksheet.write_blank(r, col, &body)?,
            };
        }
    }
    Ok(())
}

/// Excel-safe tab name: forbidden characters replaced, at most 31 chars,
/// suffixed with a counter when already taken.
pub fn unique_sheet_name(name: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim();
    let base: String = if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned.chars().take(MAX_SHEET_NAME).collect()
    };

    let mut candidate = base.clone();
    let mut counter = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({})", counter);
        let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
        candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        counter += 1;
    }
    used.insert(candidate.to_lowercase());
    candidate
}

/// Plain CSV rendition of a table; absent cells are empty fields.
pub fn write_csv(path: &Path, table: &WideTable) -> Result<()> {
    let output_error = |e: csv::Error| CutoffError::Output {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let mut writer = Writer::from_path(path).map_err(output_error)?;
    writer
        .write_record(table.columns())
        .map_err(output_error)?;

    for row in table.rows() {
        let mut record: Vec<String> = row.base.clone();
        record.extend(
            table
                .program_columns()
                .iter()
                .map(|label| row.get(label).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record).map_err(output_error)?;
    }

    writer.flush().map_err(|e| CutoffError::Output {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(())
}
