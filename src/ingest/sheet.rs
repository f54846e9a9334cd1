//! Spreadsheet readers producing a uniform grid of cell text.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::{AppError, Result};

/// Header row plus data rows, every cell rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    /// Raw header cells.
    pub headers: Vec<String>,
    /// Data rows; may be shorter or longer than `headers`.
    pub rows: Vec<Vec<String>>,
}

/// Read a CSV document. Ragged rows are accepted.
///
/// # Errors
///
/// Returns `AppError::Format` if the bytes are not valid CSV.
pub fn read_csv(bytes: &[u8]) -> Result<Sheet> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|err| AppError::Format(format!("unreadable CSV header: {err}")))?
        .iter()
        .map(str::to_owned)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| AppError::Format(format!("unreadable CSV row: {err}")))?;
        rows.push(record.iter().map(str::to_owned).collect());
    }

    Ok(Sheet { headers, rows })
}

/// Read the first worksheet of an XLSX/XLS/ODS workbook.
///
/// # Errors
///
/// Returns `AppError::Format` if the workbook cannot be opened or is empty.
pub fn read_excel(bytes: &[u8]) -> Result<Sheet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|err| AppError::Format(format!("unreadable workbook: {err}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Format("workbook has no worksheets".into()))?
        .map_err(|err| AppError::Format(format!("unreadable worksheet: {err}")))?;

    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    Ok(Sheet {
        headers,
        rows: rows.collect(),
    })
}

/// Render one workbook cell as text the row normalizer understands.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => float_text(*f),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|naive| naive.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        other => other.to_string(),
    }
}

/// Whole floats print without a fractional part so numeric ids stay `101`.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn float_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
