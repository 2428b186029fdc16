//! services/api/src/adapters/spreadsheet.rs
//!
//! Parses an uploaded fee sheet into `FeeRow`s. Workbooks (xlsx, xls, ods) are
//! read from their first worksheet; anything else is treated as CSV with a
//! header row. Columns are located by header text, so extra columns and any
//! column order are accepted.

use calamine::{open_workbook_auto_from_rs, Reader};
use csv::{ReaderBuilder, Trim};
use dropout_tracker_core::fees::FeeRow;
use regex::Regex;
use std::io::Cursor;
use std::sync::OnceLock;

#[derive(Debug, thiserror::Error)]
pub enum SpreadsheetError {
    #[error("Sheet has no '{0}' column")]
    MissingColumn(&'static str),
    #[error("Sheet contains no data rows")]
    Empty,
    #[error("Workbook has no worksheets")]
    NoWorksheet,
    #[error("Could not read sheet: {0}")]
    Csv(#[from] csv::Error),
    #[error("Could not read workbook: {0}")]
    Workbook(#[from] calamine::Error),
}

/// Zip container (xlsx, ods).
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// OLE compound file (legacy xls).
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

fn name_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(student[\s_]*)?name$").expect("valid regex"))
}

fn months_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)unpaid[\s_]*months?").expect("valid regex"))
}

fn find_column(headers: &[String], pattern: &Regex) -> Option<usize> {
    headers
        .iter()
        .position(|h| pattern.is_match(h.trim_start_matches('\u{feff}').trim()))
}

/// Reads an unpaid-months cell. Empty means zero; anything that is not a
/// whole, non-negative number yields `None`.
fn parse_months(cell: &str) -> Option<u32> {
    if cell.is_empty() {
        return Some(0);
    }
    if let Ok(n) = cell.parse::<u32>() {
        return Some(n);
    }
    match cell.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) => Some(f as u32),
        _ => None,
    }
}

pub fn is_workbook(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC) || data.starts_with(OLE_MAGIC)
}

pub fn parse_fee_sheet(data: &[u8]) -> Result<Vec<FeeRow>, SpreadsheetError> {
    let mut table = if is_workbook(data) {
        read_workbook(data)?
    } else {
        read_csv(data)?
    };
    if table.is_empty() {
        return Err(SpreadsheetError::Empty);
    }
    let headers = table.remove(0);
    rows_from_table(&headers, table)
}

fn read_csv(data: &[u8]) -> Result<Vec<Vec<String>>, SpreadsheetError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let mut table = Vec::new();
    for record in reader.records() {
        table.push(record?.iter().map(str::to_string).collect());
    }
    Ok(table)
}

fn read_workbook(data: &[u8]) -> Result<Vec<Vec<String>>, SpreadsheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SpreadsheetError::NoWorksheet)??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string().trim().to_string()).collect())
        .collect())
}

fn rows_from_table(
    headers: &[String],
    records: Vec<Vec<String>>,
) -> Result<Vec<FeeRow>, SpreadsheetError> {
    let name_col =
        find_column(headers, name_header()).ok_or(SpreadsheetError::MissingColumn("Name"))?;
    let months_col = find_column(headers, months_header())
        .ok_or(SpreadsheetError::MissingColumn("Number of unpaid month"))?;

    let mut rows = Vec::new();
    for record in records {
        if record.iter().all(String::is_empty) {
            continue;
        }
        let cell = |col: usize| record.get(col).map(String::as_str).unwrap_or_default();
        rows.push(FeeRow {
            row_number: rows.len() + 1,
            student_name: cell(name_col).to_string(),
            unpaid_months: parse_months(cell(months_col)),
        });
    }

    if rows.is_empty() {
        return Err(SpreadsheetError::Empty);
    }
    Ok(rows)
}
