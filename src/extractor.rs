use std::collections::BTreeSet;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use log::debug;

use crate::error::{Result, StatementAnalyzerError};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// A rectangular view of the first sheet of an uploaded workbook.
///
/// Invariants: headers are trimmed, and every row holds exactly
/// `headers.len()` cells (short rows are padded with empty strings, long rows
/// truncated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub metadata: TableMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    pub sheet_name: String,
    pub row_count: usize,
    pub column_count: usize,
    /// Headers that look like reporting periods (year, quarter, or month).
    /// Informational only; the data is never reshaped around them.
    pub period_labels: BTreeSet<String>,
}

/// Decodes workbook bytes (xlsx/xls/ods) and extracts the first sheet.
pub fn extract(bytes: &[u8]) -> Result<ParsedTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
        StatementAnalyzerError::MalformedSpreadsheet(format!("unreadable workbook: {e}"))
    })?;

    let sheet_name = workbook.sheet_names().first().cloned().ok_or_else(|| {
        StatementAnalyzerError::MalformedSpreadsheet("workbook contains no sheets".to_string())
    })?;

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        StatementAnalyzerError::MalformedSpreadsheet(format!(
            "sheet '{sheet_name}' is unreadable: {e}"
        ))
    })?;

    extract_range(&sheet_name, &range)
}

/// Extracts a [`ParsedTable`] from an already-decoded cell range.
///
/// The header row is the first row with at least one non-blank cell; rows
/// above it are discarded, fully-blank rows below it are dropped.
pub fn extract_range(sheet_name: &str, range: &Range<Data>) -> Result<ParsedTable> {
    if range.is_empty() {
        return Err(StatementAnalyzerError::MalformedSpreadsheet(format!(
            "sheet '{sheet_name}' contains no data"
        )));
    }

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());

    let headers: Vec<String> = loop {
        match rows.next() {
            Some(row) if row.iter().any(|cell| !cell.trim().is_empty()) => {
                break row.into_iter().map(|cell| cell.trim().to_string()).collect();
            }
            Some(_) => continue,
            None => return Err(StatementAnalyzerError::NoHeaderRow),
        }
    };

    let data_rows: Vec<Vec<String>> = rows
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|mut row| {
            row.resize(headers.len(), String::new());
            row
        })
        .collect();

    let period_labels: BTreeSet<String> = headers
        .iter()
        .filter(|header| is_period_label(header))
        .cloned()
        .collect();

    debug!(
        "extracted {} data rows x {} columns from sheet '{}'",
        data_rows.len(),
        headers.len(),
        sheet_name
    );

    Ok(ParsedTable {
        metadata: TableMetadata {
            sheet_name: sheet_name.to_string(),
            row_count: data_rows.len(),
            column_count: headers.len(),
            period_labels,
        },
        headers,
        rows: data_rows,
    })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => e.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Matches a 4-digit year run, a quarter token (Q1-Q4), or an English month
/// abbreviation anywhere in the header, case-insensitive.
fn is_period_label(header: &str) -> bool {
    let lower = header.to_ascii_lowercase();
    let bytes = lower.as_bytes();

    if bytes.windows(4).any(|w| w.iter().all(u8::is_ascii_digit)) {
        return true;
    }
    if bytes
        .windows(2)
        .any(|w| w[0] == b'q' && (b'1'..=b'4').contains(&w[1]))
    {
        return true;
    }
    MONTH_ABBREVIATIONS.iter().any(|month| lower.contains(month))
}
