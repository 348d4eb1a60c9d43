use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::extractor::ParsedTable;

/// A single cell after numeric coercion: either a parsed number or the
/// original trimmed text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

/// One data row keyed by header name, in header order.
///
/// Keys are not deduplicated: a table with duplicate (or blank) headers
/// produces a record with one entry per header, so the entry count always
/// equals the header count. Serializes as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialRecord {
    fields: Vec<(String, CellValue)>,
}

impl FinancialRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: CellValue) {
        self.fields.push((key.into(), value));
    }

    /// First entry with the given key.
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// The line-item label: the first column, which is never coerced.
    pub fn label(&self) -> Option<&str> {
        self.fields.first().and_then(|(_, value)| value.as_text())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Serialize for FinancialRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Converts a validated table into one record per data row.
///
/// Pure and infallible: validation is assumed to have already passed.
pub fn normalize(table: &ParsedTable) -> Vec<FinancialRecord> {
    table
        .rows
        .iter()
        .map(|row| {
            let mut record = FinancialRecord::new();
            for (index, header) in table.headers.iter().enumerate() {
                let raw = row.get(index).map(String::as_str).unwrap_or("");
                let value = if index == 0 {
                    CellValue::Text(raw.trim().to_string())
                } else {
                    coerce_cell(raw)
                };
                record.push(header.clone(), value);
            }
            record
        })
        .collect()
}

/// Numeric coercion for value columns.
///
/// Strips `$`, `,`, `(`, `)`, then parses as f64. A failed or non-finite
/// parse keeps the trimmed original text; an opening parenthesis in the
/// original marks the amount as negative.
pub fn coerce_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    match parse_numeric(trimmed) {
        Some(number) if trimmed.contains('(') => CellValue::Number(-number.abs()),
        Some(number) => CellValue::Number(number),
        None => CellValue::Text(trimmed.to_string()),
    }
}

/// Parses a cell as a finite number after stripping currency notation.
pub fn parse_numeric(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '(' | ')'))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
