use log::warn;

use crate::error::{Result, StatementAnalyzerError};
use crate::extractor::ParsedTable;
use crate::normalizer::parse_numeric;

/// Line-item vocabulary expected somewhere in the first column of a
/// financial statement. Matched as case-insensitive substrings.
pub const FINANCIAL_VOCABULARY: [&str; 11] = [
    "revenue",
    "sales",
    "income",
    "expense",
    "asset",
    "liability",
    "equity",
    "cash",
    "cost",
    "profit",
    "loss",
];

/// Outcome of the non-fatal checks. A table that fails only the vocabulary
/// check is still accepted, with `vocabulary_recognized == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationReport {
    pub vocabulary_recognized: bool,
}

/// Rejects tables that are structurally or semantically implausible as
/// financial statements.
///
/// Fatal: fewer than 2 columns, fewer than 3 data rows, or no numeric cell
/// anywhere outside the first column.
pub fn validate(table: &ParsedTable) -> Result<ValidationReport> {
    if table.headers.len() < 2 {
        return Err(StatementAnalyzerError::ValidationError(
            "spreadsheet must have at least 2 columns (line item names and values)".to_string(),
        ));
    }

    if table.rows.len() < 3 {
        return Err(StatementAnalyzerError::ValidationError(
            "spreadsheet must have at least 3 data rows".to_string(),
        ));
    }

    let has_numeric_data = table
        .rows
        .iter()
        .any(|row| row.iter().skip(1).any(|cell| parse_numeric(cell).is_some()));
    if !has_numeric_data {
        return Err(StatementAnalyzerError::ValidationError(
            "spreadsheet must contain numeric financial data".to_string(),
        ));
    }

    let vocabulary_recognized = table.rows.iter().any(|row| {
        row.first().is_some_and(|label| {
            let label = label.to_lowercase();
            FINANCIAL_VOCABULARY.iter().any(|term| label.contains(term))
        })
    });
    if !vocabulary_recognized {
        warn!("first column contains no recognizable financial statement vocabulary");
    }

    Ok(ValidationReport {
        vocabulary_recognized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::TableMetadata;
    use std::collections::BTreeSet;

    fn table(headers: &[&str], rows: &[&[&str]]) -> ParsedTable {
        ParsedTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
            metadata: TableMetadata {
                sheet_name: "Sheet1".to_string(),
                row_count: rows.len(),
                column_count: headers.len(),
                period_labels: BTreeSet::new(),
            },
        }
    }

    fn reason(error: StatementAnalyzerError) -> String {
        match error {
            StatementAnalyzerError::ValidationError(reason) => reason,
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_single_column_even_with_numeric_rows() {
        let t = table(&["Amount"], &[&["100"], &["200"], &["300"], &["400"]]);
        let reason = reason(validate(&t).unwrap_err());
        assert!(reason.contains("at least 2 columns"), "{reason}");
    }

    #[test]
    fn test_rejects_two_data_rows() {
        let t = table(
            &["Item", "2023"],
            &[&["Cash", "100"], &["Inventory", "200"]],
        );
        let reason = reason(validate(&t).unwrap_err());
        assert!(reason.contains("at least 3 data rows"), "{reason}");
    }

    #[test]
    fn test_rejects_table_without_numeric_values() {
        let t = table(
            &["Item", "2023"],
            &[&["Cash", "n/a"], &["Inventory", "tbd"], &["Equity", "-"]],
        );
        let reason = reason(validate(&t).unwrap_err());
        assert!(reason.contains("numeric financial data"), "{reason}");
    }

    #[test]
    fn test_numbers_in_first_column_do_not_count_as_numeric_data() {
        let t = table(
            &["Item", "2023"],
            &[&["100", "n/a"], &["200", "tbd"], &["300", "-"]],
        );
        assert!(validate(&t).is_err());
    }

    #[test]
    fn test_accepts_table_without_vocabulary_but_flags_it() {
        let t = table(
            &["Name", "A", "B"],
            &[
                &["alpha", "1", "x"],
                &["beta", "2", "y"],
                &["gamma", "3", "z"],
                &["delta", "4", "w"],
            ],
        );

        let report = validate(&t).unwrap();
        assert!(!report.vocabulary_recognized);
    }

    #[test]
    fn test_accepts_financial_table_with_currency_notation() {
        let t = table(
            &["Item", "2023", "2022"],
            &[
                &["Cash", "$1,000", "$900"],
                &["Inventory", "(200)", "180"],
                &["Total Assets", "$800", "$720"],
            ],
        );

        let report = validate(&t).unwrap();
        assert!(report.vocabulary_recognized);
    }
}
