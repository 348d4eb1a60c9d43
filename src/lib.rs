//! # Statement Analyzer
//!
//! A library for turning an uploaded financial statement spreadsheet into
//! normalized records, AI-backed insights, and derived ratio/chart data.
//!
//! ## Core Concepts
//!
//! - **Extraction**: the first sheet of the workbook becomes a rectangular
//!   header + rows table, tolerant of leading blank rows and ragged rows
//! - **Validation**: tables that are not plausible financial statements are
//!   rejected before any analysis is attempted
//! - **Normalization**: each data row becomes an ordered record keyed by
//!   header, with currency-aware numeric coercion
//! - **Analysis**: an external LLM collaborator classifies the statement and
//!   produces insights, key metrics, and variances
//! - **Derivation**: a fixed ratio set and chart-ready series are computed
//!   from the key metrics, with documented defaults for anything missing
//!
//! ## Example
//!
//! ```rust,ignore
//! use statement_analyzer::*;
//!
//! let store = MemoryStore::new();
//! let analyst = llm::OpenAiAnalyst::new(llm::OpenAiClient::from_env()?);
//! let pipeline = AnalysisPipeline::new(&store, &analyst);
//!
//! let upload = Upload {
//!     filename: "balance_sheet.xlsx".to_string(),
//!     bytes: std::fs::read("balance_sheet.xlsx")?,
//! };
//! let id = pipeline.run(&upload, AnalysisDepth::Detailed).await?;
//!
//! let record = store.get(id).unwrap();
//! println!("{:?}", record.ratios);
//! ```

pub mod derivation;
pub mod error;
pub mod extractor;
pub mod normalizer;
pub mod pipeline;
pub mod schema;
pub mod storage;
pub mod validator;

#[cfg(feature = "openai")]
pub mod llm;

pub use derivation::{
    derive_charts, derive_ratios, ChartData, ChartSeries, Dataset, DerivedRatios,
};
pub use error::{Result, StatementAnalyzerError};
pub use extractor::{extract, extract_range, ParsedTable, TableMetadata};
pub use normalizer::{coerce_cell, normalize, CellValue, FinancialRecord};
pub use pipeline::{
    check_upload, progress, AnalysisPipeline, Analyst, ProgressReport, Upload, MAX_UPLOAD_BYTES,
    STATEMENT_TYPE_SAMPLE_ROWS,
};
pub use schema::*;
pub use storage::*;
pub use validator::{validate, ValidationReport, FINANCIAL_VOCABULARY};
