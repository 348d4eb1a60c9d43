use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementAnalyzerError {
    #[error("Malformed spreadsheet: {0}")]
    MalformedSpreadsheet(String),

    #[error("Could not find a header row in the first sheet")]
    NoHeaderRow,

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Unsupported upload: {0}")]
    UnsupportedUpload(String),

    #[error("Analysis failed: {0}")]
    AnalysisError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "openai")]
    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, StatementAnalyzerError>;
