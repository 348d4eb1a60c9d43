use async_trait::async_trait;
use log::info;
use serde::Serialize;

use crate::derivation::{derive_charts, derive_ratios};
use crate::error::{Result, StatementAnalyzerError};
use crate::extractor::extract;
use crate::normalizer::{normalize, FinancialRecord};
use crate::schema::{AnalysisDepth, AnalysisResult, StatementType};
use crate::storage::{
    AnalysisId, AnalysisRecord, AnalysisStatus, AnalysisStore, AnalysisUpdate, NewAnalysis,
};
use crate::validator::validate;

/// Upload size cap enforced before any bytes reach the core.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// How many leading records the statement-type detection call receives.
pub const STATEMENT_TYPE_SAMPLE_ROWS: usize = 20;

/// The external reasoning collaborator.
///
/// The pipeline never looks inside this boundary: a prompt goes in, a
/// structured result comes out. Tests substitute a stub.
#[async_trait]
pub trait Analyst: Send + Sync {
    /// Full analysis of the normalized records at the requested depth.
    async fn analyze(
        &self,
        records: &[FinancialRecord],
        depth: AnalysisDepth,
    ) -> Result<AnalysisResult>;

    /// Best-effort classification over the first
    /// [`STATEMENT_TYPE_SAMPLE_ROWS`] records. Implementations must swallow
    /// every failure into [`StatementType::IncomeStatement`].
    async fn detect_statement_type(&self, records: &[FinancialRecord]) -> StatementType;
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Rejects uploads the core should never see: oversized files and filenames
/// without a spreadsheet extension.
pub fn check_upload(upload: &Upload) -> Result<()> {
    let size = upload.bytes.len() as u64;
    if size > MAX_UPLOAD_BYTES {
        return Err(StatementAnalyzerError::UnsupportedUpload(format!(
            "file is {size} bytes, the limit is {MAX_UPLOAD_BYTES}"
        )));
    }

    let name = upload.filename.to_lowercase();
    if !name.ends_with(".xlsx") && !name.ends_with(".xls") {
        return Err(StatementAnalyzerError::UnsupportedUpload(
            "only spreadsheet files (.xlsx, .xls) are accepted".to_string(),
        ));
    }

    Ok(())
}

/// Drives one upload through extraction, validation, normalization, the
/// external analysis call, and derivation. Strictly sequential; the analysis
/// call is the only suspension point, and no store lock is held across it.
pub struct AnalysisPipeline<'a> {
    store: &'a dyn AnalysisStore,
    analyst: &'a dyn Analyst,
}

impl<'a> AnalysisPipeline<'a> {
    pub fn new(store: &'a dyn AnalysisStore, analyst: &'a dyn Analyst) -> Self {
        Self { store, analyst }
    }

    /// Full lifecycle for one upload: create the record, process it, and
    /// return its id. On error the record is left in `failed` state and the
    /// error propagates.
    pub async fn run(&self, upload: &Upload, depth: AnalysisDepth) -> Result<AnalysisId> {
        let id = self.begin(upload, depth)?;
        self.process(id, &upload.bytes, depth).await?;
        Ok(id)
    }

    /// Creates the `processing` record after the upload policy check.
    pub fn begin(&self, upload: &Upload, depth: AnalysisDepth) -> Result<AnalysisId> {
        check_upload(upload)?;
        let record = self.store.create(NewAnalysis {
            filename: upload.filename.clone(),
            file_size: upload.bytes.len() as u64,
            analysis_depth: depth,
        });
        info!("analysis {} created for '{}'", record.id, record.filename);
        Ok(record.id)
    }

    /// Runs the stages for an already-created record. Any stage failure
    /// marks the record `failed` before the error propagates; there are no
    /// retries.
    pub async fn process(&self, id: AnalysisId, bytes: &[u8], depth: AnalysisDepth) -> Result<()> {
        match self.process_stages(id, bytes, depth).await {
            Ok(()) => Ok(()),
            Err(error) => {
                self.store
                    .update(id, AnalysisUpdate::status(AnalysisStatus::Failed));
                Err(error)
            }
        }
    }

    async fn process_stages(
        &self,
        id: AnalysisId,
        bytes: &[u8],
        depth: AnalysisDepth,
    ) -> Result<()> {
        let table = extract(bytes)?;
        let report = validate(&table)?;
        let records = normalize(&table);

        let mut warnings = Vec::new();
        if !report.vocabulary_recognized {
            warnings.push(
                "file may not contain recognizable financial statement data".to_string(),
            );
        }
        self.store.update(
            id,
            AnalysisUpdate {
                records: Some(records.clone()),
                warnings: Some(warnings),
                ..AnalysisUpdate::default()
            },
        );

        let statement_type = self.analyst.detect_statement_type(&records).await;
        self.store.update(
            id,
            AnalysisUpdate {
                statement_type: Some(statement_type),
                ..AnalysisUpdate::default()
            },
        );

        let analysis = self.analyst.analyze(&records, depth).await?;

        let ratios = derive_ratios(&analysis.key_metrics);
        let chart_data = derive_charts(&records, &analysis);

        self.store.update(
            id,
            AnalysisUpdate {
                status: Some(AnalysisStatus::Completed),
                metrics: Some(analysis.key_metrics),
                insights: Some(analysis.insights),
                recommendations: Some(analysis.recommendations),
                variances: Some(analysis.variances),
                ratios: Some(ratios),
                chart_data: Some(chart_data),
                ..AnalysisUpdate::default()
            },
        );
        info!("analysis {id} completed");
        Ok(())
    }
}

/// Coarse progress view for polling clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub id: AnalysisId,
    pub status: AnalysisStatus,
    pub progress: u8,
    pub current_step: String,
}

/// A processing record with normalized data present is past the spreadsheet
/// stages and waiting on the collaborator.
pub fn progress(record: &AnalysisRecord) -> ProgressReport {
    let (progress, current_step) = match record.status {
        AnalysisStatus::Processing if record.records.is_some() => (60, "Generating AI insights..."),
        AnalysisStatus::Processing => (20, "Processing spreadsheet..."),
        AnalysisStatus::Completed => (100, "Analysis complete"),
        AnalysisStatus::Failed => (0, "Analysis failed"),
    };

    ProgressReport {
        id: record.id,
        status: record.status,
        progress,
        current_step: current_step.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn upload(filename: &str, bytes: Vec<u8>) -> Upload {
        Upload {
            filename: filename.to_string(),
            bytes,
        }
    }

    struct StubAnalyst;

    #[async_trait]
    impl Analyst for StubAnalyst {
        async fn analyze(
            &self,
            _records: &[FinancialRecord],
            _depth: AnalysisDepth,
        ) -> Result<AnalysisResult> {
            Ok(AnalysisResult::default())
        }

        async fn detect_statement_type(&self, _records: &[FinancialRecord]) -> StatementType {
            StatementType::default()
        }
    }

    #[test]
    fn test_upload_policy_rejects_oversized_files() {
        let oversized = upload("big.xlsx", vec![0; (MAX_UPLOAD_BYTES + 1) as usize]);
        assert!(matches!(
            check_upload(&oversized).unwrap_err(),
            StatementAnalyzerError::UnsupportedUpload(_)
        ));
    }

    #[test]
    fn test_upload_policy_rejects_non_spreadsheet_names() {
        for name in ["report.pdf", "data.csv", "statement"] {
            assert!(
                check_upload(&upload(name, vec![1, 2, 3])).is_err(),
                "{name} should be rejected"
            );
        }
        assert!(check_upload(&upload("Q4.XLSX", vec![1, 2, 3])).is_ok());
        assert!(check_upload(&upload("legacy.xls", vec![1, 2, 3])).is_ok());
    }

    #[tokio::test]
    async fn test_malformed_bytes_mark_record_failed() {
        let store = MemoryStore::new();
        let analyst = StubAnalyst;
        let pipeline = AnalysisPipeline::new(&store, &analyst);

        let garbage = upload("broken.xlsx", b"not a workbook".to_vec());
        let id = pipeline.begin(&garbage, AnalysisDepth::Basic).unwrap();
        let error = pipeline
            .process(id, &garbage.bytes, AnalysisDepth::Basic)
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            StatementAnalyzerError::MalformedSpreadsheet(_)
        ));
        let record = store.get(id).unwrap();
        assert_eq!(record.status, AnalysisStatus::Failed);
        // Nothing beyond the failing stage was populated.
        assert!(record.records.is_none());
        assert!(record.ratios.is_none());
    }

    #[test]
    fn test_progress_mapping_follows_record_state() {
        let store = MemoryStore::new();
        let record = store.create(NewAnalysis {
            filename: "q4.xlsx".to_string(),
            file_size: 10,
            analysis_depth: AnalysisDepth::Basic,
        });

        let report = progress(&record);
        assert_eq!(report.progress, 20);
        assert_eq!(report.current_step, "Processing spreadsheet...");

        let with_records = store
            .update(
                record.id,
                AnalysisUpdate {
                    records: Some(Vec::new()),
                    ..AnalysisUpdate::default()
                },
            )
            .unwrap();
        let report = progress(&with_records);
        assert_eq!(report.progress, 60);
        assert_eq!(report.current_step, "Generating AI insights...");

        let completed = store
            .update(record.id, AnalysisUpdate::status(AnalysisStatus::Completed))
            .unwrap();
        assert_eq!(progress(&completed).progress, 100);

        let failed = store
            .update(record.id, AnalysisUpdate::status(AnalysisStatus::Failed))
            .unwrap();
        assert_eq!(progress(&failed).progress, 0);
    }
}
