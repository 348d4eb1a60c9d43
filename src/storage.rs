use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::derivation::{ChartData, DerivedRatios};
use crate::normalizer::FinancialRecord;
use crate::schema::{AnalysisDepth, FinancialInsight, KeyMetrics, StatementType, Variance};

pub type AnalysisId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Processing,
    Completed,
    Failed,
}

/// One analysis lifecycle, from upload to terminal state.
///
/// Fields fill in as pipeline stages complete; a failed analysis keeps only
/// what preceded the failing stage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: AnalysisId,
    pub filename: String,
    pub file_size: u64,
    pub analysis_depth: AnalysisDepth,
    pub status: AnalysisStatus,
    pub statement_type: Option<StatementType>,
    pub records: Option<Vec<FinancialRecord>>,
    pub metrics: Option<KeyMetrics>,
    pub insights: Option<Vec<FinancialInsight>>,
    pub recommendations: Option<Vec<String>>,
    pub variances: Option<Vec<Variance>>,
    pub ratios: Option<DerivedRatios>,
    pub chart_data: Option<ChartData>,
    /// Non-fatal signals raised during processing (e.g. unrecognized
    /// financial vocabulary).
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub filename: String,
    pub file_size: u64,
    pub analysis_depth: AnalysisDepth,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct AnalysisUpdate {
    pub status: Option<AnalysisStatus>,
    pub statement_type: Option<StatementType>,
    pub records: Option<Vec<FinancialRecord>>,
    pub metrics: Option<KeyMetrics>,
    pub insights: Option<Vec<FinancialInsight>>,
    pub recommendations: Option<Vec<String>>,
    pub variances: Option<Vec<Variance>>,
    pub ratios: Option<DerivedRatios>,
    pub chart_data: Option<ChartData>,
    pub warnings: Option<Vec<String>>,
}

impl AnalysisUpdate {
    pub fn status(status: AnalysisStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Key-value store of analysis records, keyed by an opaque generated id.
///
/// The pipeline only needs these four operations, so any backend (in-memory
/// map, embedded database, external cache) can stand behind this trait.
pub trait AnalysisStore: Send + Sync {
    fn create(&self, new: NewAnalysis) -> AnalysisRecord;
    fn get(&self, id: AnalysisId) -> Option<AnalysisRecord>;
    fn update(&self, id: AnalysisId, update: AnalysisUpdate) -> Option<AnalysisRecord>;
    fn delete(&self, id: AnalysisId) -> bool;
}

/// Mutex-guarded in-memory backend; the default for tests and single-process
/// deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    analyses: Mutex<HashMap<AnalysisId, AnalysisRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnalysisStore for MemoryStore {
    fn create(&self, new: NewAnalysis) -> AnalysisRecord {
        let now = Utc::now();
        let record = AnalysisRecord {
            id: Uuid::new_v4(),
            filename: new.filename,
            file_size: new.file_size,
            analysis_depth: new.analysis_depth,
            status: AnalysisStatus::Processing,
            statement_type: None,
            records: None,
            metrics: None,
            insights: None,
            recommendations: None,
            variances: None,
            ratios: None,
            chart_data: None,
            warnings: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let mut analyses = self.analyses.lock().expect("analysis store mutex poisoned");
        analyses.insert(record.id, record.clone());
        record
    }

    fn get(&self, id: AnalysisId) -> Option<AnalysisRecord> {
        let analyses = self.analyses.lock().expect("analysis store mutex poisoned");
        analyses.get(&id).cloned()
    }

    fn update(&self, id: AnalysisId, update: AnalysisUpdate) -> Option<AnalysisRecord> {
        let mut analyses = self.analyses.lock().expect("analysis store mutex poisoned");
        let record = analyses.get_mut(&id)?;

        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(statement_type) = update.statement_type {
            record.statement_type = Some(statement_type);
        }
        if let Some(records) = update.records {
            record.records = Some(records);
        }
        if let Some(metrics) = update.metrics {
            record.metrics = Some(metrics);
        }
        if let Some(insights) = update.insights {
            record.insights = Some(insights);
        }
        if let Some(recommendations) = update.recommendations {
            record.recommendations = Some(recommendations);
        }
        if let Some(variances) = update.variances {
            record.variances = Some(variances);
        }
        if let Some(ratios) = update.ratios {
            record.ratios = Some(ratios);
        }
        if let Some(chart_data) = update.chart_data {
            record.chart_data = Some(chart_data);
        }
        if let Some(warnings) = update.warnings {
            record.warnings = warnings;
        }
        record.updated_at = Utc::now();

        Some(record.clone())
    }

    fn delete(&self, id: AnalysisId) -> bool {
        let mut analyses = self.analyses.lock().expect("analysis store mutex poisoned");
        analyses.remove(&id).is_some()
    }
}
