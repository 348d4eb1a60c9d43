use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::StatementAnalyzerError;

/// Caller-selected verbosity tier for the external analysis call.
///
/// Each tier carries its own expectations about how much the collaborator
/// should produce; the expectations are communicated through the prompt and
/// are never enforced on the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    #[schemars(description = "Key metrics and major trends only")]
    Basic,

    #[schemars(description = "Comprehensive ratio, trend, and variance analysis")]
    Detailed,

    #[schemars(description = "High-level strategic summary for executives")]
    Executive,
}

impl AnalysisDepth {
    /// How many insights the prompt asks the collaborator for.
    pub fn expected_insights(&self) -> RangeInclusive<usize> {
        match self {
            Self::Basic => 2..=2,
            Self::Detailed => 5..=6,
            Self::Executive => 3..=3,
        }
    }

    /// Upper bound on key metrics requested from the collaborator.
    pub fn max_key_metrics(&self) -> usize {
        match self {
            Self::Basic => 3,
            Self::Detailed => 10,
            Self::Executive => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Detailed => "detailed",
            Self::Executive => "executive",
        }
    }
}

impl fmt::Display for AnalysisDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisDepth {
    type Err = StatementAnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "detailed" => Ok(Self::Detailed),
            "executive" => Ok(Self::Executive),
            other => Err(StatementAnalyzerError::ValidationError(format!(
                "unknown analysis depth '{other}': expected basic, detailed, or executive"
            ))),
        }
    }
}

/// Classification of the uploaded document.
///
/// The default is the fail-safe used whenever classification is absent or
/// fails, not a guess about the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatementType {
    #[schemars(description = "Assets, liabilities, and equity at a point in time")]
    BalanceSheet,

    #[default]
    #[schemars(description = "Revenue and expenses over a period")]
    IncomeStatement,
}

impl StatementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "balance_sheet",
            Self::IncomeStatement => "income_statement",
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Positive,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VarianceKind {
    Revenue,
    Expense,
    Asset,
    Liability,
    Equity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinancialInsight {
    #[serde(rename = "type")]
    pub kind: InsightKind,

    #[schemars(description = "Short headline for the insight")]
    pub title: String,

    #[schemars(description = "Detailed explanation of the observation")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// Period-over-period percentage change in a named line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Variance {
    #[schemars(description = "Line item name as it appears in the statement")]
    pub item: String,

    #[serde(alias = "change")]
    #[schemars(description = "Percentage change versus the prior period")]
    pub change_percent: f64,

    #[serde(rename = "type")]
    pub kind: VarianceKind,

    pub severity: Severity,
}

/// Named numeric figures produced by the collaborator.
///
/// Deserialization is deliberately tolerant: finite numbers are kept, `null`
/// is kept as an explicit absence, and any other shape is dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyMetrics(BTreeMap<String, Option<f64>>);

impl KeyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A metric that is present but `null` reads as absent.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied().flatten()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), Some(value));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<f64>)> {
        self.0.iter()
    }
}

impl From<BTreeMap<String, Option<f64>>> for KeyMetrics {
    fn from(metrics: BTreeMap<String, Option<f64>>) -> Self {
        Self(metrics)
    }
}

impl<'de> Deserialize<'de> for KeyMetrics {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: BTreeMap<String, serde_json::Value> = BTreeMap::deserialize(deserializer)?;
        let mut metrics = BTreeMap::new();
        for (name, value) in raw {
            match value {
                serde_json::Value::Null => {
                    metrics.insert(name, None);
                }
                serde_json::Value::Number(number) => {
                    metrics.insert(name, number.as_f64().filter(|v| v.is_finite()));
                }
                _ => {}
            }
        }
        Ok(Self(metrics))
    }
}

/// Structured result of one external analysis call.
///
/// Every field default-fills when the collaborator omits or mangles it;
/// downstream stages never see an "undefined" field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisResult {
    pub statement_type: StatementType,

    pub insights: Vec<FinancialInsight>,

    #[schemars(description = "Actionable recommendations, one sentence each")]
    pub recommendations: Vec<String>,

    #[schemars(with = "BTreeMap<String, Option<f64>>")]
    #[schemars(
        description = "Named numeric figures, e.g. totalRevenue, netIncome, totalAssets, currentRatio, debtToEquity, grossMargin, netMargin"
    )]
    pub key_metrics: KeyMetrics,

    #[schemars(description = "Line items whose change versus the prior period exceeds 10%")]
    pub variances: Vec<Variance>,
}

impl AnalysisResult {
    /// Builds a result from the collaborator's raw JSON reply.
    ///
    /// Field-by-field: a field that is missing or fails to deserialize is
    /// replaced with its default rather than failing the whole reply.
    pub fn from_response_value(value: &serde_json::Value) -> Self {
        fn field<T>(value: &serde_json::Value, key: &str) -> T
        where
            T: Default + serde::de::DeserializeOwned,
        {
            value
                .get(key)
                .map(|raw| serde_json::from_value(raw.clone()).unwrap_or_default())
                .unwrap_or_default()
        }

        Self {
            statement_type: field(value, "statementType"),
            insights: field(value, "insights"),
            recommendations: field(value, "recommendations"),
            key_metrics: field(value, "keyMetrics"),
            variances: field(value, "variances"),
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisResult)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
