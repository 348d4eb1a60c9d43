//! Deterministic ratio and chart derivation from the collaborator's key
//! metrics.
//!
//! Every output has a documented default used when the corresponding metric
//! is absent, so presentation layers never deal with missing fields. The
//! "previous period" balance-sheet series and the monthly revenue placeholder
//! are simulated presentation defaults, not historical data.

use serde::{Deserialize, Serialize};

use crate::normalizer::FinancialRecord;
use crate::schema::{AnalysisResult, KeyMetrics};

pub const DEFAULT_CURRENT_RATIO: f64 = 2.34;
pub const DEFAULT_QUICK_RATIO: f64 = 1.88;
pub const DEFAULT_DEBT_TO_EQUITY: f64 = 0.43;
pub const DEFAULT_DEBT_TO_ASSETS: f64 = 0.54;
pub const DEFAULT_EQUITY_RATIO: f64 = 0.46;
pub const DEFAULT_WORKING_CAPITAL: f64 = 850_000.0;
pub const DEFAULT_ROA: f64 = 8.7;
pub const DEFAULT_ROE: f64 = 15.2;
pub const DEFAULT_ASSET_TURNOVER: f64 = 1.28;

pub const DEFAULT_TOTAL_ASSETS: f64 = 5_200_000.0;
pub const DEFAULT_TOTAL_LIABILITIES: f64 = 2_800_000.0;
pub const DEFAULT_TOTAL_EQUITY: f64 = 2_400_000.0;

pub const DEFAULT_GROSS_MARGIN: f64 = 67.8;
pub const DEFAULT_OPERATING_MARGIN: f64 = 23.4;
pub const DEFAULT_NET_MARGIN: f64 = 14.2;

/// Scale-down factors producing the simulated previous period for assets,
/// liabilities, and equity respectively.
const PREVIOUS_PERIOD_FACTORS: [f64; 3] = [0.94, 0.93, 0.96];

const PLACEHOLDER_MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
/// Simulated 12-month revenue trend (in millions), used when the statement
/// carries no revenue row to chart.
const PLACEHOLDER_REVENUE: [f64; 12] = [
    1.8, 1.9, 2.1, 2.0, 2.2, 2.1, 2.3, 2.2, 2.4, 2.3, 2.5, 2.6,
];
const PLACEHOLDER_NET_INCOME: [f64; 12] = [
    0.25, 0.28, 0.31, 0.29, 0.33, 0.30, 0.35, 0.32, 0.34, 0.33, 0.36, 0.38,
];

/// The fixed ratio set shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedRatios {
    pub current_ratio: f64,
    pub quick_ratio: f64,
    pub debt_to_equity: f64,
    pub debt_to_assets: f64,
    pub equity_ratio: f64,
    pub working_capital: f64,
    pub roa: f64,
    pub roe: f64,
    pub asset_turnover: f64,
}

impl Default for DerivedRatios {
    fn default() -> Self {
        Self {
            current_ratio: DEFAULT_CURRENT_RATIO,
            quick_ratio: DEFAULT_QUICK_RATIO,
            debt_to_equity: DEFAULT_DEBT_TO_EQUITY,
            debt_to_assets: DEFAULT_DEBT_TO_ASSETS,
            equity_ratio: DEFAULT_EQUITY_RATIO,
            working_capital: DEFAULT_WORKING_CAPITAL,
            roa: DEFAULT_ROA,
            roe: DEFAULT_ROE,
            asset_turnover: DEFAULT_ASSET_TURNOVER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

/// One chart: parallel `labels` and per-dataset `data` of the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub balance_sheet_chart: ChartSeries,
    pub revenue_chart: ChartSeries,
    pub profitability_chart: ChartSeries,
}

/// Takes each ratio from `metrics` when present, otherwise the documented
/// default. Pure, no failure mode.
pub fn derive_ratios(metrics: &KeyMetrics) -> DerivedRatios {
    let defaults = DerivedRatios::default();
    DerivedRatios {
        current_ratio: metrics.get("currentRatio").unwrap_or(defaults.current_ratio),
        quick_ratio: metrics.get("quickRatio").unwrap_or(defaults.quick_ratio),
        debt_to_equity: metrics.get("debtToEquity").unwrap_or(defaults.debt_to_equity),
        debt_to_assets: metrics.get("debtToAssets").unwrap_or(defaults.debt_to_assets),
        equity_ratio: metrics.get("equityRatio").unwrap_or(defaults.equity_ratio),
        working_capital: metrics
            .get("workingCapital")
            .unwrap_or(defaults.working_capital),
        roa: metrics.get("roa").unwrap_or(defaults.roa),
        roe: metrics.get("roe").unwrap_or(defaults.roe),
        asset_turnover: metrics
            .get("assetTurnover")
            .unwrap_or(defaults.asset_turnover),
    }
}

/// Builds the chart series for the dashboard. Pure, no failure mode.
pub fn derive_charts(records: &[FinancialRecord], analysis: &AnalysisResult) -> ChartData {
    ChartData {
        balance_sheet_chart: balance_sheet_chart(&analysis.key_metrics),
        revenue_chart: revenue_chart(records),
        profitability_chart: profitability_chart(&analysis.key_metrics),
    }
}

fn balance_sheet_chart(metrics: &KeyMetrics) -> ChartSeries {
    let current = [
        metrics.get("totalAssets").unwrap_or(DEFAULT_TOTAL_ASSETS),
        metrics
            .get("totalLiabilities")
            .unwrap_or(DEFAULT_TOTAL_LIABILITIES),
        metrics.get("totalEquity").unwrap_or(DEFAULT_TOTAL_EQUITY),
    ];
    // Simulated comparison: the previous period is a fixed scale-down of the
    // current period.
    let previous: Vec<f64> = current
        .iter()
        .zip(PREVIOUS_PERIOD_FACTORS)
        .map(|(value, factor)| value * factor)
        .collect();

    ChartSeries {
        labels: vec![
            "Total Assets".to_string(),
            "Total Liabilities".to_string(),
            "Total Equity".to_string(),
        ],
        datasets: vec![
            Dataset {
                label: "Current Period".to_string(),
                data: current.to_vec(),
            },
            Dataset {
                label: "Previous Period".to_string(),
                data: previous,
            },
        ],
    }
}

fn revenue_chart(records: &[FinancialRecord]) -> ChartSeries {
    if let Some((labels, data)) = numeric_series(records, is_revenue_label) {
        let mut datasets = vec![Dataset {
            label: "Revenue".to_string(),
            data,
        }];
        if let Some((net_labels, net_data)) = numeric_series(records, |label| {
            label.contains("net income")
        }) {
            if net_labels == labels {
                datasets.push(Dataset {
                    label: "Net Income".to_string(),
                    data: net_data,
                });
            }
        }
        return ChartSeries { labels, datasets };
    }

    ChartSeries {
        labels: PLACEHOLDER_MONTH_LABELS.iter().map(|&m| m.to_string()).collect(),
        datasets: vec![
            Dataset {
                label: "Revenue".to_string(),
                data: PLACEHOLDER_REVENUE.to_vec(),
            },
            Dataset {
                label: "Net Income".to_string(),
                data: PLACEHOLDER_NET_INCOME.to_vec(),
            },
        ],
    }
}

fn is_revenue_label(label: &str) -> bool {
    label.contains("revenue") || (label.contains("sales") && !label.contains("cost"))
}

/// The numeric cells of the first record whose label matches, as parallel
/// (column, value) series. Requires at least two points to chart a trend.
fn numeric_series(
    records: &[FinancialRecord],
    matches: impl Fn(&str) -> bool,
) -> Option<(Vec<String>, Vec<f64>)> {
    let record = records.iter().find(|record| {
        record
            .label()
            .is_some_and(|label| matches(&label.to_lowercase()))
    })?;

    let mut labels = Vec::new();
    let mut data = Vec::new();
    for (key, value) in record.iter().skip(1) {
        if let Some(number) = value.as_number() {
            labels.push(key.to_string());
            data.push(number);
        }
    }

    (data.len() >= 2).then_some((labels, data))
}

fn profitability_chart(metrics: &KeyMetrics) -> ChartSeries {
    ChartSeries {
        labels: vec![
            "Gross Margin".to_string(),
            "Operating Margin".to_string(),
            "Net Margin".to_string(),
        ],
        datasets: vec![Dataset {
            label: "Margins".to_string(),
            data: vec![
                metrics.get("grossMargin").unwrap_or(DEFAULT_GROSS_MARGIN),
                metrics
                    .get("operatingMargin")
                    .unwrap_or(DEFAULT_OPERATING_MARGIN),
                metrics.get("netMargin").unwrap_or(DEFAULT_NET_MARGIN),
            ],
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::CellValue;

    fn record(fields: &[(&str, CellValue)]) -> FinancialRecord {
        let mut record = FinancialRecord::new();
        for (key, value) in fields {
            record.push(*key, value.clone());
        }
        record
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_single_metric_overrides_only_its_ratio() {
        let mut metrics = KeyMetrics::new();
        metrics.insert("currentRatio", 1.5);

        let ratios = derive_ratios(&metrics);
        assert_eq!(ratios.current_ratio, 1.5);
        assert_eq!(ratios.quick_ratio, DEFAULT_QUICK_RATIO);
        assert_eq!(ratios.debt_to_equity, DEFAULT_DEBT_TO_EQUITY);
        assert_eq!(ratios.debt_to_assets, DEFAULT_DEBT_TO_ASSETS);
        assert_eq!(ratios.equity_ratio, DEFAULT_EQUITY_RATIO);
        assert_eq!(ratios.working_capital, DEFAULT_WORKING_CAPITAL);
        assert_eq!(ratios.roa, DEFAULT_ROA);
        assert_eq!(ratios.roe, DEFAULT_ROE);
        assert_eq!(ratios.asset_turnover, DEFAULT_ASSET_TURNOVER);
    }

    #[test]
    fn test_empty_metrics_yield_all_defaults() {
        assert_eq!(derive_ratios(&KeyMetrics::new()), DerivedRatios::default());
    }

    #[test]
    fn test_ratios_serialize_with_camel_case_names() {
        let json = serde_json::to_value(DerivedRatios::default()).unwrap();
        assert_eq!(json["currentRatio"], serde_json::json!(2.34));
        assert_eq!(json["workingCapital"], serde_json::json!(850000.0));
        assert_eq!(json["assetTurnover"], serde_json::json!(1.28));
    }

    #[test]
    fn test_previous_period_is_scaled_current_period() {
        let mut analysis = AnalysisResult::default();
        analysis.key_metrics.insert("totalAssets", 10_000_000.0);

        let charts = derive_charts(&[], &analysis);
        let chart = &charts.balance_sheet_chart;

        assert_eq!(chart.datasets[0].data[0], 10_000_000.0);
        assert_eq!(chart.datasets[1].data[0], 9_400_000.0);
        // Liabilities and equity fall back to the global defaults.
        assert_eq!(chart.datasets[0].data[1], DEFAULT_TOTAL_LIABILITIES);
        assert_eq!(chart.datasets[1].data[1], DEFAULT_TOTAL_LIABILITIES * 0.93);
        assert_eq!(chart.datasets[1].data[2], DEFAULT_TOTAL_EQUITY * 0.96);
    }

    #[test]
    fn test_balance_sheet_chart_defaults_when_metrics_absent() {
        let charts = derive_charts(&[], &AnalysisResult::default());
        let chart = &charts.balance_sheet_chart;

        assert_eq!(
            chart.labels,
            vec!["Total Assets", "Total Liabilities", "Total Equity"]
        );
        assert_eq!(
            chart.datasets[0].data,
            vec![5_200_000.0, 2_800_000.0, 2_400_000.0]
        );
        for dataset in &chart.datasets {
            assert_eq!(dataset.data.len(), chart.labels.len());
        }
    }

    #[test]
    fn test_revenue_chart_uses_revenue_row_when_present() {
        let records = vec![
            record(&[
                ("Item", text("Cost of Sales")),
                ("2023", CellValue::Number(400.0)),
                ("2022", CellValue::Number(380.0)),
            ]),
            record(&[
                ("Item", text("Revenue")),
                ("2023", CellValue::Number(1200.0)),
                ("2022", CellValue::Number(1000.0)),
            ]),
        ];

        let charts = derive_charts(&records, &AnalysisResult::default());
        let chart = &charts.revenue_chart;

        assert_eq!(chart.labels, vec!["2023", "2022"]);
        assert_eq!(chart.datasets.len(), 1);
        assert_eq!(chart.datasets[0].label, "Revenue");
        assert_eq!(chart.datasets[0].data, vec![1200.0, 1000.0]);
    }

    #[test]
    fn test_revenue_chart_pairs_net_income_on_matching_columns() {
        let records = vec![
            record(&[
                ("Item", text("Sales Revenue")),
                ("2023", CellValue::Number(1200.0)),
                ("2022", CellValue::Number(1000.0)),
            ]),
            record(&[
                ("Item", text("Net Income")),
                ("2023", CellValue::Number(150.0)),
                ("2022", CellValue::Number(120.0)),
            ]),
        ];

        let charts = derive_charts(&records, &AnalysisResult::default());
        let chart = &charts.revenue_chart;

        assert_eq!(chart.datasets.len(), 2);
        assert_eq!(chart.datasets[1].label, "Net Income");
        assert_eq!(chart.datasets[1].data, vec![150.0, 120.0]);
    }

    #[test]
    fn test_revenue_chart_falls_back_to_placeholder_trend() {
        let records = vec![record(&[
            ("Item", text("Cash")),
            ("2023", CellValue::Number(100.0)),
        ])];

        let charts = derive_charts(&records, &AnalysisResult::default());
        let chart = &charts.revenue_chart;

        assert_eq!(chart.labels.len(), 12);
        assert_eq!(chart.labels[0], "Jan");
        assert_eq!(chart.datasets[0].data, PLACEHOLDER_REVENUE.to_vec());
        assert_eq!(chart.datasets[1].data, PLACEHOLDER_NET_INCOME.to_vec());
    }

    #[test]
    fn test_profitability_chart_reads_margin_metrics() {
        let mut analysis = AnalysisResult::default();
        analysis.key_metrics.insert("grossMargin", 55.0);

        let charts = derive_charts(&[], &analysis);
        let chart = &charts.profitability_chart;

        assert_eq!(
            chart.labels,
            vec!["Gross Margin", "Operating Margin", "Net Margin"]
        );
        assert_eq!(
            chart.datasets[0].data,
            vec![55.0, DEFAULT_OPERATING_MARGIN, DEFAULT_NET_MARGIN]
        );
    }
}
