// Prompt variants sent to the analysis collaborator. The depth tiers change
// only how much output is requested, never the response contract.

use crate::error::Result;
use crate::normalizer::FinancialRecord;
use crate::schema::{AnalysisDepth, AnalysisResult};

pub const SYSTEM_PROMPT_ANALYST: &str = "You are a senior financial analyst with expertise in \
    financial statement analysis. Analyze the provided financial data and generate insights in \
    JSON format.";

pub const SYSTEM_PROMPT_CLASSIFIER: &str = "You are a financial analyst. Determine if the \
    provided data represents a Balance Sheet or Income Statement.";

/// Depth-specific instructions, with the requested insight and metric counts
/// taken from the depth's own metadata.
pub fn depth_guidance(depth: AnalysisDepth) -> String {
    let focus = match depth {
        AnalysisDepth::Basic => {
            "Focus on key metrics, major trends, and significant variances (>10%)."
        }
        AnalysisDepth::Detailed => {
            "Provide comprehensive analysis including ratios, horizontal/vertical analysis, \
             trend analysis, and detailed variance explanation."
        }
        AnalysisDepth::Executive => {
            "Create a high-level executive summary focusing on strategic implications, key \
             risks, and opportunities."
        }
    };

    let insights = depth.expected_insights();
    let insights_phrase = if insights.start() == insights.end() {
        insights.start().to_string()
    } else {
        format!("{}-{}", insights.start(), insights.end())
    };

    format!(
        "{focus} Provide {insights_phrase} insights and up to {} key metrics.",
        depth.max_key_metrics()
    )
}

/// The full analysis request: records as JSON, depth guidance, and the exact
/// response schema the collaborator must match.
pub fn build_analysis_prompt(records: &[FinancialRecord], depth: AnalysisDepth) -> Result<String> {
    let data = serde_json::to_string_pretty(records)?;
    let schema = AnalysisResult::schema_as_json()?;

    Ok(format!(
        "Analyze this financial statement data and provide insights based on {depth} analysis \
         depth.\n\n\
         Financial Data:\n{data}\n\n\
         Analysis Requirements:\n\
         1. Determine if this is a Balance Sheet or Income Statement\n\
         2. {guidance}\n\
         3. Identify variances exceeding the 10% threshold\n\
         4. Calculate relevant financial ratios where possible\n\
         5. Provide actionable recommendations\n\n\
         Return ONLY valid JSON matching this schema:\n{schema}\n",
        guidance = depth_guidance(depth),
    ))
}

/// The lightweight classification request.
pub fn build_detection_prompt(records: &[FinancialRecord]) -> Result<String> {
    let data = serde_json::to_string(records)?;

    Ok(format!(
        "Analyze this financial data and determine the statement type. Look for characteristic \
         line items like Assets/Liabilities/Equity for a Balance Sheet or Revenue/Expenses for \
         an Income Statement.\n\n\
         Data: {data}\n\n\
         Respond with JSON: {{\"statementType\": \"balance_sheet\" | \"income_statement\", \
         \"confidence\": number}}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::CellValue;

    fn sample_records() -> Vec<FinancialRecord> {
        let mut record = FinancialRecord::new();
        record.push("Item", CellValue::Text("Cash".to_string()));
        record.push("2023", CellValue::Number(100.0));
        vec![record]
    }

    #[test]
    fn test_depth_guidance_carries_expected_counts() {
        assert!(depth_guidance(AnalysisDepth::Basic).contains("2 insights"));
        assert!(depth_guidance(AnalysisDepth::Basic).contains("up to 3 key metrics"));
        assert!(depth_guidance(AnalysisDepth::Detailed).contains("5-6 insights"));
        assert!(depth_guidance(AnalysisDepth::Detailed).contains("up to 10 key metrics"));
        assert!(depth_guidance(AnalysisDepth::Executive).contains("3 insights"));
        assert!(depth_guidance(AnalysisDepth::Executive).contains("up to 7 key metrics"));
    }

    #[test]
    fn test_analysis_prompt_embeds_data_and_schema() {
        let prompt = build_analysis_prompt(&sample_records(), AnalysisDepth::Detailed).unwrap();

        assert!(prompt.contains("detailed analysis depth"));
        assert!(prompt.contains("\"Item\": \"Cash\""));
        assert!(prompt.contains("statementType"));
        assert!(prompt.contains("keyMetrics"));
    }

    #[test]
    fn test_detection_prompt_names_both_types() {
        let prompt = build_detection_prompt(&sample_records()).unwrap();
        assert!(prompt.contains("balance_sheet"));
        assert!(prompt.contains("income_statement"));
        assert!(prompt.contains("\"Item\":\"Cash\""));
    }
}
