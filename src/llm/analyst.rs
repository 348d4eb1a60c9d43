use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;

use crate::error::{Result, StatementAnalyzerError};
use crate::llm::client::OpenAiClient;
use crate::llm::prompts;
use crate::llm::types::{ChatCompletionRequest, ChatMessage, ResponseFormat};
use crate::normalizer::FinancialRecord;
use crate::pipeline::{Analyst, STATEMENT_TYPE_SAMPLE_ROWS};
use crate::schema::{AnalysisDepth, AnalysisResult, StatementType};

pub const DEFAULT_MODEL: &str = "gpt-5";

const ANALYSIS_TEMPERATURE: f64 = 0.3;
const ANALYSIS_MAX_TOKENS: u32 = 2000;
const DETECTION_TEMPERATURE: f64 = 0.1;
const DETECTION_MAX_TOKENS: u32 = 100;

/// [`Analyst`] implementation backed by an OpenAI-compatible deployment.
pub struct OpenAiAnalyst {
    client: OpenAiClient,
    model: String,
}

impl OpenAiAnalyst {
    pub fn new(client: OpenAiClient) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn request_statement_type(&self, records: &[FinancialRecord]) -> Result<StatementType> {
        let sample = &records[..records.len().min(STATEMENT_TYPE_SAMPLE_ROWS)];
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(prompts::SYSTEM_PROMPT_CLASSIFIER),
                ChatMessage::user(prompts::build_detection_prompt(sample)?),
            ],
            response_format: ResponseFormat::json_object(),
            temperature: DETECTION_TEMPERATURE,
            max_tokens: DETECTION_MAX_TOKENS,
        };

        let reply = self.client.chat_completion(&request).await?;
        let value: Value = serde_json::from_str(&reply)?;

        Ok(value
            .get("statementType")
            .map(|raw| serde_json::from_value(raw.clone()).unwrap_or_default())
            .unwrap_or_default())
    }
}

#[async_trait]
impl Analyst for OpenAiAnalyst {
    async fn analyze(
        &self,
        records: &[FinancialRecord],
        depth: AnalysisDepth,
    ) -> Result<AnalysisResult> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(prompts::SYSTEM_PROMPT_ANALYST),
                ChatMessage::user(prompts::build_analysis_prompt(records, depth)?),
            ],
            response_format: ResponseFormat::json_object(),
            temperature: ANALYSIS_TEMPERATURE,
            max_tokens: ANALYSIS_MAX_TOKENS,
        };

        let reply = self.client.chat_completion(&request).await?;

        // A non-JSON reply is a hard failure; missing fields inside valid
        // JSON are default-filled.
        let value: Value = serde_json::from_str(&reply).map_err(|e| {
            StatementAnalyzerError::AnalysisError(format!("model reply was not valid JSON: {e}"))
        })?;
        debug!("analysis reply parsed ({} bytes)", reply.len());

        Ok(AnalysisResult::from_response_value(&value))
    }

    async fn detect_statement_type(&self, records: &[FinancialRecord]) -> StatementType {
        match self.request_statement_type(records).await {
            Ok(statement_type) => statement_type,
            Err(error) => {
                warn!("statement type detection failed, defaulting to income statement: {error}");
                StatementType::default()
            }
        }
    }
}
