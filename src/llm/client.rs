use log::debug;
use reqwest::Client;

use crate::error::{Result, StatementAnalyzerError};
use crate::llm::types::{ChatCompletionRequest, ChatCompletionResponse};

pub const DEFAULT_API_VERSION: &str = "2024-10-21";

/// Chat-completions client for an Azure-OpenAI-compatible deployment.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    deployment: String,
    api_version: String,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Reads `AZURE_OPENAI_API_KEY`, `AZURE_OPENAI_ENDPOINT`, and
    /// `AZURE_OPENAI_DEPLOYMENT_NAME`.
    pub fn from_env() -> Result<Self> {
        let api_key = require_env("AZURE_OPENAI_API_KEY")?;
        let endpoint = require_env("AZURE_OPENAI_ENDPOINT")?;
        let deployment = require_env("AZURE_OPENAI_DEPLOYMENT_NAME")?;
        Ok(Self::new(api_key, endpoint, deployment))
    }

    /// Sends one chat completion and returns the first choice's content.
    pub(crate) async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<String> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        );
        debug!("chat completion request to deployment '{}'", self.deployment);

        let res = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(StatementAnalyzerError::AnalysisError(format!(
                "OpenAI API error (status {status}): {err_text}"
            )));
        }

        let body: ChatCompletionResponse = res.json().await?;
        body.choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                StatementAnalyzerError::AnalysisError("model returned no content".to_string())
            })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| StatementAnalyzerError::AnalysisError(format!("{name} is not set")))
}
