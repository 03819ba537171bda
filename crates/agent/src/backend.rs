use std::time::Duration;

use async_trait::async_trait;
use quoteforge_core::config::GenerationConfig;
use quoteforge_core::errors::GenerationBackendError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::llm::GenerationBackend;
use crate::stage::StageContext;

const COMPLETION_TEMPERATURE: f64 = 0.3;

/// Adapter for OpenAI-compatible `/chat/completions` endpoints (OpenAI,
/// Ollama, and the many gateways speaking the same dialect).
pub struct OpenAiCompatibleBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    timeout_secs: u64,
}

impl OpenAiCompatibleBackend {
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationBackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| GenerationBackendError::Unreachable(error.to_string()))?;

        Ok(Self {
            client,
            base_url: config.effective_base_url().trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl GenerationBackend for OpenAiCompatibleBackend {
    async fn run(&self, context: &StageContext) -> Result<String, GenerationBackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "temperature": COMPLETION_TEMPERATURE,
            "messages": [
                { "role": "system", "content": context.system_prompt() },
                { "role": "user", "content": context.user_prompt() },
            ],
        });

        debug!(role = %context.role, model = %self.model, "dispatching generation stage");

        let mut request = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|error| {
            if error.is_timeout() {
                GenerationBackendError::Timeout(self.timeout_secs)
            } else {
                GenerationBackendError::Unreachable(error.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GenerationBackendError::Rejected(format!(
                "status {status}: {}",
                truncate(&detail, 300)
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|error| GenerationBackendError::Rejected(error.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_owned())
            .filter(|content| !content.is_empty())
            .ok_or(GenerationBackendError::EmptyCompletion)
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
