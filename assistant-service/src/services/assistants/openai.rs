//! OpenAI assistants-API implementation of the thread service.
//!
//! Speaks the threads/messages/runs protocol over HTTPS with a bearer
//! credential and the assistants beta header.

use super::{AssistantError, FunctionCall, Run, RunOutput, RunStatus, ThreadService};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

/// Beta header required by the assistants endpoints.
const ASSISTANTS_BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// OpenAI provider configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Secret<String>,
    pub base_url: String,
}

/// OpenAI-backed thread service.
pub struct OpenAiThreadService {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiThreadService {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Build the API URL for the given path under the configured base.
    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// POST a JSON body and decode a JSON response.
    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AssistantError> {
        let response = self
            .client
            .post(self.api_url(path))
            .bearer_auth(self.config.api_key.expose_secret())
            .header(ASSISTANTS_BETA_HEADER.0, ASSISTANTS_BETA_HEADER.1)
            .json(body)
            .send()
            .await
            .map_err(|e| AssistantError::NetworkError(e.to_string()))?;

        Self::decode_response(response).await
    }

    /// GET a JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
    ) -> Result<T, AssistantError> {
        let response = self
            .client
            .get(self.api_url(path))
            .bearer_auth(self.config.api_key.expose_secret())
            .header(ASSISTANTS_BETA_HEADER.0, ASSISTANTS_BETA_HEADER.1)
            .send()
            .await
            .map_err(|e| AssistantError::NetworkError(e.to_string()))?;

        Self::decode_response(response).await
    }

    async fn decode_response<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, AssistantError> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(AssistantError::RateLimited);
            }

            return Err(AssistantError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AssistantError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl ThreadService for OpenAiThreadService {
    async fn create_thread(&self) -> Result<String, AssistantError> {
        tracing::debug!("Creating remote thread");

        let thread: ThreadObject = self
            .post_json("threads", &serde_json::json!({}))
            .await?;

        Ok(thread.id)
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<String, AssistantError> {
        tracing::debug!(
            thread_id = %thread_id,
            role = %role,
            content_len = content.len(),
            "Appending message to thread"
        );

        let message: MessageObject = self
            .post_json(
                &format!("threads/{}/messages", thread_id),
                &CreateMessageRequest { role, content },
            )
            .await?;

        Ok(message.id)
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        function_call: Option<FunctionCall>,
    ) -> Result<Run, AssistantError> {
        tracing::debug!(
            thread_id = %thread_id,
            assistant_id = %assistant_id,
            has_function_call = function_call.is_some(),
            "Creating run"
        );

        let run: RunObject = self
            .post_json(
                &format!("threads/{}/runs", thread_id),
                &CreateRunRequest {
                    assistant_id,
                    function_call,
                },
            )
            .await?;

        Ok(run.into())
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        let run: RunObject = self
            .get_json(&format!("threads/{}/runs/{}", thread_id, run_id))
            .await?;

        Ok(run.into())
    }

    async fn health_check(&self) -> Result<(), AssistantError> {
        if self.config.api_key.expose_secret().is_empty() {
            return Err(AssistantError::NotConfigured(
                "Assistant API key not configured".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Assistants API Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    id: String,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    status: String,
    #[serde(default)]
    outputs: Vec<RunOutputObject>,
    #[serde(default)]
    last_error: Option<RunErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RunOutputObject {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct RunErrorObject {
    #[serde(default)]
    message: String,
}

impl From<RunObject> for Run {
    fn from(run: RunObject) -> Self {
        Run {
            id: run.id,
            status: RunStatus::parse(&run.status),
            outputs: run
                .outputs
                .into_iter()
                .map(|o| RunOutput { text: o.text })
                .collect(),
            last_error: run.last_error.map(|e| e.message),
        }
    }
}
