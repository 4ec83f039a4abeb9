use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use triage_core::ModelConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTask {
    Summarize,
    SeverityProbe,
    ComposeReply,
}

impl ModelTask {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::SeverityProbe => "severity_probe",
            Self::ComposeReply => "compose_reply",
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
    #[error("model is disabled")]
    Disabled,
    #[error("model endpoint unavailable: {0}")]
    Unavailable(String),
    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model response unusable: {0}")]
    BadResponse(String),
    #[error("model transport error")]
    Transport(#[from] reqwest::Error),
}

/// The external language-model collaborator. Callers bound every call with a deadline.
pub trait ModelClient: Send + Sync {
    fn name(&self) -> &str;

    fn enabled(&self) -> bool {
        true
    }

    /// Implementations may use `async fn`; the future must be `Send` so a turn can be spawned.
    fn invoke(
        &self,
        task: ModelTask,
        prompt: &str,
    ) -> impl Future<Output = Result<String, ModelError>> + Send;
}

/// Stand-in used when no model is configured; every call is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledModel;

impl ModelClient for DisabledModel {
    fn name(&self) -> &str {
        "disabled"
    }

    fn enabled(&self) -> bool {
        false
    }

    async fn invoke(&self, _task: ModelTask, _prompt: &str) -> Result<String, ModelError> {
        Err(ModelError::Disabled)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Non-streaming client for an Ollama-compatible `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    endpoint: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .timeout(config.reply_timeout().max(Duration::from_secs(1)))
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/api/generate", config.base_url.trim_end_matches('/')),
            model: config.model_name.clone(),
        })
    }
}

impl ModelClient for OllamaClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, _task: ModelTask, prompt: &str) -> Result<String, ModelError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|err| {
                if err.is_connect() {
                    ModelError::Unavailable(err.to_string())
                } else {
                    ModelError::Transport(err)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|err| ModelError::BadResponse(err.to_string()))?;
        Ok(body.response)
    }
}

/// Static dispatch over the configured model backends.
#[derive(Debug, Clone)]
pub enum ModelBackend {
    Ollama(OllamaClient),
    Disabled(DisabledModel),
}

impl ModelBackend {
    pub fn disabled() -> Self {
        Self::Disabled(DisabledModel)
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        if config.enabled {
            Ok(Self::Ollama(OllamaClient::new(config)?))
        } else {
            Ok(Self::disabled())
        }
    }
}

impl ModelClient for ModelBackend {
    fn name(&self) -> &str {
        match self {
            ModelBackend::Ollama(client) => client.name(),
            ModelBackend::Disabled(client) => client.name(),
        }
    }

    fn enabled(&self) -> bool {
        match self {
            ModelBackend::Ollama(client) => client.enabled(),
            ModelBackend::Disabled(client) => client.enabled(),
        }
    }

    async fn invoke(&self, task: ModelTask, prompt: &str) -> Result<String, ModelError> {
        match self {
            ModelBackend::Ollama(client) => client.invoke(task, prompt).await,
            ModelBackend::Disabled(client) => client.invoke(task, prompt).await,
        }
    }
}
