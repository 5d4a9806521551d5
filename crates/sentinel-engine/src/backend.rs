//! Reasoning backends
//!
//! A backend takes a system prompt and user content and returns raw text.
//! It knows nothing about verdicts; parsing lives in [`crate::verdict`].

use crate::prompt::JSON_ONLY_SUFFIX;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Backend invocation error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// No backend configured
    #[error("backend unavailable")]
    Unavailable,

    /// Transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Request timed out
    #[error("request timed out")]
    Timeout,

    /// Response body did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::HttpError(status.as_u16())
        } else if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Opaque text-completion capability
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Backend name, used in method tags
    fn name(&self) -> &str;

    /// Run one completion
    async fn invoke(&self, system_prompt: &str, user_content: &str) -> Result<String, BackendError>;
}

/// Backend provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI-compatible chat completions
    #[serde(alias = "open_ai")]
    OpenAi,
    /// Local Ollama server
    Ollama,
    /// No backend
    None,
}

impl Provider {
    /// Provider name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::None => "none",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "none" | "" => Ok(Self::None),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// Reasoning backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Provider
    pub provider: Provider,
    /// OpenAI API key
    pub api_key: Option<String>,
    /// OpenAI model
    pub openai_model: String,
    /// OpenAI-compatible base URL
    pub openai_base_url: String,
    /// Ollama model
    pub ollama_model: String,
    /// Ollama base URL
    pub ollama_base_url: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token limit
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            ollama_model: "llama3.2:1b".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            temperature: 0.1,
            max_tokens: 500,
            timeout_secs: 30,
        }
    }
}

/// Build the configured backend.
///
/// OpenAI without an API key and the `none` provider both yield an
/// [`UnavailableBackend`], so every deep analysis degrades to a fallback.
pub fn build_backend(config: &BackendConfig) -> Result<Arc<dyn ReasoningBackend>, BackendError> {
    let backend: Arc<dyn ReasoningBackend> = match config.provider {
        Provider::OpenAi => match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Arc::new(OpenAiBackend::new(config, key)?),
            _ => {
                info!("No OpenAI API key configured; model analysis will use fallbacks");
                Arc::new(UnavailableBackend::new(Provider::OpenAi.as_str()))
            }
        },
        Provider::Ollama => Arc::new(OllamaBackend::new(config)?),
        Provider::None => Arc::new(UnavailableBackend::new(Provider::None.as_str())),
    };

    info!(backend = backend.name(), "Reasoning backend ready");
    Ok(backend)
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| BackendError::Network(e.to_string()))
}

/// OpenAI-compatible chat completions backend
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiBackend {
    /// Create from configuration and key
    pub fn new(config: &BackendConfig, api_key: &str) -> Result<Self, BackendError> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key: api_key.to_string(),
            model: config.openai_model.clone(),
            endpoint: format!("{}/chat/completions", config.openai_base_url.trim_end_matches('/')),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl ReasoningBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn invoke(&self, system_prompt: &str, user_content: &str) -> Result<String, BackendError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_content },
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "response_format": { "type": "json_object" },
        });

        let resp: Value = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(model = %self.model, "Chat completion received");
        resp.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BackendError::MalformedResponse("missing choices[0].message.content".into()))
    }
}

/// Ollama `/api/chat` backend
pub struct OllamaBackend {
    client: reqwest::Client,
    model: String,
    endpoint: String,
    temperature: f32,
    max_tokens: u32,
}

impl OllamaBackend {
    /// Create from configuration
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            model: config.ollama_model.clone(),
            endpoint: format!("{}/api/chat", config.ollama_base_url.trim_end_matches('/')),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl ReasoningBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn invoke(&self, system_prompt: &str, user_content: &str) -> Result<String, BackendError> {
        // Small local models follow a single user turn more reliably
        let prompt = format!("{}\n\n{}\n\n{}", system_prompt, user_content, JSON_ONLY_SUFFIX);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
            "options": {
                "temperature": self.temperature,
                "num_predict": self.max_tokens,
            },
        });

        let resp: Value = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(model = %self.model, "Ollama chat received");
        resp.pointer("/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BackendError::MalformedResponse("missing message.content".into()))
    }
}

/// Backend used when no credential is configured; always fails
#[derive(Debug, Clone)]
pub struct UnavailableBackend {
    name: String,
}

impl UnavailableBackend {
    /// Create with the name of the provider that could not be configured
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl ReasoningBackend for UnavailableBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _system_prompt: &str, _user_content: &str) -> Result<String, BackendError> {
        Err(BackendError::Unavailable)
    }
}

/// Test double replaying canned responses and recording each call.
///
/// Queued responses are consumed first; once empty, the default response
/// (if any) is returned, otherwise the call fails as unavailable.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    name: String,
    queue: Mutex<VecDeque<Result<String, BackendError>>>,
    default: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedBackend {
    /// Create with a backend name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Always answer with `response` once the queue is drained
    pub fn always(name: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            default: Some(response.into()),
            ..Self::new(name)
        }
    }

    /// Queue one response
    pub fn push(&self, response: Result<String, BackendError>) {
        self.queue.lock().push_back(response);
    }

    /// Prompts received so far, as `(system, user)` pairs
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ReasoningBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, system_prompt: &str, user_content: &str) -> Result<String, BackendError> {
        self.calls
            .lock()
            .push((system_prompt.to_string(), user_content.to_string()));

        if let Some(next) = self.queue.lock().pop_front() {
            return next;
        }
        self.default.clone().ok_or(BackendError::Unavailable)
    }
}
