use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GenerationConfig;

/// Max tokens for the full session report.
pub const REPORT_MAX_TOKENS: u32 = 2000;
/// Max tokens for a single-finding explanation.
pub const EXPLANATION_MAX_TOKENS: u32 = 200;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Generation service unreachable at {0}")]
    Connection(String),

    #[error("Generation request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Generation service error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Malformed generation response: {0}")]
    ResponseParsing(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Generation disabled")]
    Disabled,
}

/// One chat-completion call: a system role plus a user prompt.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(system: &'a str, prompt: &'a str, max_tokens: u32) -> Self {
        Self {
            system,
            prompt,
            max_tokens,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Text generation backend. Blocking; call from `spawn_blocking`.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError>;
}

// ═══════════════════════════════════════════════════════════
// OpenAI-compatible chat completions
// ═══════════════════════════════════════════════════════════

/// HTTP client for an OpenAI-compatible `/chat/completions` endpoint (NIM, Ollama, vLLM).
pub struct ChatCompletionClient {
    base_url: String,
    model: String,
    timeout: Duration,
    client: reqwest::blocking::Client,
}

impl ChatCompletionClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: config.timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl TextGenerator for ChatCompletionClient {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                GenerationError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                GenerationError::Timeout(self.timeout)
            } else {
                GenerationError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(self.timeout)
            } else {
                GenerationError::ResponseParsing(e.to_string())
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| GenerationError::ResponseParsing("no choices[0].message.content".into()))
    }
}

// ═══════════════════════════════════════════════════════════
// Mock
// ═══════════════════════════════════════════════════════════

/// Scripted generator for tests and mock mode. Records every prompt it receives.
pub struct MockTextGenerator {
    response: Result<String, GenerationError>,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: GenerationError) -> Self {
        Self {
            response: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always fails with `Disabled`, which forces template output.
    pub fn disabled() -> Self {
        Self::failing(GenerationError::Disabled)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl TextGenerator for MockTextGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.to_string());
        }
        self.response.clone()
    }
}
