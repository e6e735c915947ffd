//! OpenAI-backed advisor over the blocking chat-completions endpoint.

use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::advisor::{AdviceRequest, ChainAdvisor};
use crate::prompt::{SYSTEM_PROMPT, user_prompt};
use crate::{LlmError, LlmResult};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

// ── OpenAiAdvisor ─────────────────────────────────────────────────────────────

/// Advisor backed by the OpenAI chat-completions API.  Every call carries a
/// bounded timeout; a timed-out or malformed call surfaces as an `LlmError`
/// and the caller keeps the agent's original chain.
pub struct OpenAiAdvisor {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiAdvisor {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> LlmResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LlmError::MissingKey);
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::BuildClient(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Read the key from a file, falling back to `OPENAI_API_KEY`.
    pub fn from_key_file(path: &Path) -> LlmResult<Self> {
        let key = std::fs::read_to_string(path)
            .map(|s| s.trim().to_string())
            .or_else(|_| std::env::var("OPENAI_API_KEY").map_err(|_| LlmError::MissingKey))?;
        Self::new(key, DEFAULT_TIMEOUT)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl ChainAdvisor for OpenAiAdvisor {
    fn advise(&self, request: &AdviceRequest) -> LlmResult<String> {
        let user = user_prompt(request);
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &user },
            ],
            temperature: 1.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().unwrap_or_else(|_| "<no body>".to_string());
            return Err(LlmError::HttpStatus { code: status.as_u16(), message });
        }

        let body: ChatCompletionResponse = response
            .json()
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or(LlmError::EmptyChoice)
    }
}
