use crate::config::GeneratorConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const PROMPT_PLACEHOLDER: &str = "{job_description}";
const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.7;

/// Control tokens some models leak into their output
const CONTROL_TOKENS: [&str; 4] = ["<s>", "</s>", "[INST]", "[/INST]"];

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("prompt template {path} unreadable: {source}")]
    Prompt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response has no completion")]
    EmptyResponse,
}

/// Writes a listing-specific cover letter from the listing description
#[async_trait]
pub trait CoverLetterGenerator: Send + Sync {
    async fn generate(&self, description: &str) -> Result<String, GeneratorError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenRouter
pub struct OpenRouterGenerator {
    http: reqwest::Client,
    config: GeneratorConfig,
    api_key: String,
}

impl OpenRouterGenerator {
    /// Returns `None` when generation is disabled or no API key is configured
    pub fn from_config(config: &GeneratorConfig) -> Option<Result<Self, GeneratorError>> {
        if !config.enabled {
            return None;
        }
        let api_key = config.api_key.clone().filter(|k| !k.is_empty())?;

        Some(
            reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .map(|http| Self {
                    http,
                    config: config.clone(),
                    api_key,
                })
                .map_err(GeneratorError::from),
        )
    }

    async fn prompt(&self, description: &str) -> Result<String, GeneratorError> {
        let template = tokio::fs::read_to_string(&self.config.prompt_path)
            .await
            .map_err(|source| GeneratorError::Prompt {
                path: self.config.prompt_path.clone(),
                source,
            })?;
        Ok(render_prompt(&template, description))
    }
}

#[async_trait]
impl CoverLetterGenerator for OpenRouterGenerator {
    async fn generate(&self, description: &str) -> Result<String, GeneratorError> {
        let prompt = self.prompt(description).await?;
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response: ChatResponse = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "https://hh.ru")
            .header("X-Title", "HH Auto Apply Bot")
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let raw = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GeneratorError::EmptyResponse)?;

        let letter = clean_completion(&raw);
        if letter.is_empty() {
            return Err(GeneratorError::EmptyResponse);
        }
        ::log::info!("Cover letter generated ({} chars)", letter.chars().count());
        Ok(letter)
    }
}

pub fn render_prompt(template: &str, description: &str) -> String {
    template.replace(PROMPT_PLACEHOLDER, description)
}

/// Trims the completion and strips model control tokens
pub fn clean_completion(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    for token in CONTROL_TOKENS {
        text = text.replace(token, "");
    }
    text.trim().to_string()
}
