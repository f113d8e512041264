use std::time::Duration;

use leadscout_core::{parse_generated_text, GeneratedText, Record};
use reqwest::StatusCode;
use scout_logging::scout_debug;
use serde::{Deserialize, Serialize};

use crate::{GenerationError, Generator};

pub const CONTENT_PLACEHOLDER: &str = "{content}";

const DEFAULT_USER_PROMPT: &str = "Write a personalized outreach email in three sentences based on \
the social post below. Appreciate their post, name the pain point it reveals, and close with a \
call to action.\n\nRespond ONLY with a JSON object with the keys subject and body.\n\
- subject: at most 10 words.\n\
- body: three friendly, direct sentences.\n\
- No explanations, no code fences, no text outside the JSON object.\n\n\
Post content:\n{content}";

/// Settings for an OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub system_prompt: String,
    /// User message; `{content}` is replaced with the record's content.
    pub user_prompt_template: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
    /// Record content beyond this many characters is cut off.
    pub max_content_chars: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key: String::new(),
            system_prompt: "You are a helpful assistant.".to_string(),
            user_prompt_template: DEFAULT_USER_PROMPT.to_string(),
            max_tokens: 512,
            temperature: 0.7,
            request_timeout: Duration::from_secs(30),
            max_content_chars: 6_000,
        }
    }
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
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct ChatCompletionClient {
    http: reqwest::Client,
    settings: ChatSettings,
}

impl ChatCompletionClient {
    pub fn new(settings: ChatSettings) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| GenerationError::Network(err.to_string()))?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn user_prompt(&self, record: &Record) -> String {
        let content = truncate_chars(record.prompt_content(), self.settings.max_content_chars);
        self.settings
            .user_prompt_template
            .replace(CONTENT_PLACEHOLDER, content)
    }
}

#[async_trait::async_trait]
impl Generator for ChatCompletionClient {
    async fn generate(&self, record: &Record) -> Result<GeneratedText, GenerationError> {
        let prompt = self.user_prompt(record);
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.settings.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        scout_debug!(
            "Chat request for {} ({} prompt chars, model {})",
            record.item_id,
            prompt.chars().count(),
            self.settings.model
        );
        let response = self
            .http
            .post(&self.settings.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::RateLimited(body));
        }
        if !status.is_success() {
            return Err(GenerationError::Http {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|err| GenerationError::Http {
                status: status.as_u16(),
                message: format!("unreadable completion envelope: {err}"),
            })?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyReply)?;

        Ok(parse_generated_text(&content)?)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> GenerationError {
    if err.status() == Some(StatusCode::TOO_MANY_REQUESTS) {
        return GenerationError::RateLimited(err.to_string());
    }
    GenerationError::Network(err.to_string())
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
