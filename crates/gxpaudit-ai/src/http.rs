//! HTTP clients for the model-serving endpoints: an OpenAI-compatible chat
//! completions API and a Whisper transcription endpoint.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::error::GenerationError;
use crate::generator::{ImagePayload, TextGenerator, Transcriber};

/// Chat model used when none is configured.
pub const DEFAULT_MODEL: &str = "databricks-claude-sonnet-4";

const TEMPERATURE: f32 = 0.3;
const TEXT_TIMEOUT: Duration = Duration::from_secs(60);
const VISION_TIMEOUT: Duration = Duration::from_secs(120);
const TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(120);

// ── Chat completions ──

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    ImageUrl { image_url: ImageUrl },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    model: String,
}

impl ChatClient {
    /// `base_url` is the API root, e.g. `https://host/serving-endpoints`
    /// (no trailing slash needed).
    pub fn new(base_url: String, token: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            model,
        }
    }

    async fn send(
        &self,
        content: MessageContent<'_>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            max_tokens,
            temperature: TEMPERATURE,
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .timeout(timeout)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::EmptyResponse("no completion choices".into()))?;

        info!(model = %self.model, chars = text.len(), "chat completion received");
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        self.send(MessageContent::Text(prompt), max_tokens, TEXT_TIMEOUT)
            .await
    }

    async fn complete_with_images(
        &self,
        prompt: &str,
        images: &[ImagePayload],
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        if images.is_empty() {
            return Err(GenerationError::NoImages);
        }

        // Images first, prompt last.
        let mut parts: Vec<ContentPart<'_>> = images
            .iter()
            .map(|img| ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: img.to_data_uri(),
                },
            })
            .collect();
        parts.push(ContentPart::Text { text: prompt });

        info!(images = images.len(), "calling chat model with images");
        self.send(MessageContent::Parts(parts), max_tokens, VISION_TIMEOUT)
            .await
    }
}

// ── Transcription ──

/// Client for a Whisper model-serving endpoint that takes base64 audio in
/// `dataframe_split` form.
pub struct WhisperClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    predictions: Vec<Value>,
}

impl WhisperClient {
    pub fn new(endpoint: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            token,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, GenerationError> {
        let payload = json!({
            "dataframe_split": {
                "columns": [0],
                "data": [[STANDARD.encode(audio)]],
            }
        });

        info!(bytes = audio.len(), "sending audio for transcription");
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .timeout(TRANSCRIBE_TIMEOUT)
            .json(&payload)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranscriptionResponse = resp.json().await?;
        let text = parsed
            .predictions
            .first()
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GenerationError::EmptyResponse("no transcription returned".into()))?
            .to_string();

        info!(chars = text.len(), "transcription complete");
        Ok(text)
    }
}
