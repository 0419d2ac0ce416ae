//! Endpoint configuration, from flags or `GXPAUDIT_*` environment variables.

use anyhow::anyhow;
use clap::Args;
use gxpaudit_ai::http::DEFAULT_MODEL;
use gxpaudit_ai::orchestrate::DEFAULT_PREVIEW_CHARS;
use gxpaudit_ai::{ChatClient, PipelineConfig, WhisperClient};

const BASE_URL_VAR: &str = "GXPAUDIT_LLM_BASE_URL";
const TOKEN_VAR: &str = "GXPAUDIT_LLM_TOKEN";
const WHISPER_URL_VAR: &str = "GXPAUDIT_WHISPER_URL";

#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    /// Root of the OpenAI-compatible serving API.
    #[arg(long, env = BASE_URL_VAR, global = true)]
    pub llm_base_url: Option<String>,

    /// Bearer token for the chat and transcription endpoints.
    #[arg(long, env = TOKEN_VAR, hide_env_values = true, global = true)]
    pub llm_token: Option<String>,

    #[arg(long, env = "GXPAUDIT_LLM_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub llm_model: String,

    /// Full URL of the Whisper invocation endpoint.
    #[arg(long, env = WHISPER_URL_VAR, global = true)]
    pub whisper_url: Option<String>,

    /// Characters of an unparseable response kept in diagnostics.
    #[arg(long, env = "GXPAUDIT_PREVIEW_CHARS", default_value_t = DEFAULT_PREVIEW_CHARS, global = true)]
    pub preview_chars: usize,
}

impl LlmArgs {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            preview_chars: self.preview_chars,
        }
    }

    pub fn chat_client(&self) -> anyhow::Result<ChatClient> {
        let base_url = required(&self.llm_base_url, BASE_URL_VAR)?;
        let token = required(&self.llm_token, TOKEN_VAR)?;
        Ok(ChatClient::new(
            base_url.to_string(),
            token.to_string(),
            self.llm_model.clone(),
        ))
    }

    pub fn whisper_client(&self) -> anyhow::Result<WhisperClient> {
        let endpoint = required(&self.whisper_url, WHISPER_URL_VAR)?;
        let token = required(&self.llm_token, TOKEN_VAR)?;
        Ok(WhisperClient::new(endpoint.to_string(), token.to_string()))
    }
}

fn required<'a>(value: &'a Option<String>, var: &str) -> anyhow::Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{var} is not set"))
}
