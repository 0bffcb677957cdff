use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;
use crate::llm::is_access_pending;
use crate::models::ChatMessage;

/// Temperature for answering calls. Zero for reproducible answers.
const ANSWER_TEMPERATURE: f32 = 0.0;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Model access has been enabled but not yet propagated; retryable.
    #[error("The answering model is not available to this API key yet. Access changes can take 5-10 minutes to propagate; please try again in a few minutes.")]
    AccessPending,
    #[error("Failed to call chat API: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Chat API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Chat response was malformed: {0}")]
    Malformed(String),
    #[error("Unknown LLM provider: {0}")]
    UnknownProvider(String),
}

/// Request a single non-streaming completion from the configured provider.
pub async fn complete(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: &[ChatMessage],
) -> Result<String, ChatError> {
    match config.provider.as_str() {
        "ollama" => complete_ollama(client, config, messages).await,
        "openai" => complete_openai(client, config, messages).await,
        other => Err(ChatError::UnknownProvider(other.to_string())),
    }
}

async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ChatError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    if is_access_pending(&body) {
        return Err(ChatError::AccessPending);
    }
    Err(ChatError::Api {
        status: status.as_u16(),
        body,
    })
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

async fn complete_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: &[ChatMessage],
) -> Result<String, ChatError> {
    let url = format!("{}/api/chat", config.base_url);

    let req = OllamaChatRequest {
        model: config.chat_model.clone(),
        messages: messages.to_vec(),
        stream: false,
        options: OllamaOptions {
            temperature: ANSWER_TEMPERATURE,
        },
    };

    let resp = check_response(client.post(&url).json(&req).send().await?).await?;
    let body: OllamaChatResponse = resp
        .json()
        .await
        .map_err(|e| ChatError::Malformed(e.to_string()))?;

    Ok(body.message.content)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}

async fn complete_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: &[ChatMessage],
) -> Result<String, ChatError> {
    let url = format!("{}/v1/chat/completions", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiChatRequest {
        model: config.chat_model.clone(),
        messages: messages.to_vec(),
        temperature: ANSWER_TEMPERATURE,
    };

    let resp = check_response(
        client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&req)
            .send()
            .await?,
    )
    .await?;

    let body: OpenAiChatResponse = resp
        .json()
        .await
        .map_err(|e| ChatError::Malformed(e.to_string()))?;

    body.choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| ChatError::Malformed("response contained no choices".to_string()))
}
