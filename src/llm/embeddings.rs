use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;
use crate::llm::is_access_pending;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Model access has been enabled but not yet propagated; retryable.
    #[error("The embedding model is not available to this API key yet. Access changes can take 5-10 minutes to propagate; please try again in a few minutes.")]
    AccessPending,
    #[error("Failed to call embedding API: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Embedding API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Embedding response was malformed: {0}")]
    Malformed(String),
    #[error("Unknown LLM provider: {0}")]
    UnknownProvider(String),
}

/// Generate embeddings for a batch of texts using the configured provider.
/// The returned vectors are parallel with `texts`.
pub async fn embed_batch(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    match config.provider.as_str() {
        "ollama" => embed_ollama(client, config, texts).await,
        "openai" => embed_openai(client, config, texts).await,
        other => Err(EmbeddingError::UnknownProvider(other.to_string())),
    }
}

/// Generate an embedding for a single text.
pub async fn embed_single(
    client: &reqwest::Client,
    config: &LlmConfig,
    text: &str,
) -> Result<Vec<f32>, EmbeddingError> {
    let results = embed_batch(client, config, &[text.to_string()]).await?;
    results
        .into_iter()
        .next()
        .ok_or_else(|| EmbeddingError::Malformed("no embedding returned".to_string()))
}

async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, EmbeddingError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    if is_access_pending(&body) {
        return Err(EmbeddingError::AccessPending);
    }
    Err(EmbeddingError::Api {
        status: status.as_u16(),
        body,
    })
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
    /// Ask Ollama to silently truncate inputs that exceed the model's
    /// context length instead of returning a 400 error.
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

async fn embed_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let url = format!("{}/api/embed", config.base_url);

    let batch_size = 32;
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size) {
        let req = OllamaEmbedRequest {
            model: config.embedding_model.clone(),
            input: chunk.to_vec(),
            truncate: true,
        };

        let resp = check_response(client.post(&url).json(&req).send().await?).await?;
        let body: OllamaEmbedResponse = resp
            .json()
            .await
            .map_err(|e| EmbeddingError::Malformed(e.to_string()))?;

        all_embeddings.extend(body.embeddings);
    }

    Ok(all_embeddings)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

async fn embed_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let url = format!("{}/v1/embeddings", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let batch_size = 64;
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size) {
        let req = OpenAiEmbedRequest {
            model: config.embedding_model.clone(),
            input: chunk.to_vec(),
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

        let body: OpenAiEmbedResponse = resp
            .json()
            .await
            .map_err(|e| EmbeddingError::Malformed(e.to_string()))?;

        all_embeddings.extend(body.data.into_iter().map(|d| d.embedding));
    }

    Ok(all_embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_response_parsing() {
        let json = r#"{"data":[{"embedding":[0.1,0.2]},{"embedding":[0.3,0.4]}]}"#;
        let parsed: OpenAiEmbedResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert_eq!(parsed.data[1].embedding, vec![0.3, 0.4]);
    }

    #[test]
    fn test_ollama_response_parsing() {
        let json = r#"{"embeddings":[[1.0,0.0],[0.0,1.0]]}"#;
        let parsed: OllamaEmbedResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
    }

    #[test]
    fn test_ollama_request_sets_truncate() {
        let req = OllamaEmbedRequest {
            model: "nomic-embed-text".into(),
            input: vec!["hello".into()],
            truncate: true,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["truncate"], true);
    }

    #[test]
    fn test_access_pending_error_message_is_user_facing() {
        let msg = EmbeddingError::AccessPending.to_string();
        assert!(msg.contains("5-10 minutes"));
    }
}
