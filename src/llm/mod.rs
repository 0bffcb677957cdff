//! Clients for the hosted embedding and answering services, plus the
//! retry policy shared by both.

pub mod chat;
pub mod embeddings;
pub mod retry;

use serde::Deserialize;

/// Error payload shape returned by OpenAI-compatible APIs.
#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

/// True if an error response body indicates that model access has been
/// granted but not yet propagated. Checks the structured error code first
/// and falls back to the known message signatures for plain-text bodies.
pub(crate) fn is_access_pending(body: &str) -> bool {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(detail) = parsed.error {
            if detail.code.as_deref() == Some("model_not_found") {
                return true;
            }
            if let Some(message) = detail.message {
                return message.contains("does not have access to model")
                    || message.contains("not allowed to generate embeddings");
            }
        }
    }
    body.contains("model_not_found") || body.contains("does not have access to model")
}
