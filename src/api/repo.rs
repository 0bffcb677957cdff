use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::analysis;
use crate::chunking;
use crate::github::{self, FetchError, RepoRef};
use crate::llm::embeddings::{self, EmbeddingError};
use crate::llm::retry::RetryPolicy;
use crate::models::{FileChunk, ProcessRepoRequest, SessionInfo};
use crate::search::vector::VectorIndex;
use crate::state::{AppState, RepoSession};

/// POST /api/repo - Fetch, chunk, embed, and index a repository, replacing
/// the current session. Re-submitting the current repository returns the
/// existing session unchanged.
pub async fn process_repo(
    State(state): State<AppState>,
    Json(req): Json<ProcessRepoRequest>,
) -> Result<Json<SessionInfo>, (StatusCode, String)> {
    let repo = RepoRef::parse(&req.url).map_err(fetch_error_response)?;
    let slug = repo.slug();

    if let Some(existing) = state.current_session() {
        if existing.info.repo == slug {
            return Ok(Json(existing.info.clone()));
        }
    }

    // One processing pipeline at a time.
    let _permit = state.process_semaphore.acquire().await.map_err(|_| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Repository processing unavailable".to_string(),
        )
    })?;

    tracing::info!("Processing repository {slug}");
    let files = github::fetch_repo_files(
        &state.http_client,
        &state.config.github_api_base,
        state.config.github_token.as_deref(),
        &repo,
    )
    .await
    .map_err(fetch_error_response)?;

    if files.is_empty() {
        tracing::warn!("No recognized source files in {slug}");
    }

    let mut chunks: Vec<FileChunk> = Vec::new();
    for file in &files {
        chunks.extend(chunking::chunk_file(&slug, file));
    }
    let documentation = analysis::documentation_coverage(files.iter().map(|f| f.content.as_str()));
    tracing::info!(
        "Fetched {} files from {slug}, {} chunks",
        files.len(),
        chunks.len()
    );

    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let llm_config = state.config.llm.clone();
    let embeddings = RetryPolicy::access_propagation()
        .run(
            |e| matches!(e, EmbeddingError::AccessPending),
            || embeddings::embed_batch(&state.http_client, &llm_config, &texts),
        )
        .await
        .map_err(embedding_error_response)?;

    if embeddings.len() != chunks.len() {
        return Err((
            StatusCode::BAD_GATEWAY,
            format!(
                "Embedding service returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            ),
        ));
    }

    let info = SessionInfo {
        repo: slug.clone(),
        file_count: files.len(),
        chunk_count: chunks.len(),
        documentation,
        processed_at: Utc::now(),
    };
    let index = VectorIndex::build(chunks, embeddings);
    state.replace_session(RepoSession {
        info: info.clone(),
        index,
    });

    tracing::info!("Successfully processed repository {slug}");
    Ok(Json(info))
}

/// GET /api/repo - Summary of the currently processed repository, if any.
pub async fn current_repo(State(state): State<AppState>) -> Json<Option<SessionInfo>> {
    Json(state.current_session().map(|s| s.info.clone()))
}

/// Map a fetch failure to a status code and readable message.
fn fetch_error_response(e: FetchError) -> (StatusCode, String) {
    let status = match &e {
        FetchError::InvalidRepositoryUrl(_) => StatusCode::BAD_REQUEST,
        FetchError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        FetchError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        FetchError::AccessDenied => StatusCode::FORBIDDEN,
        FetchError::NotFound(_) => StatusCode::NOT_FOUND,
        FetchError::Upstream { .. } | FetchError::Transport(_) => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

/// Map an index-build failure to a status code and readable message.
fn embedding_error_response(e: EmbeddingError) -> (StatusCode, String) {
    let status = match &e {
        EmbeddingError::AccessPending => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, format!("Error setting up embeddings: {e}"))
}
