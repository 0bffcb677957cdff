use std::fmt::Write as _;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::llm::chat::{self, ChatError};
use crate::llm::embeddings::{self, EmbeddingError};
use crate::llm::retry::RetryPolicy;
use crate::models::{ChatMessage, FileChunk, QueryRequest, QueryResult};
use crate::state::{AppState, RepoSession};

/// In-band answer returned when model access has not propagated after all
/// retries.
const ACCESS_PENDING_ANSWER: &str = "The model API access is still being activated. This typically takes 5-10 minutes after enabling access. Please try again in a few minutes.";

/// POST /api/query - Answer a question about the processed repository.
/// A failed answer degrades to an in-band message; it never aborts the
/// session.
pub async fn query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResult>, (StatusCode, String)> {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question is required".to_string()));
    }

    let Some(session) = state.current_session() else {
        return Err((
            StatusCode::CONFLICT,
            "No repository has been processed yet".to_string(),
        ));
    };

    Ok(Json(answer_question(&state, &session, &question).await))
}

/// A single retrieve+answer failure, classified for the retry policy.
#[derive(Debug)]
enum QueryError {
    AccessPending,
    Other(String),
}

impl From<EmbeddingError> for QueryError {
    fn from(e: EmbeddingError) -> Self {
        match e {
            EmbeddingError::AccessPending => QueryError::AccessPending,
            other => QueryError::Other(other.to_string()),
        }
    }
}

impl From<ChatError> for QueryError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::AccessPending => QueryError::AccessPending,
            other => QueryError::Other(other.to_string()),
        }
    }
}

/// Run the full retrieval-augmented answer flow under the shared retry
/// policy, degrading every failure to an in-band result.
async fn answer_question(state: &AppState, session: &Arc<RepoSession>, question: &str) -> QueryResult {
    let outcome = RetryPolicy::access_propagation()
        .run(
            |e| matches!(e, QueryError::AccessPending),
            || run_query(state, session, question),
        )
        .await;

    match outcome {
        Ok(result) => result,
        Err(QueryError::AccessPending) => QueryResult::failed(ACCESS_PENDING_ANSWER),
        Err(QueryError::Other(msg)) => {
            tracing::error!("Query failed: {msg}");
            QueryResult::failed(format!("Error processing query: {msg}"))
        }
    }
}

/// One attempt: embed the question, retrieve chunks, ask the model.
async fn run_query(
    state: &AppState,
    session: &Arc<RepoSession>,
    question: &str,
) -> Result<QueryResult, QueryError> {
    let query_embedding =
        embeddings::embed_single(&state.http_client, &state.config.llm, question).await?;

    let hits = session.index.retrieve(&query_embedding, &state.config.retrieval);
    let sources: Vec<FileChunk> = hits.into_iter().map(|h| h.chunk).collect();

    let messages = build_messages(&sources, question);
    let answer = chat::complete(&state.http_client, &state.config.llm, &messages).await?;

    Ok(QueryResult { answer, sources })
}

fn build_system_prompt() -> String {
    String::from(
        "You are an expert coding assistant specializing in code explanation and documentation. \
         Analyze the provided code snippets and context carefully.\n\n\
         When explaining code:\n\
         1. Break down complex logic into simple terms\n\
         2. Highlight key programming patterns and best practices\n\
         3. Explain the purpose and functionality of important code segments\n\
         4. Generate inline documentation for functions and classes when requested\n\
         5. Provide context about how different parts of the code interact\n\n\
         If asked to generate documentation, follow standard documentation formats, \
         include parameter descriptions, return values, and examples, and document \
         important side effects or exceptions.\n\n\
         Answer in a clear and structured format under these headings: \
         Overview, Detailed Explanation, Key Points, Recommendations.",
    )
}

fn build_context_block(chunks: &[FileChunk]) -> String {
    if chunks.is_empty() {
        return "(No relevant code was found for this question.)\n".to_string();
    }

    let mut ctx = String::new();
    for chunk in chunks {
        write!(
            ctx,
            "--- {} ({}) [chunk {}] ---\n{}\n\n",
            chunk.file_path, chunk.file_type, chunk.chunk_index, chunk.content
        )
        .unwrap();
    }
    ctx
}

fn build_messages(chunks: &[FileChunk], question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: build_system_prompt(),
        },
        // Context goes in the user message so smaller models attend to it.
        ChatMessage {
            role: "user".to_string(),
            content: format!(
                "Context:\n{}\nQuestion: {question}",
                build_context_block(chunks)
            ),
        },
    ]
}
