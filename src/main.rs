use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use code_qa::api;
use code_qa::config::Config;
use code_qa::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!(
        "LLM provider: {} ({})",
        config.llm.provider,
        config.llm.base_url
    );
    tracing::info!(
        "Retrieval: {:?} top_k={} fetch_k={}",
        config.retrieval.mode,
        config.retrieval.top_k,
        config.retrieval.fetch_k
    );
    if config.github_token.is_none() {
        tracing::info!("No GITHUB_TOKEN set; using the unauthenticated rate limit");
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config)?;

    let app = Router::new()
        .route("/", get(serve_index))
        .route("/api/repo", post(api::repo::process_repo))
        .route("/api/repo", get(api::repo::current_repo))
        .route("/api/query", post(api::query::query))
        .with_state(state)
        .fallback(get(serve_index));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {bind_addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}
