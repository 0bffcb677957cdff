use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::Config;
use crate::models::SessionInfo;
use crate::search::vector::VectorIndex;

/// The session's processed repository: its summary and retrieval index.
pub struct RepoSession {
    pub info: SessionInfo,
    pub index: VectorIndex,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http_client: reqwest::Client,
    /// The currently held repository session, replaced wholesale when a
    /// different repository is processed.
    pub session: Arc<RwLock<Option<Arc<RepoSession>>>>,
    /// Serializes repository processing: one fetch+index pipeline at a time.
    pub process_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        Ok(Self {
            config: Arc::new(config),
            http_client: reqwest::Client::builder()
                .user_agent(concat!("code-qa/", env!("CARGO_PKG_VERSION")))
                .connect_timeout(std::time::Duration::from_secs(10))
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            session: Arc::new(RwLock::new(None)),
            process_semaphore: Arc::new(tokio::sync::Semaphore::new(1)),
        })
    }

    /// Snapshot of the current session, if a repository has been processed.
    pub fn current_session(&self) -> Option<Arc<RepoSession>> {
        self.session.read().clone()
    }

    /// Replace the held session with a freshly built one.
    pub fn replace_session(&self, session: RepoSession) {
        *self.session.write() = Some(Arc::new(session));
    }
}
