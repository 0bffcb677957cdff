use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Base URL of the repository hosting API
    pub github_api_base: String,
    /// Personal access token for the hosting API. Optional: its absence
    /// lowers the shared rate limit but is not an error.
    pub github_token: Option<String>,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" or "ollama"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for answering
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
}

/// How chunks are selected for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Plain cosine top-k.
    Similarity,
    /// Maximal marginal relevance: fetch a larger candidate pool, then pick
    /// top_k balancing relevance against inter-result diversity.
    Mmr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub mode: RetrievalMode,
    pub top_k: usize,
    /// Candidate pool size for MMR selection.
    pub fetch_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9000".to_string(),
            github_api_base: "https://api.github.com".to_string(),
            github_token: None,
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-large".to_string(),
            api_key: None,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            mode: RetrievalMode::Similarity,
            top_k: 3,
            fetch_k: 8,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("CODE_QA_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(base) = std::env::var("GITHUB_API_BASE") {
            config.github_api_base = base.trim_end_matches('/').to_string();
        }
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            if !token.is_empty() {
                config.github_token = Some(token);
            }
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(mode) = std::env::var("RETRIEVAL_MODE") {
            match mode.to_lowercase().as_str() {
                "mmr" => {
                    config.retrieval.mode = RetrievalMode::Mmr;
                    // The diversity profile defaults to a larger k.
                    config.retrieval.top_k = 5;
                }
                "similarity" => config.retrieval.mode = RetrievalMode::Similarity,
                other => {
                    tracing::warn!("Unknown RETRIEVAL_MODE '{other}', using similarity");
                }
            }
        }
        if let Ok(val) = std::env::var("RETRIEVAL_TOP_K") {
            if let Ok(v) = val.parse::<usize>() {
                if v > 0 {
                    config.retrieval.top_k = v;
                }
            }
        }
        if let Ok(val) = std::env::var("RETRIEVAL_FETCH_K") {
            if let Ok(v) = val.parse::<usize>() {
                if v > 0 {
                    config.retrieval.fetch_k = v;
                }
            }
        }

        // MMR needs a candidate pool at least as large as the result set.
        if config.retrieval.fetch_k < config.retrieval.top_k {
            config.retrieval.fetch_k = config.retrieval.top_k;
        }

        config
    }
}
