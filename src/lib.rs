//! # code-qa
//!
//! A Rust web application for asking natural-language questions about a
//! public GitHub repository, answered with retrieval-augmented generation
//! over embedded code chunks.
//!
//! ## Architecture
//!
//! Data flows strictly forward through the pipeline:
//!
//! ```text
//!   ┌──────────────────┐
//!   │  Repository URL   │
//!   └────────┬─────────┘
//!            ▼
//!   ┌──────────────────┐     GitHub contents API, worklist traversal,
//!   │     Fetcher       │     recognized code extensions only
//!   └────────┬─────────┘
//!            ▼
//!   ┌──────────────────┐     separator-driven recursive splitting,
//!   │     Chunker       │     3000-char chunks with 500-char overlap
//!   └────────┬─────────┘
//!            ▼
//!   ┌──────────────────┐     hosted embedding API with
//!   │  Index Builder    │     retry-on-access-pending
//!   └────────┬─────────┘
//!            ▼
//!   ┌──────────────────┐     held in the session, replaced wholesale
//!   │   VectorIndex     │     when a new repository is processed
//!   └────────┬─────────┘
//!            ▼ per question
//!   ┌──────────────────┐     cosine top-k or MMR retrieval, prompt
//!   │     Answerer      │     assembly, chat completion at temperature 0
//!   └──────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for the server, GitHub
//!   access, LLM providers, and retrieval profiles
//! - [`models`] - Shared data types: `FileChunk`, `QueryResult`, request and
//!   response types
//! - [`github`] - Repository fetching via the GitHub contents API with a
//!   fixed code-extension filter and classified failures
//! - [`chunking`] - Recursive separator splitter producing overlapping
//!   chunks tagged with provenance metadata
//! - [`llm`] - Embedding and chat-completion clients plus the shared retry
//!   policy for access-propagation delays
//! - [`search`] - In-memory vector index with cosine top-k and
//!   diversity-aware (MMR) retrieval
//! - [`analysis`] - Code-structure scan reporting documentation coverage
//! - [`api`] - Axum handlers for repository processing and question
//!   answering
//! - [`state`] - Session state: the held index and current repository

pub mod analysis;
pub mod api;
pub mod chunking;
pub mod config;
pub mod github;
pub mod llm;
pub mod models;
pub mod search;
pub mod state;
