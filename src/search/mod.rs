//! Retrieval over embedded chunks.

pub mod vector;
