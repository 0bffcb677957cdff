//! In-memory vector index with cosine similarity search.

use crate::config::{RetrievalConfig, RetrievalMode};
use crate::models::FileChunk;

/// A chunk paired with its embedding.
#[derive(Debug, Clone)]
struct IndexEntry {
    chunk: FileChunk,
    embedding: Vec<f32>,
}

/// A retrieved chunk with its relevance score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: FileChunk,
    pub score: f32,
}

/// An immutable nearest-neighbor index over one repository's chunks.
/// Built once per repository and replaced wholesale when a different
/// repository is processed.
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Build the index from parallel chunk and embedding collections.
    /// Callers must guarantee `chunks.len() == embeddings.len()`; extra
    /// elements on either side are dropped.
    pub fn build(chunks: Vec<FileChunk>, embeddings: Vec<Vec<f32>>) -> Self {
        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retrieve chunks for a query embedding according to the configured
    /// profile.
    pub fn retrieve(&self, query: &[f32], config: &RetrievalConfig) -> Vec<ScoredChunk> {
        match config.mode {
            RetrievalMode::Similarity => self.search(query, config.top_k),
            RetrievalMode::Mmr => self.search_diverse(query, config.top_k, config.fetch_k),
        }
    }

    /// Plain cosine top-k search, most similar first.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored = self.scored_candidates(query);
        scored.truncate(k);
        scored
            .into_iter()
            .map(|(idx, score)| ScoredChunk {
                chunk: self.entries[idx].chunk.clone(),
                score,
            })
            .collect()
    }

    /// Maximal marginal relevance: take the `fetch_k` most similar
    /// candidates, then select `k` of them, each time balancing relevance
    /// to the query against similarity to already-selected chunks.
    pub fn search_diverse(&self, query: &[f32], k: usize, fetch_k: usize) -> Vec<ScoredChunk> {
        const LAMBDA: f32 = 0.5;

        let mut candidates = self.scored_candidates(query);
        candidates.truncate(fetch_k.max(k));

        let mut selected: Vec<(usize, f32)> = Vec::with_capacity(k);
        while selected.len() < k && !candidates.is_empty() {
            let mut best: Option<(usize, f32)> = None;
            for (pos, &(idx, relevance)) in candidates.iter().enumerate() {
                let redundancy = selected
                    .iter()
                    .map(|&(sel_idx, _)| {
                        cosine_similarity(
                            &self.entries[idx].embedding,
                            &self.entries[sel_idx].embedding,
                        )
                    })
                    .fold(0.0f32, f32::max);
                let mmr = LAMBDA * relevance - (1.0 - LAMBDA) * redundancy;
                if best.is_none_or(|(_, b)| mmr > b) {
                    best = Some((pos, mmr));
                }
            }
            let Some((pos, _)) = best else { break };
            selected.push(candidates.remove(pos));
        }

        selected
            .into_iter()
            .map(|(idx, score)| ScoredChunk {
                chunk: self.entries[idx].chunk.clone(),
                score,
            })
            .collect()
    }

    /// All entries scored against the query, sorted descending.
    fn scored_candidates(&self, query: &[f32]) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (idx, cosine_similarity(query, &entry.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(name: &str) -> FileChunk {
        FileChunk {
            repo: "owner/repo".to_string(),
            file_name: name.to_string(),
            file_path: name.to_string(),
            file_type: ".py".to_string(),
            chunk_index: 0,
            content: format!("content of {name}"),
        }
    }

    fn index_of(named: &[(&str, Vec<f32>)]) -> VectorIndex {
        let chunks = named.iter().map(|(n, _)| chunk(n)).collect();
        let embeddings = named.iter().map(|(_, e)| e.clone()).collect();
        VectorIndex::build(chunks, embeddings)
    }

    // ─── Cosine similarity ───────────────────────────────

    #[test]
    fn test_cosine_identical_vectors() {
        let v = vec![0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    // ─── Top-k search ────────────────────────────────────

    #[test]
    fn test_topk_returns_nearest_in_order() {
        // X, Y, Z where the query's nearest neighbors are [Y, X].
        let index = index_of(&[
            ("x.py", vec![0.7, 0.7, 0.0]),
            ("y.py", vec![1.0, 0.05, 0.0]),
            ("z.py", vec![0.0, 0.0, 1.0]),
        ]);
        let hits = index.search(&[1.0, 0.0, 0.0], 2);
        let names: Vec<&str> = hits.iter().map(|h| h.chunk.file_name.as_str()).collect();
        assert_eq!(names, vec!["y.py", "x.py"]);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_topk_larger_than_index() {
        let index = index_of(&[("a.py", vec![1.0, 0.0]), ("b.py", vec![0.0, 1.0])]);
        assert_eq!(index.search(&[1.0, 0.0], 10).len(), 2);
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = VectorIndex::build(Vec::new(), Vec::new());
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0], 3).is_empty());
    }

    // ─── MMR search ──────────────────────────────────────

    #[test]
    fn test_mmr_prefers_diverse_second_pick() {
        // a and b point in nearly the same direction; c is distinct.
        // Plain top-2 returns [a, b]; MMR penalizes b's redundancy with a
        // and picks c instead.
        let index = index_of(&[
            ("a.py", vec![0.9, 0.436, 0.0]),
            ("b.py", vec![0.89, 0.456, 0.0]),
            ("c.py", vec![0.436, 0.0, 0.9]),
        ]);
        let query = [1.0, 0.0, 0.0];

        let plain: Vec<String> = index
            .search(&query, 2)
            .iter()
            .map(|h| h.chunk.file_name.clone())
            .collect();
        assert_eq!(plain, vec!["a.py", "b.py"]);

        let diverse: Vec<String> = index
            .search_diverse(&query, 2, 3)
            .iter()
            .map(|h| h.chunk.file_name.clone())
            .collect();
        assert_eq!(diverse, vec!["a.py", "c.py"]);
    }

    #[test]
    fn test_mmr_first_pick_is_most_relevant() {
        let index = index_of(&[
            ("far.py", vec![0.0, 1.0, 0.0]),
            ("near.py", vec![1.0, 0.1, 0.0]),
        ]);
        let hits = index.search_diverse(&[1.0, 0.0, 0.0], 1, 2);
        assert_eq!(hits[0].chunk.file_name, "near.py");
    }

    #[test]
    fn test_mmr_pool_smaller_than_k() {
        let index = index_of(&[("a.py", vec![1.0, 0.0])]);
        let hits = index.search_diverse(&[1.0, 0.0], 5, 8);
        assert_eq!(hits.len(), 1);
    }

    // ─── Retrieval profiles ──────────────────────────────

    #[test]
    fn test_retrieve_respects_configured_mode() {
        let index = index_of(&[
            ("a.py", vec![0.9, 0.436, 0.0]),
            ("b.py", vec![0.89, 0.456, 0.0]),
            ("c.py", vec![0.436, 0.0, 0.9]),
        ]);
        let query = [1.0, 0.0, 0.0];

        let similarity = RetrievalConfig {
            mode: RetrievalMode::Similarity,
            top_k: 2,
            fetch_k: 3,
        };
        let mmr = RetrievalConfig {
            mode: RetrievalMode::Mmr,
            top_k: 2,
            fetch_k: 3,
        };

        let sim_names: Vec<String> = index
            .retrieve(&query, &similarity)
            .iter()
            .map(|h| h.chunk.file_name.clone())
            .collect();
        let mmr_names: Vec<String> = index
            .retrieve(&query, &mmr)
            .iter()
            .map(|h| h.chunk.file_name.clone())
            .collect();

        assert_eq!(sim_names, vec!["a.py", "b.py"]);
        assert_eq!(mmr_names, vec!["a.py", "c.py"]);
    }
}
