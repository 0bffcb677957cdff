//! Code chunking: recursive separator-driven splitting with overlap.

pub mod splitter;

pub use splitter::CodeSplitter;

use crate::github::SourceFile;
use crate::models::FileChunk;

/// Target fragment length, in characters.
pub const CHUNK_SIZE: usize = 3000;
/// Characters of the previous fragment repeated at the start of the next.
pub const CHUNK_OVERLAP: usize = 500;

/// Candidate separators, ordered most- to least-semantic. Splitting tries
/// each in order and re-splits oversized fragments with the next one; the
/// empty string means a character-boundary hard split.
pub const CODE_SEPARATORS: &[&str] = &[
    // Class and function definitions
    "\nclass ",
    "\ndef ",
    "\nfunction ",
    "\nasync def ",
    // Decorators and methods
    "\n@",
    "\n    def ",
    "\n    async def ",
    // JavaScript / TypeScript
    "\nconst ",
    "\nlet ",
    "\nvar ",
    "\nexport ",
    "\nimport ",
    // Common code blocks
    "\nif __name__ == ",
    "\ntry:",
    "\nfor ",
    "\nwhile ",
    // General structure
    "\n\n",
    "\n",
    " ",
    "",
];

/// Split one source file into tagged chunks.
pub fn chunk_file(repo: &str, file: &SourceFile) -> Vec<FileChunk> {
    let splitter = CodeSplitter::default();
    splitter
        .split(&file.content)
        .into_iter()
        .enumerate()
        .map(|(chunk_index, content)| FileChunk {
            repo: repo.to_string(),
            file_name: file.name.clone(),
            file_path: file.path.clone(),
            file_type: file.extension.clone(),
            chunk_index,
            content,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file(content: &str) -> SourceFile {
        SourceFile {
            name: "app.py".to_string(),
            path: "src/app.py".to_string(),
            extension: ".py".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_chunk_file_tags_metadata() {
        let file = sample_file("def main():\n    pass\n");
        let chunks = chunk_file("owner/repo", &file);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].repo, "owner/repo");
        assert_eq!(chunks[0].file_name, "app.py");
        assert_eq!(chunks[0].file_path, "src/app.py");
        assert_eq!(chunks[0].file_type, ".py");
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn test_chunk_file_ordinals_are_sequential() {
        let body: String = (0..200)
            .map(|i| format!("\ndef func_{i}():\n    return {i} * 2\n"))
            .collect();
        let file = sample_file(&body);
        let chunks = chunk_file("owner/repo", &file);
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
        }
    }

    #[test]
    fn test_chunk_file_empty_content() {
        let file = sample_file("");
        assert!(chunk_file("owner/repo", &file).is_empty());
    }
}
