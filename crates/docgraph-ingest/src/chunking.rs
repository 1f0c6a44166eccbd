//! Text chunking on semantic boundaries.
//!
//! Splits at paragraph, then line, then sentence, then word boundaries via
//! `text-splitter`, measured in characters, with overlap between neighbours.

use serde::Serialize;
use text_splitter::{Characters, ChunkConfig, TextSplitter};
use tracing::warn;

use docgraph_core::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use docgraph_core::ChunkingConfig;

use crate::file::Metadata;

/// A chunk of a document's text with position metadata.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentChunk {
    pub id: String,
    pub text: String,
    /// Metadata of the document the chunk came from.
    pub metadata: Metadata,
    pub index: usize,
    pub total: usize,
    /// Offset of the chunk in the source text, in characters.
    pub start_char: usize,
}

/// Splits text into overlapping chunks.
pub struct Chunker {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    splitter: Option<TextSplitter<Characters>>,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let splitter = if chunk_size == 0 {
            warn!("Chunk size 0 is not usable, documents will be kept whole");
            None
        } else {
            match ChunkConfig::new(chunk_size).with_overlap(chunk_overlap) {
                Ok(config) => Some(TextSplitter::new(config.with_trim(true))),
                Err(e) => {
                    warn!(
                        "Invalid chunking config (size={}, overlap={}): {}, documents will be kept whole",
                        chunk_size, chunk_overlap, e
                    );
                    None
                }
            }
        };
        Self {
            chunk_size,
            chunk_overlap,
            splitter,
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Chunk `text`; whitespace-only text yields no chunks.
    pub fn chunk(&self, text: &str, metadata: &Metadata) -> Vec<DocumentChunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let pieces: Vec<(usize, &str)> = match &self.splitter {
            Some(splitter) => splitter.chunk_indices(text).collect(),
            None => vec![(0, text)],
        };

        let total = pieces.len();
        let mut chars_before = 0usize;
        let mut last_byte = 0usize;
        pieces
            .into_iter()
            .enumerate()
            .map(|(index, (byte_offset, piece))| {
                chars_before += text[last_byte..byte_offset].chars().count();
                last_byte = byte_offset;
                DocumentChunk {
                    id: uuid::Uuid::new_v4().to_string(),
                    text: piece.to_string(),
                    metadata: metadata.clone(),
                    index,
                    total,
                    start_char: chars_before,
                }
            })
            .collect()
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(n: usize) -> String {
        (0..n)
            .map(|i| format!("Paragraph {} talks about Acme Corp. and its many products in detail.", i))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunker = Chunker::default();
        let chunks = chunker.chunk("Hello, world!", &Metadata::new());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello, world!");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].total, 1);
        assert_eq!(chunks[0].start_char, 0);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let chunker = Chunker::default();
        assert!(chunker.chunk("", &Metadata::new()).is_empty());
        assert!(chunker.chunk("  \n\t ", &Metadata::new()).is_empty());
    }

    #[test]
    fn test_long_text_respects_size() {
        let chunker = Chunker::new(200, 40);
        let text = paragraphs(20);
        let chunks = chunker.chunk(&text, &Metadata::new());
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert!(chunk.text.chars().count() <= 200);
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.total, chunks.len());
            let expected: String = text.chars().skip(chunk.start_char).take(chunk.text.chars().count()).collect();
            assert_eq!(chunk.text, expected);
        }
    }

    #[test]
    fn test_chunking_is_repeatable() {
        let chunker = Chunker::new(150, 30);
        let text = paragraphs(12);
        let a: Vec<String> = chunker.chunk(&text, &Metadata::new()).into_iter().map(|c| c.text).collect();
        let b: Vec<String> = chunker.chunk(&text, &Metadata::new()).into_iter().map(|c| c.text).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_overlap_keeps_text_whole() {
        let chunker = Chunker::new(50, 80);
        let text = paragraphs(5);
        let chunks = chunker.chunk(&text, &Metadata::new());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
    }

    #[test]
    fn test_chunks_carry_document_metadata() {
        let mut metadata = Metadata::new();
        metadata.insert("filename".into(), "a.txt".into());
        let chunks = Chunker::default().chunk("Some text", &metadata);
        assert_eq!(chunks[0].metadata, metadata);
        assert_ne!(chunks[0].id, Chunker::default().chunk("Some text", &metadata)[0].id);
    }
}
