use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chunk::Chunk;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkerError {
    #[error("chunk_size must be greater than 0")]
    ZeroChunkSize,
    #[error("overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}

/// Sizes are counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4000,
            overlap: 100,
        }
    }
}

impl ChunkerConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }

    pub fn validate(&self) -> Result<(), ChunkerError> {
        if self.chunk_size == 0 {
            return Err(ChunkerError::ZeroChunkSize);
        }
        if self.overlap >= self.chunk_size {
            return Err(ChunkerError::OverlapTooLarge {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }

    /// How far each window advances. Always positive for a validated config.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Splits text into fixed-size, overlapping character windows.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Result<Self, ChunkerError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Lazily walk `text` in windows. Cloning the returned iterator restarts
    /// from wherever the clone was taken.
    pub fn chunk_text<'a>(&self, doc_id: &'a str, text: &'a str) -> Chunks<'a> {
        Chunks {
            doc_id,
            text,
            chunk_size: self.config.chunk_size,
            step: self.config.step(),
            byte_pos: 0,
            char_pos: 0,
            index: 0,
            done: text.is_empty(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    doc_id: &'a str,
    text: &'a str,
    chunk_size: usize,
    step: usize,
    byte_pos: usize,
    char_pos: usize,
    index: usize,
    done: bool,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done {
            return None;
        }

        let start = self.byte_pos;
        let end = advance(self.text, start, self.chunk_size);
        let slice = &self.text[start..end];
        let end_char = self.char_pos + slice.chars().count();

        let chunk = Chunk::new(
            self.doc_id,
            self.index,
            slice.to_string(),
            (self.char_pos, end_char),
        );

        // The window that reaches end of input is the last one; anything after
        // it would lie entirely inside the overlap.
        if end == self.text.len() {
            self.done = true;
        } else {
            self.byte_pos = advance(self.text, start, self.step);
            self.char_pos += self.step;
        }
        self.index += 1;

        Some(chunk)
    }
}

/// Byte offset `n` characters after `from`, clamped to the end of `text`.
fn advance(text: &str, from: usize, n: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(n)
        .map_or(text.len(), |(i, _)| from + i)
}
