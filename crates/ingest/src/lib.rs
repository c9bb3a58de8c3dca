pub mod chunk;
pub mod chunker;
pub mod reader;

pub use chunk::Chunk;
pub use chunker::{Chunker, ChunkerConfig, ChunkerError, Chunks};
pub use reader::{FileReader, parse_targets};
