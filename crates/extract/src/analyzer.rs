use ingest::{Chunker, ChunkerConfig, ChunkerError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::llm::{CompletionClient, CompletionTransport};
use crate::retry::{Sleeper, TokioSleeper};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub chunking: ChunkerConfig,
    /// Pause between consecutive requests on a shared client, independent of
    /// any back-off. Applies across documents, not only within one.
    pub pause_ms: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkerConfig::default(),
            pause_ms: 2000,
        }
    }
}

/// Runs one instruction over every chunk of a document, strictly in order.
pub struct ChunkedAnalyzer<T, S = TokioSleeper> {
    client: Arc<CompletionClient<T, S>>,
    chunker: Chunker,
    pause: Duration,
}

impl<T: CompletionTransport, S: Sleeper> ChunkedAnalyzer<T, S> {
    pub fn new(client: Arc<CompletionClient<T, S>>, config: AnalyzerConfig) -> Result<Self, ChunkerError> {
        Ok(Self {
            client,
            chunker: Chunker::new(config.chunking)?,
            pause: Duration::from_millis(config.pause_ms),
        })
    }

    /// One line per chunk, in chunk order. Failed chunks appear as the
    /// failure sentinel rather than being dropped.
    pub async fn analyze(&self, doc_id: &str, content: &str, instruction: &str) -> String {
        let mut results = Vec::new();

        for chunk in self.chunker.chunk_text(doc_id, content) {
            self.client.pace(self.pause).await;

            info!(
                doc = doc_id,
                chunk = chunk.index,
                chunk_id = %chunk.chunk_id,
                chars = chunk.char_len(),
                "Processing chunk"
            );
            results.push(self.client.complete(&chunk.text, instruction).await);
        }

        results.join("\n")
    }
}
