pub mod analyzer;
pub mod entity;
pub mod llm;
pub mod prompt;
pub mod retry;

#[cfg(test)]
mod test_support;

pub use analyzer::{AnalyzerConfig, ChunkedAnalyzer};
pub use entity::EntityProcessor;
pub use llm::{
    CompletionClient, CompletionRequest, CompletionTransport, FAILURE_SENTINEL, HttpTransport,
    LlmConfig, Reply, TransportError,
};
pub use retry::{Backoff, RetryPolicy, RetryState, Sleeper, TokioSleeper};
