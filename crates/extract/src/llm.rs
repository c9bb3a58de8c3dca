use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::retry::{AttemptOutcome, RetryPolicy, RetryState, Sleeper, TokioSleeper};

/// Returned in place of generated text when a completion cannot be obtained.
pub const FAILURE_SENTINEL: &str = "LLM service request failed";

/// Characters that end a sentence: Latin and CJK full stops.
const TERMINATORS: [char; 2] = ['.', '。'];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Full URL of the completion endpoint.
    pub url: String,
    #[serde(skip_serializing, default)]
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Skip TLS certificate validation. Only for self-signed internal deployments.
    pub accept_invalid_certs: bool,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4000/v1/completions".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo-instruct".to_string(),
            max_tokens: 600,
            temperature: 0.5,
            accept_invalid_certs: false,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    text: String,
}

/// A single attempt's successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    RateLimited,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("completion endpoint returned HTTP {0}")]
    Status(u16),
    #[error("failed to reach completion endpoint: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

/// One outbound request per call; no retrying at this layer.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send(&self, request: &CompletionRequest) -> Result<Reply, TransportError>;
}

#[async_trait]
impl<T: CompletionTransport + ?Sized> CompletionTransport for Arc<T> {
    async fn send(&self, request: &CompletionRequest) -> Result<Reply, TransportError> {
        (**self).send(request).await
    }
}

#[derive(Clone)]
pub struct HttpTransport {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &LlmConfig) -> Result<Self, TransportError> {
        if config.accept_invalid_certs {
            warn!(url = %config.url, "TLS certificate validation is disabled for the completion endpoint");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    fn build_http_request(&self, request: &CompletionRequest) -> Result<reqwest::Request, TransportError> {
        Ok(self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(request)
            .build()?)
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn send(&self, request: &CompletionRequest) -> Result<Reply, TransportError> {
        let response = self.client.execute(self.build_http_request(request)?).await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), body = %body, "Server response");

        classify(status, &body)
    }
}

/// Map one HTTP response onto the reply taxonomy: 429 is retryable, any other
/// non-2xx is terminal, and a 2xx must carry `choices[0].text`.
pub fn classify(status: StatusCode, body: &str) -> Result<Reply, TransportError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Ok(Reply::RateLimited);
    }
    if !status.is_success() {
        return Err(TransportError::Status(status.as_u16()));
    }

    let parsed: CompletionResponse =
        serde_json::from_str(body).map_err(|e| TransportError::Malformed(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| Reply::Text(choice.text))
        .ok_or_else(|| TransportError::Malformed("response has no choices".to_string()))
}

/// Obtains one completion, recovering from 429s and truncated output.
///
/// Never fails: anything unrecoverable comes back as [`FAILURE_SENTINEL`].
pub struct CompletionClient<T, S = TokioSleeper> {
    transport: T,
    sleeper: S,
    model: String,
    max_tokens: u32,
    temperature: f32,
    retry: RetryPolicy,
    issued: AtomicBool,
}

impl<T: CompletionTransport> CompletionClient<T, TokioSleeper> {
    pub fn new(transport: T, config: &LlmConfig, retry: RetryPolicy) -> Self {
        Self::with_sleeper(transport, TokioSleeper, config, retry)
    }
}

impl<T: CompletionTransport, S: Sleeper> CompletionClient<T, S> {
    pub fn with_sleeper(transport: T, sleeper: S, config: &LlmConfig, retry: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            retry,
            issued: AtomicBool::new(false),
        }
    }

    /// Wait `pause` unless this is the first request issued through this
    /// client. Spacing holds across documents as well as between chunks.
    pub async fn pace(&self, pause: Duration) {
        if self.issued.swap(true, Ordering::SeqCst) {
            self.sleeper.sleep(pause).await;
        }
    }

    pub fn build_request(&self, content: &str, instruction: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            prompt: format!("{}\n\n{}", instruction, content),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    pub async fn complete(&self, content: &str, instruction: &str) -> String {
        let request = self.build_request(content, instruction);
        let mut backoff = self.retry.start();
        let mut last_text: Option<String> = None;

        loop {
            let attempt = backoff.retries() + 1;
            info!(attempt, max_retries = self.retry.max_retries, "Sending completion request");

            let outcome = match self.transport.send(&request).await {
                Ok(Reply::Text(text)) if is_complete(&text) => {
                    backoff.observe(AttemptOutcome::Complete);
                    if attempt > 1 {
                        info!(attempts = attempt, "Completion succeeded after retries");
                    }
                    return text.trim_end().to_string();
                }
                Ok(Reply::Text(text)) => {
                    last_text = Some(text);
                    AttemptOutcome::Incomplete
                }
                Ok(Reply::RateLimited) => AttemptOutcome::RateLimited,
                Err(e) => {
                    warn!(attempt, error = %e, "Completion request failed");
                    return FAILURE_SENTINEL.to_string();
                }
            };

            match backoff.observe(outcome) {
                RetryState::BackoffRateLimited(delay) => {
                    warn!(attempt, delay_ms = delay.as_millis() as u64, "Rate limited (429), backing off");
                    self.sleeper.sleep(delay).await;
                }
                RetryState::BackoffIncomplete(delay) => {
                    warn!(attempt, delay_ms = delay.as_millis() as u64, "Generation looks incomplete, retrying");
                    self.sleeper.sleep(delay).await;
                }
                RetryState::Exhausted | RetryState::Succeeded | RetryState::Attempting => break,
            }
        }

        warn!(max_retries = self.retry.max_retries, "Retries exhausted");
        match last_text {
            Some(text) if !text.is_empty() => {
                let kept = truncate_incomplete(&text);
                info!(dropped = %dropped_fragment(&text), "Discarded trailing fragment");
                kept
            }
            _ => FAILURE_SENTINEL.to_string(),
        }
    }
}

/// Whether generated text ends on a sentence terminator, ignoring trailing
/// whitespace. Accepted text is returned with that whitespace trimmed.
pub fn is_complete(text: &str) -> bool {
    text.trim_end().ends_with(TERMINATORS)
}

/// Keep everything up to and including the last sentence terminator. Text
/// with no terminator at all is returned trimmed.
///
/// This can over-truncate output whose source legitimately ends mid-sentence;
/// it is a heuristic, applied only once retries are exhausted.
pub fn truncate_incomplete(text: &str) -> String {
    match last_terminator_end(text) {
        Some(end) => text[..end].trim().to_string(),
        None => text.trim().to_string(),
    }
}

fn dropped_fragment(text: &str) -> &str {
    last_terminator_end(text).map_or("", |end| &text[end..])
}

/// Byte offset just past the last terminator in `text`.
fn last_terminator_end(text: &str) -> Option<usize> {
    text.char_indices()
        .rev()
        .find(|(_, c)| TERMINATORS.contains(c))
        .map(|(i, c)| i + c.len_utf8())
}
