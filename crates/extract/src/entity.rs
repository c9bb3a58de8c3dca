use anyhow::Result;
use ingest::FileReader;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::analyzer::ChunkedAnalyzer;
use crate::llm::CompletionTransport;
use crate::prompt::EXTRACTION_PROMPT;
use crate::retry::{Sleeper, TokioSleeper};

/// Resolves a company name to its details file and extracts the key facts.
pub struct EntityProcessor<T, S = TokioSleeper> {
    analyzer: ChunkedAnalyzer<T, S>,
    details_dir: PathBuf,
    extension: String,
}

impl<T: CompletionTransport, S: Sleeper> EntityProcessor<T, S> {
    pub fn new(analyzer: ChunkedAnalyzer<T, S>, details_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            analyzer,
            details_dir: details_dir.into(),
            extension: extension.into(),
        }
    }

    /// `<details_dir>/<name>.<extension>`, using the name exactly as given.
    pub fn source_path(&self, name: &str) -> PathBuf {
        self.details_dir.join(format!("{}.{}", name, self.extension))
    }

    /// `Ok(None)` when the company has no details file.
    pub async fn process(&self, name: &str) -> Result<Option<String>> {
        let path = self.source_path(name);

        let Some(content) = FileReader::read_optional(&path).await? else {
            warn!(entity = name, path = ?path, "Company file not found");
            return Ok(None);
        };

        info!(entity = name, chars = content.chars().count(), "Extracting company details");
        let result = self.analyzer.analyze(name, &content, EXTRACTION_PROMPT).await;

        Ok(Some(result))
    }
}
