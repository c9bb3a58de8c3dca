use anyhow::Result;
use extract::{CompletionTransport, EntityProcessor, Sleeper, TokioSleeper};
use ingest::{FileReader, parse_targets};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// No target list; nothing was attempted.
    MissingTargets,
    /// Every company was skipped, so no report was written.
    NothingProduced { skipped: Vec<String> },
    Written {
        path: PathBuf,
        entities: usize,
        skipped: Vec<String>,
    },
    /// The batch stopped on an I/O error; any earlier report is left as it was.
    Failed { error: String },
}

/// Walks the target list in order and writes the aggregate report.
pub struct BatchOrchestrator<T, S = TokioSleeper> {
    processor: EntityProcessor<T, S>,
    targets_path: PathBuf,
    report_path: PathBuf,
}

impl<T: CompletionTransport, S: Sleeper> BatchOrchestrator<T, S> {
    pub fn new(
        processor: EntityProcessor<T, S>,
        targets_path: impl Into<PathBuf>,
        report_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            processor,
            targets_path: targets_path.into(),
            report_path: report_path.into(),
        }
    }

    pub async fn run(&self) -> Result<BatchOutcome> {
        let Some(content) = FileReader::read_optional(&self.targets_path).await? else {
            warn!(path = ?self.targets_path, "Target list not found");
            return Ok(BatchOutcome::MissingTargets);
        };

        let targets = parse_targets(&content);
        info!(count = targets.len(), "Loaded target companies");

        let mut results = Vec::new();
        let mut skipped = Vec::new();

        for name in targets {
            info!(entity = %name, "Processing company");
            match self.processor.process(&name).await {
                Ok(Some(result)) if !result.is_empty() => results.push(result),
                Ok(_) => skipped.push(name),
                Err(e) => {
                    error!(entity = %name, error = ?e, "Failed to process company, skipping");
                    skipped.push(name);
                }
            }
        }

        if results.is_empty() {
            warn!("No output generated");
            return Ok(BatchOutcome::NothingProduced { skipped });
        }

        FileReader::write(&self.report_path, &results.join("\n\n")).await?;
        info!(path = ?self.report_path, entities = results.len(), "Aggregate report written");

        Ok(BatchOutcome::Written {
            path: self.report_path.clone(),
            entities: results.len(),
            skipped,
        })
    }
}
