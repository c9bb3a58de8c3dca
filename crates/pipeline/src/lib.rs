//! Company digest pipeline: extract key facts per company from local details
//! files, write the aggregate report, then condense it into a summary.

pub mod batch;
pub mod config;

pub use batch::{BatchOrchestrator, BatchOutcome};
pub use config::{ConfigError, PathsConfig, PipelineConfig};

use anyhow::Result;
use extract::{ChunkedAnalyzer, CompletionClient, CompletionTransport, EntityProcessor, Sleeper};
use std::sync::Arc;
use summarize::{ReportSummarizer, SummaryOutcome};
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub batch: BatchOutcome,
    pub summary: SummaryOutcome,
}

/// Run the batch to completion, then the summarizer, whatever the batch produced.
pub async fn run<T, S>(config: &PipelineConfig, client: Arc<CompletionClient<T, S>>) -> Result<RunReport>
where
    T: CompletionTransport,
    S: Sleeper,
{
    let paths = &config.paths;

    let extraction = ChunkedAnalyzer::new(client.clone(), config.extraction)?;
    let processor = EntityProcessor::new(extraction, paths.details_path(), paths.details_extension.clone());
    let batch = match BatchOrchestrator::new(processor, paths.targets_path(), paths.report_path())
        .run()
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            let error = format!("{:#}", e);
            error!(error = %error, "Batch failed, summarizing the existing report");
            BatchOutcome::Failed { error }
        }
    };

    let condensation = ChunkedAnalyzer::new(client, config.summary)?;
    let summary = ReportSummarizer::new(condensation, paths.report_path(), paths.summary_path())
        .summarize()
        .await?;

    Ok(RunReport { batch, summary })
}
