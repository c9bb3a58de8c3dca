use anyhow::Result;
use extract::prompt::SUMMARY_PROMPT;
use extract::{ChunkedAnalyzer, CompletionTransport, Sleeper, TokioSleeper};
use ingest::FileReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// The aggregate report was not there to summarize.
    MissingReport,
    Written { path: PathBuf, chars: usize },
}

/// Condenses the aggregate report into one short block per company.
pub struct ReportSummarizer<T, S = TokioSleeper> {
    analyzer: ChunkedAnalyzer<T, S>,
    report_path: PathBuf,
    summary_path: PathBuf,
}

impl<T: CompletionTransport, S: Sleeper> ReportSummarizer<T, S> {
    pub fn new(
        analyzer: ChunkedAnalyzer<T, S>,
        report_path: impl Into<PathBuf>,
        summary_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            analyzer,
            report_path: report_path.into(),
            summary_path: summary_path.into(),
        }
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }

    /// Summarize the report, overwriting any previous summary.
    pub async fn summarize(&self) -> Result<SummaryOutcome> {
        let Some(report) = FileReader::read_optional(&self.report_path).await? else {
            warn!(path = ?self.report_path, "Aggregate report not found, cannot summarize");
            return Ok(SummaryOutcome::MissingReport);
        };

        info!(path = ?self.report_path, chars = report.chars().count(), "Generating summary");
        let doc_id = self.report_path.to_string_lossy();
        let summary = self.analyzer.analyze(&doc_id, &report, SUMMARY_PROMPT).await;

        FileReader::write(&self.summary_path, &summary).await?;
        info!(path = ?self.summary_path, "Summary written");

        Ok(SummaryOutcome::Written {
            path: self.summary_path.clone(),
            chars: summary.chars().count(),
        })
    }
}
