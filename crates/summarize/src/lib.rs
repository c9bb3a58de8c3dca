pub mod summarizer;

pub use summarizer::{ReportSummarizer, SummaryOutcome};
