use extract::{CompletionClient, HttpTransport};
use pipeline::{PipelineConfig, run};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = PipelineConfig::from_env()?;
    info!(
        url = %config.llm.url,
        model = %config.llm.model,
        root = ?config.paths.root,
        "Configuration loaded"
    );

    let transport = HttpTransport::new(&config.llm)?;
    let client = Arc::new(CompletionClient::new(transport, &config.llm, config.retry));

    let report = run(&config, client).await?;
    info!(batch = ?report.batch, summary = ?report.summary, "Pipeline finished");

    Ok(())
}
