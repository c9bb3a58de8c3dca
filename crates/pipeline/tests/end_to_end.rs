use async_trait::async_trait;
use extract::{
    CompletionClient, CompletionRequest, CompletionTransport, FAILURE_SENTINEL, Reply, RetryPolicy,
    Sleeper, TransportError,
};
use pipeline::{BatchOutcome, PipelineConfig, run};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use summarize::SummaryOutcome;

/// Deterministic remote service: digests the first line of each payload.
/// Payloads mentioning `BROKEN` get an HTTP 500.
#[derive(Default)]
struct DigestTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionTransport for DigestTransport {
    async fn send(&self, request: &CompletionRequest) -> Result<Reply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let payload = request.prompt.rsplit("\n\n").next().unwrap_or_default();
        if payload.contains("BROKEN") {
            return Err(TransportError::Status(500));
        }
        let first_line = payload.lines().next().unwrap_or_default().trim();
        Ok(Reply::Text(format!("Digest of {}.", first_line)))
    }
}

struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

/// Records sends and sleeps on one shared timeline.
#[derive(Default)]
struct Timeline(Mutex<Vec<&'static str>>);

impl Timeline {
    fn push(&self, event: &'static str) {
        self.0.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

struct TimelineTransport(Arc<Timeline>);

#[async_trait]
impl CompletionTransport for TimelineTransport {
    async fn send(&self, _request: &CompletionRequest) -> Result<Reply, TransportError> {
        self.0.push("send");
        Ok(Reply::Text("Noted.".into()))
    }
}

struct TimelineSleeper(Arc<Timeline>);

#[async_trait]
impl Sleeper for TimelineSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.0.push("sleep");
    }
}

fn setup(root: &Path, targets: Option<&str>, companies: &[(&str, &str)]) -> PipelineConfig {
    if let Some(targets) = targets {
        fs::write(root.join("Targets.txt"), targets).unwrap();
    }
    let details = root.join("CompanyDetails");
    fs::create_dir_all(&details).unwrap();
    for (name, content) in companies {
        fs::write(details.join(format!("{}.txt", name)), content).unwrap();
    }

    let mut config = PipelineConfig::default();
    config.paths.root = root.to_path_buf();
    config.retry = RetryPolicy::new(3, 10);
    config.extraction.pause_ms = 0;
    config.summary.pause_ms = 0;
    config
}

fn client(transport: Arc<DigestTransport>) -> Arc<CompletionClient<Arc<DigestTransport>, NoSleep>> {
    Arc::new(CompletionClient::with_sleeper(
        transport,
        NoSleep,
        &PipelineConfig::default().llm,
        RetryPolicy::new(3, 10),
    ))
}

fn read(root: &Path, name: &str) -> String {
    fs::read_to_string(root.join(name)).unwrap()
}

#[tokio::test]
async fn missing_company_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(
        dir.path(),
        Some("Acme, Beta"),
        &[("Beta", "Beta Corp makes bolts.\nRevenue rose 10%.")],
    );

    let report = run(&config, client(Arc::default())).await.unwrap();

    match report.batch {
        BatchOutcome::Written { entities, skipped, .. } => {
            assert_eq!(entities, 1);
            assert_eq!(skipped, vec!["Acme".to_string()]);
        }
        other => panic!("unexpected batch outcome: {:?}", other),
    }
    assert_eq!(read(dir.path(), "Output.txt"), "Digest of Beta Corp makes bolts..");
    assert!(matches!(report.summary, SummaryOutcome::Written { .. }));
    assert_eq!(
        read(dir.path(), "OutputSummary.txt"),
        "Digest of Digest of Beta Corp makes bolts..."
    );
}

#[tokio::test]
async fn results_keep_target_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(
        dir.path(),
        Some("Gamma,Alpha , Beta\n"),
        &[("Alpha", "Alpha text"), ("Beta", "Beta text"), ("Gamma", "Gamma text")],
    );

    run(&config, client(Arc::default())).await.unwrap();

    assert_eq!(
        read(dir.path(), "Output.txt"),
        "Digest of Gamma text.\n\nDigest of Alpha text.\n\nDigest of Beta text."
    );
}

#[tokio::test]
async fn failed_company_appears_as_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(
        dir.path(),
        Some("Alpha,Broken"),
        &[("Alpha", "Alpha text"), ("Broken", "BROKEN upstream")],
    );

    run(&config, client(Arc::default())).await.unwrap();

    assert_eq!(
        read(dir.path(), "Output.txt"),
        format!("Digest of Alpha text.\n\n{}", FAILURE_SENTINEL)
    );
}

#[tokio::test]
async fn missing_target_list_produces_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), None, &[("Alpha", "Alpha text")]);
    let transport = Arc::new(DigestTransport::default());

    let report = run(&config, client(transport.clone())).await.unwrap();

    assert_eq!(report.batch, BatchOutcome::MissingTargets);
    assert_eq!(report.summary, SummaryOutcome::MissingReport);
    assert!(!dir.path().join("Output.txt").exists());
    assert!(!dir.path().join("OutputSummary.txt").exists());
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn no_results_skips_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), Some("Acme, Zeta"), &[]);

    let report = run(&config, client(Arc::default())).await.unwrap();

    assert_eq!(
        report.batch,
        BatchOutcome::NothingProduced {
            skipped: vec!["Acme".to_string(), "Zeta".to_string()]
        }
    );
    assert!(!dir.path().join("Output.txt").exists());
    assert_eq!(report.summary, SummaryOutcome::MissingReport);
}

#[tokio::test]
async fn rerun_overwrites_artifacts_with_equal_content() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(
        dir.path(),
        Some("Alpha,Beta"),
        &[("Alpha", "Alpha text"), ("Beta", "Beta text")],
    );

    run(&config, client(Arc::default())).await.unwrap();
    let first = (read(dir.path(), "Output.txt"), read(dir.path(), "OutputSummary.txt"));

    run(&config, client(Arc::default())).await.unwrap();
    let second = (read(dir.path(), "Output.txt"), read(dir.path(), "OutputSummary.txt"));

    assert_eq!(first, second);
}

#[tokio::test]
async fn requests_are_spaced_across_companies_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = setup(dir.path(), Some("A,B"), &[("A", "Alpha text"), ("B", "Beta text")]);
    config.extraction.pause_ms = 50;
    config.summary.pause_ms = 50;

    let timeline = Arc::new(Timeline::default());
    let client = Arc::new(CompletionClient::with_sleeper(
        TimelineTransport(timeline.clone()),
        TimelineSleeper(timeline.clone()),
        &config.llm,
        config.retry,
    ));

    run(&config, client).await.unwrap();

    assert_eq!(
        timeline.events(),
        vec!["send", "sleep", "send", "sleep", "send"]
    );
}

#[tokio::test]
async fn batch_failure_still_summarizes_existing_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), None, &[("Alpha", "Alpha text")]);
    fs::write(dir.path().join("Targets.txt"), [0xff, 0xfe, b'A']).unwrap();
    fs::write(dir.path().join("Output.txt"), "Earlier report.").unwrap();

    let report = run(&config, client(Arc::default())).await.unwrap();

    assert!(
        matches!(&report.batch, BatchOutcome::Failed { error } if error.contains("Targets.txt")),
        "unexpected batch outcome: {:?}",
        report.batch
    );
    assert_eq!(read(dir.path(), "Output.txt"), "Earlier report.");
    assert!(matches!(report.summary, SummaryOutcome::Written { .. }));
    assert_eq!(read(dir.path(), "OutputSummary.txt"), "Digest of Earlier report..");
}
