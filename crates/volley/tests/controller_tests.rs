mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use support::{RecordingProgress, ScriptedSender};
use volley::{ConsoleProgress, Controller, Progress};
use volley_common::RunConfig;

fn varied_latency(call: usize) -> Duration {
    Duration::from_millis(1 + (call % 7) as u64)
}

#[tokio::test]
async fn records_exactly_one_outcome_per_request() {
    for (requests, concurrency) in [(1, 1), (7, 3), (20, 20), (5, 50), (64, 8)] {
        let sender = Arc::new(ScriptedSender::succeeding(varied_latency));
        let config = RunConfig::new(requests, concurrency).unwrap();
        let mut progress = RecordingProgress::default();

        let summary = Controller::new(Arc::clone(&sender), config)
            .run(&mut progress)
            .await;

        assert_eq!(summary.results.len(), requests as usize);
        assert_eq!(sender.calls.load(Ordering::SeqCst), requests as usize);
        assert_eq!(progress.finished, 1);
    }
}

#[tokio::test]
async fn never_exceeds_concurrency_limit() {
    let sender = Arc::new(ScriptedSender::succeeding(varied_latency));
    let config = RunConfig::new(120, 6).unwrap();
    let mut progress = RecordingProgress::default();

    let summary = Controller::new(Arc::clone(&sender), config)
        .run(&mut progress)
        .await;

    assert_eq!(summary.peak_outstanding, 6);
    assert!(sender.peak_live.load(Ordering::SeqCst) <= 6);
}

#[tokio::test]
async fn concurrency_above_request_count_is_capped() {
    let sender = Arc::new(ScriptedSender::succeeding(|_| Duration::from_millis(5)));
    let config = RunConfig::new(4, 100).unwrap();
    let mut progress = RecordingProgress::default();

    let summary = Controller::new(Arc::clone(&sender), config)
        .run(&mut progress)
        .await;

    assert_eq!(summary.peak_outstanding, 4);
    assert_eq!(summary.results.len(), 4);
}

#[tokio::test]
async fn failures_are_recorded_not_retried() {
    let sender = Arc::new(ScriptedSender::new(
        |_| Duration::from_millis(1),
        |call| call % 3 == 0,
    ));
    let config = RunConfig::new(30, 4).unwrap();
    let mut progress = RecordingProgress::default();

    let summary = Controller::new(Arc::clone(&sender), config)
        .run(&mut progress)
        .await;

    assert_eq!(sender.calls.load(Ordering::SeqCst), 30);
    assert_eq!(summary.results.failures(), 10);
    assert_eq!(summary.results.latencies().len(), 20);
}

#[tokio::test]
async fn results_arrive_in_completion_order() {
    // First launch is the slowest, so it must be recorded last.
    let sender = Arc::new(ScriptedSender::succeeding(|call| {
        Duration::from_millis(if call == 0 { 80 } else { 5 })
    }));
    let config = RunConfig::new(3, 3).unwrap();
    let mut progress = RecordingProgress::default();

    let summary = Controller::new(sender, config).run(&mut progress).await;

    let latencies = summary.results.latencies();
    assert_eq!(latencies.last(), Some(&Duration::from_millis(80)));
}

#[tokio::test]
async fn progress_fires_on_each_hundred_completions() {
    let sender = Arc::new(ScriptedSender::succeeding(|_| Duration::from_micros(200)));
    let config = RunConfig::new(250, 10).unwrap();
    let mut progress = RecordingProgress::default();

    Controller::new(sender, config).run(&mut progress).await;

    assert_eq!(progress.updates, vec![(100, 250), (200, 250)]);
    assert_eq!(progress.finished, 1);
}

#[tokio::test]
async fn short_run_emits_no_progress() {
    let sender = Arc::new(ScriptedSender::succeeding(|_| Duration::from_millis(1)));
    let config = RunConfig::new(99, 10).unwrap();
    let mut progress = RecordingProgress::default();

    Controller::new(sender, config).run(&mut progress).await;

    assert!(progress.updates.is_empty());
}

#[test]
fn console_progress_overwrites_and_clears_line() {
    let mut progress = ConsoleProgress::new(Vec::new());
    progress.update(100, 250);
    progress.update(200, 250);
    progress.finish();

    let out = String::from_utf8(progress.into_inner()).unwrap();
    let expected = format!(
        "\rCompleted 100 from 250 requests\rCompleted 200 from 250 requests\r{}",
        " ".repeat(34)
    );
    assert_eq!(out, expected);
}

#[test]
fn console_progress_prints_nothing_without_updates() {
    let mut progress = ConsoleProgress::new(Vec::new());
    progress.finish();
    assert!(progress.into_inner().is_empty());
}

struct PanickingSender;

impl volley::RequestSender for PanickingSender {
    async fn send(&self) -> volley::RequestOutcome {
        panic!("sender blew up");
    }
}

#[tokio::test]
async fn panicking_sender_counts_as_failure() {
    let config = RunConfig::new(3, 2).unwrap();
    let mut progress = RecordingProgress::default();

    let summary = Controller::new(Arc::new(PanickingSender), config)
        .run(&mut progress)
        .await;

    assert_eq!(summary.results.len(), 3);
    assert_eq!(summary.results.failures(), 3);
    assert!(summary
        .results
        .iter()
        .all(|o| matches!(o.error(), Some(volley::SendError::Aborted))));
}
