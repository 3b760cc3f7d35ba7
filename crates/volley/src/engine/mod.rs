pub mod controller;
pub mod progress;
pub mod sender;

use crate::report::Report;
use crate::target::Target;
use controller::Controller;
use progress::Progress;
use sender::HttpSender;
use std::sync::Arc;
use tracing::info;
use volley_common::RunConfig;

/// Sends every configured request to `target` and aggregates the results.
pub async fn run_load<P: Progress>(target: Target, config: RunConfig, progress: &mut P) -> Report {
    info!(
        target_addr = %target.socket_addr(),
        path = %target.path_and_query(),
        requests = config.requests(),
        concurrency = config.effective_concurrency(),
        "Load run started"
    );

    let sender = Arc::new(HttpSender::new(target));
    let summary = Controller::new(sender, config).run(progress).await;
    let report = Report::from_results(&summary.results, config.requests(), summary.elapsed);

    info!(
        elapsed_ms = report.time_taken_ms,
        failures = report.total_failures,
        peak_outstanding = summary.peak_outstanding,
        "Load run finished"
    );
    report
}
