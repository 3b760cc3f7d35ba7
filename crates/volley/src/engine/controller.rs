//! Bounded-concurrency dispatch loop.
//!
//! The controller is the single owner of the run bookkeeping and of the
//! [`ResultSet`]. Sender tasks only ever hand their outcome back through the
//! completion channel, so nothing here needs a lock.
//!
//! ## States
//! - **Dispatching**: launch senders while budget and unlaunched requests remain
//! - **Draining**: wait for the next completion and record it
//! - **Terminal**: every request has completed
//!
//! Invariants: `launched - completed <= limit`, `launched <= total`.

use crate::engine::progress::{Progress, PROGRESS_INTERVAL};
use crate::engine::sender::{RequestOutcome, RequestSender, SendError};
use crate::metrics;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, trace};
use volley_common::RunConfig;

/// Outcomes in completion order.
#[derive(Debug, Default)]
pub struct ResultSet {
    outcomes: Vec<RequestOutcome>,
}

impl ResultSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(capacity),
        }
    }

    fn record(&mut self, outcome: RequestOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestOutcome> {
        self.outcomes.iter()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    /// Latencies of the successful outcomes, in completion order.
    pub fn latencies(&self) -> Vec<Duration> {
        self.outcomes.iter().filter_map(RequestOutcome::latency).collect()
    }
}

impl FromIterator<RequestOutcome> for ResultSet {
    fn from_iter<I: IntoIterator<Item = RequestOutcome>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

/// Everything the aggregator needs once the run is over.
#[derive(Debug)]
pub struct RunSummary {
    pub results: ResultSet,
    pub elapsed: Duration,
    /// Highest `launched - completed` seen during the run.
    pub peak_outstanding: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Dispatching,
    Draining,
    Terminal,
}

#[derive(Debug)]
struct Budget {
    total: usize,
    limit: usize,
    launched: usize,
    completed: usize,
}

impl Budget {
    fn outstanding(&self) -> usize {
        self.launched - self.completed
    }

    fn can_launch(&self) -> bool {
        self.outstanding() < self.limit && self.launched < self.total
    }

    fn is_done(&self) -> bool {
        self.completed == self.total
    }
}

/// Reports an outcome exactly once. If the sender task dies before
/// delivering, the drop hands the controller an `Aborted` failure so the
/// run can still finish.
struct CompletionSlot {
    tx: Option<mpsc::Sender<RequestOutcome>>,
    started: Instant,
}

impl CompletionSlot {
    fn new(tx: mpsc::Sender<RequestOutcome>) -> Self {
        metrics::IN_FLIGHT.inc();
        Self {
            tx: Some(tx),
            started: Instant::now(),
        }
    }

    fn deliver(mut self, outcome: RequestOutcome) {
        if let Some(tx) = self.tx.take() {
            // Capacity equals the request count, so this never sees a full channel.
            let _ = tx.try_send(outcome);
        }
    }
}

impl Drop for CompletionSlot {
    fn drop(&mut self) {
        metrics::IN_FLIGHT.dec();
        if let Some(tx) = self.tx.take() {
            let _ = tx.try_send(RequestOutcome::Failure {
                elapsed: self.started.elapsed(),
                error: SendError::Aborted,
            });
        }
    }
}

pub struct Controller<S> {
    sender: Arc<S>,
    config: RunConfig,
}

impl<S: RequestSender> Controller<S> {
    pub fn new(sender: Arc<S>, config: RunConfig) -> Self {
        Self { sender, config }
    }

    fn launch(&self, tx: mpsc::Sender<RequestOutcome>) {
        let sender = Arc::clone(&self.sender);
        let slot = CompletionSlot::new(tx);
        metrics::REQUESTS_SENT.inc();
        tokio::spawn(async move {
            let outcome = sender.send().await;
            slot.deliver(outcome);
        });
    }

    /// Runs every configured request to completion. Never cancels, never
    /// retries; a failed request is recorded like any other.
    pub async fn run<P: Progress>(self, progress: &mut P) -> RunSummary {
        let total = self.config.requests() as usize;
        let mut budget = Budget {
            total,
            limit: self.config.effective_concurrency() as usize,
            launched: 0,
            completed: 0,
        };
        let (tx, mut rx) = mpsc::channel(total);
        let mut results = ResultSet::with_capacity(total);
        let mut peak_outstanding = 0;

        let started = Instant::now();
        let mut phase = Phase::Dispatching;

        while phase != Phase::Terminal {
            phase = match phase {
                Phase::Dispatching if budget.can_launch() => {
                    self.launch(tx.clone());
                    budget.launched += 1;
                    peak_outstanding = peak_outstanding.max(budget.outstanding());
                    trace!(
                        launched = budget.launched,
                        outstanding = budget.outstanding(),
                        "Launched request"
                    );
                    Phase::Dispatching
                }
                Phase::Dispatching | Phase::Draining if budget.is_done() => Phase::Terminal,
                Phase::Dispatching => Phase::Draining,
                Phase::Draining => {
                    let Some(outcome) = rx.recv().await else {
                        // The controller holds a sender, so the channel cannot close.
                        error!(
                            completed = budget.completed,
                            total, "Completion channel closed early"
                        );
                        break;
                    };
                    metrics::record_outcome(&outcome);
                    results.record(outcome);
                    budget.completed += 1;
                    trace!(
                        completed = budget.completed,
                        outstanding = budget.outstanding(),
                        "Recorded completion"
                    );

                    if budget.completed % PROGRESS_INTERVAL == 0 {
                        progress.update(budget.completed, total);
                    }

                    if budget.can_launch() {
                        Phase::Dispatching
                    } else {
                        Phase::Draining
                    }
                }
                Phase::Terminal => Phase::Terminal,
            };
        }

        let elapsed = started.elapsed();
        progress.finish();

        RunSummary {
            results,
            elapsed,
            peak_outstanding,
        }
    }
}
