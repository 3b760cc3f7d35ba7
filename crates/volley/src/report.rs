//! Aggregate statistics over a finished run.
//!
//! All millisecond values are `nanoseconds / 1_000_000` as floating point.
//! With zero successful requests the average and median are `None` and are
//! printed as `n/a`.

use crate::engine::controller::ResultSet;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Configured request count, not the observed one.
    pub total_requests: u32,
    pub total_failures: usize,
    pub time_taken_ms: f64,
    pub average_request_ms: Option<f64>,
    /// Element at `successes / 2` of the sorted latencies. For an even count
    /// this is the upper of the two middle values.
    pub median_request_ms: Option<f64>,
    /// Run time divided by the configured request count.
    pub average_interresponse_ms: f64,
}

pub fn ms(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

impl Report {
    pub fn from_results(results: &ResultSet, total_requests: u32, elapsed: Duration) -> Self {
        let mut latencies = results.latencies();
        latencies.sort_unstable();

        let average_request_ms = if latencies.is_empty() {
            None
        } else {
            let sum: u128 = latencies.iter().map(Duration::as_nanos).sum();
            Some(sum as f64 / latencies.len() as f64 / 1_000_000.0)
        };
        let median_request_ms = latencies.get(latencies.len() / 2).copied().map(ms);

        Self {
            total_requests,
            total_failures: results.failures(),
            time_taken_ms: ms(elapsed),
            average_request_ms,
            median_request_ms,
            average_interresponse_ms: ms(elapsed) / f64::from(total_requests.max(1)),
        }
    }

    pub fn successes(&self) -> usize {
        (self.total_requests as usize).saturating_sub(self.total_failures)
    }
}

struct Millis(Option<f64>);

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.3} ms", v),
            None => write!(f, "n/a"),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total requests performed:       {}", self.total_requests)?;
        writeln!(f, "Total failures:                 {}", self.total_failures)?;
        writeln!(f, "Time taken for tests:           {}", Millis(Some(self.time_taken_ms)))?;
        writeln!(f, "Average request takes:          {}", Millis(self.average_request_ms))?;
        writeln!(f, "Median request time:            {}", Millis(self.median_request_ms))?;
        writeln!(
            f,
            "Average time between responses: {}",
            Millis(Some(self.average_interresponse_ms))
        )
    }
}
