use crate::metrics_defs::{REQUEST_DURATION, REQUESTS};
use shared::{counter, histogram};
use std::future::Future;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// Sink for per-operation outcomes. Fire and forget.
pub trait Reporter: Send + Sync {
    fn record(&self, operation: &'static str, outcome: Outcome, duration: Duration);
}

/// Reports through the globally installed `metrics` recorder.
#[derive(Clone, Copy, Debug, Default)]
pub struct MetricsReporter;

impl Reporter for MetricsReporter {
    fn record(&self, operation: &'static str, outcome: Outcome, duration: Duration) {
        counter!(REQUESTS, "operation" => operation, "outcome" => outcome.as_str()).increment(1);
        histogram!(REQUEST_DURATION, "operation" => operation, "outcome" => outcome.as_str())
            .record(duration.as_secs_f64());
    }
}

/// Runs `fut` and records its outcome and elapsed time once it has finished.
/// The result is returned untouched.
pub async fn instrument<F, T, E>(reporter: &dyn Reporter, operation: &'static str, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let result = fut.await;

    let outcome = match result {
        Ok(_) => Outcome::Success,
        Err(_) => Outcome::Failure,
    };
    reporter.record(operation, outcome, start.elapsed());

    result
}
