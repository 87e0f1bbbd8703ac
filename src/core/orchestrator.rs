// src/core/orchestrator.rs

//! Bounded fan-out/fan-in of independent probes against one target.
//!
//! The orchestrator owns a window of at most `max_concurrency` probe tasks.
//! Every task is wrapped in a timeout gate and a panic guard, so whatever the
//! probe does, its parameter comes back as exactly one [`ProbeRecord`]. The
//! orchestrator loop is the only place outcomes are collected; probes never
//! share a result buffer.

use crate::core::models::{ProbeFailure, ProbeOutcome};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One probe parameter together with the outcome it produced.
#[derive(Debug, Clone)]
pub struct ProbeRecord<P, T> {
    /// Position of the parameter in the probe set.
    pub index: usize,
    pub parameter: P,
    pub outcome: ProbeOutcome<T>,
    pub elapsed: Duration,
}

/// The finalized outcomes of one batch, in arrival order.
///
/// Only the orchestrator can build one; once returned it is read-only.
#[derive(Debug, Clone)]
pub struct BatchResult<P, T> {
    records: Vec<ProbeRecord<P, T>>,
    started_at: DateTime<Utc>,
    elapsed: Duration,
    cancelled: bool,
}

impl<P, T> BatchResult<P, T> {
    pub fn records(&self) -> &[ProbeRecord<P, T>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// True when the batch was cut short by its cancellation token.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn success_count(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failure_count(&self, reason: ProbeFailure) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome.failure() == Some(reason))
            .count()
    }

    pub fn into_records(self) -> Vec<ProbeRecord<P, T>> {
        self.records
    }
}

/// Accumulates records while a batch is in flight.
struct BatchCollector<P, T> {
    records: Vec<ProbeRecord<P, T>>,
    seen: Vec<bool>,
    started_at: DateTime<Utc>,
    clock: Instant,
}

impl<P: Clone, T> BatchCollector<P, T> {
    fn new(total: usize) -> Self {
        Self {
            records: Vec::with_capacity(total),
            seen: vec![false; total],
            started_at: Utc::now(),
            clock: Instant::now(),
        }
    }

    fn record(&mut self, record: ProbeRecord<P, T>) {
        match self.seen.get_mut(record.index) {
            Some(seen) if !*seen => {
                *seen = true;
                self.records.push(record);
            }
            _ => warn!(index = record.index, "Discarding duplicate or out-of-range probe record."),
        }
    }

    /// Closes the batch. Any parameter that never reported gets a failure so the
    /// one-outcome-per-parameter guarantee holds even on abnormal termination.
    fn finish(mut self, probe_set: &[P], cancelled: bool) -> BatchResult<P, T> {
        let elapsed = self.clock.elapsed();
        let missing = if cancelled { ProbeFailure::Cancelled } else { ProbeFailure::Panicked };
        for (index, parameter) in probe_set.iter().enumerate() {
            if !self.seen[index] {
                self.records.push(ProbeRecord {
                    index,
                    parameter: parameter.clone(),
                    outcome: ProbeOutcome::Failure(missing),
                    elapsed,
                });
            }
        }
        BatchResult {
            records: self.records,
            started_at: self.started_at,
            elapsed,
            cancelled,
        }
    }
}

/// Runs probe sets with a per-probe timeout and a bounded in-flight window.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    label: &'static str,
    per_probe_timeout: Duration,
    max_concurrency: usize,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// `max_concurrency` below one is treated as one.
    pub fn new(label: &'static str, per_probe_timeout: Duration, max_concurrency: usize) -> Self {
        Self {
            label,
            per_probe_timeout,
            max_concurrency: max_concurrency.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Ties the batch to a cancellation token. Cancelling it aborts in-flight
    /// probes and returns the partial result.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn per_probe_timeout(&self) -> Duration {
        self.per_probe_timeout
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Executes `probe` once for every parameter of `probe_set`.
    ///
    /// Never fails: timeouts, probe errors, panics and cancellation all become
    /// `ProbeOutcome::Failure` records. Records arrive in completion order.
    /// Dropping the returned future aborts every probe still in flight.
    pub async fn run<P, T, F, Fut>(&self, probe_set: Vec<P>, probe: F) -> BatchResult<P, T>
    where
        P: Clone + Send + 'static,
        T: Send + 'static,
        F: Fn(P) -> Fut,
        Fut: Future<Output = Result<T, ProbeFailure>> + Send + 'static,
    {
        let total = probe_set.len();
        let mut collector = BatchCollector::new(total);
        let mut in_flight = JoinSet::new();
        let mut next = 0;

        debug!(
            batch = self.label,
            total,
            max_concurrency = self.max_concurrency,
            timeout_ms = self.per_probe_timeout.as_millis() as u64,
            "Starting batch."
        );

        while next < total && in_flight.len() < self.max_concurrency {
            self.launch(&mut in_flight, next, probe_set[next].clone(), &probe);
            next += 1;
        }

        let mut cancelled = false;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    cancelled = true;
                    in_flight.abort_all();
                    break;
                }
                joined = in_flight.join_next() => match joined {
                    None => break,
                    Some(joined) => {
                        match joined {
                            Ok(record) => {
                                debug!(
                                    batch = self.label,
                                    index = record.index,
                                    success = record.outcome.is_success(),
                                    elapsed_ms = record.elapsed.as_millis() as u64,
                                    "Probe finished."
                                );
                                collector.record(record);
                            }
                            Err(e) => warn!(batch = self.label, error = %e, "Probe task failed to join."),
                        }
                        if next < total {
                            self.launch(&mut in_flight, next, probe_set[next].clone(), &probe);
                            next += 1;
                        }
                    }
                },
            }
        }

        if cancelled {
            // Probes that completed before the abort landed still count.
            while let Some(joined) = in_flight.join_next().await {
                if let Ok(record) = joined {
                    collector.record(record);
                }
            }
        }

        let batch = collector.finish(&probe_set, cancelled);
        info!(
            batch = self.label,
            total,
            succeeded = batch.success_count(),
            timed_out = batch.failure_count(ProbeFailure::Timeout),
            cancelled,
            started_at = %batch.started_at(),
            elapsed_ms = batch.elapsed().as_millis() as u64,
            "Batch finished."
        );
        batch
    }

    /// Builds the probe future and spawns it behind the timeout and panic guards.
    /// A closure that panics while building its future still yields a record.
    fn launch<P, T, F, Fut>(
        &self,
        in_flight: &mut JoinSet<ProbeRecord<P, T>>,
        index: usize,
        parameter: P,
        probe: &F,
    ) where
        P: Clone + Send + 'static,
        T: Send + 'static,
        F: Fn(P) -> Fut,
        Fut: Future<Output = Result<T, ProbeFailure>> + Send + 'static,
    {
        let built = std::panic::catch_unwind(AssertUnwindSafe(|| probe(parameter.clone()))).ok();
        if built.is_none() {
            warn!(batch = self.label, index, "Probe panicked before it started.");
        }
        let timeout = self.per_probe_timeout;
        in_flight.spawn(async move {
            let started = Instant::now();
            let outcome = match built {
                Some(future) => {
                    let guarded = AssertUnwindSafe(future).catch_unwind();
                    match tokio::time::timeout(timeout, guarded).await {
                        Ok(Ok(result)) => ProbeOutcome::from(result),
                        Ok(Err(_)) => ProbeOutcome::Failure(ProbeFailure::Panicked),
                        Err(_) => ProbeOutcome::Failure(ProbeFailure::Timeout),
                    }
                }
                None => ProbeOutcome::Failure(ProbeFailure::Panicked),
            };
            ProbeRecord {
                index,
                parameter,
                outcome,
                elapsed: started.elapsed(),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn orchestrator(timeout_ms: u64, width: usize) -> Orchestrator {
        Orchestrator::new("test", Duration::from_millis(timeout_ms), width)
    }

    #[tokio::test]
    async fn every_parameter_yields_exactly_one_outcome() {
        let params: Vec<u32> = (0..40).collect();
        let batch = orchestrator(100, 8)
            .run(params, |n| async move {
                match n % 4 {
                    0 => Ok(n),
                    1 => Err(ProbeFailure::ConnectionRefused),
                    2 => {
                        std::future::pending::<()>().await;
                        Ok(n)
                    }
                    _ => Err(ProbeFailure::ResolutionError),
                }
            })
            .await;

        assert_eq!(batch.len(), 40);
        let indices: HashSet<usize> = batch.records().iter().map(|r| r.index).collect();
        assert_eq!(indices.len(), 40);
        for record in batch.records() {
            assert_eq!(record.index as u32, record.parameter);
        }
        assert_eq!(batch.success_count(), 10);
        assert_eq!(batch.failure_count(ProbeFailure::ConnectionRefused), 10);
        assert_eq!(batch.failure_count(ProbeFailure::Timeout), 10);
        assert_eq!(batch.failure_count(ProbeFailure::ResolutionError), 10);
        assert!(!batch.was_cancelled());
    }

    #[tokio::test]
    async fn hanging_probe_times_out_within_bound() {
        let started = Instant::now();
        let batch = orchestrator(50, 4)
            .run(vec!["hang"], |_| async {
                std::future::pending::<()>().await;
                Ok(())
            })
            .await;

        assert_eq!(batch.records()[0].outcome, ProbeOutcome::Failure(ProbeFailure::Timeout));
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn in_flight_probes_never_exceed_the_window() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let batch = orchestrator(1_000, 3)
            .run((0..20).collect::<Vec<u32>>(), |n| {
                let current = current.clone();
                let peak = peak.clone();
                async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok(n)
                }
            })
            .await;

        assert_eq!(batch.success_count(), 20);
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "observed {peak} probes in flight");
        assert!(peak >= 1);
    }

    #[tokio::test]
    async fn zero_concurrency_is_clamped_to_one() {
        let batch = orchestrator(100, 0)
            .run(vec![1u8, 2, 3], |n| async move { Ok(n) })
            .await;
        assert_eq!(batch.success_count(), 3);
    }

    #[tokio::test]
    async fn panicking_probe_is_isolated() {
        let batch = orchestrator(100, 4)
            .run(vec![1u8, 2, 3], |n| async move {
                if n == 2 {
                    panic!("probe blew up");
                }
                Ok(n)
            })
            .await;

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.success_count(), 2);
        assert_eq!(batch.failure_count(ProbeFailure::Panicked), 1);
    }

    #[tokio::test]
    async fn cancellation_returns_partial_batch() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let batch = orchestrator(10_000, 2)
            .with_cancellation(token)
            .run(vec![0u32, 1, 2, 3, 4], |n| async move {
                if n == 0 {
                    return Ok(n);
                }
                std::future::pending::<()>().await;
                Ok(n)
            })
            .await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(batch.was_cancelled());
        assert_eq!(batch.len(), 5);
        assert_eq!(batch.success_count(), 1);
        assert_eq!(batch.failure_count(ProbeFailure::Cancelled), 4);
    }

    #[tokio::test]
    async fn fast_probes_arrive_before_slow_ones() {
        let batch = orchestrator(1_000, 4)
            .run(vec![60u64, 0], |delay| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(delay)
            })
            .await;

        let order: Vec<u64> = batch.records().iter().map(|r| r.parameter).collect();
        assert_eq!(order, vec![0, 60]);
    }

    #[tokio::test]
    async fn empty_probe_set_finishes_immediately() {
        let batch = orchestrator(100, 4)
            .run(Vec::<u8>::new(), |n| async move { Ok(n) })
            .await;
        assert!(batch.is_empty());
        assert!(!batch.was_cancelled());
    }
    #[tokio::test]
    async fn panic_while_building_a_probe_is_isolated() {
        let batch = orchestrator(100, 2)
            .run(vec![1u8, 2, 3], |n| {
                if n == 2 {
                    panic!("could not build probe");
                }
                async move { Ok(n) }
            })
            .await;

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.success_count(), 2);
        let failed: Vec<u8> = batch
            .records()
            .iter()
            .filter(|r| r.outcome == ProbeOutcome::Failure(ProbeFailure::Panicked))
            .map(|r| r.parameter)
            .collect();
        assert_eq!(failed, vec![2]);
    }

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn dropping_the_batch_releases_every_in_flight_probe() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let orchestrator = orchestrator(60_000, 3);

        let run = orchestrator.run(vec![0u8, 1, 2], |_| {
            let counter = DropCounter(dropped.clone());
            async move {
                let _counter = counter;
                std::future::pending::<Result<(), ProbeFailure>>().await
            }
        });
        // The caller gives up before any probe can finish.
        assert!(tokio::time::timeout(Duration::from_millis(50), run).await.is_err());

        // Aborted tasks are torn down by the runtime on its next turn.
        let released = tokio::time::timeout(Duration::from_secs(1), async {
            while dropped.load(Ordering::SeqCst) < 3 {
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(released.is_ok(), "only {} probes released", dropped.load(Ordering::SeqCst));
    }
}
