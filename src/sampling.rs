//! Repeated measurement bounded by an iteration count and/or a time budget.
//!
//! The driver runs iterations on the calling thread, or hands iteration
//! indices to a fixed pool of workers over a rendezvous channel. After each
//! iteration it checks the count bound and predicts whether another iteration
//! would overrun the deadline using the running average iteration latency.

use crossbeam_channel::bounded;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::decoration::Decorations;
use crate::experiment::{Experiment, Sample};

/// Bounds and parallelism for [`Experiment::sample`].
///
/// At least one of `n` and `duration` must be set. Zero counts as unset for
/// both.
///
/// ```
/// use cntryl_measure::SamplingConfig;
/// use std::time::Duration;
///
/// let cfg = SamplingConfig::new()
///     .n(100)
///     .duration(Duration::from_secs(2))
///     .num_parallel(4);
/// assert_eq!(cfg.n, Some(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingConfig {
    /// Maximum number of iterations.
    pub n: Option<usize>,
    /// Wall-clock budget for the whole run.
    pub duration: Option<Duration>,
    /// Worker count; 1 runs iterations on the calling thread.
    pub num_parallel: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            n: None,
            duration: None,
            num_parallel: 1,
        }
    }
}

impl SamplingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n(mut self, n: usize) -> Self {
        self.n = Some(n);
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn num_parallel(mut self, workers: usize) -> Self {
        self.num_parallel = workers;
        self
    }

    fn max_n(&self) -> Option<usize> {
        self.n.filter(|&n| n > 0)
    }

    fn budget(&self) -> Option<Duration> {
        self.duration.filter(|d| !d.is_zero())
    }
}

/// Run `callback` once per iteration index until `config`'s bounds are hit.
///
/// Returns the number of iterations run. Every dispatched iteration finishes
/// before this returns.
///
/// # Panics
///
/// Panics if neither `n` nor `duration` is set.
pub fn sample<F>(config: &SamplingConfig, callback: F) -> usize
where
    F: Fn(usize) + Sync,
{
    let max_n = config.max_n();
    let budget = config.budget();
    if max_n.is_none() && budget.is_none() {
        panic!("you must specify at least one of SamplingConfig.n and SamplingConfig.duration");
    }
    let deadline = budget.map(|d| Instant::now() + d);
    let max_n = max_n.unwrap_or(usize::MAX);
    let num_parallel = config.num_parallel.max(1);
    debug!(?max_n, ?budget, num_parallel, "sampling started");

    let iterations = if num_parallel == 1 {
        drive(max_n, deadline, 1, |idx| {
            callback(idx);
            true
        })
    } else {
        let (tx, rx) = bounded::<usize>(0);
        std::thread::scope(|s| {
            for _ in 0..num_parallel {
                let rx = rx.clone();
                let callback = &callback;
                s.spawn(move || {
                    for idx in rx {
                        callback(idx);
                    }
                });
            }
            drop(rx);
            let dispatched = drive(max_n, deadline, num_parallel, |idx| tx.send(idx).is_ok());
            drop(tx);
            dispatched
        })
    };

    debug!(iterations, "sampling finished");
    iterations
}

/// The stopping loop. `dispatch` runs or hands off one iteration and returns
/// false if it could not.
///
/// The first `warmup` iterations are left out of the latency average so that
/// filling the worker pipeline does not skew it.
fn drive(
    max_n: usize,
    deadline: Option<Instant>,
    warmup: usize,
    mut dispatch: impl FnMut(usize) -> bool,
) -> usize {
    let mut idx = 0;
    let mut avg_nanos: u128 = 0;
    loop {
        let start = Instant::now();
        if !dispatch(idx) {
            return idx;
        }
        let dt = start.elapsed().as_nanos();
        if idx >= warmup {
            let seen = (idx - warmup) as u128;
            avg_nanos = (avg_nanos * seen + dt) / (seen + 1);
        }
        idx += 1;
        if idx >= max_n {
            return idx;
        }
        if let Some(deadline) = deadline {
            let avg = Duration::from_nanos(u64::try_from(avg_nanos).unwrap_or(u64::MAX));
            if Instant::now() + avg > deadline {
                trace!(idx, ?avg, "stopping before deadline");
                return idx;
            }
        }
    }
}

impl Experiment {
    /// Drive `callback` per `config`. See [`sample`].
    pub fn sample<F>(&self, callback: F, config: &SamplingConfig) -> usize
    where
        F: Fn(usize) + Sync,
    {
        sample(config, callback)
    }

    /// Time each iteration of `callback` and record it under `name`.
    pub fn sample_duration<F>(
        &self,
        name: &str,
        callback: F,
        config: &SamplingConfig,
        decorations: Decorations,
    ) where
        F: Fn(usize) + Sync,
    {
        let annotation = decorations.annotation_or_empty();
        self.sample(
            |idx| {
                let start = Instant::now();
                callback(idx);
                let elapsed = start.elapsed();
                self.record_sample(name, Sample::Duration(elapsed), annotation.clone(), &decorations);
            },
            config,
        );
    }

    /// Like [`sample_duration`](Self::sample_duration), with the annotation
    /// for each sample returned by the callback.
    pub fn sample_annotated_duration<F>(
        &self,
        name: &str,
        callback: F,
        config: &SamplingConfig,
        decorations: Decorations,
    ) where
        F: Fn(usize) -> String + Sync,
    {
        self.sample(
            |idx| {
                let start = Instant::now();
                let annotation = callback(idx);
                let elapsed = start.elapsed();
                self.record_sample(name, Sample::Duration(elapsed), annotation, &decorations);
            },
            config,
        );
    }

    /// Record the value returned by each iteration under `name`.
    pub fn sample_value<F>(
        &self,
        name: &str,
        callback: F,
        config: &SamplingConfig,
        decorations: Decorations,
    ) where
        F: Fn(usize) -> f64 + Sync,
    {
        let annotation = decorations.annotation_or_empty();
        self.sample(
            |idx| {
                let value = callback(idx);
                self.record_sample(name, Sample::Value(value), annotation.clone(), &decorations);
            },
            config,
        );
    }

    /// Like [`sample_value`](Self::sample_value), with a per-sample annotation.
    pub fn sample_annotated_value<F>(
        &self,
        name: &str,
        callback: F,
        config: &SamplingConfig,
        decorations: Decorations,
    ) where
        F: Fn(usize) -> (f64, String) + Sync,
    {
        self.sample(
            |idx| {
                let (value, annotation) = callback(idx);
                self.record_sample(name, Sample::Value(value), annotation, &decorations);
            },
            config,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    #[should_panic(expected = "at least one of SamplingConfig.n and SamplingConfig.duration")]
    fn should_panic_when_no_bound_set() {
        sample(&SamplingConfig::new(), |_| {});
    }

    #[test]
    fn should_run_exactly_n_iterations_serially() {
        let calls = Mutex::new(Vec::new());
        let ran = sample(&SamplingConfig::new().n(5), |idx| calls.lock().unwrap().push(idx));
        assert_eq!(ran, 5);
        assert_eq!(*calls.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn should_run_exactly_n_iterations_in_parallel() {
        let count = AtomicUsize::new(0);
        let seen = Mutex::new(Vec::new());
        let ran = sample(&SamplingConfig::new().n(50).num_parallel(4), |idx| {
            count.fetch_add(1, Ordering::SeqCst);
            seen.lock().unwrap().push(idx);
        });

        assert_eq!(ran, 50);
        assert_eq!(count.load(Ordering::SeqCst), 50);
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn should_stop_near_deadline() {
        let start = Instant::now();
        let ran = sample(
            &SamplingConfig::new().duration(Duration::from_millis(100)),
            |_| std::thread::sleep(Duration::from_millis(10)),
        );
        let elapsed = start.elapsed();

        assert!(ran >= 5, "ran only {} iterations", ran);
        assert!(ran <= 11, "ran {} iterations", ran);
        assert!(elapsed < Duration::from_millis(250));
    }

    #[test]
    fn should_record_every_dispatched_iteration_when_parallel_run_hits_deadline() {
        let e = Experiment::new("exp");
        let budget = Duration::from_millis(50);
        let iteration = Duration::from_millis(5);

        let start = Instant::now();
        let ran = e.sample(
            |idx| {
                std::thread::sleep(iteration);
                e.record_value("idx", idx as f64, Decorations::new());
            },
            &SamplingConfig::new().duration(budget).num_parallel(4),
        );
        let elapsed = start.elapsed();

        let entry = e.get("idx");
        assert!(ran > 4, "ran only {} iterations", ran);
        assert_eq!(entry.values.len(), ran);
        let mut seen: Vec<usize> = entry.values.iter().map(|v| *v as usize).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..ran).collect::<Vec<_>>());
        assert!(
            elapsed < budget + iteration + Duration::from_millis(40),
            "took {:?}",
            elapsed
        );
    }

    #[test]
    fn should_leave_warmup_latencies_out_of_the_average() {
        // Each iteration takes 30ms against a 50ms budget. Counted from the
        // first iteration, the average predicts an overrun at once; skipped
        // during warmup, a second iteration starts.
        let slow = |_: usize| {
            std::thread::sleep(Duration::from_millis(30));
            true
        };

        let deadline = Instant::now() + Duration::from_millis(50);
        assert_eq!(drive(usize::MAX, Some(deadline), 0, slow), 1);

        let deadline = Instant::now() + Duration::from_millis(50);
        assert_eq!(drive(usize::MAX, Some(deadline), 3, slow), 2);
    }

    #[test]
    fn should_stop_driving_when_dispatch_fails() {
        let mut dispatched = Vec::new();
        let ran = drive(10, None, 1, |idx| {
            dispatched.push(idx);
            idx < 3
        });
        assert_eq!(ran, 3);
        assert_eq!(dispatched, vec![0, 1, 2, 3]);
    }

    #[test]
    fn should_stop_on_count_before_deadline() {
        let ran = sample(
            &SamplingConfig::new().n(3).duration(Duration::from_secs(60)),
            |_| {},
        );
        assert_eq!(ran, 3);
    }

    #[test]
    fn should_treat_zero_n_as_unset() {
        let ran = sample(
            &SamplingConfig::new().n(0).duration(Duration::from_millis(20)),
            |_| std::thread::sleep(Duration::from_millis(1)),
        );
        assert!(ran > 1);
    }

    #[test]
    fn should_record_durations_in_call_order() {
        let e = Experiment::new("exp");
        let calls = AtomicUsize::new(0);
        e.sample_annotated_duration(
            "work",
            |idx| {
                calls.fetch_add(1, Ordering::SeqCst);
                format!("iteration {}", idx)
            },
            &SamplingConfig::new().n(5),
            Decorations::new(),
        );

        let entry = e.get("work");
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(entry.durations.len(), 5);
        let expected: Vec<String> = (0..5).map(|i| format!("iteration {}", i)).collect();
        assert_eq!(entry.annotations, expected);
    }

    #[test]
    fn should_reuse_decorations_across_samples() {
        let e = Experiment::new("exp");
        e.sample_value(
            "v",
            |idx| idx as f64,
            &SamplingConfig::new().n(4).num_parallel(2),
            Decorations::new().units("items").annotation("batch"),
        );

        let entry = e.get("v");
        assert_eq!(entry.units, "items");
        assert_eq!(entry.values.len(), 4);
        assert!(entry.annotations.iter().all(|a| a == "batch"));
    }

    #[test]
    fn should_record_annotated_values() {
        let e = Experiment::new("exp");
        e.sample_annotated_value(
            "v",
            |idx| (idx as f64 * 2.0, format!("#{}", idx)),
            &SamplingConfig::new().n(3),
            Decorations::new(),
        );
        let entry = e.get("v");
        assert_eq!(entry.values, vec![0.0, 2.0, 4.0]);
        assert_eq!(entry.annotations, vec!["#0", "#1", "#2"]);
    }

    #[test]
    fn should_sample_durations_under_shared_name() {
        let e = Experiment::new("exp");
        e.sample_duration(
            "noop",
            |_| {},
            &SamplingConfig::new().n(10).num_parallel(3),
            Decorations::new(),
        );
        assert_eq!(e.get_stats("noop").n, 10);
    }
}
