//! Pausable stopwatch that records into an experiment.

use std::time::{Duration, Instant};

use crate::decoration::Decorations;
use crate::experiment::Experiment;

/// Accumulates elapsed wall-clock time, minus paused intervals, and records
/// it as a duration sample on demand.
///
/// Methods return `&mut Self` so calls chain:
///
/// ```rust
/// use cntryl_measure::{Decorations, Experiment};
///
/// let experiment = Experiment::new("pipeline");
/// let mut sw = experiment.new_stopwatch();
/// // ... load ...
/// sw.record("load", Decorations::new()).reset();
/// // ... transform ...
/// sw.pause();
/// // ... not timed ...
/// sw.resume();
/// sw.record("transform", Decorations::new());
///
/// assert_eq!(experiment.get_stats("load").n, 1);
/// ```
///
/// Calling `record` or `pause` on a paused stopwatch, or `resume` on a
/// running one, panics.
pub struct Stopwatch<'a> {
    experiment: &'a Experiment,
    start: Instant,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl<'a> Stopwatch<'a> {
    pub(crate) fn new(experiment: &'a Experiment) -> Self {
        Self {
            experiment,
            start: Instant::now(),
            paused_at: None,
            paused_total: Duration::ZERO,
        }
    }

    /// A fresh running stopwatch on the same experiment.
    pub fn new_stopwatch(&self) -> Stopwatch<'a> {
        Stopwatch::new(self.experiment)
    }

    pub fn experiment(&self) -> &'a Experiment {
        self.experiment
    }

    pub fn is_running(&self) -> bool {
        self.paused_at.is_none()
    }

    /// Time since start or the last reset, excluding paused intervals.
    pub fn elapsed(&self) -> Duration {
        let end = self.paused_at.unwrap_or_else(Instant::now);
        end.duration_since(self.start).saturating_sub(self.paused_total)
    }

    /// Record the elapsed time under `name`. The stopwatch keeps running.
    pub fn record(&mut self, name: &str, decorations: Decorations) -> &mut Self {
        if !self.is_running() {
            panic!(
                "stopwatch is not running - call resume or reset before calling record('{}')",
                name
            );
        }
        self.experiment.record_duration(name, self.elapsed(), decorations);
        self
    }

    /// Restart from zero, running, with no paused time.
    pub fn reset(&mut self) -> &mut Self {
        self.start = Instant::now();
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
        self
    }

    pub fn pause(&mut self) -> &mut Self {
        if !self.is_running() {
            panic!("stopwatch is not running - call resume or reset before calling pause");
        }
        self.paused_at = Some(Instant::now());
        self
    }

    pub fn resume(&mut self) -> &mut Self {
        match self.paused_at.take() {
            Some(paused_at) => self.paused_total += paused_at.elapsed(),
            None => panic!("stopwatch is running - call pause before calling resume"),
        }
        self
    }
}
