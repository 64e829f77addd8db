//! The experiment record store and its recording API.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::decoration::{Decorations, Style};
use crate::entry::{EntryKind, LogEntry};
use crate::report::Report;
use crate::stats::{self, Stats};
use crate::stopwatch::Stopwatch;
use crate::table;

/// Units given to duration entries recorded without a `units` decoration.
const DEFAULT_DURATION_UNITS: &str = "duration";

/// A named, ordered collection of log entries.
///
/// Every recording method takes `&self`: entries live behind a single mutex,
/// so one experiment can be shared by reference across sampling workers or
/// threads. Appends are atomic but their relative order across threads is
/// completion order.
///
/// # Example
///
/// ```rust
/// use cntryl_measure::{Decorations, Experiment, Stat};
/// use std::time::Duration;
///
/// let experiment = Experiment::new("parsing");
/// experiment.record_value("size", 12.0, Decorations::new().units("KB"));
/// experiment.record_duration("parse", Duration::from_millis(3), Decorations::new());
///
/// let stats = experiment.get_stats("size");
/// assert_eq!(stats.n, 1);
/// assert_eq!(stats.value_for(Stat::Mean), 12.0);
/// ```
pub struct Experiment {
    name: String,
    entries: Mutex<Vec<LogEntry>>,
}

pub(crate) enum Sample {
    Duration(Duration),
    Value(f64),
}

impl Sample {
    fn kind(&self) -> EntryKind {
        match self {
            Sample::Duration(_) => EntryKind::Duration,
            Sample::Value(_) => EntryKind::Value,
        }
    }
}

impl Experiment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of every entry in recording order.
    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    // A panic while recording (kind mismatch) happens before any append,
    // so the guarded data is still consistent after poisoning.
    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a free-text note. Notes have no name and may repeat.
    pub fn record_note(&self, note: impl Into<String>, decorations: Decorations) {
        let entry = LogEntry {
            kind: EntryKind::Note,
            experiment_name: self.name.clone(),
            note: note.into(),
            style: decorations.style_or_default(),
            ..LogEntry::default()
        };
        self.lock().push(entry);
    }

    /// Append one duration sample to the entry `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already used for values.
    pub fn record_duration(&self, name: &str, duration: Duration, decorations: Decorations) {
        let annotation = decorations.annotation_or_empty();
        self.record_sample(name, Sample::Duration(duration), annotation, &decorations);
    }

    /// Append one value sample to the entry `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already used for durations.
    pub fn record_value(&self, name: &str, value: f64, decorations: Decorations) {
        let annotation = decorations.annotation_or_empty();
        self.record_sample(name, Sample::Value(value), annotation, &decorations);
    }

    /// Time one call of `callback`, record it under `name`, and return it.
    pub fn measure_duration<F>(&self, name: &str, callback: F, decorations: Decorations) -> Duration
    where
        F: FnOnce(),
    {
        let start = Instant::now();
        callback();
        let elapsed = start.elapsed();
        self.record_duration(name, elapsed, decorations);
        elapsed
    }

    /// Record the value returned by one call of `callback`, and return it.
    pub fn measure_value<F>(&self, name: &str, callback: F, decorations: Decorations) -> f64
    where
        F: FnOnce() -> f64,
    {
        let value = callback();
        self.record_value(name, value, decorations);
        value
    }

    pub(crate) fn record_sample(
        &self,
        name: &str,
        sample: Sample,
        annotation: String,
        decorations: &Decorations,
    ) {
        let kind = sample.kind();
        let mut entries = self.lock();

        let idx = match entries
            .iter()
            .position(|e| e.kind != EntryKind::Note && e.name == name)
        {
            Some(idx) => {
                let existing = entries[idx].kind;
                if existing != kind {
                    panic!(
                        "attempting to record {} with name '{}' in experiment '{}'. \
                         That name is already in use for recording {}s.",
                        kind.to_string().to_lowercase(),
                        name,
                        self.name,
                        existing.to_string().to_lowercase()
                    );
                }
                idx
            }
            None => {
                debug!(experiment = %self.name, entry = name, %kind, "creating log entry");
                let units = match (&decorations.units, kind) {
                    (Some(units), _) => units.clone(),
                    (None, EntryKind::Duration) => DEFAULT_DURATION_UNITS.to_string(),
                    (None, _) => String::new(),
                };
                entries.push(LogEntry {
                    kind,
                    experiment_name: self.name.clone(),
                    name: name.to_string(),
                    units,
                    style: decorations.style_or_default(),
                    precision: decorations.precision_or_default(),
                    ..LogEntry::default()
                });
                entries.len() - 1
            }
        };

        let entry = &mut entries[idx];
        match sample {
            Sample::Duration(d) => entry.durations.push(d),
            Sample::Value(v) => entry.values.push(v),
        }
        entry.annotations.push(annotation);
    }

    /// The entry recorded under `name`, or an empty entry if there is none.
    pub fn get(&self, name: &str) -> LogEntry {
        self.lock()
            .iter()
            .find(|e| e.kind != EntryKind::Note && e.name == name)
            .cloned()
            .unwrap_or_default()
    }

    /// Statistics for `name`, or zero-count stats if there is no such entry.
    pub fn get_stats(&self, name: &str) -> Stats {
        self.lock()
            .iter()
            .find(|e| e.kind != EntryKind::Note && e.name == name)
            .map(LogEntry::stats)
            .unwrap_or_default()
    }

    /// A running stopwatch that records into this experiment.
    pub fn new_stopwatch(&self) -> Stopwatch<'_> {
        Stopwatch::new(self)
    }
}

impl Report for Experiment {
    fn report(&self, styled: bool) -> String {
        let mut t = table::new_table(styled);
        t.set_header(
            ["Name", "N", "Min", "Median", "Mean", "StdDev", "Max"]
                .map(|h| table::cell(h, Style::Bold, styled)),
        );

        for entry in self.lock().iter() {
            match entry.kind {
                EntryKind::Note => {
                    t.add_row(vec![table::cell(&entry.note, entry.style, styled)]);
                }
                EntryKind::Value | EntryKind::Duration => {
                    let mut row = vec![table::cell(
                        stats::label(&entry.name, &entry.units),
                        entry.style,
                        styled,
                    )];
                    row.extend(entry.stats().cells(entry.style, styled));
                    t.add_row(row);
                }
                EntryKind::Invalid => {}
            }
        }

        let title = if styled {
            Style::Bold.paint(&self.name).to_string()
        } else {
            self.name.clone()
        };
        format!("{}\n{}", title, table::render(&mut t))
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report(false))
    }
}

impl fmt::Debug for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Experiment")
            .field("name", &self.name)
            .field("log_entries", &*self.lock())
            .finish()
    }
}

impl Clone for Experiment {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            entries: Mutex::new(self.log_entries()),
        }
    }
}

impl PartialEq for Experiment {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.log_entries() == other.log_entries()
    }
}

#[derive(Serialize)]
struct ExperimentRef<'a> {
    name: &'a str,
    log_entries: &'a [LogEntry],
}

#[derive(Deserialize)]
struct ExperimentOwned {
    name: String,
    #[serde(default)]
    log_entries: Vec<LogEntry>,
}

impl Serialize for Experiment {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let entries = self.lock();
        ExperimentRef {
            name: &self.name,
            log_entries: &entries,
        }
        .serialize(s)
    }
}

impl<'de> Deserialize<'de> for Experiment {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let owned = ExperimentOwned::deserialize(d)?;
        Ok(Self {
            name: owned.name,
            entries: Mutex::new(owned.log_entries),
        })
    }
}
