//! Summary statistics derived from a log entry's raw samples.
//!
//! Derivation never reorders the samples themselves: an index permutation is
//! sorted instead, so the entry keeps recording order and the annotation of
//! each extremal sample can be looked up by index.

use comfy_table::Cell;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::decoration::{Precision, Style};
use crate::table;

/// A single summary statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stat {
    Min,
    Max,
    Mean,
    Median,
    StdDev,
}

impl Stat {
    /// Column order used by every rendered table.
    pub const COLUMNS: [Stat; 5] = [Stat::Min, Stat::Median, Stat::Mean, Stat::StdDev, Stat::Max];

    pub fn name(self) -> &'static str {
        match self {
            Stat::Min => "Min",
            Stat::Max => "Max",
            Stat::Mean => "Mean",
            Stat::Median => "Median",
            Stat::StdDev => "StdDev",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which bundle of a [`Stats`] is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatsKind {
    /// Stats of a note or of an entry that does not exist.
    #[default]
    Unknown,
    Value,
    Duration,
}

impl fmt::Display for StatsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatsKind::Unknown => "Unknown",
            StatsKind::Value => "Value",
            StatsKind::Duration => "Duration",
        })
    }
}

/// Immutable summary of one log entry.
///
/// Always check [`Stats::n`] before reading a statistic: a zero-count
/// snapshot has empty bundles and every accessor returns zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub kind: StatsKind,
    pub experiment_name: String,
    pub name: String,
    pub units: String,
    pub style: Style,
    pub precision: Precision,
    /// Number of samples summarized.
    pub n: usize,
    pub value_bundle: BTreeMap<Stat, f64>,
    pub duration_bundle: BTreeMap<Stat, Duration>,
    /// Annotation carried by the min and max samples.
    pub annotation_bundle: BTreeMap<Stat, String>,
}

impl Stats {
    pub fn value_for(&self, stat: Stat) -> f64 {
        self.value_bundle.get(&stat).copied().unwrap_or(0.0)
    }

    pub fn duration_for(&self, stat: Stat) -> Duration {
        self.duration_bundle.get(&stat).copied().unwrap_or_default()
    }

    /// The statistic as a float; durations are expressed in nanoseconds.
    pub fn float_for(&self, stat: Stat) -> f64 {
        match self.kind {
            StatsKind::Value => self.value_for(stat),
            StatsKind::Duration => self.duration_for(stat).as_nanos() as f64,
            StatsKind::Unknown => 0.0,
        }
    }

    pub fn annotation_for(&self, stat: Stat) -> &str {
        self.annotation_bundle
            .get(&stat)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// The statistic rendered with this snapshot's precision.
    pub fn string_for(&self, stat: Stat) -> String {
        match self.kind {
            StatsKind::Value => self.precision.format_value(self.value_for(stat)),
            StatsKind::Duration => self.precision.format_duration(self.duration_for(stat)),
            StatsKind::Unknown => String::new(),
        }
    }

    /// `<mean> ±stddev`
    pub fn mean_std_dev_characterization(&self) -> String {
        format!(
            "<{}> ±{}",
            self.string_for(Stat::Mean),
            self.string_for(Stat::StdDev)
        )
    }

    /// `Name [units]`, the label used in every table.
    pub(crate) fn label(&self) -> String {
        label(&self.name, &self.units)
    }

    /// `N` followed by one cell per [`Stat::COLUMNS`], annotations on a
    /// second line.
    pub(crate) fn cells(&self, style: Style, styled: bool) -> Vec<Cell> {
        let mut out = vec![table::cell(self.n, style, styled)];
        for stat in Stat::COLUMNS {
            let mut content = self.string_for(stat);
            let annotation = self.annotation_for(stat);
            if !annotation.is_empty() {
                content.push('\n');
                content.push_str(annotation);
            }
            out.push(table::cell(content, style, styled));
        }
        out
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} < [{}] | <{}> ±{} < {}",
            self.string_for(Stat::Min),
            self.string_for(Stat::Median),
            self.string_for(Stat::Mean),
            self.string_for(Stat::StdDev),
            self.string_for(Stat::Max)
        )
    }
}

pub(crate) fn label(name: &str, units: &str) -> String {
    if units.is_empty() {
        name.to_string()
    } else {
        format!("{} [{}]", name, units)
    }
}

/// Indices of `samples` in ascending order; ties keep recording order.
fn stable_order<T>(samples: &[T], cmp: impl Fn(&T, &T) -> Ordering) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..samples.len()).collect();
    indices.sort_by(|&a, &b| cmp(&samples[a], &samples[b]));
    indices
}

fn extremal_annotations(annotations: &[String], order: &[usize]) -> BTreeMap<Stat, String> {
    let annotation = |idx: usize| annotations.get(idx).cloned().unwrap_or_default();
    BTreeMap::from([
        (Stat::Min, annotation(order[0])),
        (Stat::Max, annotation(order[order.len() - 1])),
    ])
}

/// Fill the value bundle of `out` from `values`.
pub(crate) fn derive_value_stats(out: &mut Stats, values: &[f64], annotations: &[String]) {
    out.kind = StatsKind::Value;
    out.n = values.len();
    if values.is_empty() {
        return;
    }
    let n = values.len();
    let order = stable_order(values, |a, b| a.total_cmp(b));

    let mean = values.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (values[order[n / 2 - 1]] + values[order[n / 2]]) / 2.0
    } else {
        values[order[n / 2]]
    };
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;

    out.value_bundle = BTreeMap::from([
        (Stat::Min, values[order[0]]),
        (Stat::Max, values[order[n - 1]]),
        (Stat::Mean, mean),
        (Stat::Median, median),
        (Stat::StdDev, variance.sqrt()),
    ]);
    out.annotation_bundle = extremal_annotations(annotations, &order);
}

/// Fill the duration bundle of `out` from `durations`.
///
/// Mean and standard deviation truncate to whole nanoseconds.
pub(crate) fn derive_duration_stats(out: &mut Stats, durations: &[Duration], annotations: &[String]) {
    out.kind = StatsKind::Duration;
    out.n = durations.len();
    if durations.is_empty() {
        return;
    }
    let n = durations.len();
    let order = stable_order(durations, Ord::cmp);

    let total: u128 = durations.iter().map(Duration::as_nanos).sum();
    let mean = nanos(total / n as u128);
    let median = if n % 2 == 0 {
        nanos((durations[order[n / 2 - 1]].as_nanos() + durations[order[n / 2]].as_nanos()) / 2)
    } else {
        durations[order[n / 2]]
    };
    let mean_f = mean.as_nanos() as f64;
    let variance = durations
        .iter()
        .map(|d| {
            let diff = d.as_nanos() as f64 - mean_f;
            diff * diff
        })
        .sum::<f64>()
        / n as f64;

    out.duration_bundle = BTreeMap::from([
        (Stat::Min, durations[order[0]]),
        (Stat::Max, durations[order[n - 1]]),
        (Stat::Mean, mean),
        (Stat::Median, median),
        (Stat::StdDev, Duration::from_nanos(variance.sqrt() as u64)),
    ]);
    out.annotation_bundle = extremal_annotations(annotations, &order);
}

fn nanos(n: u128) -> Duration {
    Duration::from_nanos(u64::try_from(n).unwrap_or(u64::MAX))
}
