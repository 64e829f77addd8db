//! Log entries: named buckets of raw samples.

use comfy_table::CellAlignment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::decoration::{Precision, Style};
use crate::report::Report;
use crate::stats::{self, Stats};
use crate::table;

/// What a [`LogEntry`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntryKind {
    /// Returned by lookups for names that were never recorded.
    #[default]
    Invalid,
    Note,
    Duration,
    Value,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryKind::Invalid => "INVALID LOG ENTRY TYPE",
            EntryKind::Note => "Note",
            EntryKind::Duration => "Duration",
            EntryKind::Value => "Value",
        })
    }
}

/// One named series of samples, or a free-text note.
///
/// `annotations` always has one element per sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub kind: EntryKind,
    pub experiment_name: String,
    /// Note text; empty for sample series.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    /// Series name; empty for notes.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub precision: Precision,
    #[serde(default, with = "duration_vec_serde")]
    pub durations: Vec<Duration>,
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default)]
    pub annotations: Vec<String>,
}

impl LogEntry {
    /// Number of samples recorded so far.
    pub fn len(&self) -> usize {
        match self.kind {
            EntryKind::Duration => self.durations.len(),
            EntryKind::Value => self.values.len(),
            EntryKind::Note | EntryKind::Invalid => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Derive summary statistics from the current samples.
    pub fn stats(&self) -> Stats {
        let mut out = Stats {
            experiment_name: self.experiment_name.clone(),
            name: self.name.clone(),
            units: self.units.clone(),
            style: self.style,
            precision: self.precision,
            ..Stats::default()
        };
        match self.kind {
            EntryKind::Value => stats::derive_value_stats(&mut out, &self.values, &self.annotations),
            EntryKind::Duration => {
                stats::derive_duration_stats(&mut out, &self.durations, &self.annotations)
            }
            EntryKind::Note | EntryKind::Invalid => return Stats::default(),
        }
        out
    }
}

impl Report for LogEntry {
    fn report(&self, styled: bool) -> String {
        let paint = |text: String| {
            if styled && self.style != Style::Plain {
                self.style.paint(&text).to_string()
            } else {
                text
            }
        };

        let (header_label, samples): (&str, Vec<String>) = match self.kind {
            EntryKind::Note => {
                return paint(format!("{} - Note\n{}\n", self.experiment_name, self.note));
            }
            EntryKind::Invalid => return String::new(),
            EntryKind::Value => (
                "Value",
                self.values
                    .iter()
                    .map(|v| self.precision.format_value(*v))
                    .collect(),
            ),
            EntryKind::Duration => (
                "Duration",
                self.durations
                    .iter()
                    .map(|d| self.precision.format_duration(*d))
                    .collect(),
            ),
        };

        let mut out = paint(format!(
            "{} - {}",
            self.experiment_name,
            stats::label(&self.name, &self.units)
        ));
        out.push('\n');
        out.push_str(&self.stats().to_string());
        out.push('\n');

        let mut t = table::new_table(styled);
        t.set_header(vec![
            table::aligned(header_label, self.style, styled, CellAlignment::Center),
            table::aligned("Annotation", self.style, styled, CellAlignment::Center),
        ]);
        for (sample, annotation) in samples.into_iter().zip(&self.annotations) {
            t.add_row(vec![
                table::aligned(sample, self.style, styled, CellAlignment::Right),
                table::cell(annotation, Style::Gray, styled),
            ]);
        }
        out.push_str(&table::render(&mut t));
        out
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report(false))
    }
}

pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        saturating_nanos(*d).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let nanos = u64::deserialize(d)?;
        Ok(Duration::from_nanos(nanos))
    }

    /// Whole nanoseconds, clamped to `u64::MAX` (about 584 years).
    pub(super) fn saturating_nanos(d: Duration) -> u64 {
        u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    use super::duration_serde::saturating_nanos;

    pub fn serialize<S: Serializer>(v: &[Duration], s: S) -> Result<S::Ok, S::Error> {
        v.iter()
            .map(|d| saturating_nanos(*d))
            .collect::<Vec<_>>()
            .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Duration>, D::Error> {
        let nanos: Vec<u64> = Vec::deserialize(d)?;
        Ok(nanos.into_iter().map(Duration::from_nanos).collect())
    }
}
