//! Display decorations attached to recorded samples.
//!
//! Every recording call takes a [`Decorations`] value. Each decoration kind
//! is a single optional field, so a kind can appear at most once and there is
//! no such thing as an unrecognised decoration.

use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default rounding applied to durations when rendering.
pub const DEFAULT_DURATION_PRECISION: Duration = Duration::from_micros(100);
/// Default number of decimals used when rendering values.
pub const DEFAULT_VALUE_DECIMALS: usize = 3;

/// Rendering style for an entry, row or cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Style {
    #[default]
    Plain,
    Bold,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

const STYLE_NAMES: [(Style, &str); 9] = [
    (Style::Plain, ""),
    (Style::Bold, "bold"),
    (Style::Red, "red"),
    (Style::Green, "green"),
    (Style::Yellow, "yellow"),
    (Style::Blue, "blue"),
    (Style::Magenta, "magenta"),
    (Style::Cyan, "cyan"),
    (Style::Gray, "gray"),
];

impl Style {
    /// Lowercase name of the style; empty for [`Style::Plain`].
    pub fn name(self) -> &'static str {
        STYLE_NAMES
            .iter()
            .find(|(s, _)| *s == self)
            .map(|(_, n)| *n)
            .unwrap_or("")
    }

    /// Look a style up by its lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        STYLE_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(s, _)| *s)
    }

    /// Apply this style to already laid-out text.
    pub fn paint(self, text: &str) -> ColoredString {
        match self {
            Style::Plain => text.normal(),
            Style::Bold => text.bold(),
            Style::Red => text.red(),
            Style::Green => text.green(),
            Style::Yellow => text.yellow(),
            Style::Blue => text.blue(),
            Style::Magenta => text.magenta(),
            Style::Cyan => text.cyan(),
            Style::Gray => text.bright_black(),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How precisely samples and statistics are rendered.
///
/// Durations are rounded to a multiple of `duration`; values are printed with
/// `decimals` digits after the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision {
    #[serde(with = "crate::entry::duration_serde")]
    pub duration: Duration,
    pub decimals: usize,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_PRECISION,
            decimals: DEFAULT_VALUE_DECIMALS,
        }
    }
}

impl Precision {
    /// Default precision with a custom duration rounding.
    pub fn duration(rounding: Duration) -> Self {
        Self {
            duration: rounding,
            ..Self::default()
        }
    }

    /// Default precision with a custom number of value decimals.
    pub fn decimals(decimals: usize) -> Self {
        Self {
            decimals,
            ..Self::default()
        }
    }

    pub fn format_value(&self, value: f64) -> String {
        format!("{:.*}", self.decimals, value)
    }

    /// Round `d` to this precision and render it with a unit suffix.
    ///
    /// Only as many decimals as the rounding can carry are shown, so a 100µs
    /// precision renders `1.2ms` rather than `1.200000ms`.
    pub fn format_duration(&self, d: Duration) -> String {
        let nanos = round_nanos(d.as_nanos(), self.duration.as_nanos());
        if nanos == 0 {
            return "0s".to_string();
        }
        let (unit_nanos, suffix) = if nanos >= 1_000_000_000 {
            (1_000_000_000u128, "s")
        } else if nanos >= 1_000_000 {
            (1_000_000, "ms")
        } else if nanos >= 1_000 {
            (1_000, "µs")
        } else {
            (1, "ns")
        };
        let decimals = decimals_for(unit_nanos, self.duration.as_nanos());
        format!("{:.*}{}", decimals, nanos as f64 / unit_nanos as f64, suffix)
    }
}

/// Round to the nearest multiple of `step`, halfway cases away from zero.
fn round_nanos(nanos: u128, step: u128) -> u128 {
    if step <= 1 {
        return nanos;
    }
    let rem = nanos % step;
    if rem * 2 < step {
        nanos - rem
    } else {
        nanos + (step - rem)
    }
}

fn decimals_for(unit_nanos: u128, step: u128) -> usize {
    let mut decimals = 0;
    let mut scale = unit_nanos;
    while scale > step.max(1) && decimals < 9 {
        scale /= 10;
        decimals += 1;
    }
    decimals
}

/// Optional modifiers attached to a recording.
///
/// ```
/// use cntryl_measure::{Decorations, Precision, Style};
///
/// let d = Decorations::new()
///     .annotation("cold cache")
///     .units("MB")
///     .precision(Precision::decimals(1))
///     .style(Style::Cyan);
/// assert_eq!(d.units.as_deref(), Some("MB"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decorations {
    pub annotation: Option<String>,
    pub units: Option<String>,
    pub precision: Option<Precision>,
    pub style: Option<Style>,
}

impl Decorations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text tag stored alongside the sample.
    pub fn annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Unit label shown next to the entry name.
    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn precision(mut self, precision: Precision) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = Some(style);
        self
    }

    pub(crate) fn annotation_or_empty(&self) -> String {
        self.annotation.clone().unwrap_or_default()
    }

    pub(crate) fn precision_or_default(&self) -> Precision {
        self.precision.unwrap_or_default()
    }

    pub(crate) fn style_or_default(&self) -> Style {
        self.style.unwrap_or_default()
    }
}
