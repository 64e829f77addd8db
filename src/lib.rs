//! # cntryl-measure
//!
//! Record, summarize, compare and cache performance measurements from tests.
//!
//! An [`Experiment`] collects named series of durations or values, plus free
//! text notes. Samples can be recorded one at a time, timed with a
//! [`Stopwatch`], or driven by the sampler across several worker threads.
//! Summaries come out as [`Stats`], which can be ranked against each other,
//! compared with a Z-score, or rendered as tables.
//!
//! ## Quick Start
//!
//! ```rust
//! use cntryl_measure::{Decorations, Experiment, Report, SamplingConfig, Stat};
//!
//! let experiment = Experiment::new("parsing");
//!
//! experiment.sample_duration(
//!     "parse",
//!     |_idx| {
//!         let _ = "1234".parse::<u32>();
//!     },
//!     &SamplingConfig::new().n(20),
//!     Decorations::new(),
//! );
//! experiment.record_value("payload", 4.0, Decorations::new().units("KB"));
//!
//! let stats = experiment.get_stats("parse");
//! assert_eq!(stats.n, 20);
//! assert!(stats.duration_for(Stat::Min) <= stats.duration_for(Stat::Max));
//!
//! println!("{}", experiment.report(false));
//! ```
//!
//! ## Caching
//!
//! [`ExperimentCache`] stores experiments on disk keyed by name and version so
//! expensive measurements can be reused across runs. The `measure-cache`
//! binary lists and prunes a cache directory.

mod cache;
mod compare;
mod config;
mod decoration;
mod entry;
mod error;
mod experiment;
mod ranking;
mod report;
mod sampling;
mod stats;
mod stopwatch;
mod table;

pub use cache::{CachedExperimentHeader, ExperimentCache, CACHE_EXT};
pub use compare::{compute_z_score, is_comparable, DEFAULT_Z_CUTOFF};
pub use config::{MeasureConfig, DEFAULT_CACHE_DIR};
pub use decoration::{Decorations, Precision, Style};
pub use entry::{EntryKind, LogEntry};
pub use error::{CacheError, ComparisonError, Result};
pub use experiment::Experiment;
pub use ranking::{rank_stats, Ranking, RankingCriteria};
pub use report::Report;
pub use sampling::{sample, SamplingConfig};
pub use stats::{Stat, Stats, StatsKind};
pub use stopwatch::Stopwatch;
