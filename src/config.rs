//! Environment-driven defaults for caching, rendering and sampling.

use std::path::PathBuf;

use crate::sampling::SamplingConfig;

/// Default directory for cached experiments.
pub const DEFAULT_CACHE_DIR: &str = "target/measure-cache";

/// Shared settings for test suites using this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureConfig {
    /// Directory holding cached experiments.
    pub cache_dir: PathBuf,
    /// Render reports with color markup.
    pub styled: bool,
    /// Worker count used by [`MeasureConfig::sampling`]. Sampling configs
    /// built any other way do not see it.
    pub default_parallelism: usize,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            styled: true,
            default_parallelism: 1,
        }
    }
}

impl MeasureConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config from environment variables.
    ///
    /// Supported variables:
    /// - `MEASURE_CACHE_DIR`: cache directory (default: `target/measure-cache`)
    /// - `MEASURE_COLOR`: styled output (default: true)
    /// - `NO_COLOR`: disables styled output when set
    /// - `MEASURE_PARALLEL`: sampling workers (default: 1). Opt-in: only
    ///   sampling configs started from [`MeasureConfig::sampling`] use it,
    ///   while [`SamplingConfig::new`] always starts at one worker.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = lookup("MEASURE_CACHE_DIR") {
            cfg.cache_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("MEASURE_COLOR") {
            cfg.styled = v != "0" && !v.eq_ignore_ascii_case("false");
        }
        if lookup("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            cfg.styled = false;
        }
        if let Some(v) = lookup("MEASURE_PARALLEL") {
            if let Ok(n) = v.parse::<usize>() {
                cfg.default_parallelism = n.max(1);
            }
        }

        cfg
    }

    /// Set the cache directory.
    pub fn cache_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_dir = path.into();
        self
    }

    /// Set styled output.
    pub fn styled(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    /// Set the default sampling parallelism.
    pub fn default_parallelism(mut self, workers: usize) -> Self {
        self.default_parallelism = workers.max(1);
        self
    }

    /// A sampling config with no bounds and this config's parallelism.
    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig::new().num_parallel(self.default_parallelism)
    }
}
