//! measure-cache: inspect and prune a directory of cached experiments.
//!
//! ```text
//! measure-cache list                      # name and version of every entry
//! measure-cache show "parser timings"     # render a cached experiment
//! measure-cache delete "parser timings"   # drop one entry
//! measure-cache clear                     # drop every entry
//! ```
//!
//! The directory defaults to `MEASURE_CACHE_DIR` (or `target/measure-cache`).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cntryl_measure::{ExperimentCache, MeasureConfig, Report};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "measure-cache",
    about = "Inspect and prune cached experiments",
    long_about = "
measure-cache manages the on-disk experiment cache used by test suites.

Example:
    measure-cache list
    measure-cache show 'parser timings' --min-version 2
    measure-cache delete 'parser timings'
    measure-cache clear
"
)]
struct Cli {
    /// Cache directory (defaults to MEASURE_CACHE_DIR or target/measure-cache)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List cached experiments
    List,

    /// Print a cached experiment
    Show {
        /// Experiment name
        name: String,

        /// Skip the entry if its version is lower than this
        #[arg(long, default_value_t = i64::MIN, allow_negative_numbers = true)]
        min_version: i64,
    },

    /// Delete one cached experiment
    Delete {
        /// Experiment name
        name: String,
    },

    /// Delete every cached experiment
    Clear,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = MeasureConfig::from_env();
    if let Some(dir) = cli.dir {
        config = config.cache_dir(dir);
    }
    if cli.no_color {
        config = config.styled(false);
    }

    let cache = ExperimentCache::from_config(&config)
        .with_context(|| format!("Failed to open cache at {}", config.cache_dir.display()))?;

    match cli.cmd {
        Commands::List => list(&cache),
        Commands::Show { name, min_version } => show(&cache, &config, &name, min_version),
        Commands::Delete { name } => cache
            .delete(&name)
            .with_context(|| format!("Failed to delete cached experiment '{}'", name)),
        Commands::Clear => cache.clear().context("Failed to clear cache"),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ============================================================================
// Commands
// ============================================================================

fn list(cache: &ExperimentCache) -> Result<()> {
    let headers = cache.list().context("Failed to read cache")?;
    if headers.is_empty() {
        eprintln!("No cached experiments in {}", cache.path().display());
        return Ok(());
    }

    let width = headers.iter().map(|h| h.name.chars().count()).max().unwrap_or(0);
    for h in &headers {
        println!("{:<width$}  v{}", h.name, h.version, width = width);
    }
    Ok(())
}

fn show(cache: &ExperimentCache, config: &MeasureConfig, name: &str, min_version: i64) -> Result<()> {
    let Some(experiment) = cache.load(name, min_version) else {
        bail!(
            "No usable cached experiment '{}' in {}",
            name,
            cache.path().display()
        );
    };
    println!("{}", experiment.render(config));
    for entry in experiment.log_entries() {
        println!("{}", entry.render(config));
    }
    Ok(())
}
