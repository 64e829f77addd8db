//! On-disk cache of experiments, keyed by name and version.
//!
//! Each experiment is stored in its own file named after the MD5 digest of the
//! experiment name. The file holds two JSON records: a
//! [`CachedExperimentHeader`] followed by the [`Experiment`] itself.
//!
//! Two names with colliding digests share a file; the later save wins.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::MeasureConfig;
use crate::error::{CacheError, Result};
use crate::experiment::Experiment;

/// Extension of every cache file.
pub const CACHE_EXT: &str = ".gmeasure-cache";

/// First record of a cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedExperimentHeader {
    pub name: String,
    pub version: i64,
}

/// A directory of cached experiments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentCache {
    path: PathBuf,
}

impl ExperimentCache {
    /// Open the cache at `dir`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().to_path_buf();
        match fs::metadata(&path) {
            Ok(meta) if !meta.is_dir() => return Err(CacheError::NotADirectory(path)),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                fs::create_dir_all(&path)?;
                tracing::debug!(path = %path.display(), "created experiment cache");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(Self { path })
    }

    /// Open the cache directory named by `config`.
    pub fn from_config(config: &MeasureConfig) -> Result<Self> {
        Self::open(&config.cache_dir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn hash_of(name: &str) -> String {
        format!("{:x}", md5::compute(name.as_bytes()))
    }

    fn file_for(&self, name: &str) -> PathBuf {
        self.path.join(format!("{}{}", Self::hash_of(name), CACHE_EXT))
    }

    fn is_cache_file(path: &Path) -> bool {
        path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(CACHE_EXT))
    }

    fn cache_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if Self::is_cache_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Write `experiment` under `name` at `version`, replacing any prior file.
    ///
    /// Fails without touching the cache if any value sample is NaN or infinite.
    pub fn save(&self, name: &str, version: i64, experiment: &Experiment) -> Result<()> {
        if let Some(entry) = experiment
            .log_entries()
            .into_iter()
            .find(|e| e.values.iter().any(|v| !v.is_finite()))
        {
            return Err(CacheError::NonFiniteSample {
                experiment: name.to_string(),
                entry: entry.name,
            });
        }

        let path = self.file_for(name);
        let mut w = BufWriter::new(fs::File::create(&path)?);

        let header = CachedExperimentHeader {
            name: name.to_string(),
            version,
        };
        let encode = |source: serde_json::Error| CacheError::Encode {
            name: name.to_string(),
            source,
        };
        serde_json::to_writer(&mut w, &header).map_err(encode)?;
        w.write_all(b"\n")?;
        serde_json::to_writer(&mut w, experiment).map_err(encode)?;
        w.write_all(b"\n")?;
        w.flush()?;

        tracing::debug!(name, version, path = %path.display(), "saved experiment");
        Ok(())
    }

    /// Load the experiment stored under `name` if its version is at least `version`.
    ///
    /// Missing, unreadable, malformed and stale files all yield `None`.
    pub fn load(&self, name: &str, version: i64) -> Option<Experiment> {
        let path = self.file_for(name);
        let contents = fs::read_to_string(&path).ok()?;
        let mut de = serde_json::Deserializer::from_str(&contents);

        let header = match CachedExperimentHeader::deserialize(&mut de) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed cache header");
                return None;
            }
        };
        if header.version < version {
            tracing::debug!(name, cached = header.version, requested = version, "cached experiment is stale");
            return None;
        }

        match Experiment::deserialize(&mut de) {
            Ok(experiment) => Some(experiment),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed cached experiment");
                None
            }
        }
    }

    fn read_header(path: &Path) -> Result<CachedExperimentHeader> {
        let reader = BufReader::new(fs::File::open(path)?);
        let mut de = serde_json::Deserializer::from_reader(reader);
        CachedExperimentHeader::deserialize(&mut de).map_err(|source| CacheError::MalformedHeader {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Headers of every cached experiment.
    pub fn list(&self) -> Result<Vec<CachedExperimentHeader>> {
        self.cache_files()?
            .iter()
            .map(|path| Self::read_header(path))
            .collect()
    }

    /// Remove every cache file, leaving other files in the directory alone.
    pub fn clear(&self) -> Result<()> {
        let files = self.cache_files()?;
        for path in &files {
            fs::remove_file(path)?;
        }
        tracing::debug!(removed = files.len(), path = %self.path.display(), "cleared experiment cache");
        Ok(())
    }

    /// Remove the cache file for `name`. Fails if there is none.
    pub fn delete(&self, name: &str) -> Result<()> {
        fs::remove_file(self.file_for(name))?;
        tracing::debug!(name, "deleted cached experiment");
        Ok(())
    }
}
