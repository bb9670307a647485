use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::config::Config;
use crate::model::project::Project;
use crate::parse::{DecodeError, decode, render_with};

/// Error type for reading a set and writing its summary
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not decode {path}: {source}")]
    DecodeError {
        path: PathBuf,
        source: DecodeError,
    },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
}

impl SummaryError {
    /// The file the error is about
    pub fn path(&self) -> &Path {
        match self {
            SummaryError::ReadError { path, .. }
            | SummaryError::DecodeError { path, .. }
            | SummaryError::WriteError { path, .. } => path,
        }
    }
}

/// Outcome of summarizing a batch of sets
#[derive(Debug, Default)]
pub struct SummaryReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<SummaryError>,
}

impl SummaryReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.failed.len()
    }
}

/// Where the summary of `set` goes: the set's own path with `suffix` appended
/// (`song.als` → `song.als.txt`).
pub fn summary_path(set: &Path, suffix: &str) -> PathBuf {
    let mut name = set.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// True for `.als` files outside Live's `Backup/` folders
pub fn is_live_set(path: &Path) -> bool {
    let is_als = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("als"));
    let in_backup = path
        .parent()
        .and_then(|p| p.file_name())
        .is_some_and(|n| n == "Backup");
    is_als && !in_backup
}

/// Why `suffix` can't name a summary file, or `None` when it can. The summary
/// must land beside the set without replacing it or passing for another set.
pub fn suffix_problem(suffix: &str) -> Option<&'static str> {
    if suffix.is_empty() {
        return Some("summary would overwrite the set");
    }
    if suffix.contains(['/', '\\']) {
        return Some("must not contain a path separator");
    }
    if is_live_set(&summary_path(Path::new("Song.als"), suffix)) {
        return Some("summary would be read as a Live set");
    }
    None
}

/// The Live sets directly inside `dir`, sorted by path
pub fn find_als_files(dir: &Path) -> Result<Vec<PathBuf>, SummaryError> {
    let entries = fs::read_dir(dir).map_err(|e| SummaryError::ReadError {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut sets = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SummaryError::ReadError {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_file() && is_live_set(&path) {
            sets.push(path);
        }
    }
    sets.sort();
    Ok(sets)
}

/// Read and decode a set, logging every extraction warning
pub fn load_set(path: &Path) -> Result<Project, SummaryError> {
    let bytes = fs::read(path).map_err(|e| SummaryError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let project = decode(&bytes).map_err(|e| SummaryError::DecodeError {
        path: path.to_path_buf(),
        source: e,
    })?;
    for warning in &project.warnings {
        tracing::warn!(file = %path.display(), "{}", warning);
    }
    Ok(project)
}

/// Decode a set and write its summary next to it. Returns the summary path.
pub fn summarize_file(path: &Path, config: &Config) -> Result<PathBuf, SummaryError> {
    let suffix = &config.watch.suffix;
    let out = summary_path(path, suffix);
    if let Some(reason) = suffix_problem(suffix) {
        return Err(SummaryError::WriteError {
            path: out,
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("suffix {:?}: {}", suffix, reason),
            ),
        });
    }
    let project = load_set(path)?;
    let text = render_with(&project, &config.render);
    atomic_write(&out, text.as_bytes()).map_err(|e| SummaryError::WriteError {
        path: out.clone(),
        source: e,
    })?;
    tracing::info!(summary = %out.display(), "generated summary");
    Ok(out)
}

/// Summarize each set in turn. A failing set is logged and reported, and
/// never stops the others.
pub fn summarize_all(paths: &[PathBuf], config: &Config) -> SummaryReport {
    let mut report = SummaryReport::default();
    for path in paths {
        match summarize_file(path, config) {
            Ok(out) => report.written.push(out),
            Err(e) => {
                tracing::error!("{}", e);
                report.failed.push(e);
            }
        }
    }
    report
}

/// Write via a temp file in the same directory and rename into place, so a
/// reader never sees a half-written summary.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
