//! Report storage backed by a capability-scoped directory.
//!
//! Reports are written to a staging file and renamed into place, so readers
//! never observe a partially written CSV.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{HistoryReportWriter, HistoryReportWriterError};

/// Directory holding generated CSV reports.
#[derive(Clone)]
pub struct CsvReportDirectory {
    root: PathBuf,
    dir: Arc<Dir>,
}

impl CsvReportDirectory {
    /// Open `root`, creating it when missing.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        Dir::create_ambient_dir_all(&root, ambient_authority())?;
        let dir = Dir::open_ambient_dir(&root, ambient_authority())?;
        Ok(Self {
            root,
            dir: Arc::new(dir),
        })
    }

    /// Directory this adapter writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn validate_name(name: &str) -> Result<(), HistoryReportWriterError> {
    let plain = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
    if plain {
        Ok(())
    } else {
        Err(HistoryReportWriterError::invalid_name(name))
    }
}

fn io_error(name: &str, error: &io::Error) -> HistoryReportWriterError {
    HistoryReportWriterError::io(format!("{name}: {error}"))
}

fn write_atomically(dir: &Dir, name: &str, contents: &[u8]) -> Result<(), HistoryReportWriterError> {
    let staging = format!(".{name}.{}.tmp", Uuid::new_v4().simple());
    dir.write(&staging, contents)
        .map_err(|error| io_error(&staging, &error))?;
    if let Err(error) = dir.rename(&staging, dir, name) {
        let _ = dir.remove_file(&staging);
        return Err(io_error(name, &error));
    }
    Ok(())
}

async fn run_blocking<T, F>(task: F) -> Result<T, HistoryReportWriterError>
where
    F: FnOnce() -> Result<T, HistoryReportWriterError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|error| HistoryReportWriterError::io(format!("report task failed: {error}")))?
}

#[async_trait]
impl HistoryReportWriter for CsvReportDirectory {
    async fn write(&self, name: &str, contents: Vec<u8>) -> Result<(), HistoryReportWriterError> {
        validate_name(name)?;
        let dir = Arc::clone(&self.dir);
        let owned = name.to_owned();
        run_blocking(move || write_atomically(&dir, &owned, &contents)).await?;
        debug!(root = %self.root.display(), file = name, "report stored");
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, HistoryReportWriterError> {
        validate_name(name)?;
        let dir = Arc::clone(&self.dir);
        let owned = name.to_owned();
        run_blocking(move || match dir.read(&owned) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(io_error(&owned, &error)),
        })
        .await
    }
}
