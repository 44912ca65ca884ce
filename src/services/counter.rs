//! Mindful-minutes counter persisted as a one-line decimal file

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// File name of the counter inside the data directory
pub const COUNTER_FILE_NAME: &str = "total_minutes";

/// Reads and writes the cumulative mindful-minutes total
#[derive(Debug, Clone)]
pub struct CounterStore {
    path: PathBuf,
}

impl CounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Counter stored as [`COUNTER_FILE_NAME`] inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(COUNTER_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current total, or 0 when the file is missing or unreadable
    pub fn read(&self) -> u64 {
        match fs::read_to_string(&self.path) {
            Ok(contents) => contents.trim().parse().unwrap_or_else(|e| {
                warn!("Ignoring unparseable counter in {}: {}", self.path.display(), e);
                0
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => {
                warn!("Failed to read counter {}: {}", self.path.display(), e);
                0
            }
        }
    }

    /// Add `minutes` to the total and return the new value.
    ///
    /// The new total goes to a temporary file that is renamed over the old
    /// one, so a failed write is logged and leaves the stored total intact.
    pub fn increment(&self, minutes: u64) -> Option<u64> {
        let total = self.read().saturating_add(minutes);
        match self.write(total) {
            Ok(()) => {
                debug!("Counter {} now at {}", self.path.display(), total);
                Some(total)
            }
            Err(e) => {
                warn!("Failed to write counter {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn write(&self, total: u64) -> io::Result<()> {
        self.replace_with(|file| writeln!(file, "{}", total))
    }

    fn replace_with<F>(&self, fill: F) -> io::Result<()>
    where
        F: FnOnce(&mut NamedTempFile) -> io::Result<()>,
    {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        fill(&mut file)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = CounterStore::in_dir(dir.path());
        assert_eq!(store.read(), 0);
    }

    #[test]
    fn garbage_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = CounterStore::in_dir(dir.path());
        fs::write(store.path(), "twelve").unwrap();
        assert_eq!(store.read(), 0);
        fs::write(store.path(), "-4").unwrap();
        assert_eq!(store.read(), 0);
    }

    #[test]
    fn increment_accumulates_and_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = CounterStore::in_dir(&dir.path().join("nested").join("gongy"));

        assert_eq!(store.increment(10), Some(10));
        assert_eq!(store.increment(30), Some(40));
        assert_eq!(store.read(), 40);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "40\n");
    }

    #[test]
    fn reads_value_written_by_hand() {
        let dir = tempfile::tempdir().unwrap();
        let store = CounterStore::in_dir(dir.path());
        fs::write(store.path(), "125").unwrap();
        assert_eq!(store.increment(5), Some(130));
    }

    #[test]
    fn interrupted_write_keeps_previous_total() {
        let dir = tempfile::tempdir().unwrap();
        let store = CounterStore::in_dir(dir.path());
        fs::write(store.path(), "40\n").unwrap();

        let result = store.replace_with(|file| {
            file.write_all(b"1")?;
            Err(io::Error::new(io::ErrorKind::Other, "file size limit exceeded"))
        });

        assert!(result.is_err());
        assert_eq!(store.read(), 40);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "40\n");
        // The abandoned temporary file is cleaned up.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_rename_keeps_previous_total() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("total_minutes");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "").unwrap();
        let store = CounterStore::new(&target);

        assert_eq!(store.increment(5), None);
        assert!(target.join("keep").exists());
    }

    #[test]
    fn unwritable_location_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let store = CounterStore::in_dir(&blocker);

        assert_eq!(store.increment(10), None);
        assert_eq!(store.read(), 0);
    }
}
