//! Persisted premium allowlist.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// File name of the allowlist inside the data directory.
pub const ACCESS_FILE_NAME: &str = "premium.json";

/// Errors surfaced by the strict loading path.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Failed to read access file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse access file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Ordered set of user ids granted premium access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessList {
    ids: Vec<i64>,
}

impl AccessList {
    /// Builds a list from raw ids, dropping repeated ids.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        let mut list = Self::default();
        for id in ids {
            list.insert(id);
        }
        list
    }

    /// Adds an id. Returns `false` if it was already present.
    pub fn insert(&mut self, id: i64) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Removes an id. Returns `false` if it was not present.
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&existing| existing != id);
        self.ids.len() != before
    }

    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// File-backed allowlist, read and written whole on every access.
///
/// Loading never fails: a missing, unreadable or corrupt file reads as an
/// empty list. Use [`AccessStore::load_strict`] when the difference matters.
#[derive(Debug, Clone)]
pub struct AccessStore {
    path: PathBuf,
}

impl AccessStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store located at `<data_dir>/premium.json`.
    #[must_use]
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(ACCESS_FILE_NAME))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the allowlist, falling back to an empty list on any error.
    #[must_use]
    pub fn load(&self) -> AccessList {
        match self.load_strict() {
            Ok(list) => list,
            Err(AccessError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Access file {} not found, using empty list", self.path.display());
                AccessList::default()
            }
            Err(e) => {
                warn!("Ignoring unusable access file {}: {}", self.path.display(), e);
                AccessList::default()
            }
        }
    }

    /// Loads the allowlist, reporting read and parse failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array of ids.
    pub fn load_strict(&self) -> Result<AccessList, AccessError> {
        self.load_raw().map(AccessList::from_ids)
    }

    /// Reads the ids exactly as stored, repeats included.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array of ids.
    pub fn load_raw(&self) -> Result<Vec<i64>, AccessError> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Replaces the persisted allowlist.
    ///
    /// Writes a sibling temporary file and renames it over the target.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file written.
    pub fn save(&self, list: &AccessList) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(list.ids())?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, AccessStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = AccessStore::in_dir(dir.path());
        (dir, store)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_dir, store) = temp_store();
        assert!(store.load().is_empty());
        assert!(matches!(store.load_strict(), Err(AccessError::IoError(_))));
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_empty());
        assert!(matches!(store.load_strict(), Err(AccessError::ParseError(_))));
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, store) = temp_store();
        let list = AccessList::from_ids([42, 7, 1001]);
        store.save(&list).unwrap();
        assert_eq!(store.load(), list);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_save_of_load_keeps_ids() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), "[3, 1, 2]").unwrap();

        store.save(&store.load()).unwrap();

        let raw: Vec<i64> =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw, vec![3, 1, 2]);
    }

    #[test]
    fn test_save_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccessStore::in_dir(dir.path().join("nested").join("data"));
        store.save(&AccessList::from_ids([5])).unwrap();
        assert!(store.load().contains(5));
    }

    #[test]
    fn test_duplicates_collapse() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), "[9, 9, 4, 9]").unwrap();
        assert_eq!(store.load().ids(), &[9, 4]);
        assert_eq!(store.load_raw().unwrap(), vec![9, 9, 4, 9]);
    }

    #[test]
    fn test_insert_and_remove() {
        let mut list = AccessList::default();
        assert!(list.insert(10));
        assert!(!list.insert(10));
        assert_eq!(list.len(), 1);
        assert!(list.remove(10));
        assert!(!list.remove(10));
        assert!(list.is_empty());
    }
}
