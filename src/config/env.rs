//! Environment snapshot store with optional `.env` seeding.
//!
//! Reifies the process environment as an explicit store object so that
//! configuration flows through a value callers own, instead of hidden
//! process-global state. File loading is merge-only: a `.env` entry never
//! overwrites a key that is already present.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use tracing::{debug, warn};

/// Snapshot of environment key-value pairs.
///
/// Normally seeded from the process environment with [`EnvStore::from_process`],
/// then topped up from a local `.env` file with [`EnvStore::load_env`].
#[derive(Debug, Clone, Default)]
pub struct EnvStore {
    vars: HashMap<String, String>, // Key-value pairs, merge-only from files
}

impl EnvStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded from the current process environment.
    pub fn from_process() -> Self {
        Self { vars: std::env::vars().collect() }
    }

    /// Merge key-value pairs from a `.env` file in the working directory
    /// (or the nearest ancestor directory containing one).
    ///
    /// Keys already present in the store are left untouched, so calling
    /// this repeatedly is idempotent. A missing file is the expected
    /// common case and is not an error.
    pub fn load_env(&mut self) {
        match dotenvy::dotenv_iter() {
            Ok(entries) => self.merge(entries),
            Err(e) if e.not_found() => {
                debug!("No .env file found, using existing environment only");
            }
            Err(e) => warn!("Failed to read .env file: {}", e),
        }
    }

    /// Merge key-value pairs from an explicit env file path.
    ///
    /// Same merge-only semantics as [`EnvStore::load_env`].
    pub fn load_env_from(&mut self, path: &Path) {
        match dotenvy::from_path_iter(path) {
            Ok(entries) => self.merge(entries),
            Err(e) if e.not_found() => {
                debug!("No env file at {}, using existing environment only", path.display());
            }
            Err(e) => warn!("Failed to read env file {}: {}", path.display(), e),
        }
    }

    /// Look up a key.
    ///
    /// # Returns
    /// The stored value, or `None` if the key is absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Look up a key, falling back to `default` when absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Insert a key-value pair directly.
    ///
    /// Unlike file loading, an explicit set overwrites any existing value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Merge parsed entries, keeping existing keys. Malformed lines are
    /// logged and skipped; only the absent-file case stays quiet.
    fn merge(&mut self, entries: impl Iterator<Item = Result<(String, String), dotenvy::Error>>) {
        let mut added = 0usize;
        for entry in entries {
            let (key, value) = match entry {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Skipping malformed env file line: {}", e);
                    continue;
                }
            };

            if let Entry::Vacant(slot) = self.vars.entry(key) {
                slot.insert(value);
                added += 1;
            }
        }
        debug!("Merged {} new entries from env file", added);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    use serial_test::serial;
    use tempfile::TempDir;

    fn write_env_file(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join(".env");
        fs::write(&path, contents).expect("write env file");
        path
    }

    #[test]
    fn test_get_returns_none_when_absent() {
        let store = EnvStore::new();
        assert_eq!(store.get("NOT_SET"), None);
        assert_eq!(store.get_or("NOT_SET", "fallback"), "fallback");
    }

    #[test]
    fn test_get_prefers_stored_value_over_default() {
        let mut store = EnvStore::new();
        store.set("OLLAMA_MODEL", "foo");
        assert_eq!(store.get("OLLAMA_MODEL"), Some("foo"));
        assert_eq!(store.get_or("OLLAMA_MODEL", "bar"), "foo");
    }

    #[test]
    fn test_load_env_from_merges_file_entries() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_env_file(&dir, "OLLAMA_MODEL=foo\nOLLAMA_URL=http://example:11434\n");

        let mut store = EnvStore::new();
        store.load_env_from(&path);

        assert_eq!(store.get("OLLAMA_MODEL"), Some("foo"));
        assert_eq!(store.get("OLLAMA_URL"), Some("http://example:11434"));
    }

    #[test]
    fn test_file_does_not_overwrite_existing_keys() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_env_file(&dir, "OLLAMA_MODEL=from-file\n");

        let mut store = EnvStore::new();
        store.set("OLLAMA_MODEL", "from-env");
        store.load_env_from(&path);

        // Environment wins; file merging never clobbers.
        assert_eq!(store.get("OLLAMA_MODEL"), Some("from-env"));
    }

    #[test]
    fn test_loading_twice_is_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_env_file(&dir, "A=1\nB=2\n");

        let mut store = EnvStore::new();
        store.load_env_from(&path);
        let once = store.clone();
        store.load_env_from(&path);

        assert_eq!(store.get("A"), once.get("A"));
        assert_eq!(store.get("B"), once.get("B"));
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let mut store = EnvStore::new();
        store.set("KEEP", "me");
        store.load_env_from(Path::new("/nonexistent/.env"));

        assert_eq!(store.get("KEEP"), Some("me"));
        assert_eq!(store.get("OLLAMA_MODEL"), None);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_env_file(&dir, "GOOD=yes\nthis line is not a pair\n");

        let mut store = EnvStore::new();
        store.load_env_from(&path);

        assert_eq!(store.get("GOOD"), Some("yes"));
    }

    #[test]
    #[serial]
    fn test_from_process_sees_process_environment() {
        // SAFETY: single-threaded within this #[serial] test.
        unsafe { std::env::set_var("OLLAMA_ENV_TEST_KEY", "present") };

        let store = EnvStore::from_process();
        assert_eq!(store.get("OLLAMA_ENV_TEST_KEY"), Some("present"));

        unsafe { std::env::remove_var("OLLAMA_ENV_TEST_KEY") };
    }
}
