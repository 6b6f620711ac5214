//! Key-value persistence for configurations.
//!
//! The simulator front-end persists sessions in a flat string-keyed store. This
//! module provides:
//! 1. **Contract:** The `SettingsStore` trait (`get`/`set` of strings).
//! 2. **Key layout:** Prefix scoping shared by every loader and saver.
//! 3. **Stores:** `MemoryStore` for sessions and tests, `JsonFileStore` for files on disk.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::common::StoreError;

/// Separator placed between a non-empty prefix and a key name.
pub const KEY_SEPARATOR: char = '/';

/// String-keyed settings backend.
///
/// Any key-value store satisfies this contract; the configuration types only
/// ever read and write whole string values.
pub trait SettingsStore {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str);
}

/// Joins a scope prefix and a key name.
///
/// An empty prefix leaves the name unchanged.
///
/// ```
/// use rvsim_machine::config::store::scoped_key;
///
/// assert_eq!(scoped_key("", "Pipelined"), "Pipelined");
/// assert_eq!(scoped_key("session", "Pipelined"), "session/Pipelined");
/// ```
pub fn scoped_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}{KEY_SEPARATOR}{name}")
    }
}

/// Reads and parses `prefix/name`.
///
/// A missing key yields `None`. A present value that does not parse is logged
/// and also yields `None`, so the caller keeps its default.
pub(crate) fn load<T, S>(store: &S, prefix: &str, name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
    S: SettingsStore + ?Sized,
{
    let key = scoped_key(prefix, name);
    let raw = store.get(&key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key = %key, value = %raw, "ignoring stored setting: {e}");
            None
        }
    }
}

/// Reads `prefix/name` as a path, verbatim.
///
/// Paths may begin or end with whitespace, so the value is not trimmed.
pub(crate) fn load_path<S>(store: &S, prefix: &str, name: &str) -> Option<PathBuf>
where
    S: SettingsStore + ?Sized,
{
    store.get(&scoped_key(prefix, name)).map(PathBuf::from)
}

/// Writes `path` under `prefix/name`.
///
/// Store values are strings; a non-UTF-8 path is stored lossily and logged.
pub(crate) fn save_path<S>(store: &mut S, prefix: &str, name: &str, path: &Path)
where
    S: SettingsStore + ?Sized,
{
    let key = scoped_key(prefix, name);
    let value = path.to_string_lossy();
    if path.to_str().is_none() {
        tracing::warn!(key = %key, value = %value, "path is not valid UTF-8; storing lossily");
    }
    store.set(&key, &value);
}

/// Logs a stored value a setter rejected; the setter already left the field unchanged.
pub(crate) fn keep_valid<E: Display>(prefix: &str, name: &str, result: Result<(), E>) {
    if let Err(e) = result {
        tracing::warn!(key = %scoped_key(prefix, name), "ignoring stored setting: {e}");
    }
}

/// Writes `value` under `prefix/name` using its `Display` form.
pub(crate) fn save<T, S>(store: &mut S, prefix: &str, name: &str, value: T)
where
    T: Display,
    S: SettingsStore + ?Sized,
{
    store.set(&scoped_key(prefix, name), &value.to_string());
}

/// In-memory settings store backed by an ordered map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Iterates over stored entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        let _ = self.entries.insert(key.to_string(), value.to_string());
    }
}

/// Settings store persisted as a flat JSON object of strings.
///
/// Changes are kept in memory until [`JsonFileStore::save`] is called.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: MemoryStore,
}

impl JsonFileStore {
    /// Opens the store at `path`.
    ///
    /// A missing file yields an empty store; it is created on the first save.
    ///
    /// # Errors
    ///
    /// `StoreError::Io` if the file exists but cannot be read, and
    /// `StoreError::Json` if it is not a JSON object of string values.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => {
                let map: BTreeMap<String, String> =
                    serde_json::from_str(&text).map_err(|source| StoreError::Json {
                        path: path.clone(),
                        source,
                    })?;
                MemoryStore { entries: map }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => MemoryStore::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "opened settings file");
        Ok(Self { path, entries })
    }

    /// Writes the current contents to the backing file.
    ///
    /// # Errors
    ///
    /// `StoreError::Io` if the file cannot be written.
    pub fn save(&self) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(&self.entries.entries).map_err(|source| {
            StoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, text).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// In-memory view of the stored entries.
    pub const fn entries(&self) -> &MemoryStore {
        &self.entries
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.set(key, value);
    }
}
