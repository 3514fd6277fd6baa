use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};

use crate::utils::app_config_dir;

/// The filename under the app config dir
pub const PREFS_FILENAME: &str = "prefs.toml";

/// A single persisted preference value.
///
/// Untagged so the TOML file reads as plain `key = value` lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

/// Callback invoked with the key of every effective write or removal.
pub type PrefListener = Box<dyn Fn(&str) + Send + Sync>;

/// String-keyed preference store persisted as TOML in the app config dir.
///
/// Reads are total: an absent key, or a value stored under a different
/// shape, falls back to the caller-supplied default.
pub struct PrefStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, PrefValue>>,
    listeners: Mutex<Vec<PrefListener>>,
}

impl PrefStore {
    /// Open the store backed by `path`. A missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            toml::from_str(&text)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
            listeners: Mutex::new(Vec::new()),
        })
    }

    /// Open the store at its OS-standard location.
    pub fn open_default() -> anyhow::Result<Self> {
        Self::open(app_config_dir().join(PREFS_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().unwrap().contains_key(key)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.lock().unwrap().get(key) {
            Some(PrefValue::Bool(v)) => *v,
            _ => default,
        }
    }

    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.values.lock().unwrap().get(key) {
            Some(PrefValue::Int(v)) => *v,
            _ => default,
        }
    }

    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        match self.values.lock().unwrap().get(key) {
            Some(PrefValue::Float(v)) => *v,
            _ => default,
        }
    }

    pub fn set_bool(&self, key: &str, value: bool) {
        self.set(key, PrefValue::Bool(value));
    }

    pub fn set_int(&self, key: &str, value: i32) {
        self.set(key, PrefValue::Int(value));
    }

    pub fn set_float(&self, key: &str, value: f32) {
        self.set(key, PrefValue::Float(value));
    }

    fn set(&self, key: &str, value: PrefValue) {
        self.values.lock().unwrap().insert(key.to_string(), value);
        self.persist();
        self.notify(key);
    }

    /// Remove the entry for `key`, reverting reads to their defaults.
    /// Removing an absent key changes nothing and notifies nobody.
    pub fn remove(&self, key: &str) {
        let removed = self.values.lock().unwrap().remove(key).is_some();
        if removed {
            self.persist();
            self.notify(key);
        }
    }

    /// Register a change listener.
    pub fn subscribe(&self, listener: PrefListener) {
        self.listeners.lock().unwrap().push(listener);
    }

    /// Subscription variant that delivers changed keys over a channel,
    /// for callers that drain events from their own loop.
    pub fn watch(&self) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel();
        self.subscribe(Box::new(move |key| {
            let _ = tx.send(key.to_string());
        }));
        rx
    }

    fn notify(&self, key: &str) {
        let listeners = self.listeners.lock().unwrap();
        for listener in listeners.iter() {
            listener(key);
        }
    }

    // Writes are best-effort: a failed persist keeps the in-memory value
    // and is logged rather than surfaced to the caller.
    fn persist(&self) {
        if let Err(e) = self.write_to_disk() {
            tracing::warn!("failed to persist preferences to {}: {e}", self.path.display());
        }
    }

    fn write_to_disk(&self) -> anyhow::Result<()> {
        let text = {
            let values = self.values.lock().unwrap();
            toml::to_string(&*values)?
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Atomic-ish write: write to temp file then rename
        let tmp_path = self.path.with_extension("toml.tmp");
        let mut f = std::fs::File::create(&tmp_path)?;
        f.write_all(text.as_bytes())?;
        f.flush()?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
