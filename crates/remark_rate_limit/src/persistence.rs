//! Best-effort persistence for tuned delays.
//!
//! Only `current_delay_ms` survives a restart. The record is a flat map from
//! model id to delay, kept under one namespaced key so it can share a
//! key-value file with other settings.

use remark_core::ModelId;
use remark_error::{StoreError, StoreErrorKind, StoreResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument};

/// Key the delay record is stored under.
pub const ADAPTIVE_DELAYS_KEY: &str = "remark.adaptive_delays.v1";

/// Persisted delays, keyed by model.
pub type DelayRecord = BTreeMap<ModelId, u64>;

/// Load/save capability injected into the rate governor.
///
/// Both operations are fallible; the governor logs failures and carries on
/// in memory, so implementations should not retry or panic.
pub trait DelayPersistence: Send + Sync {
    /// Read the record. A missing record is an empty map, not an error.
    fn load(&self) -> StoreResult<DelayRecord>;

    /// Replace the record.
    fn save(&self, record: &DelayRecord) -> StoreResult<()>;
}

fn decode_record(value: &Value) -> StoreResult<DelayRecord> {
    serde_json::from_value(value.clone())
        .map_err(|e| StoreError::new(StoreErrorKind::Corrupt(e.to_string())))
}

fn encode_record(record: &DelayRecord) -> StoreResult<Value> {
    serde_json::to_value(record).map_err(|e| StoreError::new(StoreErrorKind::Encode(e.to_string())))
}

/// JSON file acting as a small key-value store.
///
/// Other top-level keys in the file are preserved on save.
#[derive(Debug, Clone)]
pub struct FileDelayStore {
    path: PathBuf,
}

impl FileDelayStore {
    /// Store backed by the file at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> StoreResult<Option<Map<String, Value>>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::new(StoreErrorKind::Read(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                ))));
            }
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(_) => Err(StoreError::new(StoreErrorKind::Corrupt(format!(
                "{} is not a JSON object",
                self.path.display()
            )))),
            Err(e) => Err(StoreError::new(StoreErrorKind::Corrupt(format!(
                "{}: {}",
                self.path.display(),
                e
            )))),
        }
    }
}

impl DelayPersistence for FileDelayStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> StoreResult<DelayRecord> {
        let Some(document) = self.read_document()? else {
            debug!("No delay store file yet");
            return Ok(DelayRecord::new());
        };
        match document.get(ADAPTIVE_DELAYS_KEY) {
            Some(value) => decode_record(value),
            None => Ok(DelayRecord::new()),
        }
    }

    #[instrument(skip(self, record), fields(path = %self.path.display(), models = record.len()))]
    fn save(&self, record: &DelayRecord) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::new(StoreErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        // A corrupt file is replaced rather than blocking every future save.
        let mut document = self.read_document().ok().flatten().unwrap_or_default();
        document.insert(ADAPTIVE_DELAYS_KEY.to_string(), encode_record(record)?);

        let text = serde_json::to_string_pretty(&Value::Object(document))
            .map_err(|e| StoreError::new(StoreErrorKind::Encode(e.to_string())))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text).map_err(|e| {
            StoreError::new(StoreErrorKind::Write(format!("{}: {}", tmp.display(), e)))
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            StoreError::new(StoreErrorKind::Write(format!(
                "{}: {}",
                self.path.display(),
                e
            )))
        })?;

        debug!("Saved delay record");
        Ok(())
    }
}

/// In-process store holding the encoded record.
///
/// Used by hosts without persistent storage and by tests. Records still go
/// through JSON encoding so behaviour matches the file store.
#[derive(Debug, Default)]
pub struct MemoryDelayStore {
    encoded: Mutex<Option<String>>,
}

impl MemoryDelayStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with raw text, which may be deliberately malformed.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            encoded: Mutex::new(Some(raw.into())),
        }
    }

    /// The encoded record, if one was saved.
    pub fn raw(&self) -> Option<String> {
        self.encoded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DelayPersistence for MemoryDelayStore {
    fn load(&self) -> StoreResult<DelayRecord> {
        let Some(raw) = self.raw() else {
            return Ok(DelayRecord::new());
        };
        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| StoreError::new(StoreErrorKind::Corrupt(e.to_string())))?;
        decode_record(&value)
    }

    fn save(&self, record: &DelayRecord) -> StoreResult<()> {
        let raw = serde_json::to_string(&encode_record(record)?)
            .map_err(|e| StoreError::new(StoreErrorKind::Encode(e.to_string())))?;
        *self.encoded.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DelayRecord {
        let mut record = DelayRecord::new();
        record.insert("google:gemini-2.5-flash".parse().unwrap(), 8000);
        record.insert("openai:gpt-4o-mini".parse().unwrap(), 1250);
        record
    }

    #[test]
    fn file_store_preserves_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        let store = FileDelayStore::new(&path);
        store.save(&record()).unwrap();

        let document: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document["theme"], "dark");
        assert_eq!(
            document[ADAPTIVE_DELAYS_KEY]["google:gemini-2.5-flash"],
            8000
        );
        assert_eq!(store.load().unwrap(), record());
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDelayStore::new(dir.path().join("nope/delays.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn file_store_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delays.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileDelayStore::new(&path);
        assert!(matches!(
            store.load().unwrap_err().kind,
            StoreErrorKind::Corrupt(_)
        ));

        // Saving over a corrupt file recovers it.
        store.save(&record()).unwrap();
        assert_eq!(store.load().unwrap(), record());
    }

    #[test]
    fn memory_store_rejects_garbage() {
        let store = MemoryDelayStore::with_raw(r#"{"bogus-id": 12}"#);
        assert!(store.load().is_err());
    }
}
