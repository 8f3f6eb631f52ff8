use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::api::UserRecord;

/// Storage key holding the active session identifier.
pub const SESSION_KEY: &str = "session_id";
/// Storage key holding the signed-in user as JSON.
pub const USER_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable string key/value storage for one local profile.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Storage backed by a single JSON object on disk, rewritten on every change.
pub struct FileStorage {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, String>>,
}

impl FileStorage {
    /// ~/.local/share/consult-desk/storage.json
    pub fn open_default() -> Self {
        let mut p = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("consult-desk");
        p.push("storage.json");
        Self::open(p)
    }

    /// Open storage at `path`. A missing or corrupt file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                log::warn!("Discarding unreadable storage {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            entries: RefCell::new(entries),
        }
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_string_pretty(&*self.entries.borrow())?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries.borrow_mut().clear();
        self.flush()
    }
}

/// Process-local storage, used by tests and as a fallback.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RefCell<BTreeMap<String, String>>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}

/// Read the stored user; an unparsable record counts as signed out.
pub fn load_user(storage: &dyn Storage) -> Option<UserRecord> {
    let raw = storage.get(USER_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(e) => {
            log::warn!("Stored user record is invalid: {e}");
            None
        }
    }
}

pub fn save_user(storage: &dyn Storage, user: &UserRecord) -> Result<(), StorageError> {
    let data = serde_json::to_string(user)?;
    storage.set(USER_KEY, &data)
}
