use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::session::{SessionField, StoredFields};
use crate::errors::StoreError;

/// Durable key/value persistence for session fields.
///
/// Writes happen on every relevant change so that a restarted process
/// restores the last session.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<StoredFields, StoreError>;
    fn save(&self, field: SessionField, value: &str) -> Result<(), StoreError>;
    fn remove(&self, field: SessionField) -> Result<(), StoreError>;

    /// Erase every session field. The passphrase is kept.
    fn clear(&self) -> Result<(), StoreError> {
        for field in SessionField::SESSION {
            self.remove(field)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(default)]
    fields: StoredFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// JSON-file backed store, one document per project.
pub struct FileSessionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<SessionDocument, StoreError> {
        if !self.path.exists() {
            return Ok(SessionDocument::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(SessionDocument::default());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_document(&self, mut document: SessionDocument) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        document.updated_at = Some(Utc::now());
        let content = serde_json::to_string_pretty(&document).map_err(|source| {
            StoreError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, content).map_err(io_err)
    }

    fn update(&self, apply: impl FnOnce(&mut StoredFields)) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut document = self.read_document()?;
        apply(&mut document.fields);
        self.write_document(document)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<StoredFields, StoreError> {
        Ok(self.read_document()?.fields)
    }

    fn save(&self, field: SessionField, value: &str) -> Result<(), StoreError> {
        self.update(|fields| {
            fields.insert(field, value.to_string());
        })
    }

    fn remove(&self, field: SessionField) -> Result<(), StoreError> {
        self.update(|fields| {
            fields.remove(&field);
        })
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.update(|fields| {
            for field in SessionField::SESSION {
                fields.remove(&field);
            }
        })
    }
}

/// In-process store for tests and the server's ephemeral mode.
#[derive(Default)]
pub struct MemorySessionStore {
    fields: Mutex<StoredFields>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<StoredFields, StoreError> {
        Ok(self.fields.lock().map_err(|_| StoreError::LockPoisoned)?.clone())
    }

    fn save(&self, field: SessionField, value: &str) -> Result<(), StoreError> {
        self.fields
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?
            .insert(field, value.to_string());
        Ok(())
    }

    fn remove(&self, field: SessionField) -> Result<(), StoreError> {
        self.fields
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?
            .remove(&field);
        Ok(())
    }
}
