//! Persistence for the habit, goal, journal, theme and session slots.
//!
//! A [`Store`] is a flat key/value space of JSON documents. Each save
//! replaces the whole slot, so a collection is never half written from the
//! point of view of this crate.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::encryption::{self, EncryptedData, EncryptionError};

pub const HABITS_SLOT: &str = "streakly-habits";
pub const GOALS_SLOT: &str = "streakly-goals";
pub const JOURNAL_SLOT: &str = "streakly-journal";
pub const THEME_SLOT: &str = "streakly-theme";
pub const SESSION_SLOT: &str = "streakly-phone-user";

pub const ALL_SLOTS: [&str; 5] = [HABITS_SLOT, GOALS_SLOT, JOURNAL_SLOT, THEME_SLOT, SESSION_SLOT];

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Encryption error: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("Backup contains unknown slot {0:?}")]
    UnknownSlot(String),
}

pub trait Store {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError>;

    fn save(&self, key: &str, value: &Value) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub fn load_slot<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Result<Option<T>, StorageError> {
    match store.load(key)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub fn save_slot<T: Serialize + ?Sized>(store: &dyn Store, key: &str, data: &T) -> Result<(), StorageError> {
    let value = serde_json::to_value(data)?;
    store.save(key, &value)
}

/// Process-local store; nothing survives the value being dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RefCell<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        self.slots.borrow_mut().insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.slots.borrow_mut().remove(key);
        Ok(())
    }
}

/// One password-encrypted file per slot inside the data directory.
pub struct EncryptedFileStore {
    data_dir: PathBuf,
    password: RefCell<String>,
}

impl EncryptedFileStore {
    pub fn new(data_dir: impl Into<PathBuf>, password: &str) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;

        Ok(Self {
            data_dir,
            password: RefCell::new(password.to_string()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.encrypted", key))
    }

    /// True if any slot has been written.
    pub fn exists(&self) -> bool {
        ALL_SLOTS.iter().any(|key| self.slot_path(key).exists())
    }

    /// Checks `password` against whatever is on disk. An empty store accepts
    /// any password.
    pub fn verify_password(&self, password: &str) -> bool {
        ALL_SLOTS
            .iter()
            .map(|key| self.slot_path(key))
            .filter(|path| path.exists())
            .all(|path| read_sealed(&path).is_ok_and(|sealed| encryption::open(password, &sealed).is_ok()))
    }

    /// Re-encrypts every slot under `new_password`. On failure every slot is
    /// still readable with `current_password`.
    pub fn change_password(&self, current_password: &str, new_password: &str) -> Result<(), StorageError> {
        let slots = self.read_all(current_password)?;
        self.replace_slots(&slots, new_password, &slots, current_password)?;
        self.password.replace(new_password.to_string());
        log::info!("Re-encrypted {} slot(s) under a new password", slots.len());
        Ok(())
    }

    /// Bundles every slot into one file encrypted under `backup_password`.
    pub fn export_backup(&self, backup_path: &Path, backup_password: &str) -> Result<(), StorageError> {
        let slots = self.read_all(&self.password.borrow())?;
        let bundle = serde_json::to_value(&slots)?;
        write_sealed(backup_path, backup_password, &bundle)?;
        log::info!("Exported backup of {} slot(s) to {:?}", slots.len(), backup_path);
        Ok(())
    }

    /// Replaces the slots present in the backup with its contents, encrypted
    /// under the store's current password.
    pub fn import_backup(&self, backup_path: &Path, backup_password: &str) -> Result<(), StorageError> {
        let sealed = read_sealed(backup_path)?;
        let plaintext = encryption::open(backup_password, &sealed)?;
        let slots: BTreeMap<String, Value> = serde_json::from_slice(&plaintext)?;
        if let Some(unknown) = slots.keys().find(|key| !ALL_SLOTS.contains(&key.as_str())) {
            return Err(StorageError::UnknownSlot(unknown.clone()));
        }

        let password = self.password.borrow();
        let previous = self.read_all(&password)?;
        self.replace_slots(&slots, &password, &previous, &password)?;
        log::info!("Imported {} slot(s) from {:?}", slots.len(), backup_path);
        Ok(())
    }

    pub fn delete_all_data(&self) -> Result<(), StorageError> {
        for key in ALL_SLOTS {
            let path = self.slot_path(key);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        log::info!("Deleted all data in {:?}", self.data_dir);
        Ok(())
    }

    /// Writes `slots` under `password` as one unit. Every slot is sealed to
    /// its temp file before any original is replaced. If a rename fails, the
    /// slots already moved are restored from `previous`.
    fn replace_slots(
        &self,
        slots: &BTreeMap<String, Value>,
        password: &str,
        previous: &BTreeMap<String, Value>,
        previous_password: &str,
    ) -> Result<(), StorageError> {
        let mut staged: Vec<(&str, PathBuf)> = Vec::new();
        for (key, value) in slots {
            let tmp = self.slot_path(key).with_extension("tmp");
            if let Err(e) = stage_sealed(&tmp, password, value) {
                log::error!("Failed to stage slot {}: {}", key, e);
                discard_staged(staged.iter().map(|(_, tmp)| tmp.as_path()));
                return Err(e);
            }
            staged.push((key.as_str(), tmp));
        }

        for (i, (key, tmp)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(tmp, self.slot_path(key)) {
                log::error!("Failed to replace slot {}: {}", key, e);
                discard_staged(staged[i..].iter().map(|(_, tmp)| tmp.as_path()));
                for (done, _) in &staged[..i] {
                    self.restore_slot(done, previous.get(*done), previous_password);
                }
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn restore_slot(&self, key: &str, value: Option<&Value>, password: &str) {
        let path = self.slot_path(key);
        let restored = match value {
            Some(value) => write_sealed(&path, password, value),
            None => fs::remove_file(&path).map_err(StorageError::from),
        };
        if let Err(e) = restored {
            log::error!("Failed to restore slot {}: {}", key, e);
        }
    }

    fn read_all(&self, password: &str) -> Result<BTreeMap<String, Value>, StorageError> {
        let mut slots = BTreeMap::new();
        for key in ALL_SLOTS {
            let path = self.slot_path(key);
            if !path.exists() {
                continue;
            }
            let sealed = read_sealed(&path)?;
            let plaintext = encryption::open(password, &sealed)?;
            slots.insert(key.to_string(), serde_json::from_slice(&plaintext)?);
        }
        Ok(slots)
    }
}

impl Store for EncryptedFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let sealed = read_sealed(&path)?;
        let plaintext = encryption::open(&self.password.borrow(), &sealed)?;
        log::debug!("Loaded slot {} ({} bytes)", key, plaintext.len());
        Ok(Some(serde_json::from_slice(&plaintext)?))
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        write_sealed(&self.slot_path(key), &self.password.borrow(), value)?;
        log::debug!("Saved slot {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn read_sealed(path: &Path) -> Result<EncryptedData, StorageError> {
    let encrypted_json = fs::read(path)?;
    Ok(serde_json::from_slice(&encrypted_json)?)
}

fn stage_sealed(tmp: &Path, password: &str, value: &Value) -> Result<(), StorageError> {
    let json_data = serde_json::to_vec(value)?;
    let sealed = encryption::seal(password, &json_data)?;
    let encrypted_json = serde_json::to_vec(&sealed)?;
    fs::write(tmp, encrypted_json)?;
    Ok(())
}

fn discard_staged<'a>(tmps: impl Iterator<Item = &'a Path>) {
    for tmp in tmps {
        if tmp.is_file() {
            if let Err(e) = fs::remove_file(tmp) {
                log::warn!("Failed to remove {:?}: {}", tmp, e);
            }
        }
    }
}

fn write_sealed(path: &Path, password: &str, value: &Value) -> Result<(), StorageError> {
    // Write next to the target and rename over it so a crash mid-write
    // leaves the previous contents in place.
    let tmp = path.with_extension("tmp");
    stage_sealed(&tmp, password, value)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
