//! Named persistent slots: the local-storage equivalent the recipe store
//! writes its whole collection into.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::error::VaultError;

/// Key/value persistence where each value is one opaque string.
pub trait SlotStore {
    /// Returns `Ok(None)` when nothing has been written under `key` yet.
    fn read_slot(&self, key: &str) -> Result<Option<String>, VaultError>;

    /// Replace the whole value stored under `key`.
    fn write_slot(&self, key: &str, contents: &str) -> Result<(), VaultError>;
}

/// Slots backed by one `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileSlots {
    dir: PathBuf,
}

impl FileSlots {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the file backing `key`.
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SlotStore for FileSlots {
    fn read_slot(&self, key: &str) -> Result<Option<String>, VaultError> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VaultError::StorageRead {
                path,
                detail: e.to_string(),
            }),
        }
    }

    /// Creates `dir` if needed, writes `<key>.json.tmp` and renames it over
    /// the slot file; falls back to a direct write if the rename fails.
    fn write_slot(&self, key: &str, contents: &str) -> Result<(), VaultError> {
        let path = self.slot_path(key);

        fs::create_dir_all(&self.dir).map_err(|e| VaultError::StorageWrite {
            path: self.dir.clone(),
            detail: format!("failed to create directory: {e}"),
        })?;

        let tmp_path = self.dir.join(format!("{key}.json.tmp"));
        let write_err = |e: std::io::Error| VaultError::StorageWrite {
            path: tmp_path.clone(),
            detail: e.to_string(),
        };

        let mut f = fs::File::create(&tmp_path).map_err(write_err)?;
        f.write_all(contents.as_bytes()).map_err(write_err)?;
        f.flush().map_err(write_err)?;
        drop(f);

        if fs::rename(&tmp_path, &path).is_err() {
            fs::write(&path, contents).map_err(|e| VaultError::StorageWrite {
                path: path.clone(),
                detail: e.to_string(),
            })?;
            let _ = fs::remove_file(&tmp_path);
        }

        Ok(())
    }
}

/// In-process slots; nothing survives the value being dropped.
#[derive(Debug, Default)]
pub struct MemorySlots {
    slots: RefCell<HashMap<String, String>>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a slot, e.g. with previously persisted text.
    pub fn with_slot(self, key: &str, contents: &str) -> Self {
        self.slots
            .borrow_mut()
            .insert(key.to_owned(), contents.to_owned());
        self
    }
}

impl SlotStore for MemorySlots {
    fn read_slot(&self, key: &str) -> Result<Option<String>, VaultError> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn write_slot(&self, key: &str, contents: &str) -> Result<(), VaultError> {
        self.slots
            .borrow_mut()
            .insert(key.to_owned(), contents.to_owned());
        Ok(())
    }
}

impl<S: SlotStore + ?Sized> SlotStore for &S {
    fn read_slot(&self, key: &str) -> Result<Option<String>, VaultError> {
        (**self).read_slot(key)
    }

    fn write_slot(&self, key: &str, contents: &str) -> Result<(), VaultError> {
        (**self).write_slot(key, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_path_appends_json_extension() {
        let slots = FileSlots::new("/data/vault");
        assert_eq!(
            slots.slot_path("recipes"),
            PathBuf::from("/data/vault/recipes.json")
        );
    }

    #[test]
    fn read_missing_slot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let slots = FileSlots::new(dir.path());
        assert_eq!(slots.read_slot("recipes").unwrap(), None);
    }

    #[test]
    fn write_then_read_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let slots = FileSlots::new(dir.path());
        slots.write_slot("recipes", "[1,2,3]").unwrap();
        assert_eq!(slots.read_slot("recipes").unwrap().as_deref(), Some("[1,2,3]"));
        assert!(!dir.path().join("recipes.json.tmp").exists());
    }

    #[test]
    fn write_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let slots = FileSlots::new(&nested);
        slots.write_slot("recipes", "[]").unwrap();
        assert!(nested.join("recipes.json").exists());
    }

    #[test]
    fn write_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let slots = FileSlots::new(dir.path());
        slots.write_slot("recipes", "first").unwrap();
        slots.write_slot("recipes", "second").unwrap();
        assert_eq!(slots.read_slot("recipes").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn read_directory_as_slot_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("recipes.json")).unwrap();
        let slots = FileSlots::new(dir.path());
        let err = slots.read_slot("recipes").unwrap_err();
        assert!(matches!(err, VaultError::StorageRead { .. }), "got {err:?}");
    }

    #[test]
    fn memory_slots_keep_keys_separate() {
        let slots = MemorySlots::new().with_slot("a", "1");
        slots.write_slot("b", "2").unwrap();
        assert_eq!(slots.read_slot("a").unwrap().as_deref(), Some("1"));
        assert_eq!(slots.read_slot("b").unwrap().as_deref(), Some("2"));
        assert_eq!(slots.read_slot("c").unwrap(), None);
    }
}
