//! JSON file-backed contact store.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use peoplesync_common::{Error, Result};

use crate::contact::LocalContact;
use crate::memory::MemoryStore;
use crate::store::ContactStore;

/// On-disk document format.
#[derive(Debug, Serialize, Deserialize)]
struct ContactsFile {
    version: u32,
    contacts: Vec<LocalContact>,
}

const CONTACTS_FILE_VERSION: u32 = 1;

/// Contact store persisted as a single JSON document.
///
/// The whole document is read on open and rewritten after every mutation.
/// Writes go to a sibling temp file that is renamed over the original.
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    /// - File exists but cannot be read or parsed
    /// - Unsupported document version
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let inner = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let file: ContactsFile = serde_json::from_str(&content)?;
            if file.version != CONTACTS_FILE_VERSION {
                return Err(Error::InvalidInput(format!(
                    "Unsupported contacts file version: {}",
                    file.version
                )));
            }
            debug!("Loaded {} contacts from {}", file.contacts.len(), path.display());
            MemoryStore::from_contacts(file.contacts)
        } else {
            MemoryStore::new()
        };

        Ok(Self { path, inner })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, contacts: &MemoryStore) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = ContactsFile {
            version: CONTACTS_FILE_VERSION,
            contacts: contacts.contacts().to_vec(),
        };
        let content = serde_json::to_string_pretty(&file)?;

        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    /// Apply `f` to a copy of the working set and adopt the copy only once
    /// it is on disk.
    fn commit(&mut self, f: impl FnOnce(&mut MemoryStore) -> Result<()>) -> Result<()> {
        let mut candidate = self.inner.clone();
        f(&mut candidate)?;
        self.persist(&candidate)?;
        self.inner = candidate;
        Ok(())
    }
}

impl ContactStore for JsonFileStore {
    fn name(&self) -> &str {
        "file"
    }

    fn list_contacts(&self) -> Result<Vec<LocalContact>> {
        self.inner.list_contacts()
    }

    fn add_contact(&mut self, contact: LocalContact) -> Result<()> {
        self.commit(|store| store.add_contact(contact))
    }

    fn delete_contact(&mut self, contact: &LocalContact) -> Result<()> {
        self.commit(|store| store.delete_contact(contact))
    }

    fn replace_contact(&mut self, old: &LocalContact, new: LocalContact) -> Result<()> {
        self.commit(|store| store.replace_contact(old, new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peoplesync_common::ContactName;
    use tempfile::TempDir;

    fn contact(name: &str) -> LocalContact {
        LocalContact::new(ContactName::parse(name).unwrap())
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(temp_dir.path().join("contacts.json")).unwrap();
        assert!(store.list_contacts().unwrap().is_empty());
    }

    #[test]
    fn test_mutations_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/contacts.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        let alex = contact("Alex");
        store.add_contact(alex.clone()).unwrap();
        store.add_contact(contact("Bernice")).unwrap();
        store.delete_contact(&alex).unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        let contacts = reopened.list_contacts().unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].display_name(), "Bernice");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_failed_mutation_does_not_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("contacts.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        assert!(store.delete_contact(&contact("Ghost")).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_write_leaves_contacts_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let mut store = JsonFileStore::open(blocker.join("contacts.json")).unwrap();
        assert!(store.add_contact(contact("Alex")).is_err());
        assert!(store.list_contacts().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_version_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("contacts.json");
        std::fs::write(&path, r#"{"version": 99, "contacts": []}"#).unwrap();

        assert!(JsonFileStore::open(&path).is_err());
    }
}
