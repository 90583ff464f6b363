//! File-backed remote directory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use peoplesync_common::{RemoteId, Result};

use crate::contact::RemoteContact;
use crate::directory::RemoteDirectory;
use crate::mask::UpdateMask;
use crate::memory::DirectoryState;

/// Remote directory stored as a single JSON document.
///
/// Stands in for a hosted directory during development: every call loads
/// the document, applies the operation and writes it back atomically.
/// Update times come from the wall clock.
pub struct FileDirectory {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileDirectory {
    /// Create a directory backed by `path`. A missing file is an empty
    /// directory; the file is created on first write.
    ///
    /// # Errors
    /// - Parent directory cannot be created
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<DirectoryState> {
        if !fs::try_exists(&self.path).await? {
            return Ok(DirectoryState::new(Utc::now()));
        }
        let content = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn save(&self, state: &DirectoryState) -> Result<()> {
        let content = serde_json::to_string_pretty(state)?;
        let temp = self.path.with_extension("json.tmp");
        fs::write(&temp, content).await?;
        fs::rename(&temp, &self.path).await?;
        Ok(())
    }

    /// Load the document, apply `op` and write the result back.
    async fn modify<T>(
        &self,
        op: impl FnOnce(&mut DirectoryState, DateTime<Utc>) -> Result<T>,
    ) -> Result<T> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;
        let result = op(&mut state, Utc::now())?;
        self.save(&state).await?;
        Ok(result)
    }

    /// Store a contact as if another client had created it.
    pub async fn insert(&self, contact: RemoteContact) -> Result<RemoteContact> {
        self.modify(|state, now| state.insert(contact, Some(now))).await
    }
}

#[async_trait]
impl RemoteDirectory for FileDirectory {
    fn name(&self) -> &str {
        "file"
    }

    async fn list_connections(&self) -> Result<Vec<RemoteContact>> {
        let _guard = self.lock.lock().await;
        let connections = self.load().await?.list();
        debug!("Listed {} connections from {}", connections.len(), self.path.display());
        Ok(connections)
    }

    async fn create_contact(&self, contact: &RemoteContact) -> Result<RemoteContact> {
        self.modify(|state, now| state.create(contact, Some(now))).await
    }

    async fn update_contact(
        &self,
        id: &RemoteId,
        contact: &RemoteContact,
        mask: &UpdateMask,
    ) -> Result<RemoteContact> {
        self.modify(|state, now| state.update(id, contact, mask, Some(now)))
            .await
    }

    async fn delete_contact(&self, id: &RemoteId) -> Result<()> {
        self.modify(|state, _| state.delete(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Name;
    use peoplesync_common::Error;
    use tempfile::TempDir;

    fn person(given: &str) -> RemoteContact {
        RemoteContact {
            names: vec![Name {
                given_name: Some(given.to_string()),
                family_name: None,
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let directory = FileDirectory::new(temp_dir.path().join("people.json")).unwrap();

        assert!(directory.list_connections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_contacts_persist_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("remote/people.json");

        let directory = FileDirectory::new(&path).unwrap();
        let alex = directory.create_contact(&person("Alex")).await.unwrap();
        let bernice = directory.create_contact(&person("Bernice")).await.unwrap();
        directory
            .delete_contact(alex.resource_name.as_ref().unwrap())
            .await
            .unwrap();

        let reopened = FileDirectory::new(&path).unwrap();
        let listed = reopened.list_connections().await.unwrap();
        assert_eq!(listed, vec![bernice]);

        let charlotte = reopened.create_contact(&person("Charlotte")).await.unwrap();
        assert_eq!(charlotte.resource_name.unwrap().as_str(), "people/c3");
    }

    #[tokio::test]
    async fn test_update_times_increase() {
        let temp_dir = TempDir::new().unwrap();
        let directory = FileDirectory::new(temp_dir.path().join("people.json")).unwrap();

        let created = directory.create_contact(&person("Alex")).await.unwrap();
        let id = created.resource_name.clone().unwrap();
        let mut payload = person("Alex Yeoh");
        payload.etag = created.etag.clone();
        let updated = directory
            .update_contact(&id, &payload, &UpdateMask::contact_fields())
            .await
            .unwrap();

        assert!(updated.update_time().unwrap() > created.update_time().unwrap());
    }

    #[tokio::test]
    async fn test_failed_operation_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("people.json");
        let directory = FileDirectory::new(&path).unwrap();

        let id = RemoteId::new("people/c9").unwrap();
        let result = directory.delete_contact(&id).await;

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(!path.exists());
    }
}
