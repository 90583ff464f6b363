//! Persistent set of synchronized remote identifiers.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use peoplesync_common::{RemoteId, Result};

/// Remote identifiers known to correspond to a local contact as of the last
/// sync. Iteration is in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    ids: BTreeSet<RemoteId>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the id was not already linked.
    pub fn insert(&mut self, id: RemoteId) -> bool {
        self.ids.insert(id)
    }

    /// Returns true if the id was linked.
    pub fn remove(&mut self, id: &RemoteId) -> bool {
        self.ids.remove(id)
    }

    pub fn contains(&self, id: &RemoteId) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.ids)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self {
            ids: serde_json::from_str(json)?,
        })
    }
}

impl FromIterator<RemoteId> for LinkSet {
    fn from_iter<I: IntoIterator<Item = RemoteId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// File holding the link set between runs, as a sorted JSON array of
/// identifiers.
#[derive(Debug, Clone)]
pub struct LinkStore {
    path: PathBuf,
}

impl LinkStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the link set. A missing file is an empty set.
    ///
    /// # Errors
    /// - File exists but cannot be read or parsed
    pub async fn load(&self) -> Result<LinkSet> {
        if !fs::try_exists(&self.path).await? {
            debug!("No link set at {}, starting empty", self.path.display());
            return Ok(LinkSet::new());
        }
        let content = fs::read_to_string(&self.path).await?;
        LinkSet::from_json(&content)
    }

    /// Overwrite the file with `links`. The write goes to a sibling temp
    /// file that is renamed into place.
    pub async fn save(&self, links: &LinkSet) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.path.with_extension("json.tmp");
        fs::write(&temp, links.to_json()?).await?;
        fs::rename(&temp, &self.path).await?;
        debug!("Saved {} links to {}", links.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn id(s: &str) -> RemoteId {
        RemoteId::new(s).unwrap()
    }

    #[test]
    fn test_json_is_sorted_array() {
        let links: LinkSet = vec![id("people/c2"), id("people/c10"), id("people/c1")]
            .into_iter()
            .collect();

        let value: serde_json::Value = serde_json::from_str(&links.to_json().unwrap()).unwrap();
        assert_eq!(value, serde_json::json!(["people/c1", "people/c10", "people/c2"]));
    }

    #[test]
    fn test_empty_id_rejected() {
        assert!(LinkSet::from_json(r#"["people/c1", ""]"#).is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = LinkStore::new(temp_dir.path().join("links.json"));

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state/links.json");
        let store = LinkStore::new(&path);

        let mut links = LinkSet::new();
        assert!(links.insert(id("people/c1")));
        assert!(!links.insert(id("people/c1")));
        links.insert(id("people/c7"));
        store.save(&links).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, links);
        assert!(!path.with_extension("json.tmp").exists());

        links.remove(&id("people/c1"));
        store.save(&links).await.unwrap();
        assert_eq!(store.load().await.unwrap().len(), 1);
    }
}
