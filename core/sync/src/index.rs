//! Identity indices over local and remote contact snapshots.
//!
//! Both indices are built once from a full listing and never mutated. They
//! answer the two questions reconciliation asks: which record holds this
//! remote identifier, and which record goes by this name.

use std::collections::HashMap;

use peoplesync_common::RemoteId;
use peoplesync_contacts::LocalContact;
use peoplesync_remote::RemoteContact;

/// Snapshot of the local store keyed by remote identifier and full name.
#[derive(Debug, Default)]
pub struct LocalIndex {
    contacts: Vec<LocalContact>,
    by_id: HashMap<RemoteId, usize>,
    by_name: HashMap<String, usize>,
}

impl LocalIndex {
    /// Build from a store listing. Unlinked contacts are absent from the id
    /// map. When two contacts share a name the later one wins.
    pub fn build(contacts: Vec<LocalContact>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();

        for (i, contact) in contacts.iter().enumerate() {
            if let Some(id) = &contact.remote_id {
                by_id.insert(id.clone(), i);
            }
            by_name.insert(contact.display_name().to_string(), i);
        }

        Self {
            contacts,
            by_id,
            by_name,
        }
    }

    pub fn by_id(&self, id: &RemoteId) -> Option<&LocalContact> {
        self.by_id.get(id).map(|&i| &self.contacts[i])
    }

    pub fn by_name(&self, name: &str) -> Option<&LocalContact> {
        self.by_name.get(name).map(|&i| &self.contacts[i])
    }

    pub fn contains_id(&self, id: &RemoteId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Every contact, in store order.
    pub fn contacts(&self) -> &[LocalContact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

/// Snapshot of the remote directory keyed by resource name and display name.
#[derive(Debug, Default)]
pub struct RemoteIndex {
    contacts: Vec<RemoteContact>,
    by_id: HashMap<RemoteId, usize>,
    by_name: HashMap<String, usize>,
}

impl RemoteIndex {
    /// Build from a directory listing. Records without a resource name are
    /// ignored; records without a resolvable display name are only
    /// reachable by id.
    pub fn build(listing: Vec<RemoteContact>) -> Self {
        let contacts: Vec<RemoteContact> = listing
            .into_iter()
            .filter(|c| c.resource_name.is_some())
            .collect();
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();

        for (i, contact) in contacts.iter().enumerate() {
            if let Some(id) = &contact.resource_name {
                by_id.insert(id.clone(), i);
            }
            if let Some(name) = contact.display_name() {
                by_name.insert(name, i);
            }
        }

        Self {
            contacts,
            by_id,
            by_name,
        }
    }

    pub fn by_id(&self, id: &RemoteId) -> Option<&RemoteContact> {
        self.by_id.get(id).map(|&i| &self.contacts[i])
    }

    pub fn by_name(&self, name: &str) -> Option<&RemoteContact> {
        self.by_name.get(name).map(|&i| &self.contacts[i])
    }

    pub fn contains_id(&self, id: &RemoteId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Every indexed contact, in listing order.
    pub fn contacts(&self) -> &[RemoteContact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}
