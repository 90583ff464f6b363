//! In-memory remote directory for testing.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use peoplesync_common::{Error, RemoteId, Result};

use crate::contact::{PostalAddress, RemoteContact};
use crate::directory::RemoteDirectory;
use crate::mask::{PersonField, UpdateMask};

/// Contents of a directory plus the counters it needs to hand out
/// identifiers and timestamps. Shared by the memory and file backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DirectoryState {
    next_id: u64,
    last_update: DateTime<Utc>,
    connections: Vec<RemoteContact>,
}

impl DirectoryState {
    pub(crate) fn new(epoch: DateTime<Utc>) -> Self {
        Self {
            next_id: 1,
            last_update: epoch,
            connections: Vec::new(),
        }
    }

    /// Next update time. Timestamps are strictly increasing so two writes
    /// never share one; without a wall clock reading, each write advances
    /// the clock by one second.
    fn tick(&mut self, now: Option<DateTime<Utc>>) -> DateTime<Utc> {
        let candidate = now.unwrap_or(self.last_update + Duration::seconds(1));
        let next = if candidate > self.last_update {
            candidate
        } else {
            self.last_update + Duration::milliseconds(1)
        };
        self.last_update = next;
        next
    }

    fn next_resource_name(&mut self) -> Result<RemoteId> {
        loop {
            let id = RemoteId::new(format!("people/c{}", self.next_id))?;
            self.next_id += 1;
            if self.position(&id).is_none() {
                return Ok(id);
            }
        }
    }

    fn position(&self, id: &RemoteId) -> Option<usize> {
        self.connections
            .iter()
            .position(|c| c.resource_name.as_ref() == Some(id))
    }

    /// Store a contact as-is, filling in only what is missing.
    pub(crate) fn insert(
        &mut self,
        mut contact: RemoteContact,
        now: Option<DateTime<Utc>>,
    ) -> Result<RemoteContact> {
        if contact.resource_name.is_none() {
            contact.resource_name = Some(self.next_resource_name()?);
        }
        match contact.update_time() {
            Some(time) if time > self.last_update => self.last_update = time,
            Some(_) => {}
            None => {
                let time = self.tick(now);
                contact.set_update_time(time);
            }
        }
        if contact.etag.is_none() {
            contact.etag = Some(Uuid::new_v4().to_string());
        }
        if let Some(id) = contact.resource_name.clone() {
            if let Some(index) = self.position(&id) {
                self.connections.remove(index);
            }
        }
        self.connections.push(contact.clone());
        Ok(contact)
    }

    pub(crate) fn list(&self) -> Vec<RemoteContact> {
        self.connections.clone()
    }

    pub(crate) fn get(&self, id: &RemoteId) -> Option<RemoteContact> {
        self.position(id).map(|i| self.connections[i].clone())
    }

    pub(crate) fn create(
        &mut self,
        contact: &RemoteContact,
        now: Option<DateTime<Utc>>,
    ) -> Result<RemoteContact> {
        let mut created = contact.clone();
        created.resource_name = Some(self.next_resource_name()?);
        created.etag = Some(Uuid::new_v4().to_string());
        created.addresses = created.addresses.into_iter().map(parse_address).collect();
        let time = self.tick(now);
        created.set_update_time(time);

        self.connections.push(created.clone());
        Ok(created)
    }

    pub(crate) fn update(
        &mut self,
        id: &RemoteId,
        contact: &RemoteContact,
        mask: &UpdateMask,
        now: Option<DateTime<Utc>>,
    ) -> Result<RemoteContact> {
        if !mask.is_contact_fields() {
            return Err(Error::remote(format!(
                "Invalid updatePersonFields mask: {}",
                mask
            )));
        }

        let index = self
            .position(id)
            .ok_or_else(|| Error::NotFound(format!("Contact not found: {}", id)))?;

        if let Some(etag) = &contact.etag {
            if self.connections[index].etag.as_ref() != Some(etag) {
                return Err(Error::remote(format!("Etag mismatch for {}", id)));
            }
        }

        let time = self.tick(now);
        let stored = &mut self.connections[index];
        for field in mask.fields() {
            match field {
                PersonField::Names => stored.names = contact.names.clone(),
                PersonField::EmailAddresses => {
                    stored.email_addresses = contact.email_addresses.clone()
                }
                PersonField::Addresses => {
                    stored.addresses = contact.addresses.iter().cloned().map(parse_address).collect()
                }
                PersonField::PhoneNumbers => stored.phone_numbers = contact.phone_numbers.clone(),
            }
        }
        stored.etag = Some(Uuid::new_v4().to_string());
        stored.set_update_time(time);

        Ok(stored.clone())
    }

    pub(crate) fn delete(&mut self, id: &RemoteId) -> Result<()> {
        let index = self
            .position(id)
            .ok_or_else(|| Error::NotFound(format!("Contact not found: {}", id)))?;
        self.connections.remove(index);
        Ok(())
    }

    /// Apply an edit as another client would, bumping etag and update time.
    pub(crate) fn edit(
        &mut self,
        id: &RemoteId,
        now: Option<DateTime<Utc>>,
        f: impl FnOnce(&mut RemoteContact),
    ) -> Result<RemoteContact> {
        let index = self
            .position(id)
            .ok_or_else(|| Error::NotFound(format!("Contact not found: {}", id)))?;
        let time = self.tick(now);
        let stored = &mut self.connections[index];
        f(stored);
        stored.etag = Some(Uuid::new_v4().to_string());
        stored.set_update_time(time);
        Ok(stored.clone())
    }
}

/// The directory splits a formatted address into its street address on write.
fn parse_address(mut address: PostalAddress) -> PostalAddress {
    if address.street_address.is_none() {
        address.street_address = address.formatted_value.clone();
    }
    address
}

/// Directory operation, used for call accounting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryOp {
    List,
    Create,
    Update,
    Delete,
}

/// Count of successful calls per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryCalls {
    pub lists: usize,
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl DirectoryCalls {
    /// Calls that changed the directory.
    pub fn mutations(&self) -> usize {
        self.creates + self.updates + self.deletes
    }
}

#[derive(Debug)]
struct InjectedFailure {
    remaining: usize,
    transient: bool,
}

#[derive(Debug)]
struct Inner {
    state: DirectoryState,
    calls: DirectoryCalls,
    failures: HashMap<DirectoryOp, InjectedFailure>,
    rejected_names: HashSet<String>,
}

/// In-memory remote directory.
///
/// Useful for testing and development. Identifiers look like the People
/// API's (`people/c1`, `people/c2`, ...) and are never reused. Update times
/// come from a logical clock that starts at 2024-01-01T00:00:00Z and moves
/// forward one second per write, so timestamps are deterministic.
#[derive(Debug, Clone)]
pub struct MemoryDirectory {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDirectory {
    /// Create a new empty directory.
    pub fn new() -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(1_704_067_200);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: DirectoryState::new(epoch),
                calls: DirectoryCalls::default(),
                failures: HashMap::new(),
                rejected_names: HashSet::new(),
            })),
        }
    }

    /// Create a directory holding the given contacts.
    pub fn with_contacts(contacts: Vec<RemoteContact>) -> Result<Self> {
        let directory = Self::new();
        for contact in contacts {
            directory.insert(contact)?;
        }
        Ok(directory)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a contact as if another client had created it. Missing
    /// resource name, etag and update time are filled in.
    pub fn insert(&self, contact: RemoteContact) -> Result<RemoteContact> {
        self.lock().state.insert(contact, None)
    }

    /// Edit a contact as another client would.
    pub fn edit(&self, id: &RemoteId, f: impl FnOnce(&mut RemoteContact)) -> Result<RemoteContact> {
        self.lock().state.edit(id, None, f)
    }

    /// Delete a contact as another client would.
    pub fn remove(&self, id: &RemoteId) -> Result<()> {
        self.lock().state.delete(id)
    }

    pub fn get(&self, id: &RemoteId) -> Option<RemoteContact> {
        self.lock().state.get(id)
    }

    pub fn contacts(&self) -> Vec<RemoteContact> {
        self.lock().state.list()
    }

    /// Successful calls made through the `RemoteDirectory` trait so far.
    pub fn calls(&self) -> DirectoryCalls {
        self.lock().calls
    }

    pub fn reset_calls(&self) {
        self.lock().calls = DirectoryCalls::default();
    }

    /// Make the next `times` calls of `op` fail.
    pub fn fail_next(&self, op: DirectoryOp, times: usize, transient: bool) {
        self.lock().failures.insert(
            op,
            InjectedFailure {
                remaining: times,
                transient,
            },
        );
    }

    /// Reject every create whose display name is `name`.
    pub fn reject_name(&self, name: impl Into<String>) {
        self.lock().rejected_names.insert(name.into());
    }

    fn check_failure(inner: &mut Inner, op: DirectoryOp) -> Result<()> {
        if let Some(failure) = inner.failures.get_mut(&op) {
            if failure.remaining > 0 {
                failure.remaining -= 1;
                let message = format!("Injected {:?} failure", op);
                return Err(if failure.transient {
                    Error::transient(message)
                } else {
                    Error::remote(message)
                });
            }
        }
        Ok(())
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteDirectory for MemoryDirectory {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_connections(&self) -> Result<Vec<RemoteContact>> {
        let mut inner = self.lock();
        Self::check_failure(&mut inner, DirectoryOp::List)?;
        inner.calls.lists += 1;
        Ok(inner.state.list())
    }

    async fn create_contact(&self, contact: &RemoteContact) -> Result<RemoteContact> {
        let mut inner = self.lock();
        Self::check_failure(&mut inner, DirectoryOp::Create)?;
        if let Some(name) = contact.display_name() {
            if inner.rejected_names.contains(&name) {
                return Err(Error::remote(format!("Create rejected for {}", name)));
            }
        }
        let created = inner.state.create(contact, None)?;
        inner.calls.creates += 1;
        Ok(created)
    }

    async fn update_contact(
        &self,
        id: &RemoteId,
        contact: &RemoteContact,
        mask: &UpdateMask,
    ) -> Result<RemoteContact> {
        let mut inner = self.lock();
        Self::check_failure(&mut inner, DirectoryOp::Update)?;
        let updated = inner.state.update(id, contact, mask, None)?;
        inner.calls.updates += 1;
        Ok(updated)
    }

    async fn delete_contact(&self, id: &RemoteId) -> Result<()> {
        let mut inner = self.lock();
        Self::check_failure(&mut inner, DirectoryOp::Delete)?;
        inner.state.delete(id)?;
        inner.calls.deletes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{Name, PhoneNumber};

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
    async fn test_create_assigns_id_and_time() {
        let directory = MemoryDirectory::new();

        let first = directory.create_contact(&person("Alex")).await.unwrap();
        let second = directory.create_contact(&person("Bernice")).await.unwrap();

        assert_eq!(first.resource_name.as_ref().unwrap().as_str(), "people/c1");
        assert_eq!(second.resource_name.as_ref().unwrap().as_str(), "people/c2");
        assert!(second.update_time().unwrap() > first.update_time().unwrap());
        assert_eq!(directory.calls().creates, 2);
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let directory = MemoryDirectory::new();
        let created = directory.create_contact(&person("Alex")).await.unwrap();
        let id = created.resource_name.unwrap();

        directory.delete_contact(&id).await.unwrap();
        let again = directory.create_contact(&person("Alex")).await.unwrap();

        assert_ne!(again.resource_name.unwrap(), id);
    }

    #[tokio::test]
    async fn test_update_overwrites_masked_fields() {
        let directory = MemoryDirectory::new();
        let mut alex = person("Alex");
        alex.phone_numbers = vec![PhoneNumber {
            value: "12345".to_string(),
        }];
        let created = directory.create_contact(&alex).await.unwrap();
        let id = created.resource_name.clone().unwrap();

        let mut payload = person("Alex Yeoh");
        payload.etag = created.etag.clone();
        let updated = directory
            .update_contact(&id, &payload, &UpdateMask::contact_fields())
            .await
            .unwrap();

        assert_eq!(updated.display_name().as_deref(), Some("Alex Yeoh"));
        assert_eq!(updated.phone(), None);
        assert!(updated.update_time().unwrap() > created.update_time().unwrap());
    }

    #[tokio::test]
    async fn test_update_rejects_partial_mask() {
        let directory = MemoryDirectory::new();
        let created = directory.create_contact(&person("Alex")).await.unwrap();
        let id = created.resource_name.unwrap();

        let mask = UpdateMask::from_fields(vec![PersonField::Names]);
        let result = directory.update_contact(&id, &person("Alex"), &mask).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_rejects_stale_etag() {
        let directory = MemoryDirectory::new();
        let created = directory.create_contact(&person("Alex")).await.unwrap();
        let id = created.resource_name.clone().unwrap();
        directory.edit(&id, |c| c.names = person("Alexander").names).unwrap();

        let mut payload = person("Alex");
        payload.etag = created.etag;
        let result = directory
            .update_contact(&id, &payload, &UpdateMask::contact_fields())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_parses_formatted_address() {
        let directory = MemoryDirectory::new();
        let mut alex = person("Alex");
        alex.addresses = vec![PostalAddress {
            formatted_value: Some("Blk 30".to_string()),
            street_address: None,
        }];

        let created = directory.create_contact(&alex).await.unwrap();
        assert_eq!(created.addresses[0].street_address.as_deref(), Some("Blk 30"));
    }

    #[tokio::test]
    async fn test_delete_missing_fails() {
        let directory = MemoryDirectory::new();
        let id = RemoteId::new("people/c404").unwrap();
        assert!(matches!(
            directory.delete_contact(&id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let directory = MemoryDirectory::new();
        directory.fail_next(DirectoryOp::List, 1, true);

        let err = directory.list_connections().await.unwrap_err();
        assert!(err.is_transient());
        assert!(directory.list_connections().await.is_ok());
        assert_eq!(directory.calls().lists, 1);
    }

    #[tokio::test]
    async fn test_rejected_name() {
        let directory = MemoryDirectory::new();
        directory.reject_name("Mallory");

        assert!(directory.create_contact(&person("Mallory")).await.is_err());
        assert!(directory.create_contact(&person("Alex")).await.is_ok());
    }

    #[test]
    fn test_seeded_times_are_kept() {
        let time = DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(1_800_000_000);
        let mut seeded = person("Alex");
        seeded.set_update_time(time);

        let directory = MemoryDirectory::with_contacts(vec![seeded]).unwrap();
        let stored = &directory.contacts()[0];
        assert_eq!(stored.update_time(), Some(time));

        let edited = directory
            .edit(stored.resource_name.as_ref().unwrap(), |_| {})
            .unwrap();
        assert!(edited.update_time().unwrap() > time);
    }
}
