//! In-memory contact store.

use peoplesync_common::{Error, Result};

use crate::contact::LocalContact;
use crate::store::ContactStore;

/// In-memory contact store.
///
/// Useful for testing and as the working set of the file-backed store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    contacts: Vec<LocalContact>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given contacts, without duplicate checks.
    pub fn from_contacts(contacts: Vec<LocalContact>) -> Self {
        Self { contacts }
    }

    /// Borrow the contacts held by the store.
    pub fn contacts(&self) -> &[LocalContact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    fn position(&self, contact: &LocalContact) -> Result<usize> {
        self.contacts
            .iter()
            .position(|c| c == contact)
            .ok_or_else(|| Error::ContactNotFound(contact.name.to_string()))
    }
}

impl ContactStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn list_contacts(&self) -> Result<Vec<LocalContact>> {
        Ok(self.contacts.clone())
    }

    fn add_contact(&mut self, contact: LocalContact) -> Result<()> {
        if self.contacts.iter().any(|c| c.is_same_contact(&contact)) {
            return Err(Error::DuplicateContact(contact.name.to_string()));
        }
        self.contacts.push(contact);
        Ok(())
    }

    fn delete_contact(&mut self, contact: &LocalContact) -> Result<()> {
        let index = self.position(contact)?;
        self.contacts.remove(index);
        Ok(())
    }

    fn replace_contact(&mut self, old: &LocalContact, new: LocalContact) -> Result<()> {
        let index = self.position(old)?;
        let clashes = self
            .contacts
            .iter()
            .enumerate()
            .any(|(i, c)| i != index && c.is_same_contact(&new));
        if clashes {
            return Err(Error::DuplicateContact(new.name.to_string()));
        }
        self.contacts[index] = new;
        Ok(())
    }
}
