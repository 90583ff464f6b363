//! Contact store trait definition.

use peoplesync_common::Result;

use crate::contact::LocalContact;

/// Local contact store.
///
/// Stores hold whole records and are mutated only by adding, deleting or
/// replacing a record. Records are matched by full equality, so callers must
/// pass the record exactly as it was last listed.
pub trait ContactStore: Send {
    /// Get the store name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// List all contacts in insertion order.
    fn list_contacts(&self) -> Result<Vec<LocalContact>>;

    /// Add a contact.
    ///
    /// # Errors
    /// - `DuplicateContact` when a contact with the same name, phone, email
    ///   and address already exists
    fn add_contact(&mut self, contact: LocalContact) -> Result<()>;

    /// Delete a contact.
    ///
    /// # Errors
    /// - `ContactNotFound` when the record is not in the store
    fn delete_contact(&mut self, contact: &LocalContact) -> Result<()>;

    /// Replace `old` with `new`, keeping its position.
    ///
    /// # Errors
    /// - `ContactNotFound` when `old` is not in the store
    /// - `DuplicateContact` when `new` is the same contact as another record
    fn replace_contact(&mut self, old: &LocalContact, new: LocalContact) -> Result<()>;
}
