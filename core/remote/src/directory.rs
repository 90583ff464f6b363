//! Remote directory trait definition.

use async_trait::async_trait;

use peoplesync_common::{RemoteId, Result};

use crate::contact::RemoteContact;
use crate::mask::UpdateMask;

/// Remote contact directory.
///
/// Every call is a blocking round-trip from the caller's point of view and a
/// potential failure point. Implementations report retryable failures with
/// `Error::transient` and permanent ones with `Error::remote` or `NotFound`.
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// Get the directory name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// List every contact in the directory.
    ///
    /// # Postconditions
    /// - Every returned contact carries a resource name and an update time
    async fn list_connections(&self) -> Result<Vec<RemoteContact>>;

    /// Create a contact.
    ///
    /// # Postconditions
    /// - Returns the stored contact with its assigned resource name and
    ///   server update time
    async fn create_contact(&self, contact: &RemoteContact) -> Result<RemoteContact>;

    /// Overwrite the fields named in `mask` on an existing contact.
    ///
    /// # Preconditions
    /// - `mask` covers exactly names, email addresses, addresses and phone numbers
    /// - `contact.etag` is the current etag when present
    ///
    /// # Postconditions
    /// - Returns the stored contact with its new update time
    ///
    /// # Errors
    /// - Contact not found
    /// - Mask or etag rejected
    async fn update_contact(
        &self,
        id: &RemoteId,
        contact: &RemoteContact,
        mask: &UpdateMask,
    ) -> Result<RemoteContact>;

    /// Delete a contact.
    ///
    /// # Errors
    /// - Contact not found
    async fn delete_contact(&self, id: &RemoteId) -> Result<()>;
}
