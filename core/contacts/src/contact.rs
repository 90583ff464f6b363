//! The local contact record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use peoplesync_common::{display_or, Address, ContactName, Email, Phone, RemoteId, Tag};

use crate::meeting::Meeting;

/// A contact in the local address book.
///
/// `remote_id` is `None` until the contact has been linked to a record in
/// the remote directory. `last_modified` is the authoritative ordering field
/// used by sync to decide which side changed last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalContact {
    pub name: ContactName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Phone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<RemoteId>,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub tags: BTreeSet<Tag>,
    #[serde(default)]
    pub meetings: BTreeSet<Meeting>,
}

impl LocalContact {
    /// Create an unlinked contact with only a name, modified now.
    pub fn new(name: ContactName) -> Self {
        Self {
            name,
            phone: None,
            email: None,
            address: None,
            remote_id: None,
            last_modified: Utc::now(),
            note: String::new(),
            tags: BTreeSet::new(),
            meetings: BTreeSet::new(),
        }
    }

    pub fn with_phone(mut self, phone: Option<Phone>) -> Self {
        self.phone = phone;
        self
    }

    pub fn with_email(mut self, email: Option<Email>) -> Self {
        self.email = email;
        self
    }

    pub fn with_address(mut self, address: Option<Address>) -> Self {
        self.address = address;
        self
    }

    pub fn with_remote_id(mut self, remote_id: Option<RemoteId>) -> Self {
        self.remote_id = remote_id;
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn with_meeting(mut self, meeting: Meeting) -> Self {
        self.meetings.insert(meeting);
        self
    }

    /// Full name used to match against remote display names.
    pub fn display_name(&self) -> &str {
        self.name.as_str()
    }

    /// Whether the contact has been linked to a remote record.
    pub fn is_linked(&self) -> bool {
        self.remote_id.is_some()
    }

    /// Two contacts are the same person when name, phone, email and address
    /// all agree. Sync metadata, notes, tags and meetings are ignored.
    pub fn is_same_contact(&self, other: &LocalContact) -> bool {
        self.name == other.name
            && self.phone == other.phone
            && self.email == other.email
            && self.address == other.address
    }
}

impl fmt::Display for LocalContact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Phone: {} Email: {} Address: {}",
            self.name,
            display_or(self.phone.as_ref(), Phone::ABSENT),
            display_or(self.email.as_ref(), Email::ABSENT),
            display_or(self.address.as_ref(), Address::ABSENT),
        )
    }
}
