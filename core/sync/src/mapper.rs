//! Conversion between local and remote contact representations.

use chrono::{DateTime, Utc};
use tracing::warn;

use peoplesync_common::{Address, ContactName, Email, Phone, Result};
use peoplesync_contacts::LocalContact;
use peoplesync_remote::{EmailAddress, Name, PhoneNumber, PostalAddress, RemoteContact};

/// A remote field value checked against the local validation rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<T> {
    Valid(T),
    /// Present remotely but rejected locally; carries the raw text.
    Invalid(String),
    Absent,
}

impl<T> FieldValue<T> {
    pub fn classify(raw: Option<&str>, parse: impl FnOnce(&str) -> Result<T>) -> Self {
        match raw {
            None => FieldValue::Absent,
            Some(text) => match parse(text) {
                Ok(value) => FieldValue::Valid(value),
                Err(_) => FieldValue::Invalid(text.to_string()),
            },
        }
    }

    /// Local value; invalid and absent fields both become `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            FieldValue::Valid(value) => Some(value),
            FieldValue::Invalid(_) | FieldValue::Absent => None,
        }
    }
}

/// Remote fields as the local store would accept them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFields {
    pub name: ContactName,
    pub phone: FieldValue<Phone>,
    pub email: FieldValue<Email>,
    pub address: FieldValue<Address>,
}

impl RemoteFields {
    /// Extract and validate the synchronized fields of a remote contact.
    ///
    /// Returns `None` when the contact has no usable name. Invalid phone,
    /// email or address values are logged and dropped.
    pub fn extract(remote: &RemoteContact) -> Option<Self> {
        let id = remote.resource_name.as_ref().map_or("<unnamed>", |r| r.as_str());

        let Some(display_name) = remote.display_name() else {
            warn!("Remote contact {} has no name", id);
            return None;
        };
        let name = match ContactName::parse(&display_name) {
            Ok(name) => name,
            Err(e) => {
                warn!("Remote contact {} has an invalid name: {}", id, e);
                return None;
            }
        };

        let fields = Self {
            name,
            phone: FieldValue::classify(remote.phone(), Phone::parse),
            email: FieldValue::classify(remote.email(), Email::parse),
            address: FieldValue::classify(remote.address(), Address::parse),
        };

        for (field, invalid) in [
            ("phone", fields.phone.raw_invalid()),
            ("email", fields.email.raw_invalid()),
            ("address", fields.address.raw_invalid()),
        ] {
            if let Some(raw) = invalid {
                warn!("Dropping invalid {} '{}' on remote contact {}", field, raw, id);
            }
        }

        Some(fields)
    }
}

impl<T> FieldValue<T> {
    fn raw_invalid(&self) -> Option<&str> {
        match self {
            FieldValue::Invalid(raw) => Some(raw),
            _ => None,
        }
    }
}

/// Build the remote payload for a local contact.
///
/// The whole name goes into the given name. Phone, email and address are
/// only included when present; an absent field is omitted, never sent empty.
pub fn to_remote(local: &LocalContact) -> RemoteContact {
    RemoteContact {
        names: vec![Name {
            given_name: Some(local.name.to_string()),
            family_name: None,
        }],
        phone_numbers: local
            .phone
            .iter()
            .map(|p| PhoneNumber {
                value: p.to_string(),
            })
            .collect(),
        email_addresses: local
            .email
            .iter()
            .map(|e| EmailAddress {
                value: e.to_string(),
            })
            .collect(),
        addresses: local
            .address
            .iter()
            .map(|a| PostalAddress {
                formatted_value: Some(a.to_string()),
                street_address: None,
            })
            .collect(),
        ..Default::default()
    }
}

/// Convert a remote contact into a new local contact linked to it.
///
/// Returns `None` when the remote contact has no usable name or no
/// resource name. The local last-modified time is the remote update time.
pub fn to_local(remote: &RemoteContact) -> Option<LocalContact> {
    let id = remote.resource_name.clone()?;
    let fields = RemoteFields::extract(remote)?;
    let last_modified = remote.update_time().unwrap_or_else(Utc::now);

    Some(
        LocalContact::new(fields.name)
            .with_phone(fields.phone.into_option())
            .with_email(fields.email.into_option())
            .with_address(fields.address.into_option())
            .with_remote_id(Some(id))
            .with_last_modified(last_modified),
    )
}

/// Overwrite the synchronized fields of `local` with those of `remote`.
///
/// The note, tags, meetings and remote identifier of the local record are
/// kept. Returns `None` when the remote contact has no usable name.
pub fn pull_into(
    local: &LocalContact,
    remote: &RemoteContact,
    update_time: DateTime<Utc>,
) -> Option<LocalContact> {
    let fields = RemoteFields::extract(remote)?;

    let mut pulled = local.clone();
    pulled.name = fields.name;
    pulled.phone = fields.phone.into_option();
    pulled.email = fields.email.into_option();
    pulled.address = fields.address.into_option();
    pulled.last_modified = update_time;
    Some(pulled)
}

/// Fill fields missing from an update payload from the existing remote
/// record, so that an update never clears a value the local side does not
/// hold. The existing etag is carried over.
pub fn backfill_from(payload: &mut RemoteContact, existing: &RemoteContact) {
    if payload.phone_numbers.is_empty() {
        payload.phone_numbers = existing.phone_numbers.clone();
    }
    if payload.email_addresses.is_empty() {
        payload.email_addresses = existing.email_addresses.clone();
    }
    if payload.addresses.is_empty() {
        payload.addresses = existing.addresses.clone();
    }
    payload.etag = existing.etag.clone();
    payload.metadata = existing.metadata.clone();
}
