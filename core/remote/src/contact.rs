//! Remote contact representation.
//!
//! Mirrors the subset of the People API `Person` resource that sync reads
//! and writes. Every multi-valued field is treated as a singleton: only the
//! first entry is meaningful, and an empty list means the field is absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use peoplesync_common::RemoteId;

/// Contact as held by the remote directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteContact {
    /// Resource name assigned by the directory (e.g. `people/c123`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<RemoteId>,
    /// Revision tag; updates must carry the current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Server-maintained metadata, including the last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PersonMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<Name>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<PostalAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonMetadata {
    #[serde(default)]
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub update_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
}

impl PostalAddress {
    /// Address text: the parsed street address, or the formatted value when
    /// the directory has not split it out.
    pub fn text(&self) -> Option<&str> {
        self.street_address
            .as_deref()
            .or(self.formatted_value.as_deref())
    }
}

impl RemoteContact {
    /// Display name: the given name, or "given family" when a family name
    /// is present. `None` when the contact has no given name.
    pub fn display_name(&self) -> Option<String> {
        let name = self.names.first()?;
        let given = name.given_name.as_deref()?;
        match name.family_name.as_deref() {
            Some(family) if !family.is_empty() => Some(format!("{} {}", given, family)),
            _ => Some(given.to_string()),
        }
    }

    /// Last update time reported by the directory's primary source.
    pub fn update_time(&self) -> Option<DateTime<Utc>> {
        self.metadata
            .as_ref()
            .and_then(|m| m.sources.first())
            .map(|s| s.update_time)
    }

    /// Replace the primary source update time.
    pub fn set_update_time(&mut self, update_time: DateTime<Utc>) {
        self.metadata = Some(PersonMetadata {
            sources: vec![Source { update_time }],
        });
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone_numbers.first().map(|p| p.value.as_str())
    }

    pub fn email(&self) -> Option<&str> {
        self.email_addresses.first().map(|e| e.value.as_str())
    }

    pub fn address(&self) -> Option<&str> {
        self.addresses.first().and_then(|a| a.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(given: Option<&str>, family: Option<&str>) -> RemoteContact {
        RemoteContact {
            names: vec![Name {
                given_name: given.map(String::from),
                family_name: family.map(String::from),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_display_name_joins_family() {
        assert_eq!(named(Some("Alex"), Some("Yeoh")).display_name().as_deref(), Some("Alex Yeoh"));
        assert_eq!(named(Some("Alex"), None).display_name().as_deref(), Some("Alex"));
        assert_eq!(named(Some("Alex"), Some("")).display_name().as_deref(), Some("Alex"));
    }

    #[test]
    fn test_display_name_missing() {
        assert_eq!(RemoteContact::default().display_name(), None);
        assert_eq!(named(None, Some("Yeoh")).display_name(), None);
    }

    #[test]
    fn test_address_prefers_street_address() {
        let address = PostalAddress {
            formatted_value: Some("Blk 30, Singapore".to_string()),
            street_address: Some("Blk 30".to_string()),
        };
        assert_eq!(address.text(), Some("Blk 30"));

        let formatted_only = PostalAddress {
            formatted_value: Some("Blk 30, Singapore".to_string()),
            street_address: None,
        };
        assert_eq!(formatted_only.text(), Some("Blk 30, Singapore"));
    }

    #[test]
    fn test_people_wire_shape() {
        let json = r#"{
            "resourceName": "people/c42",
            "etag": "%EgUBAi43PRoEAQIFByIMR0xUY3",
            "metadata": {"sources": [{"updateTime": "2017-11-02T10:00:00Z"}]},
            "names": [{"givenName": "Alex", "familyName": "Yeoh"}],
            "phoneNumbers": [{"value": "87438807"}],
            "emailAddresses": [{"value": "alexyeoh@example.com"}]
        }"#;
        let contact: RemoteContact = serde_json::from_str(json).unwrap();

        assert_eq!(contact.resource_name.as_ref().map(|r| r.as_str()), Some("people/c42"));
        assert_eq!(contact.display_name().as_deref(), Some("Alex Yeoh"));
        assert_eq!(contact.phone(), Some("87438807"));
        assert_eq!(contact.email(), Some("alexyeoh@example.com"));
        assert_eq!(contact.address(), None);
        assert!(contact.update_time().is_some());

        let back = serde_json::to_value(&contact).unwrap();
        assert!(back.get("addresses").is_none());
    }
}
