//! Common types used throughout peoplesync.
//!
//! Each contact field is a validated newtype. A field that has no value is
//! modeled as `Option<T>` by the owning record; the `ABSENT` text constants
//! are only used when rendering such a field for display.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

use crate::{Error, Result};

macro_rules! string_newtype {
    ($name:ident) => {
        impl $name {
            /// Get the inner string value.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.0
            }
        }
    };
}

/// Identifier assigned by the remote directory (a People resource name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteId(String);

impl RemoteId {
    /// Create a new RemoteId from a string.
    ///
    /// # Errors
    /// - Returns error if id is empty
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidInput(
                "RemoteId cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    fn parse(id: &str) -> Result<Self> {
        Self::new(id)
    }
}

string_newtype!(RemoteId);

/// Full name of a contact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContactName(String);

impl ContactName {
    /// Names start with an alphanumeric character and contain only
    /// alphanumerics and spaces.
    pub fn is_valid(value: &str) -> bool {
        let mut chars = value.chars();
        match chars.next() {
            Some(first) if first.is_alphanumeric() => {
                chars.all(|c| c.is_alphanumeric() || c == ' ')
            }
            _ => false,
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        if !Self::is_valid(value) {
            return Err(Error::Validation(format!(
                "Name '{}' should only contain alphanumeric characters and spaces",
                value
            )));
        }
        Ok(Self(value.to_string()))
    }
}

string_newtype!(ContactName);

/// Phone number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Display text for a contact without a phone number.
    pub const ABSENT: &'static str = "No Phone Number";

    /// Phone numbers are at least 3 digits long.
    pub fn is_valid(value: &str) -> bool {
        value.len() >= 3 && value.chars().all(|c| c.is_ascii_digit())
    }

    pub fn parse(value: &str) -> Result<Self> {
        if !Self::is_valid(value) {
            return Err(Error::Validation(format!(
                "Phone '{}' should only contain numbers and be at least 3 digits long",
                value
            )));
        }
        Ok(Self(value.to_string()))
    }
}

string_newtype!(Phone);

/// Email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Display text for a contact without an email address.
    pub const ABSENT: &'static str = "No Email";

    /// Emails look like `local@domain`, where both parts are non-empty and
    /// made of alphanumerics, `_`, `.`, `-` or `+`.
    pub fn is_valid(value: &str) -> bool {
        let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '+');
        match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && local.chars().all(allowed)
                    && domain.chars().all(allowed)
            }
            None => false,
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        if !Self::is_valid(value) {
            return Err(Error::Validation(format!(
                "Email '{}' should be of the form local-part@domain",
                value
            )));
        }
        Ok(Self(value.to_string()))
    }
}

string_newtype!(Email);

/// Postal address, free text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Display text for a contact without an address.
    pub const ABSENT: &'static str = "No Address";

    /// Addresses can take any value but must not start with whitespace.
    pub fn is_valid(value: &str) -> bool {
        value.chars().next().is_some_and(|c| !c.is_whitespace())
    }

    pub fn parse(value: &str) -> Result<Self> {
        if !Self::is_valid(value) {
            return Err(Error::Validation(
                "Address can take any value but must not be blank".to_string(),
            ));
        }
        Ok(Self(value.to_string()))
    }
}

string_newtype!(Address);

/// Tag attached to a contact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    pub fn is_valid(value: &str) -> bool {
        !value.is_empty() && value.chars().all(char::is_alphanumeric)
    }

    pub fn parse(value: &str) -> Result<Self> {
        if !Self::is_valid(value) {
            return Err(Error::Validation(format!(
                "Tag '{}' should be alphanumeric",
                value
            )));
        }
        Ok(Self(value.to_string()))
    }
}

string_newtype!(Tag);

/// Render an optional field, falling back to its absent text.
pub fn display_or<T: fmt::Display>(value: Option<&T>, absent: &str) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| absent.to_string())
}

/// Secret string wrapper that zeroizes on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SensitiveString(String);

impl SensitiveString {
    /// Wrap a secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Get the secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveString([REDACTED; {} chars])", self.0.len())
    }
}
