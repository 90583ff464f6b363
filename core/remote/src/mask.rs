//! Field masks for contact updates.

use std::fmt;

/// A person field that an update may overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonField {
    Names,
    EmailAddresses,
    Addresses,
    PhoneNumbers,
}

impl PersonField {
    /// Wire name used in `updatePersonFields`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonField::Names => "names",
            PersonField::EmailAddresses => "emailAddresses",
            PersonField::Addresses => "addresses",
            PersonField::PhoneNumbers => "phoneNumbers",
        }
    }
}

/// Set of fields an update is allowed to overwrite remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMask(Vec<PersonField>);

impl UpdateMask {
    /// The mask sync uses for every update: exactly the four contact fields.
    pub fn contact_fields() -> Self {
        Self(vec![
            PersonField::Names,
            PersonField::EmailAddresses,
            PersonField::Addresses,
            PersonField::PhoneNumbers,
        ])
    }

    /// Build a mask from arbitrary fields.
    pub fn from_fields(fields: Vec<PersonField>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &[PersonField] {
        &self.0
    }

    pub fn contains(&self, field: PersonField) -> bool {
        self.0.contains(&field)
    }

    /// Whether this mask covers exactly the contact fields, in any order.
    pub fn is_contact_fields(&self) -> bool {
        let expected = Self::contact_fields();
        self.0.len() == expected.0.len() && expected.0.iter().all(|f| self.contains(*f))
    }
}

impl fmt::Display for UpdateMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(PersonField::as_str).collect();
        write!(f, "{}", names.join(","))
    }
}
