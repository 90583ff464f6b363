//! Equivalence between a local and a remote contact of the same name.

use peoplesync_contacts::LocalContact;
use peoplesync_remote::RemoteContact;

/// Whether `local` and `remote` describe the same person.
///
/// Display names must match exactly. Phone, email and address each agree
/// when both sides lack the field or both hold the same text. Used only to
/// decide whether two same-name records may be linked without creating a
/// copy on either side.
pub fn equivalent(local: &LocalContact, remote: &RemoteContact) -> bool {
    remote.display_name().as_deref() == Some(local.display_name())
        && field_agrees(local.phone.as_ref().map(|p| p.as_str()), remote.phone())
        && field_agrees(local.email.as_ref().map(|e| e.as_str()), remote.email())
        && field_agrees(local.address.as_ref().map(|a| a.as_str()), remote.address())
}

fn field_agrees(local: Option<&str>, remote: Option<&str>) -> bool {
    local == remote
}

#[cfg(test)]
mod tests {
    use super::*;
    use peoplesync_common::{Address, ContactName, Email, Phone};
    use peoplesync_remote::{EmailAddress, Name, PhoneNumber, PostalAddress};

    fn local() -> LocalContact {
        LocalContact::new(ContactName::parse("Alex Yeoh").unwrap())
            .with_phone(Some(Phone::parse("87438807").unwrap()))
    }

    fn remote() -> RemoteContact {
        RemoteContact {
            names: vec![Name {
                given_name: Some("Alex".to_string()),
                family_name: Some("Yeoh".to_string()),
            }],
            phone_numbers: vec![PhoneNumber {
                value: "87438807".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_matching_contacts() {
        assert!(equivalent(&local(), &remote()));
    }

    #[test]
    fn test_name_mismatch() {
        let mut other = remote();
        other.names[0].family_name = None;
        assert!(!equivalent(&local(), &other));
    }

    #[test]
    fn test_field_present_on_one_side_only() {
        let with_email = local().with_email(Some(Email::parse("alex@example.com").unwrap()));
        assert!(!equivalent(&with_email, &remote()));

        let mut with_address = remote();
        with_address.addresses = vec![PostalAddress {
            formatted_value: Some("Blk 30".to_string()),
            street_address: Some("Blk 30".to_string()),
        }];
        assert!(!equivalent(&local(), &with_address));
    }

    #[test]
    fn test_field_values_differ() {
        let mut other = remote();
        other.phone_numbers[0].value = "99272758".to_string();
        assert!(!equivalent(&local(), &other));
    }

    #[test]
    fn test_all_fields_present() {
        let full = local()
            .with_email(Some(Email::parse("alex@example.com").unwrap()))
            .with_address(Some(Address::parse("Blk 30").unwrap()));
        let mut other = remote();
        other.email_addresses = vec![EmailAddress {
            value: "alex@example.com".to_string(),
        }];
        other.addresses = vec![PostalAddress {
            formatted_value: None,
            street_address: Some("Blk 30".to_string()),
        }];
        assert!(equivalent(&full, &other));
    }
}
