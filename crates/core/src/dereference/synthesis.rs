//! Build an entry snapshot from the change alone

use groupderef_domain::{ChangeDetail, ChangeEvent, Entry, ModificationKind};

/// Entry content implied by `event`, for hosts that hand a record downstream
/// without reading the source.
///
/// - Add: the added attributes
/// - Modify: the attributes of every modification that is not a delete
/// - Delete and Rename: `None`
pub fn synthesize_entry(event: &ChangeEvent) -> Option<Entry> {
    let mut entry = Entry::new(event.target_dn.clone());

    match &event.detail {
        ChangeDetail::Add { attributes } => {
            for attribute in attributes {
                entry.add_attribute(attribute.clone());
            }
        }
        ChangeDetail::Modify { modifications } => {
            for modification in modifications.iter().filter(|m| m.kind != ModificationKind::Delete) {
                entry.add_attribute(modification.to_attribute());
            }
        }
        ChangeDetail::Delete { .. } | ChangeDetail::Rename { .. } => return None,
    }

    Some(entry)
}

#[cfg(test)]
mod tests {
    use groupderef_domain::{Attribute, Modification};

    use super::*;

    #[test]
    fn add_copies_attributes() {
        let event = ChangeEvent::add(
            "uid=a",
            vec![Attribute::new("cn", ["A"]), Attribute::new("mail", ["a@example.com"])],
        );

        let entry = synthesize_entry(&event).unwrap();
        assert_eq!(entry.dn, "uid=a");
        assert_eq!(entry.values("mail"), ["a@example.com".to_string()]);
    }

    #[test]
    fn modify_skips_deletes_and_merges_values() {
        let event = ChangeEvent::modify(
            "uid=a",
            vec![
                Modification::add("mail", ["one@example.com"]),
                Modification::delete("telephoneNumber", ["555"]),
                Modification::replace("mail", ["two@example.com"]),
            ],
        );

        let entry = synthesize_entry(&event).unwrap();
        assert_eq!(entry.values("mail").len(), 2);
        assert!(entry.attribute("telephoneNumber").is_none());
    }

    #[test]
    fn delete_and_rename_yield_nothing() {
        assert!(synthesize_entry(&ChangeEvent::delete("uid=a", vec![])).is_none());
        assert!(synthesize_entry(&ChangeEvent::rename("uid=a", "uid=b")).is_none());
    }
}
