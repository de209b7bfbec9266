//! Change events observed on group entries

use serde::{Deserialize, Serialize};

use super::entry::{Attribute, Entry};
use crate::impl_option_conversions;

/// Kind of change detected on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Modify,
    Delete,
    Rename,
}

impl_option_conversions!(ChangeKind {
    Add => "add",
    Modify => "modify",
    Delete => "delete",
    Rename => "rename" | "modrdn" | "moddn",
});

/// Kind of a single attribute modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModificationKind {
    Add,
    Delete,
    Replace,
}

impl_option_conversions!(ModificationKind {
    Add => "add",
    Delete => "delete",
    Replace => "replace",
});

/// One entry of a modify change: attribute, operation and values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    pub attribute: String,
    pub kind: ModificationKind,
    #[serde(default)]
    pub values: Vec<String>,
}

impl Modification {
    pub fn new<A, I, V>(kind: ModificationKind, attribute: A, values: I) -> Self
    where
        A: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self { attribute: attribute.into(), kind, values: values.into_iter().map(Into::into).collect() }
    }

    pub fn add<A: Into<String>, I: IntoIterator<Item = V>, V: Into<String>>(
        attribute: A,
        values: I,
    ) -> Self {
        Self::new(ModificationKind::Add, attribute, values)
    }

    pub fn delete<A: Into<String>, I: IntoIterator<Item = V>, V: Into<String>>(
        attribute: A,
        values: I,
    ) -> Self {
        Self::new(ModificationKind::Delete, attribute, values)
    }

    pub fn replace<A: Into<String>, I: IntoIterator<Item = V>, V: Into<String>>(
        attribute: A,
        values: I,
    ) -> Self {
        Self::new(ModificationKind::Replace, attribute, values)
    }

    /// The modification expressed as an attribute (name plus values).
    #[must_use]
    pub fn to_attribute(&self) -> Attribute {
        Attribute { name: self.attribute.clone(), values: self.values.clone() }
    }
}

/// Write request issued against a directory connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyRequest {
    pub dn: String,
    pub modifications: Vec<Modification>,
}

/// Kind-specific content of a change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChangeDetail {
    /// Attributes of the newly added entry.
    Add { attributes: Vec<Attribute> },
    /// Ordered list of modifications.
    Modify { modifications: Vec<Modification> },
    /// Attributes the entry held before it was deleted.
    Delete { deleted_attributes: Vec<Attribute> },
    /// The entry moved; its content is untouched.
    Rename {
        new_rdn: String,
        #[serde(default)]
        new_superior: Option<String>,
    },
}

/// A change detected by the host engine on a watched entry.
///
/// Owned by the host engine and only read by the dereference pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub target_dn: String,
    pub detail: ChangeDetail,
    /// The entry as currently stored at the source, when the host fetched it.
    /// Whole-group parsing reads membership from here.
    #[serde(default)]
    pub current_entry: Option<Entry>,
}

impl ChangeEvent {
    pub fn add(target_dn: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self::from_detail(target_dn, ChangeDetail::Add { attributes })
    }

    pub fn modify(target_dn: impl Into<String>, modifications: Vec<Modification>) -> Self {
        Self::from_detail(target_dn, ChangeDetail::Modify { modifications })
    }

    pub fn delete(target_dn: impl Into<String>, deleted_attributes: Vec<Attribute>) -> Self {
        Self::from_detail(target_dn, ChangeDetail::Delete { deleted_attributes })
    }

    pub fn rename(target_dn: impl Into<String>, new_rdn: impl Into<String>) -> Self {
        Self::from_detail(target_dn, ChangeDetail::Rename { new_rdn: new_rdn.into(), new_superior: None })
    }

    fn from_detail(target_dn: impl Into<String>, detail: ChangeDetail) -> Self {
        Self { target_dn: target_dn.into(), detail, current_entry: None }
    }

    /// Attach the current source entry (needed for whole-group parsing).
    #[must_use]
    pub fn with_current_entry(mut self, entry: Entry) -> Self {
        self.current_entry = Some(entry);
        self
    }

    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self.detail {
            ChangeDetail::Add { .. } => ChangeKind::Add,
            ChangeDetail::Modify { .. } => ChangeKind::Modify,
            ChangeDetail::Delete { .. } => ChangeKind::Delete,
            ChangeDetail::Rename { .. } => ChangeKind::Rename,
        }
    }
}
