//! Change records handed to the downstream batch engine

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::change::ChangeKind;
use super::entry::Entry;
use super::reference::MemberReference;
use crate::constants::DN_PROPERTY;

/// What a change record carries about its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RecordPayload {
    /// Identifier-only propagation; the consumer re-reads the entry itself.
    Properties(BTreeMap<String, String>),
    /// Snapshot of every attribute captured when the record was built.
    FullEntry(Entry),
}

/// Unit of work for the downstream engine, consumed exactly once by a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub target_dn: String,
    pub change_type: ChangeKind,
    pub payload: RecordPayload,
    pub change_time: DateTime<Utc>,
}

impl ChangeRecord {
    /// Record carrying only the member DN as the `DN` property.
    #[must_use]
    pub fn for_reference(reference: &MemberReference, change_time: DateTime<Utc>) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(DN_PROPERTY.to_string(), reference.as_str().to_string());
        Self {
            target_dn: reference.as_str().to_string(),
            change_type: ChangeKind::Modify,
            payload: RecordPayload::Properties(properties),
            change_time,
        }
    }

    /// Record carrying a fetched snapshot of the member entry.
    #[must_use]
    pub fn for_entry(
        reference: &MemberReference,
        entry: Entry,
        change_time: DateTime<Utc>,
    ) -> Self {
        Self {
            target_dn: reference.as_str().to_string(),
            change_type: ChangeKind::Modify,
            payload: RecordPayload::FullEntry(entry),
            change_time,
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        match &self.payload {
            RecordPayload::Properties(properties) => properties.get(name).map(String::as_str),
            RecordPayload::FullEntry(_) => None,
        }
    }

    /// The `DN` property of an identifier-only record.
    #[must_use]
    pub fn dn_property(&self) -> Option<&str> {
        self.property(DN_PROPERTY)
    }

    #[must_use]
    pub const fn full_entry(&self) -> Option<&Entry> {
        match &self.payload {
            RecordPayload::FullEntry(entry) => Some(entry),
            RecordPayload::Properties(_) => None,
        }
    }
}
