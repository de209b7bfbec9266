//! Shared helpers for infra integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use groupderef_core::{ConnectionError, DirectoryConnection};
use groupderef_domain::{Attribute, ChangeEvent, Entry, ModifyRequest};
use parking_lot::Mutex;

/// In-memory directory recording every modify request.
#[derive(Default)]
pub struct MockDirectory {
    entries: Mutex<HashMap<String, Entry>>,
    modifications: Mutex<Vec<ModifyRequest>>,
    unreachable: Mutex<Vec<String>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_people(self, dns: &[&str]) -> Self {
        {
            let mut entries = self.entries.lock();
            for dn in dns {
                let entry = Entry::new(*dn)
                    .with_attribute(Attribute::new("objectClass", ["top", "person"]))
                    .with_attribute(Attribute::new("cn", [*dn]));
                entries.insert((*dn).to_string(), entry);
            }
        }
        self
    }

    /// Fail every request for `dn` as if the server were down.
    pub fn unreachable_for(self, dn: &str) -> Self {
        self.unreachable.lock().push(dn.to_string());
        self
    }

    pub fn modified_dns(&self) -> Vec<String> {
        self.modifications.lock().iter().map(|request| request.dn.clone()).collect()
    }

    fn check(&self, dn: &str) -> Result<(), ConnectionError> {
        if self.unreachable.lock().iter().any(|failing| failing == dn) {
            return Err(ConnectionError::Timeout(Duration::from_secs(30)));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryConnection for MockDirectory {
    async fn fetch_entry(&self, dn: &str) -> Result<Entry, ConnectionError> {
        self.check(dn)?;
        self.entries
            .lock()
            .get(dn)
            .cloned()
            .ok_or_else(|| ConnectionError::NoSuchEntry(dn.to_string()))
    }

    async fn modify(&self, request: &ModifyRequest) -> Result<(), ConnectionError> {
        self.check(&request.dn)?;
        self.modifications.lock().push(request.clone());
        Ok(())
    }
}

/// A group added with the given members.
pub fn group_added(members: &[&str]) -> ChangeEvent {
    ChangeEvent::add(
        "cn=engineering,ou=groups,dc=example,dc=com",
        vec![
            Attribute::new("objectClass", ["groupOfNames"]),
            Attribute::new("member", members.iter().copied()),
        ],
    )
}

/// Poll `condition` on tokio's clock until it holds.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    while !condition() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
