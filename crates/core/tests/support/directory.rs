//! In-memory directory for testing
//!
//! Serves entries from a map and records every modify request, so tests can
//! check what the pipeline read and wrote without a server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use groupderef_core::{ConnectionError, DirectoryConnection};
use groupderef_domain::{Attribute, Entry, ModifyRequest};
use parking_lot::Mutex;

/// In-memory mock for `DirectoryConnection`.
#[derive(Default)]
pub struct MockDirectory {
    entries: Mutex<HashMap<String, Entry>>,
    modifications: Mutex<Vec<ModifyRequest>>,
    failing_dns: Mutex<Vec<String>>,
    fetches: AtomicUsize,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a person entry with a `cn` attribute.
    pub fn with_person(self, dn: &str, cn: &str) -> Self {
        let entry = Entry::new(dn).with_attribute(Attribute::new("cn", [cn]));
        self.entries.lock().insert(dn.to_string(), entry);
        self
    }

    /// Make every operation against `dn` fail with a server error.
    pub fn failing_for(self, dn: &str) -> Self {
        self.failing_dns.lock().push(dn.to_string());
        self
    }

    pub fn modifications(&self) -> Vec<ModifyRequest> {
        self.modifications.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_failure(&self, dn: &str) -> Result<(), ConnectionError> {
        if self.failing_dns.lock().iter().any(|failing| failing == dn) {
            return Err(ConnectionError::Operation { code: 51, message: "server busy".into() });
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryConnection for MockDirectory {
    async fn fetch_entry(&self, dn: &str) -> Result<Entry, ConnectionError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failure(dn)?;
        self.entries
            .lock()
            .get(dn)
            .cloned()
            .ok_or_else(|| ConnectionError::NoSuchEntry(dn.to_string()))
    }

    async fn modify(&self, request: &ModifyRequest) -> Result<(), ConnectionError> {
        self.check_failure(&request.dn)?;
        self.modifications.lock().push(request.clone());
        Ok(())
    }
}
