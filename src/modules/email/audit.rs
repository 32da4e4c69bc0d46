use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Durable log of one dispatch attempt. Created with `sent=false` before the
/// transport is invoked, updated once the outcome is known.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EmailAuditRecord {
    /// Recipients after any test-mode substitution, comma-separated
    pub recipients: String,
    pub subject: String,
    pub html_content: String,
    pub text_content: String,
    pub sent: bool,
    pub sent_at: Option<u64>,
    pub test_mode: bool,
}

/// Handle to a persisted audit record, opaque to the dispatcher
pub type AuditHandle = u64;

/// Persistence collaborator for audit records. Records are never deleted.
pub trait AuditStore {
    fn create(&mut self, record: EmailAuditRecord) -> AuditHandle;
    fn update(&mut self, handle: AuditHandle, record: EmailAuditRecord);
}

/// HashMap-backed audit store with sequential handles
pub struct InMemoryAuditStore {
    records: HashMap<AuditHandle, EmailAuditRecord>,
    next_handle: AuditHandle,
}

impl Default for InMemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            next_handle: 1,
        }
    }

    pub fn get(&self, handle: AuditHandle) -> Option<&EmailAuditRecord> {
        self.records.get(&handle)
    }

    pub fn records(&self) -> Vec<&EmailAuditRecord> {
        let mut handles: Vec<_> = self.records.keys().copied().collect();
        handles.sort_unstable();
        handles.iter().map(|h| &self.records[h]).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AuditStore for InMemoryAuditStore {
    fn create(&mut self, record: EmailAuditRecord) -> AuditHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.records.insert(handle, record);
        handle
    }

    fn update(&mut self, handle: AuditHandle, record: EmailAuditRecord) {
        self.records.insert(handle, record);
    }
}
