//! Append-only audit trail for dispatch attempts.
//!
//! Entries live in a bounded in-memory ring buffer: at capacity the oldest
//! entry is evicted. Appends happen under a short-lived mutex after each
//! dispatch completes, so insertion order is completion order, not arrival
//! order. Entries are never mutated after creation.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::permissions::Role;

/// Default ring-buffer capacity.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default number of entries returned by a listing.
pub const DEFAULT_LISTING_LIMIT: usize = 100;

/// Server-side cap on a caller-supplied listing limit.
pub const MAX_LISTING_LIMIT: usize = 500;

/// One recorded dispatch attempt.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuditEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub tool: String,
    pub input: Value,
    pub success: bool,
    pub user: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// Clone-able handle to the shared audit ring buffer.
#[derive(Clone)]
pub struct AuditLog {
    entries: Arc<Mutex<VecDeque<AuditEntry>>>,
    capacity: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an entry, evicting the oldest one at capacity.
    pub fn record(&self, entry: AuditEntry) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// The most recent `limit` entries in insertion order (oldest of the
    /// window first). `limit` is clamped to `[1, MAX_LISTING_LIMIT]`.
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let limit = limit.clamp(1, MAX_LISTING_LIMIT);
        let entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
