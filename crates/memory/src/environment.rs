//! Environment layer: a small freshness-ordered map of real-time signals.
//!
//! Last write wins, but only when the incoming timestamp is not older than
//! the stored one. An explicit `supersedes` reference removes the named key
//! outright, whatever its timestamp. When the layer grows past capacity,
//! the entry with the oldest timestamp is evicted unless it is the entry
//! just written.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const ENVIRONMENT_CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
    /// Timestamp of the last accepted write.
    pub ts: NaiveDateTime,
}

/// What happened to a single environment write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvWrite {
    /// The value was stored.
    Installed { evicted: Option<String> },
    /// A newer value was already stored; the write was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct Environment {
    /// Entries in first-insertion order; ties on timestamp resolve by it.
    entries: Vec<EnvEntry>,
    capacity: usize,
}

impl Environment {
    pub fn new() -> Self {
        Self::with_capacity(ENVIRONMENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Apply a write with freshness and supersession rules.
    pub fn write(
        &mut self,
        key: &str,
        value: &str,
        ts: NaiveDateTime,
        supersedes: Option<&str>,
    ) -> EnvWrite {
        if let Some(old) = supersedes {
            self.entries.retain(|e| e.key != old);
        }

        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(existing) if existing.ts > ts => {
                debug!(key = %key, stored = %existing.ts, incoming = %ts, "Dropping stale environment write");
                return EnvWrite::Stale;
            }
            Some(existing) => {
                existing.value = value.to_string();
                existing.ts = ts;
            }
            None => self.entries.push(EnvEntry {
                key: key.to_string(),
                value: value.to_string(),
                ts,
            }),
        }

        EnvWrite::Installed {
            evicted: self.enforce_capacity(key),
        }
    }

    /// Install a snapshot entry with the oldest possible timestamp, so any
    /// later write replaces it. Snapshot entries are never evicted on
    /// install; a snapshot larger than the capacity shrinks by one entry per
    /// later write.
    pub fn install_initial(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(existing) => {
                existing.value = value.to_string();
                existing.ts = NaiveDateTime::MIN;
            }
            None => self.entries.push(EnvEntry {
                key: key.to_string(),
                value: value.to_string(),
                ts: NaiveDateTime::MIN,
            }),
        }
    }

    fn enforce_capacity(&mut self, just_written: &str) -> Option<String> {
        if self.entries.len() <= self.capacity {
            return None;
        }
        let oldest = self
            .entries
            .iter()
            .enumerate()
            .min_by(|(ia, a), (ib, b)| a.ts.cmp(&b.ts).then(ia.cmp(ib)))
            .map(|(idx, _)| idx)?;
        if self.entries[oldest].key == just_written {
            return None;
        }
        let evicted = self.entries.remove(oldest);
        debug!(key = %evicted.key, "Evicted oldest environment entry");
        Some(evicted.key)
    }

    pub fn get(&self, key: &str) -> Option<&EnvEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Up to `limit` entries, newest timestamp first. Ties keep
    /// first-insertion order.
    pub fn freshest(&self, limit: usize) -> Vec<&EnvEntry> {
        let mut sorted: Vec<&EnvEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.ts.cmp(&a.ts));
        sorted.truncate(limit);
        sorted
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
