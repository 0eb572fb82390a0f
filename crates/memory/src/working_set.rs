//! Working set: a capped recency buffer of conversational snippets.
//!
//! Every conversational turn lands here tagged with its inferred scope.
//! The buffer is a strict FIFO: once the capacity is exceeded the oldest
//! items fall off silently. Turns that raise open questions are also
//! tracked as known unknowns, so the model can say "not provided" instead
//! of inventing an answer.

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::classify::Scope;

pub const DEFAULT_WORKING_SET_SIZE: usize = 10;

/// A single snippet in the working set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingItem {
    pub content: String,
    pub ts: NaiveDateTime,
    pub scope: Scope,
}

impl WorkingItem {
    /// Bracketed scope tag shown before the content, if any.
    pub fn tag(&self) -> Option<&'static str> {
        match self.scope {
            Scope::Hypothetical => Some("[HYPOTHETICAL]"),
            Scope::Draft => Some("[DRAFT]"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkingSet {
    items: VecDeque<WorkingItem>,
    capacity: usize,
}

impl WorkingSet {
    /// Create an empty working set. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append an item, dropping from the front to stay within capacity.
    pub fn push(&mut self, content: impl Into<String>, ts: NaiveDateTime, scope: Scope) {
        self.items.push_back(WorkingItem {
            content: content.into(),
            ts,
            scope,
        });
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &WorkingItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Default for WorkingSet {
    fn default() -> Self {
        Self::new(DEFAULT_WORKING_SET_SIZE)
    }
}

/// Open questions raised during the conversation, keyed by turn text.
#[derive(Debug, Clone, Default)]
pub struct KnownUnknowns {
    entries: Vec<(String, NaiveDateTime)>,
}

impl KnownUnknowns {
    /// Record a question. Repeating the same text refreshes its timestamp.
    pub fn record(&mut self, text: &str, ts: NaiveDateTime) {
        match self.entries.iter_mut().find(|(t, _)| t == text) {
            Some(entry) => entry.1 = ts,
            None => self.entries.push((text.to_string(), ts)),
        }
    }

    /// Question texts, most recent first. Ties keep first-recorded order.
    pub fn most_recent_first(&self) -> Vec<&str> {
        let mut sorted: Vec<&(String, NaiveDateTime)> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.into_iter().map(|(t, _)| t.as_str()).collect()
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
