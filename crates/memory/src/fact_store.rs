//! Fact store and supersession graph.
//!
//! Maps fact keys to fact records. Records are never deleted: supersession
//! flips `is_valid`, links `superseded_by`, logs a correction, and walks the
//! `derived_facts` graph to flag everything built on the old fact as
//! needing review. Re-writing an existing key replaces the record in place
//! (a new version at the same position).
//!
//! A superseded record is frozen: writes that land on its key are rejected
//! and the record stays invalid. Superseding a key with itself is an
//! in-place correction, so the key stays valid and is never listed as
//! superseded.
//!
//! # Cycles
//!
//! Keyword overlap can make a rewritten key depend on its own previous
//! version, which yields a self-loop in `derived_facts`. The invalidation
//! walk keeps a visited set, so any cycle terminates after each fact has
//! been expanded once.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classify::{self, ConstraintType, MemoryType, Scope};
use crate::dependency::{DependencyPolicy, KeywordOverlap};

/// Value marker written by scenarios to flag a fact as stale in place.
pub const INVALIDATED_MARKER: &str = "[INVALIDATED";

/// A fact with memory type, scope, dependency, and constraint metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub key: String,
    pub value: String,
    pub source: String,
    pub ts: NaiveDateTime,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<String>,
    pub memory_type: MemoryType,
    pub scope: Scope,
    /// Keys this fact was derived from, fixed at creation time.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Keys of later facts that list this one in `depends_on`.
    #[serde(default)]
    pub derived_facts: Vec<String>,
    pub needs_review: bool,
    pub is_constraint: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_type: Option<ConstraintType>,
}

impl Fact {
    /// Create a valid fact, classifying scope, memory type, and constraint
    /// metadata from its text and source. No dependencies.
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        source: &str,
        ts: NaiveDateTime,
    ) -> Self {
        let value = value.into();
        Self {
            key: key.into(),
            scope: classify::infer_scope(&value),
            memory_type: classify::infer_memory_type(source),
            is_constraint: classify::is_constraint(&value, source),
            constraint_type: classify::infer_constraint_type(&value),
            value,
            source: source.to_string(),
            ts,
            is_valid: true,
            superseded_by: None,
            depends_on: Vec::new(),
            derived_facts: Vec::new(),
            needs_review: false,
        }
    }

    /// Whether the value text itself carries the invalidation marker.
    pub fn is_marked_invalidated(&self) -> bool {
        self.value.contains(INVALIDATED_MARKER)
    }
}

/// Append-only record of a supersession, used for rendering only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub old_key: String,
    pub old_value: String,
    pub new_value: String,
    pub ts: NaiveDateTime,
}

/// The stateful core: facts, supersession links, and the dependency graph.
pub struct FactStore {
    /// Records in first-insertion order.
    facts: Vec<Fact>,
    index: HashMap<String, usize>,
    superseded: BTreeSet<String>,
    corrections: Vec<Correction>,
    policy: Box<dyn DependencyPolicy>,
}

impl FactStore {
    /// Create an empty store using keyword-overlap dependency inference.
    pub fn new() -> Self {
        Self::with_policy(Box::new(KeywordOverlap))
    }

    pub fn with_policy(policy: Box<dyn DependencyPolicy>) -> Self {
        Self {
            facts: Vec::new(),
            index: HashMap::new(),
            superseded: BTreeSet::new(),
            corrections: Vec::new(),
            policy,
        }
    }

    /// Swap the dependency policy. Stored dependencies are left as they are.
    pub fn set_policy(&mut self, policy: Box<dyn DependencyPolicy>) {
        self.policy = policy;
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    // ── Mutation ──

    /// Insert or overwrite the fact at `key`, inferring its dependencies
    /// against the currently valid facts. A write to a superseded key is
    /// rejected and the stored record is returned unchanged.
    pub fn write(&mut self, key: &str, value: &str, source: &str, ts: NaiveDateTime) -> &Fact {
        if let Some(idx) = self.frozen_index(key) {
            warn!(key = %key, "Write to superseded key rejected");
            return &self.facts[idx];
        }
        let mut fact = Fact::new(key, value, source, ts);
        fact.depends_on = self.infer_dependencies(value);
        self.insert_linked(fact)
    }

    /// Replace `old_key` with a new fact at `new_key`.
    ///
    /// If `old_key` names a stored fact, it is invalidated, linked to
    /// `new_key`, logged as a correction, and everything derived from it is
    /// flagged for review. The new fact keeps the old fact's memory type.
    /// A missing or unknown `old_key` degrades to a plain [`write`](Self::write).
    ///
    /// When `new_key == old_key` the fact is corrected in place: the
    /// correction and cascade happen, but the key stays valid. A
    /// supersession whose `new_key` is already superseded is rejected as a
    /// whole and the stored record is returned.
    pub fn supersede(
        &mut self,
        new_key: &str,
        value: &str,
        old_key: Option<&str>,
        source: &str,
        ts: NaiveDateTime,
    ) -> &Fact {
        if let Some(idx) = self.frozen_index(new_key) {
            warn!(new = %new_key, "Supersession onto superseded key rejected");
            return &self.facts[idx];
        }

        let mut inherited = None;

        if let Some(old_key) = old_key {
            if let Some(&idx) = self.index.get(old_key) {
                let in_place = old_key == new_key;
                let old = &mut self.facts[idx];
                if !in_place {
                    old.is_valid = false;
                    old.superseded_by = Some(new_key.to_string());
                }
                inherited = Some(old.memory_type);
                let old_value = old.value.clone();

                if !in_place {
                    self.superseded.insert(old_key.to_string());
                }
                let flagged = self.invalidate_dependents(old_key);
                self.corrections.push(Correction {
                    old_key: old_key.to_string(),
                    old_value,
                    new_value: value.to_string(),
                    ts,
                });
                info!(old = %old_key, new = %new_key, flagged, in_place, "Fact superseded");
            } else {
                debug!(old = %old_key, new = %new_key, "Superseded key not in store, writing as new fact");
            }
        }

        let mut fact = Fact::new(new_key, value, source, ts);
        if let Some(memory_type) = inherited {
            fact.memory_type = memory_type;
        }
        fact.depends_on = self.infer_dependencies(value);
        self.insert_linked(fact)
    }

    /// Install a fact from an initial snapshot as-is, without dependency
    /// inference.
    pub fn install(&mut self, fact: Fact) {
        self.upsert(fact);
    }

    /// Drop everything. The dependency policy is kept.
    pub fn clear(&mut self) {
        self.facts.clear();
        self.index.clear();
        self.superseded.clear();
        self.corrections.clear();
    }

    // ── Queries ──

    pub fn get(&self, key: &str) -> Option<&Fact> {
        self.index.get(key).map(|&idx| &self.facts[idx])
    }

    /// All records, valid or not, in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn valid_facts(&self) -> Vec<&Fact> {
        self.facts.iter().filter(|f| f.is_valid).collect()
    }

    pub fn constraints(&self) -> Vec<&Fact> {
        self.facts
            .iter()
            .filter(|f| f.is_valid && f.is_constraint)
            .collect()
    }

    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    /// Keys that have been superseded, sorted.
    pub fn superseded_keys(&self) -> &BTreeSet<String> {
        &self.superseded
    }

    // ── Internals ──

    fn infer_dependencies(&self, value: &str) -> Vec<String> {
        let valid = self.valid_facts();
        self.policy.infer(value, &valid)
    }

    /// Position of a stored record that has been invalidated.
    fn frozen_index(&self, key: &str) -> Option<usize> {
        self.index
            .get(key)
            .copied()
            .filter(|&idx| !self.facts[idx].is_valid)
    }

    fn upsert(&mut self, fact: Fact) -> usize {
        match self.index.get(&fact.key) {
            Some(&idx) => {
                self.facts[idx] = fact;
                idx
            }
            None => {
                let idx = self.facts.len();
                self.index.insert(fact.key.clone(), idx);
                self.facts.push(fact);
                idx
            }
        }
    }

    /// Store `fact` and register it in the `derived_facts` of each
    /// dependency. Registration happens after the store, so a key that
    /// depends on its own previous version gets a self-loop.
    fn insert_linked(&mut self, fact: Fact) -> &Fact {
        let key = fact.key.clone();
        let deps = fact.depends_on.clone();
        let idx = self.upsert(fact);

        for dep in &deps {
            if let Some(&dep_idx) = self.index.get(dep) {
                self.facts[dep_idx].derived_facts.push(key.clone());
            }
        }

        debug!(key = %key, deps = deps.len(), "Fact written");
        &self.facts[idx]
    }

    /// Depth-first walk over `derived_facts` from `root`, setting
    /// `needs_review` on every reachable fact. Returns how many facts were
    /// newly flagged.
    fn invalidate_dependents(&mut self, root: &str) -> usize {
        let mut visited: HashSet<String> = HashSet::from([root.to_string()]);
        let mut stack = vec![root.to_string()];
        let mut flagged = 0;

        while let Some(key) = stack.pop() {
            let Some(&idx) = self.index.get(&key) else {
                continue;
            };
            let derived = self.facts[idx].derived_facts.clone();
            for child in derived {
                let Some(&child_idx) = self.index.get(&child) else {
                    continue;
                };
                let target = &mut self.facts[child_idx];
                if !target.needs_review {
                    target.needs_review = true;
                    flagged += 1;
                }
                if visited.insert(child.clone()) {
                    stack.push(child);
                } else {
                    debug!(key = %child, "Already walked, skipping");
                }
            }
        }

        flagged
    }
}

impl Default for FactStore {
    fn default() -> Self {
        Self::new()
    }
}
