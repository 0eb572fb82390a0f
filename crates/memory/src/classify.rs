//! Classification heuristics over free text.
//!
//! Pure, total functions: every input, including empty or non-ASCII text,
//! yields a classification. These are reference heuristics; their false
//! positives are part of the contract and must not be "fixed".

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Breadth of applicability of a fact or utterance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    Global,
    Task,
    Hypothetical,
    Draft,
    Session,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Task => "task",
            Scope::Hypothetical => "hypothetical",
            Scope::Draft => "draft",
            Scope::Session => "session",
        }
    }
}

/// Tri-partite memory classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// Preferences, corrections, decisions.
    #[default]
    User,
    /// Learned patterns and heuristics.
    Capability,
    /// Policies, system data, documents.
    Organizational,
}

impl MemoryType {
    /// Abbreviated label used in rendered context.
    pub fn label(&self) -> &'static str {
        match self {
            MemoryType::User => "usr",
            MemoryType::Capability => "cap",
            MemoryType::Organizational => "org",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    Budget,
    Deadline,
    Capacity,
    Policy,
}

impl ConstraintType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintType::Budget => "budget",
            ConstraintType::Deadline => "deadline",
            ConstraintType::Capacity => "capacity",
            ConstraintType::Policy => "policy",
        }
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Marker tables ─────────────────────────────────────────────────────────

const HYPOTHETICAL_MARKERS: &[&str] = &[
    "what if",
    "hypothetically",
    "suppose",
    "imagine",
    "let's say",
    "in theory",
    "potentially",
];

const DRAFT_MARKERS: &[&str] = &[
    "draft",
    "preliminary",
    "not final",
    "pending",
    "proposal",
    "tentative",
];

const TASK_MARKERS: &[&str] = &["for this task", "for this project", "just for this", "only for"];

const ORGANIZATIONAL_SOURCES: &[&str] = &[
    "policy",
    "finance_system",
    "hr_system",
    "calendar_system",
    "inventory_system",
    "crm_system",
    "erp_system",
    "document",
    "sharepoint",
    "confluence",
    "database",
];

const CAPABILITY_SOURCES: &[&str] = &["observation", "pattern", "heuristic", "strategy"];

/// Conversational markers that disqualify a statement as a constraint.
/// Matched case-sensitively against the raw text.
const SOFT_MARKERS: &[&str] = &[
    "INVALIDATED",
    "CORRECTION",
    "delayed",
    "changed",
    "let's go with",
    "just fyi",
    "btw",
    "hold on",
    "wait",
    "best we can do",
    "fine,",
    "bad news",
    "good news",
];

const FORMAL_MARKERS: &[&str] = &[
    "must",
    "require",
    "policy",
    "limit is",
    "maximum is",
    "minimum is",
    "cannot exceed",
    "not allowed",
    "prohibited",
    "mandatory",
    "approval required",
    "needs approval",
    "authority to",
];

const BUDGET_MARKERS: &[&str] = &["budget", "$", "cost", "price", "spend"];
const DEADLINE_MARKERS: &[&str] = &["deadline", "due", "by", "before", "until"];
const CAPACITY_MARKERS: &[&str] = &["capacity", "available", "team", "resource", "hours"];
const GOVERNANCE_MARKERS: &[&str] = &["policy", "require", "must", "approval", "authority"];

const UNKNOWN_MARKERS: &[&str] = &["need info", "don't know", "not sure", "find out"];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

// ── Heuristics ────────────────────────────────────────────────────────────

/// Infer scope from text. Hypothetical beats draft beats task.
pub fn infer_scope(text: &str) -> Scope {
    let lower = text.to_lowercase();
    if contains_any(&lower, HYPOTHETICAL_MARKERS) {
        Scope::Hypothetical
    } else if contains_any(&lower, DRAFT_MARKERS) {
        Scope::Draft
    } else if contains_any(&lower, TASK_MARKERS) {
        Scope::Task
    } else {
        Scope::Global
    }
}

/// Classify a fact by the name of its source.
pub fn infer_memory_type(source: &str) -> MemoryType {
    if ORGANIZATIONAL_SOURCES.contains(&source) {
        MemoryType::Organizational
    } else if CAPABILITY_SOURCES.contains(&source) {
        MemoryType::Capability
    } else {
        MemoryType::User
    }
}

/// Whether a statement is a formal constraint rather than a casual mention.
pub fn is_constraint(value: &str, source: &str) -> bool {
    if contains_any(value, SOFT_MARKERS) {
        return false;
    }
    if source == "policy" {
        return true;
    }
    contains_any(&value.to_lowercase(), FORMAL_MARKERS)
}

/// Keyword-bucket constraint category, first bucket wins.
pub fn infer_constraint_type(value: &str) -> Option<ConstraintType> {
    let lower = value.to_lowercase();
    if contains_any(&lower, BUDGET_MARKERS) {
        Some(ConstraintType::Budget)
    } else if contains_any(&lower, DEADLINE_MARKERS) {
        Some(ConstraintType::Deadline)
    } else if contains_any(&lower, CAPACITY_MARKERS) {
        Some(ConstraintType::Capacity)
    } else if contains_any(&lower, GOVERNANCE_MARKERS) {
        Some(ConstraintType::Policy)
    } else {
        None
    }
}

/// Whether a conversational turn raises an open question.
pub fn is_known_unknown(text: &str) -> bool {
    text.contains('?') || contains_any(&text.to_lowercase(), UNKNOWN_MARKERS)
}

/// Lowercased alphanumeric keywords of at least three characters.
/// Underscores separate words, so fact keys tokenize like prose.
pub fn extract_keywords(text: &str) -> HashSet<String> {
    text.replace('_', " ")
        .split_whitespace()
        .filter_map(|raw| {
            let cleaned: String = raw
                .to_lowercase()
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect();
            (cleaned.chars().count() >= 3).then_some(cleaned)
        })
        .collect()
}
