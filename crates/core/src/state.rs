//! State snapshot types for the four-layer context architecture.
//!
//! 1. **Identity & Role**: who the human is and their authority
//! 2. **Persistent Facts**: decisions, preferences, constraints
//! 3. **Working Set**: current objective, artifacts, open questions
//! 4. **Environment**: calendar, deadlines, "now"
//!
//! A timeline starts from an [`InitialState`] built from these types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Layer 1: identity and role of the human the agent works for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRole {
    pub user_name: String,
    /// Role or authority level (e.g., Director, Manager, IC).
    pub authority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_style: Option<String>,
}

/// Origin of a persistent fact in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactSource {
    User,
    Policy,
    Decision,
    Preference,
    System,
    Commitment,
}

impl FactSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactSource::User => "user",
            FactSource::Policy => "policy",
            FactSource::Decision => "decision",
            FactSource::Preference => "preference",
            FactSource::System => "system",
            FactSource::Commitment => "commitment",
        }
    }
}

/// Layer 2: a single persistent fact as it appears in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentFact {
    pub key: String,
    pub value: String,
    pub source: FactSource,
    pub ts: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<String>,
    #[serde(default = "default_true")]
    pub is_valid: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkingItemType {
    Objective,
    Artifact,
    Question,
    PendingAction,
    Context,
}

/// Layer 3: an item in the active working set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingSetItem {
    pub item_type: WorkingItemType,
    pub content: String,
    pub ts: NaiveDateTime,
    #[serde(default)]
    pub priority: i32,
}

/// State at the start of a timeline, consumed once before any event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialState {
    pub identity_role: IdentityRole,
    #[serde(default)]
    pub persistent_facts: Vec<PersistentFact>,
    #[serde(default)]
    pub working_set: Vec<WorkingSetItem>,
    /// Layer 4: environment signals (e.g., `"now"`), in document order.
    #[serde(default, with = "ordered_pairs")]
    pub environment: Vec<(String, String)>,
}

/// A JSON object read as key/value pairs without reordering. Duplicate
/// keys keep their first position and take the last value.
mod ordered_pairs {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(pairs: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(pairs.len()))?;
        for (key, value) in pairs {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(PairsVisitor)
    }

    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of string values")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut pairs: Vec<(String, String)> =
                Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, value)) = access.next_entry::<String, String>()? {
                match pairs.iter_mut().find(|(k, _)| *k == key) {
                    Some(existing) => existing.1 = value,
                    None => pairs.push((key, value)),
                }
            }
            Ok(pairs)
        }
    }
}
