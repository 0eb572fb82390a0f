//! Timeline events: the input stream a memory strategy consumes.
//!
//! A timeline is an ordered list of events. Four kinds exist:
//! conversational turns, explicit state writes, supersessions (writes that
//! invalidate a named prior fact), and queries carrying ground truth for the
//! external judge.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Who produced a conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Display label used when replaying turns ("User", "Assistant").
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Assistant => "Assistant",
        }
    }
}

/// Which state layer a write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    PersistentFacts,
    WorkingSet,
    Environment,
}

/// A single state write operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Write {
    pub layer: Layer,
    pub key: String,
    pub value: String,
    /// Key this write replaces, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub ts: NaiveDateTime,
    pub speaker: Speaker,
    pub text: String,
}

/// Establishes facts or environment signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateWrite {
    pub ts: NaiveDateTime,
    pub writes: Vec<Write>,
}

/// Declares that each write's `supersedes` key is no longer true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supersession {
    pub ts: NaiveDateTime,
    pub writes: Vec<Write>,
}

/// Expected answer shape for a query. Only the external judge reads this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundTruth {
    pub decision: String,
    #[serde(default)]
    pub must_mention: Vec<String>,
    #[serde(default)]
    pub must_not_mention: Vec<String>,
    #[serde(default = "default_allowed_sources")]
    pub allowed_sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

fn default_allowed_sources() -> Vec<String> {
    vec!["persistent_facts".into(), "environment".into()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub ts: NaiveDateTime,
    pub prompt: String,
    pub ground_truth: GroundTruth,
}

/// All timeline events, tagged by `"type"` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ConversationTurn(ConversationTurn),
    StateWrite(StateWrite),
    Supersession(Supersession),
    Query(Query),
}

impl Event {
    /// Timestamp of the event, whatever its kind.
    pub fn ts(&self) -> NaiveDateTime {
        match self {
            Event::ConversationTurn(e) => e.ts,
            Event::StateWrite(e) => e.ts,
            Event::Supersession(e) => e.ts,
            Event::Query(e) => e.ts,
        }
    }

    /// Short kind name, matching the wire tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ConversationTurn(_) => "conversation_turn",
            Event::StateWrite(_) => "state_write",
            Event::Supersession(_) => "supersession",
            Event::Query(_) => "query",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_turn_parses_from_tagged_json() {
        let json = r#"{"type":"conversation_turn","ts":"2025-12-21T09:00:00","speaker":"user","text":"hello"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        match &event {
            Event::ConversationTurn(turn) => {
                assert_eq!(turn.speaker, Speaker::User);
                assert_eq!(turn.text, "hello");
            }
            _ => panic!("Expected ConversationTurn"),
        }
        assert_eq!(event.kind(), "conversation_turn");
    }

    #[test]
    fn supersession_write_carries_prior_key() {
        let json = r#"{
            "type": "supersession",
            "ts": "2025-12-21T10:30:00",
            "writes": [{"layer": "persistent_facts", "key": "po_v2", "value": "cancelled", "supersedes": "po"}]
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        let Event::Supersession(s) = event else {
            panic!("Expected Supersession");
        };
        assert_eq!(s.writes[0].layer, Layer::PersistentFacts);
        assert_eq!(s.writes[0].supersedes.as_deref(), Some("po"));
    }

    #[test]
    fn ground_truth_defaults_allowed_sources() {
        let json = r#"{"type":"query","ts":"2025-12-21T11:00:00","prompt":"Can I proceed?","ground_truth":{"decision":"no"}}"#;
        let Event::Query(q) = serde_json::from_str::<Event>(json).unwrap() else {
            panic!("Expected Query");
        };
        assert_eq!(q.ground_truth.allowed_sources, vec!["persistent_facts", "environment"]);
        assert!(q.ground_truth.must_mention.is_empty());
    }

    #[test]
    fn event_serialization_keeps_type_tag() {
        let event = Event::StateWrite(StateWrite {
            ts: "2025-12-21T09:00:00".parse().unwrap(),
            writes: vec![],
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"state_write""#));
    }

    #[test]
    fn speaker_labels_are_capitalized() {
        assert_eq!(Speaker::User.label(), "User");
        assert_eq!(Speaker::Assistant.label(), "Assistant");
    }
}
