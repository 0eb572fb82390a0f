//! Timelines: one complete benchmark test case.
//!
//! A timeline bundles a business domain, a benchmark track, the actors, an
//! initial state snapshot, and the ordered events. Timelines are stored as
//! newline-delimited JSON: each non-blank line is one full record.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TimelineError;
use crate::event::{Event, Query, Supersession};
use crate::state::InitialState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Procurement,
    Sales,
    Project,
    Hr,
    Support,
}

/// Benchmark track a timeline belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Supersession,
    CommitmentDurability,
    InterruptionResumption,
    ScopePermission,
    EnvironmentalFreshness,
    HallucinationResistance,
    ScopeLeak,
    Causality,
    RepairPropagation,
    BrutalRealistic,
}

impl Track {
    pub const ALL: [Track; 10] = [
        Track::Supersession,
        Track::CommitmentDurability,
        Track::InterruptionResumption,
        Track::ScopePermission,
        Track::EnvironmentalFreshness,
        Track::HallucinationResistance,
        Track::ScopeLeak,
        Track::Causality,
        Track::RepairPropagation,
        Track::BrutalRealistic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Supersession => "supersession",
            Track::CommitmentDurability => "commitment_durability",
            Track::InterruptionResumption => "interruption_resumption",
            Track::ScopePermission => "scope_permission",
            Track::EnvironmentalFreshness => "environmental_freshness",
            Track::HallucinationResistance => "hallucination_resistance",
            Track::ScopeLeak => "scope_leak",
            Track::Causality => "causality",
            Track::RepairPropagation => "repair_propagation",
            Track::BrutalRealistic => "brutal_realistic",
        }
    }

    /// All valid track names, in declaration order.
    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|t| t.as_str().to_string()).collect()
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Track {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TimelineError::UnknownTrack {
                name: s.to_string(),
                available: Self::names(),
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: String,
    pub org: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actors {
    pub user: Actor,
    #[serde(default = "default_assistant_role")]
    pub assistant_role: String,
}

fn default_assistant_role() -> String {
    "AI_Employee".into()
}

/// A complete test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    /// Unique identifier (e.g., `S1-000123`).
    pub id: String,
    pub domain: Domain,
    pub track: Track,
    pub actors: Actors,
    pub initial_state: InitialState,
    pub events: Vec<Event>,
}

impl Timeline {
    pub fn queries(&self) -> Vec<&Query> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Query(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    pub fn supersessions(&self) -> Vec<&Supersession> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Supersession(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

/// Parse newline-delimited timeline records. Blank lines are skipped.
pub fn parse_jsonl(content: &str) -> Result<Vec<Timeline>, TimelineError> {
    let mut timelines = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let timeline: Timeline =
            serde_json::from_str(line).map_err(|e| TimelineError::Parse {
                line: idx + 1,
                reason: e.to_string(),
            })?;
        timelines.push(timeline);
    }
    debug!(count = timelines.len(), "Parsed timelines");
    Ok(timelines)
}

/// Read and parse a JSONL timeline file.
pub fn read_jsonl(path: &Path) -> Result<Vec<Timeline>, TimelineError> {
    let content = std::fs::read_to_string(path).map_err(|e| TimelineError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_jsonl(&content)
}
