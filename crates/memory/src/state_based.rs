//! The state-based strategy: maintains explicit state layers instead of
//! replaying the transcript.
//!
//! Layers: identity, persistent facts (with supersession and dependency
//! tracking), a capped working set, a freshness-ordered environment, and
//! the open questions raised in conversation. Every query renders the
//! current layers through the [`ContextAssembler`].

use statebench_core::event::{ConversationTurn, Event, Layer, Write};
use statebench_core::memory::MemoryStrategy;
use statebench_core::state::{IdentityRole, InitialState};
use tracing::debug;

use crate::assembler::{AssembledContext, AssemblyInput, ContextAssembler};
use crate::classify::{self, Scope};
use crate::dependency::DependencyPolicy;
use crate::environment::Environment;
use crate::fact_store::{Correction, Fact, FactStore};
use crate::working_set::{DEFAULT_WORKING_SET_SIZE, KnownUnknowns, WorkingSet};

/// Source recorded on facts written by timeline events.
pub const EVENT_FACT_SOURCE: &str = "decision";

const SYSTEM_PROMPT: &str = "You are an AI agent. Answer based ONLY on the structured context provided.

CRITICAL RULES:
1. CHECK ALL CONSTRAINTS before deciding - if ANY constraint blocks, the answer is NO
2. Multiple constraints must ALL be satisfied simultaneously
3. NEVER invent details not explicitly stated (budgets, timelines, approvals)
4. If information wasn't provided, say 'not specified' - don't assume or guess
5. Items marked [HYPOTHETICAL] are what-if scenarios - don't treat as real
6. Items marked [DRAFT] are tentative - not finalized

REPAIR/CORRECTION RULES:
7. If facts are marked [INVALIDATED], their conclusions are WRONG
8. You MUST recalculate using the CORRECTED values, not the old conclusions
9. When base data changes, derived conclusions change too

Be accurate, concise, and explicit about what you know vs. don't know.";

pub struct StateBasedStrategy {
    identity: Option<IdentityRole>,
    store: FactStore,
    working_set: WorkingSet,
    environment: Environment,
    known_unknowns: KnownUnknowns,
    assembler: ContextAssembler,
}

impl StateBasedStrategy {
    pub fn new(working_set_size: usize) -> Self {
        Self {
            identity: None,
            store: FactStore::new(),
            working_set: WorkingSet::new(working_set_size),
            environment: Environment::new(),
            known_unknowns: KnownUnknowns::default(),
            assembler: ContextAssembler::default(),
        }
    }

    /// Replace the dependency inference policy. Existing facts keep the
    /// dependencies they were written with.
    pub fn with_policy(mut self, policy: Box<dyn DependencyPolicy>) -> Self {
        self.store.set_policy(policy);
        self
    }

    /// Render the current layers with per-section statistics.
    pub fn assemble(&self) -> AssembledContext {
        self.assembler.assemble(&AssemblyInput {
            identity: self.identity.as_ref(),
            facts: &self.store,
            working_set: &self.working_set,
            environment: &self.environment,
            known_unknowns: &self.known_unknowns,
        })
    }

    // ── Inspection ──

    pub fn identity(&self) -> Option<&IdentityRole> {
        self.identity.as_ref()
    }

    pub fn fact(&self, key: &str) -> Option<&Fact> {
        self.store.get(key)
    }

    pub fn facts(&self) -> &FactStore {
        &self.store
    }

    pub fn corrections(&self) -> &[Correction] {
        self.store.corrections()
    }

    pub fn superseded_keys(&self) -> impl Iterator<Item = &str> {
        self.store.superseded_keys().iter().map(String::as_str)
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn known_unknowns(&self) -> &KnownUnknowns {
        &self.known_unknowns
    }

    // ── Event handlers ──

    fn record_turn(&mut self, turn: &ConversationTurn) {
        let scope = classify::infer_scope(&turn.text);
        self.working_set.push(
            format!("{}: {}", turn.speaker.label(), turn.text),
            turn.ts,
            scope,
        );
        if classify::is_known_unknown(&turn.text) {
            self.known_unknowns.record(&turn.text, turn.ts);
        }
    }

    fn apply_writes(&mut self, writes: &[Write], ts: chrono::NaiveDateTime, supersession: bool) {
        for write in writes {
            match write.layer {
                Layer::PersistentFacts if supersession => {
                    self.store.supersede(
                        &write.key,
                        &write.value,
                        write.supersedes.as_deref(),
                        EVENT_FACT_SOURCE,
                        ts,
                    );
                }
                Layer::PersistentFacts => {
                    self.store.write(&write.key, &write.value, EVENT_FACT_SOURCE, ts);
                }
                Layer::Environment => {
                    self.environment
                        .write(&write.key, &write.value, ts, write.supersedes.as_deref());
                }
                Layer::WorkingSet => {
                    debug!(key = %write.key, "Working-set write ignored");
                }
            }
        }
    }
}

impl Default for StateBasedStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_WORKING_SET_SIZE)
    }
}

impl MemoryStrategy for StateBasedStrategy {
    fn name(&self) -> &str {
        "state_based"
    }

    fn process_event(&mut self, event: &Event) {
        match event {
            Event::ConversationTurn(turn) => self.record_turn(turn),
            Event::StateWrite(write) => self.apply_writes(&write.writes, write.ts, false),
            Event::Supersession(sup) => self.apply_writes(&sup.writes, sup.ts, true),
            Event::Query(_) => {}
        }
    }

    fn build_context(&self, _query: &str) -> String {
        let assembled = self.assemble();
        for stats in &assembled.sections {
            debug!(
                section = %stats.name,
                included = stats.items_included,
                total = stats.items_total,
                "Section rendered"
            );
        }
        assembled.text
    }

    fn reset(&mut self) {
        self.identity = None;
        self.store.clear();
        self.working_set.clear();
        self.environment.clear();
        self.known_unknowns.clear();
    }

    fn expects_initial_state(&self) -> bool {
        true
    }

    fn initialize_from_state(&mut self, initial_state: &InitialState) {
        self.identity = Some(initial_state.identity_role.clone());

        for snapshot in &initial_state.persistent_facts {
            let mut fact = Fact::new(
                snapshot.key.as_str(),
                snapshot.value.as_str(),
                snapshot.source.as_str(),
                snapshot.ts,
            );
            fact.scope = Scope::Global;
            fact.is_valid = snapshot.is_valid;
            fact.superseded_by = snapshot.superseded_by.clone();
            self.store.install(fact);
        }

        for item in &initial_state.working_set {
            self.working_set.push(item.content.as_str(), item.ts, Scope::Global);
        }

        for (key, value) in &initial_state.environment {
            self.environment.install_initial(key, value);
        }

        debug!(
            facts = initial_state.persistent_facts.len(),
            working_set = initial_state.working_set.len(),
            environment = initial_state.environment.len(),
            "Initial state installed"
        );
    }

    fn system_prompt(&self) -> String {
        SYSTEM_PROMPT.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use statebench_core::event::{Speaker, StateWrite, Supersession};
    use statebench_core::state::{FactSource, PersistentFact, WorkingItemType, WorkingSetItem};

    fn ts(minute: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2025, 12, 21)
            .unwrap()
            .and_hms_opt(9, minute, 0)
            .unwrap()
    }

    fn fact_write(key: &str, value: &str, supersedes: Option<&str>) -> Write {
        Write {
            layer: Layer::PersistentFacts,
            key: key.into(),
            value: value.into(),
            supersedes: supersedes.map(Into::into),
        }
    }

    fn env_write(key: &str, value: &str) -> Write {
        Write {
            layer: Layer::Environment,
            key: key.into(),
            value: value.into(),
            supersedes: None,
        }
    }

    fn state_write(minute: u32, writes: Vec<Write>) -> Event {
        Event::StateWrite(StateWrite { ts: ts(minute), writes })
    }

    fn supersession(minute: u32, writes: Vec<Write>) -> Event {
        Event::Supersession(Supersession { ts: ts(minute), writes })
    }

    fn user(minute: u32, text: &str) -> Event {
        Event::ConversationTurn(ConversationTurn {
            ts: ts(minute),
            speaker: Speaker::User,
            text: text.into(),
        })
    }

    #[test]
    fn empty_engine_renders_empty_context() {
        let strategy = StateBasedStrategy::default();
        assert_eq!(strategy.build_context("anything"), "");
        assert_eq!(strategy.format_prompt("anything"), "anything");
    }

    #[test]
    fn po_status_supersession() {
        let mut strategy = StateBasedStrategy::default();
        strategy.process_event(&state_write(
            0,
            vec![fact_write("po_status", "approved $50,000", None)],
        ));
        strategy.process_event(&supersession(
            5,
            vec![fact_write("po_status_v2", "CANCELLED due to budget freeze", Some("po_status"))],
        ));

        let old = strategy.fact("po_status").unwrap();
        assert!(!old.is_valid);
        assert_eq!(old.superseded_by.as_deref(), Some("po_status_v2"));
        assert_eq!(strategy.superseded_keys().collect::<Vec<_>>(), vec!["po_status"]);

        let ctx = strategy.build_context("Is the PO still approved?");
        assert!(ctx.contains("## Superseded Facts\n- po_status: superseded"));
        assert!(ctx.contains("## Current Facts\n- [usr] CANCELLED due to budget freeze\n\n"));
        assert!(!ctx.contains("- [usr] approved $50,000"));
    }

    #[test]
    fn policy_constraint_from_initial_state() {
        let mut strategy = StateBasedStrategy::default();
        strategy.initialize_from_state(&InitialState {
            identity_role: IdentityRole {
                user_name: "Alex".into(),
                authority: "Manager".into(),
                department: None,
                organization: None,
                communication_style: None,
            },
            persistent_facts: vec![PersistentFact {
                key: "discount_policy".into(),
                value: "Maximum discount is 15% without CFO approval".into(),
                source: FactSource::Policy,
                ts: ts(0),
                supersedes: None,
                superseded_by: None,
                is_valid: true,
            }],
            working_set: vec![],
            environment: vec![],
        });

        let fact = strategy.fact("discount_policy").unwrap();
        assert!(fact.is_constraint);
        assert_eq!(fact.constraint_type.map(|t| t.as_str()), Some("policy"));

        let ctx = strategy.build_context("Can I give 20%?");
        assert_eq!(
            ctx,
            "## Identity\nUser: Alex\nRole: Manager\n\n\
             ## Active Constraints (CHECK ALL)\n[policy] Maximum discount is 15% without CFO approval"
        );
    }

    #[test]
    fn initial_state_layers() {
        let mut strategy = StateBasedStrategy::new(2);
        strategy.initialize_from_state(&InitialState {
            identity_role: IdentityRole {
                user_name: "Alex".into(),
                authority: "IC".into(),
                department: None,
                organization: None,
                communication_style: None,
            },
            persistent_facts: vec![PersistentFact {
                key: "old_plan".into(),
                value: "Use the draft vendor list".into(),
                source: FactSource::Decision,
                ts: ts(0),
                supersedes: None,
                superseded_by: Some("new_plan".into()),
                is_valid: false,
            }],
            working_set: vec![
                WorkingSetItem {
                    item_type: WorkingItemType::Objective,
                    content: "What if we renegotiate?".into(),
                    ts: ts(0),
                    priority: 0,
                },
                WorkingSetItem {
                    item_type: WorkingItemType::Artifact,
                    content: "Quote #12".into(),
                    ts: ts(1),
                    priority: 1,
                },
            ],
            environment: vec![("now".to_string(), "Monday".to_string())],
        });

        let old = strategy.fact("old_plan").unwrap();
        assert!(!old.is_valid);
        assert_eq!(old.scope, Scope::Global);

        // Initial items are global even when their text reads hypothetical.
        let ctx = strategy.build_context("q");
        assert!(ctx.contains("## Recent Context\nWhat if we renegotiate?\nQuote #12"));

        // Any later write replaces an initial environment value.
        strategy.process_event(&state_write(0, vec![env_write("now", "Tuesday")]));
        assert_eq!(strategy.environment().get("now").unwrap().value, "Tuesday");
    }

    #[test]
    fn initial_environment_renders_in_file_order() {
        let state: InitialState = serde_json::from_str(
            r#"{
                "identity_role":{"user_name":"Alex","authority":"Manager"},
                "environment":{"now":"2025-12-21T09:00:00","deadline":"Report due Friday"}
            }"#,
        )
        .unwrap();
        let mut strategy = StateBasedStrategy::default();
        strategy.initialize_from_state(&state);

        let ctx = strategy.build_context("q");
        let expected = "## Environment\n- now: 2025-12-21T09:00:00\n- deadline: Report due Friday";
        assert!(ctx.contains(expected));
        assert_eq!(strategy.assemble().section("environment").unwrap().items_total, 2);
    }

    #[test]
    fn oversized_initial_environment_is_kept_whole() {
        let mut strategy = StateBasedStrategy::default();
        strategy.initialize_from_state(&InitialState {
            identity_role: IdentityRole {
                user_name: "Alex".into(),
                authority: "Manager".into(),
                department: None,
                organization: None,
                communication_style: None,
            },
            persistent_facts: vec![],
            working_set: vec![],
            environment: (0..7).map(|i| (format!("signal_{i}"), format!("v{i}"))).collect(),
        });
        assert_eq!(strategy.environment().len(), 7);

        let stats = strategy.assemble();
        let env = stats.section("environment").unwrap();
        assert_eq!(env.items_included, 5);
        assert_eq!(env.items_total, 7);
        assert!(stats.text.contains("## Environment\n- signal_0: v0\n- signal_1: v1"));
    }

    #[test]
    fn superseded_key_stays_superseded_after_rewrite() {
        let mut strategy = StateBasedStrategy::default();
        strategy.process_event(&state_write(
            0,
            vec![fact_write("po_status", "approved $50,000", None)],
        ));
        strategy.process_event(&supersession(
            5,
            vec![fact_write("po_status_v2", "CANCELLED due to budget freeze", Some("po_status"))],
        ));
        strategy.process_event(&state_write(
            6,
            vec![fact_write("po_status", "approved $50,000", None)],
        ));

        assert!(!strategy.fact("po_status").unwrap().is_valid);
        let ctx = strategy.build_context("q");
        assert!(ctx.contains("## Current Facts\n- [usr] CANCELLED due to budget freeze\n\n"));
        assert!(!ctx.contains("- [usr] approved $50,000"));
        assert!(ctx.contains("## Superseded Facts\n- po_status: superseded"));
    }

    #[test]
    fn turns_feed_working_set_and_known_unknowns() {
        let mut strategy = StateBasedStrategy::default();
        strategy.process_event(&user(0, "What if we ordered 50 units?"));
        strategy.process_event(&user(1, "I'm not sure about freight"));
        strategy.process_event(&Event::ConversationTurn(ConversationTurn {
            ts: ts(2),
            speaker: Speaker::Assistant,
            text: "Noted.".into(),
        }));

        let items: Vec<_> = strategy.working_set().iter().map(|i| i.content.as_str()).collect();
        assert_eq!(
            items,
            vec![
                "User: What if we ordered 50 units?",
                "User: I'm not sure about freight",
                "Assistant: Noted."
            ]
        );
        assert_eq!(strategy.known_unknowns().len(), 2);

        let ctx = strategy.build_context("q");
        assert!(ctx.contains("[HYPOTHETICAL] User: What if we ordered 50 units?"));
        assert!(ctx.ends_with(
            "## Known Unknowns\n- I'm not sure about freight\n- What if we ordered 50 units?"
        ));
    }

    #[test]
    fn working_set_writes_are_ignored() {
        let mut strategy = StateBasedStrategy::default();
        strategy.process_event(&state_write(
            0,
            vec![Write {
                layer: Layer::WorkingSet,
                key: "objective".into(),
                value: "Close the deal".into(),
                supersedes: None,
            }],
        ));
        assert!(strategy.working_set().is_empty());
        assert!(strategy.facts().is_empty());
        assert_eq!(strategy.build_context("q"), "");
    }

    #[test]
    fn cascade_reaches_derived_facts() {
        let mut strategy = StateBasedStrategy::default();
        strategy.process_event(&state_write(
            0,
            vec![fact_write("unit_price", "Unit price $120", None)],
        ));
        strategy.process_event(&state_write(
            1,
            vec![fact_write("order_total", "Order total at unit price is $1,200", None)],
        ));
        strategy.process_event(&supersession(
            2,
            vec![fact_write("unit_price_v2", "Supplier quote revised to $150", Some("unit_price"))],
        ));

        assert!(strategy.fact("order_total").unwrap().needs_review);
        let ctx = strategy.build_context("q");
        let expected = "## INVALIDATED - Must Recalculate\n[X] Order total at unit price is $1,200";
        assert!(ctx.contains(expected));
    }

    #[test]
    fn supersession_of_unknown_key_is_plain_write() {
        let mut strategy = StateBasedStrategy::default();
        strategy.process_event(&supersession(
            0,
            vec![fact_write("eta", "Arrives Friday", Some("missing"))],
        ));
        assert!(strategy.fact("eta").unwrap().is_valid);
        assert!(strategy.corrections().is_empty());
        assert_eq!(strategy.superseded_keys().count(), 0);
    }

    #[test]
    fn reset_then_replay_is_identical() {
        let events = vec![
            user(0, "Budget is tight, not sure we can afford it"),
            state_write(
                1,
                vec![fact_write("budget", "Budget is $40,000", None), env_write("now", "Q3")],
            ),
            supersession(
                2,
                vec![fact_write("budget_v2", "Budget cut to $30,000 by finance", Some("budget"))],
            ),
        ];

        let mut strategy = StateBasedStrategy::default();
        for event in &events {
            strategy.process_event(event);
        }
        let first = strategy.build_context("q");

        strategy.reset();
        assert_eq!(strategy.build_context("q"), "");
        for event in &events {
            strategy.process_event(event);
        }
        assert_eq!(strategy.build_context("q"), first);
    }

    #[test]
    fn reset_clears_identity() {
        let mut strategy = StateBasedStrategy::default();
        strategy.initialize_from_state(&InitialState {
            identity_role: IdentityRole {
                user_name: "Alex".into(),
                authority: "IC".into(),
                department: None,
                organization: None,
                communication_style: None,
            },
            persistent_facts: vec![],
            working_set: vec![],
            environment: vec![],
        });
        strategy.reset();
        assert!(strategy.identity().is_none());
    }

    #[test]
    fn system_prompt_lists_rules() {
        let prompt = StateBasedStrategy::default().system_prompt();
        assert!(prompt.contains("CHECK ALL CONSTRAINTS"));
        assert!(prompt.contains("[HYPOTHETICAL]"));
        assert!(prompt.contains("[INVALIDATED]"));
    }
}
