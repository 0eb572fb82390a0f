//! Property tests for the state layers: supersession monotonicity,
//! environment freshness and capacity, working-set capacity, and
//! reset idempotence.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use statebench_core::event::{
    ConversationTurn, Event, Layer, Speaker, StateWrite, Supersession, Write,
};
use statebench_core::memory::MemoryStrategy;
use statebench_memory::{Environment, FactStore, Scope, StateBasedStrategy, WorkingSet};

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn at(minute: u32) -> NaiveDateTime {
    let base = NaiveDate::from_ymd_opt(2025, 12, 21)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    base + Duration::minutes(i64::from(minute))
}

fn arb_value() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("budget"),
            Just("vendor"),
            Just("approved"),
            Just("shipping"),
            Just("order"),
            Just("must"),
            Just("draft"),
            Just("$500"),
            Just("q3"),
        ],
        1..5,
    )
    .prop_map(|words| words.join(" "))
}

/// (supersede?, key, old key, value) drawn from a pool of six keys, so
/// keys are rewritten, superseded more than once, and superseded by
/// themselves.
fn arb_fact_ops() -> impl Strategy<Value = Vec<(bool, u8, u8, String)>> {
    prop::collection::vec((any::<bool>(), 0u8..6, 0u8..6, arb_value()), 1..40)
}

fn arb_event(minute: u32) -> impl Strategy<Value = Event> {
    let ts = at(minute);
    prop_oneof![
        (arb_value(), any::<bool>()).prop_map(move |(text, question)| {
            let text = if question { format!("{text}?") } else { text };
            Event::ConversationTurn(ConversationTurn {
                ts,
                speaker: Speaker::User,
                text,
            })
        }),
        (0u8..6, arb_value()).prop_map(move |(key, value)| {
            Event::StateWrite(StateWrite {
                ts,
                writes: vec![Write {
                    layer: Layer::PersistentFacts,
                    key: format!("fact_{key}"),
                    value,
                    supersedes: None,
                }],
            })
        }),
        (0u8..6, 0u8..6, arb_value()).prop_map(move |(key, old, value)| {
            Event::Supersession(Supersession {
                ts,
                writes: vec![Write {
                    layer: Layer::PersistentFacts,
                    key: format!("fact_{key}_v{minute}"),
                    value,
                    supersedes: Some(format!("fact_{old}")),
                }],
            })
        }),
        (0u8..8, arb_value()).prop_map(move |(key, value)| {
            Event::StateWrite(StateWrite {
                ts,
                writes: vec![Write {
                    layer: Layer::Environment,
                    key: format!("env_{key}"),
                    value,
                    supersedes: None,
                }],
            })
        }),
    ]
}

fn arb_events() -> impl Strategy<Value = Vec<Event>> {
    (1u32..25).prop_flat_map(|n| (0..n).map(arb_event).collect::<Vec<_>>())
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Once a key is invalid it stays invalid for the life of the store,
    /// and the superseded set names exactly the invalid keys.
    #[test]
    fn supersession_is_monotonic(ops in arb_fact_ops()) {
        let mut store = FactStore::new();
        let mut invalid: Vec<String> = Vec::new();

        for (i, (supersede, key, old, value)) in ops.into_iter().enumerate() {
            let key = format!("k{key}");
            let ts = at(i as u32);
            if supersede {
                let old = format!("k{old}");
                store.supersede(&key, &value, Some(old.as_str()), "decision", ts);
            } else {
                store.write(&key, &value, "decision", ts);
            }

            for fact in store.iter().filter(|f| !f.is_valid) {
                if !invalid.contains(&fact.key) {
                    invalid.push(fact.key.clone());
                }
            }
            for key in &invalid {
                let fact = store.get(key).unwrap();
                prop_assert!(!fact.is_valid);
                prop_assert!(fact.superseded_by.is_some());
            }

            let superseded: Vec<&String> = store.superseded_keys().iter().collect();
            let mut expected: Vec<&String> = invalid.iter().collect();
            expected.sort();
            prop_assert_eq!(superseded, expected);
        }
    }

    /// An older write never replaces a newer value for the same key.
    #[test]
    fn environment_rejects_stale_writes(t0 in 0u32..1000, gap in 1u32..1000, v0 in "[a-z]{1,8}", v1 in "[a-z]{1,8}") {
        let mut env = Environment::new();
        env.write("now", &v1, at(t0 + gap), None);
        env.write("now", &v0, at(t0), None);
        let entry = env.get("now").unwrap();
        prop_assert_eq!(&entry.value, &v1);
        prop_assert_eq!(entry.ts, at(t0 + gap));
    }

    /// Writing more than five distinct keys keeps the five newest.
    #[test]
    fn environment_keeps_five_freshest(n in 6usize..20) {
        let mut env = Environment::new();
        for i in 0..n {
            env.write(&format!("k{i}"), "v", at(i as u32), None);
        }
        prop_assert_eq!(env.len(), 5);
        let mut kept: Vec<String> = env.iter().map(|e| e.key.clone()).collect();
        kept.sort();
        let mut expected: Vec<String> = (n - 5..n).map(|i| format!("k{i}")).collect();
        expected.sort();
        prop_assert_eq!(kept, expected);
    }

    /// The working set holds exactly the newest `capacity` items in order.
    #[test]
    fn working_set_keeps_newest_in_order(capacity in 1usize..15, n in 0usize..40) {
        let mut ws = WorkingSet::new(capacity);
        for i in 0..n {
            ws.push(format!("turn {i}"), at(i as u32), Scope::Global);
        }
        let kept: Vec<String> = ws.iter().map(|item| item.content.clone()).collect();
        let expected: Vec<String> =
            (n.saturating_sub(capacity)..n).map(|i| format!("turn {i}")).collect();
        prop_assert_eq!(kept, expected);
    }

    /// Reset followed by the same events renders the same context.
    #[test]
    fn reset_then_replay_is_identical(events in arb_events()) {
        let mut strategy = StateBasedStrategy::default();
        for event in &events {
            strategy.process_event(event);
        }
        let first = strategy.build_context("q");

        strategy.reset();
        for event in &events {
            strategy.process_event(event);
        }
        prop_assert_eq!(strategy.build_context("q"), first);
    }
}
