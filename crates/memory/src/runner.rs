//! Timeline replay: drives a strategy through a timeline in event order
//! and captures the prompt it would send at every query.

use serde::{Deserialize, Serialize};
use statebench_core::event::Event;
use statebench_core::memory::MemoryStrategy;
use statebench_core::timeline::Timeline;
use tracing::{debug, info, trace};

/// The prompt a strategy produced for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPrompt {
    pub timeline_id: String,
    /// 0-based position among the timeline's queries.
    pub query_index: usize,
    pub system_prompt: String,
    pub prompt: String,
    /// Expected decision, carried through for the external judge.
    pub decision: String,
}

/// Replay one timeline through `strategy`.
///
/// The strategy is reset first and seeded from the initial state when it
/// asks for it. Queries do not mutate state.
pub fn replay_timeline(strategy: &mut dyn MemoryStrategy, timeline: &Timeline) -> Vec<QueryPrompt> {
    strategy.reset();
    if strategy.expects_initial_state() {
        strategy.initialize_from_state(&timeline.initial_state);
    }

    let mut prompts = Vec::new();
    for event in &timeline.events {
        trace!(kind = event.kind(), ts = %event.ts(), "Replaying event");
        match event {
            Event::Query(query) => {
                prompts.push(QueryPrompt {
                    timeline_id: timeline.id.clone(),
                    query_index: prompts.len(),
                    system_prompt: strategy.system_prompt(),
                    prompt: strategy.format_prompt(&query.prompt),
                    decision: query.ground_truth.decision.clone(),
                });
            }
            other => strategy.process_event(other),
        }
    }

    debug!(
        timeline = %timeline.id,
        strategy = strategy.name(),
        events = timeline.events.len(),
        queries = prompts.len(),
        "Timeline replayed"
    );
    prompts
}

/// Replay every timeline with the same strategy instance.
pub fn replay_all(strategy: &mut dyn MemoryStrategy, timelines: &[Timeline]) -> Vec<QueryPrompt> {
    let prompts: Vec<QueryPrompt> = timelines
        .iter()
        .flat_map(|timeline| replay_timeline(strategy, timeline))
        .collect();
    info!(
        strategy = strategy.name(),
        timelines = timelines.len(),
        queries = prompts.len(),
        "Replay complete"
    );
    prompts
}
