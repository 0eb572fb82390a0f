//! Memory strategy trait: how context is accumulated from events and
//! assembled into a prompt.
//!
//! Every strategy sees the same event stream in timeline order. Strategies
//! differ only in what they keep and how they render it. Implementations:
//! no-memory, transcript replay, and the state-based engine.

use crate::event::Event;
use crate::state::InitialState;

/// Separator placed between the assembled context and the user question.
pub const PROMPT_SEPARATOR: &str = "\n\n---\n\nUser question: ";

/// Tokens a budgeted strategy holds back for the query and response.
pub const TRANSCRIPT_RESERVE_TOKENS: usize = 500;

/// Default system prompt for strategies that do not provide their own.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant helping with business tasks. \
Answer questions based on the context provided. Be concise and accurate.";

/// The core MemoryStrategy trait.
///
/// One instance serves one timeline at a time; call [`reset`](Self::reset)
/// before replaying the next one. All operations are synchronous.
pub trait MemoryStrategy: Send {
    /// Stable strategy name (e.g., "state_based", "no_memory").
    fn name(&self) -> &str;

    /// Update internal state from one event. Queries are not passed here.
    fn process_event(&mut self, event: &Event);

    /// Build the context string for a query. May be empty.
    fn build_context(&self, query: &str) -> String;

    /// Discard all state for a new timeline.
    fn reset(&mut self);

    /// Whether this strategy wants the timeline's initial state snapshot.
    fn expects_initial_state(&self) -> bool {
        false
    }

    /// Install the initial state snapshot. Called once, before any event.
    fn initialize_from_state(&mut self, _initial_state: &InitialState) {}

    fn system_prompt(&self) -> String {
        DEFAULT_SYSTEM_PROMPT.to_string()
    }

    /// Final prompt: context, separator, query; or just the query when the
    /// context is empty.
    fn format_prompt(&self, query: &str) -> String {
        let context = self.build_context(query);
        if context.is_empty() {
            query.to_string()
        } else {
            format!("{context}{PROMPT_SEPARATOR}{query}")
        }
    }
}
