//! No-memory strategy: disables context entirely.

use statebench_core::event::Event;
use statebench_core::memory::MemoryStrategy;

/// Context returned for every query.
pub const NO_MEMORY_CONTEXT: &str =
    "[No memory baseline] Prior conversation is intentionally ignored.";

/// A strategy that stores nothing. Only the current query reaches the model.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMemoryStrategy;

impl MemoryStrategy for NoMemoryStrategy {
    fn name(&self) -> &str {
        "no_memory"
    }

    fn process_event(&mut self, _event: &Event) {}

    fn build_context(&self, _query: &str) -> String {
        NO_MEMORY_CONTEXT.to_string()
    }

    fn reset(&mut self) {}

    fn system_prompt(&self) -> String {
        "You are an AI assistant. Answer the user's question. \
         If you don't have enough information, say so."
            .to_string()
    }
}
