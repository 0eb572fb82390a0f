//! Transcript replay: keeps every user turn and replays the newest ones
//! that fit the token budget.

use statebench_core::event::{ConversationTurn, Event, Speaker};
use statebench_core::memory::{MemoryStrategy, TRANSCRIPT_RESERVE_TOKENS};
use tracing::debug;

use crate::token::estimate_tokens;

pub const TRUNCATION_MARKER: &str = "[Earlier conversation truncated...]";

const HEADER: &str = "Conversation history:\n\n";

pub struct TranscriptReplayStrategy {
    token_budget: usize,
    turns: Vec<ConversationTurn>,
}

impl TranscriptReplayStrategy {
    pub fn new(token_budget: usize) -> Self {
        Self {
            token_budget,
            turns: Vec::new(),
        }
    }

    pub fn token_budget(&self) -> usize {
        self.token_budget
    }

    /// Number of stored turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl MemoryStrategy for TranscriptReplayStrategy {
    fn name(&self) -> &str {
        "transcript_replay"
    }

    fn process_event(&mut self, event: &Event) {
        if let Event::ConversationTurn(turn) = event {
            if turn.speaker == Speaker::User {
                self.turns.push(turn.clone());
            }
        }
    }

    fn build_context(&self, _query: &str) -> String {
        if self.turns.is_empty() {
            return String::new();
        }

        let available = self.token_budget.saturating_sub(TRANSCRIPT_RESERVE_TOKENS);
        let mut lines: Vec<String> = Vec::new();
        let mut used = 0;

        // Newest first, so truncation drops the oldest turns.
        for turn in self.turns.iter().rev() {
            let line = format!("{}: {}", turn.speaker.label(), turn.text);
            let cost = estimate_tokens(&line);
            if used + cost > available {
                debug!(kept = lines.len(), total = self.turns.len(), "Transcript truncated");
                lines.push(TRUNCATION_MARKER.to_string());
                break;
            }
            lines.push(line);
            used += cost;
        }

        lines.reverse();
        format!("{HEADER}{}", lines.join("\n\n"))
    }

    fn reset(&mut self) {
        self.turns.clear();
    }

    fn system_prompt(&self) -> String {
        "You are an AI assistant. Use the conversation history \
         to answer the user's question. Be concise and accurate."
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn turn(speaker: Speaker, text: &str) -> Event {
        Event::ConversationTurn(ConversationTurn {
            ts: NaiveDateTime::MIN,
            speaker,
            text: text.into(),
        })
    }

    #[test]
    fn empty_transcript_is_empty_context() {
        let strategy = TranscriptReplayStrategy::new(8000);
        assert_eq!(strategy.build_context("anything"), "");
        assert_eq!(strategy.format_prompt("anything"), "anything");
    }

    #[test]
    fn keeps_user_turns_only() {
        let mut strategy = TranscriptReplayStrategy::new(8000);
        strategy.process_event(&turn(Speaker::User, "Budget is $40k"));
        strategy.process_event(&turn(Speaker::Assistant, "Noted."));
        strategy.process_event(&turn(Speaker::User, "Order 10 laptops"));
        assert_eq!(strategy.len(), 2);
        assert_eq!(
            strategy.build_context("q"),
            "Conversation history:\n\nUser: Budget is $40k\n\nUser: Order 10 laptops"
        );
    }

    #[test]
    fn truncates_oldest_first() {
        // 508 - 500 reserve = 8 tokens available; each line below is 5 tokens.
        let mut strategy = TranscriptReplayStrategy::new(508);
        strategy.process_event(&turn(Speaker::User, "first turn xx"));
        strategy.process_event(&turn(Speaker::User, "second turn x"));
        assert_eq!(
            strategy.build_context("q"),
            "Conversation history:\n\n[Earlier conversation truncated...]\n\nUser: second turn x"
        );
    }

    #[test]
    fn budget_below_reserve_keeps_only_marker() {
        let mut strategy = TranscriptReplayStrategy::new(100);
        strategy.process_event(&turn(Speaker::User, "hello"));
        assert_eq!(
            strategy.build_context("q"),
            "Conversation history:\n\n[Earlier conversation truncated...]"
        );
    }

    #[test]
    fn reset_clears_turns() {
        let mut strategy = TranscriptReplayStrategy::new(8000);
        strategy.process_event(&turn(Speaker::User, "hello"));
        strategy.reset();
        assert!(strategy.is_empty());
        assert_eq!(strategy.build_context("q"), "");
    }
}
