//! Strategy registry: builds strategies by name.
//!
//! Each timeline needs its own fresh engine, so the registry hands out new
//! boxed instances rather than holding shared ones.

use statebench_core::error::StrategyError;
use statebench_core::memory::MemoryStrategy;
use tracing::debug;

use crate::no_memory::NoMemoryStrategy;
use crate::state_based::StateBasedStrategy;
use crate::transcript::TranscriptReplayStrategy;
use crate::working_set::DEFAULT_WORKING_SET_SIZE;

/// Registered strategy names, in listing order.
pub const STRATEGY_NAMES: [&str; 3] = ["no_memory", "transcript_replay", "state_based"];

/// Constructor knobs shared by all strategies. Each strategy reads the
/// fields it cares about and ignores the rest.
#[derive(Debug, Clone, Copy)]
pub struct StrategyOptions {
    pub token_budget: usize,
    pub working_set_size: usize,
}

impl Default for StrategyOptions {
    fn default() -> Self {
        Self {
            token_budget: 8000,
            working_set_size: DEFAULT_WORKING_SET_SIZE,
        }
    }
}

pub fn available_strategies() -> Vec<String> {
    STRATEGY_NAMES.iter().map(|s| s.to_string()).collect()
}

/// Build a fresh strategy by name.
pub fn create_strategy(
    name: &str,
    options: &StrategyOptions,
) -> Result<Box<dyn MemoryStrategy>, StrategyError> {
    let strategy: Box<dyn MemoryStrategy> = match name {
        "no_memory" => Box::new(NoMemoryStrategy),
        "transcript_replay" => Box::new(TranscriptReplayStrategy::new(options.token_budget)),
        "state_based" => Box::new(StateBasedStrategy::new(options.working_set_size)),
        _ => {
            return Err(StrategyError::UnknownStrategy {
                name: name.to_string(),
                available: available_strategies(),
            });
        }
    };
    debug!(strategy = %name, "Created strategy");
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_name_builds() {
        for name in available_strategies() {
            let strategy = create_strategy(&name, &StrategyOptions::default()).unwrap();
            assert_eq!(strategy.name(), name);
        }
    }

    #[test]
    fn unknown_name_lists_options() {
        let err = create_strategy("rolling_summary", &StrategyOptions::default())
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "Unknown strategy: rolling_summary. Available: no_memory, transcript_replay, state_based"
        );
    }

    #[test]
    fn only_state_based_expects_initial_state() {
        let options = StrategyOptions::default();
        let expecting: Vec<_> = STRATEGY_NAMES
            .iter()
            .filter(|name| create_strategy(name, &options).unwrap().expects_initial_state())
            .collect();
        assert_eq!(expecting, vec![&"state_based"]);
    }
}
