//! Memory strategies for StateBench.
//!
//! The state-based engine is built bottom-up from:
//! - [`classify`]: scope, memory-type, and constraint heuristics
//! - [`dependency`]: pluggable dependency inference
//! - [`fact_store`]: facts, supersession links, cascading invalidation
//! - [`working_set`] and [`environment`]: the bounded recency layers
//! - [`assembler`]: renders the layers into a context string
//!
//! Alongside it live the no-memory and transcript-replay baselines, the
//! name-based [`registry`], and the timeline [`runner`].

pub mod assembler;
pub mod classify;
pub mod dependency;
pub mod environment;
pub mod fact_store;
pub mod no_memory;
pub mod registry;
pub mod runner;
pub mod state_based;
pub mod token;
pub mod transcript;
pub mod working_set;

pub use assembler::{AssembledContext, AssemblyInput, ContextAssembler, SectionStats};
pub use classify::{ConstraintType, MemoryType, Scope};
pub use dependency::{DependencyPolicy, KeywordOverlap};
pub use environment::{EnvEntry, EnvWrite, Environment};
pub use fact_store::{Correction, Fact, FactStore};
pub use no_memory::NoMemoryStrategy;
pub use registry::{StrategyOptions, available_strategies, create_strategy};
pub use runner::{QueryPrompt, replay_all, replay_timeline};
pub use state_based::StateBasedStrategy;
pub use token::estimate_tokens;
pub use transcript::TranscriptReplayStrategy;
pub use working_set::{KnownUnknowns, WorkingItem, WorkingSet};
