//! # StateBench Core
//!
//! Domain types, traits, and error definitions for the StateBench
//! state-correctness benchmark. This crate has **zero framework
//! dependencies**: it defines the timeline model and the strategy trait
//! that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! A memory strategy is defined as a trait here. Implementations live in
//! `statebench-memory`, and the driver only ever talks to
//! `dyn MemoryStrategy`, so strategies can be swapped by name.

pub mod error;
pub mod event;
pub mod memory;
pub mod state;
pub mod timeline;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result, StrategyError, TimelineError};
pub use event::{
    ConversationTurn, Event, GroundTruth, Layer, Query, Speaker, StateWrite, Supersession, Write,
};
pub use memory::MemoryStrategy;
pub use state::{
    FactSource, IdentityRole, InitialState, PersistentFact, WorkingItemType, WorkingSetItem,
};
pub use timeline::{Actor, Actors, Domain, Timeline, Track};
