//! Memory system
//!
//! Bounded, append-only history persisted in SQLite. Crew runs append their
//! results here and agents read recent entries back into their prompts.

mod store;
mod types;

pub use store::MemoryStore;
pub use types::{Memory, MemoryFilter, CREW_RESULT_CATEGORY};
