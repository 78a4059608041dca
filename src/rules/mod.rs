//! Pluggable combat formulas and AI selection.

pub mod basic;
pub mod engine;

pub use basic::BasicRules;
pub use engine::CombatRules;
