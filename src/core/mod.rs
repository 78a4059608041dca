//! Core data entities: combatants, actions, conditions, configuration,
//! rosters, and the deterministic RNG.

pub mod action;
pub mod combatant;
pub mod condition;
pub mod config;
pub mod rng;
pub mod roster;

pub use action::{ActionRecord, ActionVerb, BattleAction, HitOutcome};
pub use combatant::{
    Combatant, CombatantId, DropEntry, EnemyReward, Position, Restriction, Row, Side,
    StatusEffect, GAUGE_MAX,
};
pub use condition::BattleCondition;
pub use config::{AtbMode, BattleConfig, ComboSetting, Terms};
pub use rng::BattleRng;
pub use roster::Roster;
