//! The combat rules contract.
//!
//! Formulas (damage, hit chance, escape odds) and AI heuristics live
//! behind this trait; the engine only orchestrates when they run and
//! what they may observe.

use crate::core::{BattleAction, BattleRng, Combatant, HitOutcome, Roster};

pub trait CombatRules {
    /// Execute one hit of `action` by `source` against `target` and
    /// report the outcome. Must not mutate anything; the pipeline
    /// applies the returned HP delta itself.
    fn execute_hit(
        &self,
        action: &BattleAction,
        source: &Combatant,
        target: &Combatant,
        rng: &mut BattleRng,
    ) -> HitOutcome;

    /// Probability in `[0, 1]` that a command-menu escape succeeds.
    /// `attempts` counts prior failed escapes this battle.
    fn escape_chance(&self, roster: &Roster, attempts: u32) -> f64;

    /// Choose the action for an enemy whose gauge filled.
    fn select_enemy_action(
        &self,
        enemy: &Combatant,
        roster: &Roster,
        rng: &mut BattleRng,
    ) -> Option<BattleAction>;

    /// Choose the action for an ally under auto-battle.
    fn select_auto_action(
        &self,
        ally: &Combatant,
        roster: &Roster,
        rng: &mut BattleRng,
    ) -> Option<BattleAction>;
}
