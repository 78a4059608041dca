//! ATB gauge subsystem: condition-dependent initialization, per-tick
//! accumulation, and the suspension predicate.
//!
//! The gauge itself lives on the combatant; this module owns the rules
//! for when and how it moves.

use tracing::trace;

use crate::core::{AtbMode, BattleCondition, Roster, Side, GAUGE_MAX};
use crate::scene::SceneState;

/// Set initial gauge values at battle start.
///
/// `Initiative`/`Surround` give the party a full gauge and the troop
/// nothing; `Back`/`Pincers` the reverse. Without a condition, a
/// combatant starts full if it has the preemptive trait (or, for
/// allies, the encounter's first-strike flag), otherwise at half.
/// Hidden or incapacitated combatants are skipped entirely.
pub fn init_gauges(roster: &mut Roster, condition: BattleCondition, first_strike: bool) {
    for combatant in roster.all_mut() {
        if !combatant.participates() || !combatant.can_act() {
            combatant.set_gauge(0);
            continue;
        }
        let side_full = match combatant.id.side {
            Side::Ally => condition.allies_start_full(),
            Side::Enemy => condition.enemies_start_full(),
        };
        let side_empty = match combatant.id.side {
            Side::Ally => condition.enemies_start_full(),
            Side::Enemy => condition.allies_start_full(),
        };
        let gauge = if side_full {
            GAUGE_MAX
        } else if side_empty {
            0
        } else if combatant.preemptive || (first_strike && combatant.id.side == Side::Ally) {
            GAUGE_MAX
        } else {
            GAUGE_MAX / 2
        };
        combatant.set_gauge(gauge);
    }
}

/// Per-tick gauge increment: a constant rate derived from agility.
#[must_use]
pub fn tick_increment(agility: i32) -> i32 {
    agility.max(1) * 10
}

/// Whether gauges accumulate in the given scene state.
///
/// Menu-selection states accumulate only under active ATB mode; actor
/// selection and auto-battle always accumulate; everything else
/// (including action resolution) never does. Interpreter execution and
/// visible messages suspend accumulation regardless, but that gating
/// happens before this predicate is consulted.
#[must_use]
pub fn accumulates_in(state: SceneState, mode: AtbMode) -> bool {
    match state {
        SceneState::SelectActor | SceneState::AutoBattle => true,
        SceneState::SelectOption
        | SceneState::SelectCommand
        | SceneState::SelectItem
        | SceneState::SelectSkill
        | SceneState::SelectEnemyTarget
        | SceneState::SelectAllyTarget => mode == AtbMode::Active,
        SceneState::Start
        | SceneState::Battle
        | SceneState::Victory
        | SceneState::Defeat
        | SceneState::Escape => false,
    }
}

/// Advance every participating combatant's gauge by one tick.
pub fn advance(roster: &mut Roster) {
    for ally in roster.side_mut(Side::Ally) {
        if ally.participates() && ally.can_act() {
            ally.increase_gauge(tick_increment(ally.agility));
        }
    }
    // TODO: legacy quirk kept for save compatibility: enemy
    // accumulation stops at the first enemy whose gauge fills this
    // tick, so later enemies lose the tick.
    for enemy in roster.side_mut(Side::Enemy) {
        if !enemy.participates() || !enemy.can_act() {
            continue;
        }
        let was_full = enemy.is_gauge_full();
        enemy.increase_gauge(tick_increment(enemy.agility));
        if !was_full && enemy.is_gauge_full() {
            trace!(enemy = %enemy.id, "enemy gauge filled, aborting tick");
            break;
        }
    }
}
