//! Combatant: one unit (ally or enemy) participating in a battle.
//!
//! A combatant owns its ATB gauge, status effects, positional state and
//! (at most one) assigned action. It is never deleted mid-battle: death
//! or hiding removes it from active consideration, revival makes it
//! eligible again.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::action::BattleAction;

/// Maximum ATB gauge value. A combatant whose gauge reaches this value
/// is ready to act.
pub const GAUGE_MAX: i32 = 300_000;

/// Which roster a combatant belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Ally,
    Enemy,
}

impl Side {
    /// The opposing side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Side::Ally => Side::Enemy,
            Side::Enemy => Side::Ally,
        }
    }
}

/// Stable identity of a combatant: side plus roster index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantId {
    pub side: Side,
    pub index: u16,
}

impl CombatantId {
    /// Identity of the ally at the given roster index.
    #[must_use]
    pub const fn ally(index: u16) -> Self {
        Self {
            side: Side::Ally,
            index,
        }
    }

    /// Identity of the enemy at the given roster index.
    #[must_use]
    pub const fn enemy(index: u16) -> Self {
        Self {
            side: Side::Enemy,
            index,
        }
    }
}

impl std::fmt::Display for CombatantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.side {
            Side::Ally => write!(f, "Ally({})", self.index),
            Side::Enemy => write!(f, "Enemy({})", self.index),
        }
    }
}

/// Battle row. Back-row units stand behind the front line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Row {
    #[default]
    Front,
    Back,
}

/// Action restriction imposed by a status effect.
///
/// The *significant* restriction (first non-`None` among active statuses)
/// overrides normal action selection: berserk-style statuses force an
/// attack against a random battler of the given side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Restriction {
    #[default]
    None,
    /// Forced attack against a random ally-side battler.
    AttackAlly,
    /// Forced attack against a random enemy-side battler.
    AttackEnemy,
    /// Cannot act at all (paralysis and the like).
    DoNothing,
}

/// An ongoing status effect, applied to every active combatant during the
/// `Conditions` pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Status identifier (opaque to the engine).
    pub id: u16,
    /// HP change per action resolution (negative for poison, positive
    /// for regeneration).
    pub hp_per_turn: i32,
    /// Action restriction imposed while active.
    pub restriction: Restriction,
}

impl StatusEffect {
    /// A plain damage-over-time status.
    #[must_use]
    pub fn poison(id: u16, hp_per_turn: i32) -> Self {
        Self {
            id,
            hp_per_turn: -hp_per_turn.abs(),
            restriction: Restriction::None,
        }
    }
}

/// A single item drop entry on an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DropEntry {
    pub item_id: u16,
    /// Probability in [0, 1] that the item drops.
    pub chance: f64,
}

/// Victory rewards carried by an enemy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnemyReward {
    pub exp: i32,
    pub gold: i32,
    pub drops: SmallVec<[DropEntry; 1]>,
}

/// Screen-space battle position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One battle participant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Combatant {
    /// Stable identity (side + roster index).
    pub id: CombatantId,

    /// Display name.
    pub name: String,

    pub hp: i32,
    pub max_hp: i32,

    /// Drives the per-tick ATB increment.
    pub agility: i32,

    /// Hidden combatants take no part in the battle until revealed.
    pub hidden: bool,

    /// Player-controllable (false for enemies and for allies under
    /// automation-only statuses).
    pub controllable: bool,

    pub row: Row,

    /// Facing. Unflipped allies face right, unflipped enemies face left.
    pub facing_flipped: bool,

    pub position: Position,

    /// Individual preemptive-attack trait: starts with a full gauge when
    /// no battle condition applies.
    pub preemptive: bool,

    /// Active status effects.
    pub statuses: Vec<StatusEffect>,

    /// Skills selectable from the command menu (allies only).
    pub skills: Vec<u16>,

    /// Victory rewards (enemies only).
    pub reward: Option<EnemyReward>,

    gauge: i32,

    /// The assigned action, owned exclusively until the pipeline
    /// consumes it.
    action: Option<BattleAction>,

    /// Last selected battle command, for combo detection.
    last_command: Option<u16>,

    /// Consecutive selections of `last_command`.
    combo_repeats: u32,

    /// Number of actions this combatant has started.
    turns: u32,
}

impl Combatant {
    /// Create a combatant with full HP and an empty gauge.
    #[must_use]
    pub fn new(id: CombatantId, name: impl Into<String>, max_hp: i32, agility: i32) -> Self {
        Self {
            id,
            name: name.into(),
            hp: max_hp,
            max_hp,
            agility,
            hidden: false,
            controllable: id.side == Side::Ally,
            row: Row::default(),
            facing_flipped: false,
            position: Position::default(),
            preemptive: false,
            statuses: Vec::new(),
            skills: Vec::new(),
            reward: None,
            gauge: 0,
            action: None,
            last_command: None,
            combo_repeats: 0,
            turns: 0,
        }
    }

    // === Liveness ===

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Active participant: visible and alive.
    #[must_use]
    pub fn exists(&self) -> bool {
        !self.hidden && self.is_alive()
    }

    /// The first non-`None` restriction among active statuses.
    #[must_use]
    pub fn significant_restriction(&self) -> Restriction {
        self.statuses
            .iter()
            .map(|s| s.restriction)
            .find(|r| *r != Restriction::None)
            .unwrap_or(Restriction::None)
    }

    /// Whether the combatant can currently take actions.
    #[must_use]
    pub fn can_act(&self) -> bool {
        self.is_alive() && self.significant_restriction() != Restriction::DoNothing
    }

    /// Eligible for gauge initialization and accumulation: visible and
    /// either able to act now or able to recover the ability.
    #[must_use]
    pub fn participates(&self) -> bool {
        !self.hidden && self.is_alive()
    }

    // === ATB gauge ===

    #[must_use]
    pub fn gauge(&self) -> i32 {
        self.gauge
    }

    #[must_use]
    pub fn is_gauge_full(&self) -> bool {
        self.gauge >= GAUGE_MAX
    }

    /// Set the gauge, clamped to `[0, GAUGE_MAX]`.
    pub fn set_gauge(&mut self, value: i32) {
        self.gauge = value.clamp(0, GAUGE_MAX);
    }

    /// Accumulate readiness. Saturates at `GAUGE_MAX`.
    pub fn increase_gauge(&mut self, amount: i32) {
        debug_assert!(amount >= 0, "gauge only decreases via reset");
        self.gauge = (self.gauge + amount).min(GAUGE_MAX);
    }

    // === Assigned action ===

    #[must_use]
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    #[must_use]
    pub fn action(&self) -> Option<&BattleAction> {
        self.action.as_ref()
    }

    /// Assign an action. The gauge resets to 0 the instant the action is
    /// assigned (not when it executes), preventing double-queuing.
    pub fn assign_action(&mut self, action: BattleAction) {
        self.action = Some(action);
        self.gauge = 0;
    }

    /// Consume and clear the assigned action.
    pub fn take_action(&mut self) -> Option<BattleAction> {
        self.action.take()
    }

    // === Combo tracking ===

    #[must_use]
    pub fn last_command(&self) -> Option<u16> {
        self.last_command
    }

    #[must_use]
    pub fn combo_repeats(&self) -> u32 {
        self.combo_repeats
    }

    /// Record a selected battle command, maintaining the consecutive
    /// repeat counter used for combo detection.
    pub fn note_command(&mut self, command_id: u16) {
        if self.last_command == Some(command_id) {
            self.combo_repeats += 1;
        } else {
            self.combo_repeats = 1;
        }
        self.last_command = Some(command_id);
    }

    /// Clear the combo chain (row changes, auto actions, forced moves).
    pub fn clear_last_command(&mut self) {
        self.last_command = None;
        self.combo_repeats = 0;
    }

    // === Turns ===

    #[must_use]
    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn next_turn(&mut self) {
        self.turns += 1;
    }

    // === HP and statuses ===

    /// Apply a raw HP delta, clamped to `[0, max_hp]`. Returns the delta
    /// actually applied.
    pub fn adjust_hp(&mut self, delta: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + delta).clamp(0, self.max_hp);
        self.hp - before
    }

    /// Apply all ongoing status effects once. Returns the net HP change.
    pub fn tick_statuses(&mut self) -> i32 {
        let delta: i32 = self.statuses.iter().map(|s| s.hp_per_turn).sum();
        if delta == 0 {
            0
        } else {
            self.adjust_hp(delta)
        }
    }
}
