//! Battler sprite proxy contract.

use crate::core::CombatantId;

use super::effects::FloatTextKind;

/// Animation poses the engine requests per combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpritePose {
    Idle,
    Attack,
    Damage,
    Victory,
    /// Running-away walk used by the escape sequence.
    Walk,
    Dead,
}

/// Per-combatant visual state. The pipeline polls `is_idling` before
/// advancing past stages that must wait for a pose to settle.
pub trait BattlerSprites {
    fn set_pose(&mut self, id: CombatantId, pose: SpritePose);

    /// The combatant's sprite has returned to its idle pose.
    fn is_idling(&self, id: CombatantId) -> bool;

    /// Flash the battler (enemy attack feedback).
    fn flash(&mut self, id: CombatantId);

    /// Show floating combat text over the battler.
    fn float_text(&mut self, id: CombatantId, kind: FloatTextKind, amount: i32);
}
