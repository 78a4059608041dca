//! Battle actions: the value object a combatant owns between selection
//! and resolution.
//!
//! An action is created when a selection completes (player input, auto
//! heuristic, or enemy AI), owned by exactly one combatant, and consumed
//! by the resolution pipeline's terminal stage. It carries both the
//! declarative request (verb, targets, announcement) and the transient
//! per-hit resolution state filled in by the combat rules.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::combatant::CombatantId;

/// What an action does. Closed set; every pipeline stage matches on it
/// exhaustively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionVerb {
    Attack,
    Skill,
    Item,
    Defend,
    RowChange,
    /// Deliberate no-op turn (guarding scripts, stunned fillers).
    None,
    Flee,
}

impl ActionVerb {
    /// Whether consecutive repeats of this verb can build a combo.
    #[must_use]
    pub fn combo_eligible(self) -> bool {
        matches!(self, ActionVerb::Attack | ActionVerb::Skill)
    }

    /// Whether the action visibly does something to the battlefield
    /// (drives enemy attack feedback and waits).
    #[must_use]
    pub fn is_real(self) -> bool {
        matches!(self, ActionVerb::Attack | ActionVerb::Skill | ActionVerb::Item)
    }
}

/// Outcome of one executed hit against one target, produced by the
/// combat rules and consumed for feedback (floating text, sounds).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitOutcome {
    pub success: bool,
    pub critical: bool,
    /// HP delta applied to the target, if any.
    pub affected_hp: Option<i32>,
    /// True when the effect heals rather than harms.
    pub positive: bool,
}

/// One assigned battle action.
///
/// Target iteration state (`cur_target`, `cur_repeat`) lives on the
/// action itself so the pipeline can resume mid-sweep across frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleAction {
    pub source: CombatantId,
    pub verb: ActionVerb,
    pub targets: SmallVec<[CombatantId; 4]>,

    /// Skill or item identifier, when the verb carries one.
    pub payload_id: Option<u16>,

    /// Battle command that produced this action, for combo detection.
    /// `None` for forced, auto, and enemy actions.
    pub command_id: Option<u16>,

    /// Visual effect played during the animation stages.
    pub animation_id: Option<u16>,

    /// Announcement shown by the notify stage.
    pub start_message: Option<String>,

    /// Total times the start-to-apply cycle runs.
    pub hits: u32,

    /// A target bounces the effect back at the source; the animation
    /// stage replays mirrored against the source before applying.
    pub reflect: bool,

    /// Switches flipped on at the finished stage, consumed by
    /// after-action event triggers.
    pub switches_on: SmallVec<[u32; 2]>,
    pub switches_off: SmallVec<[u32; 2]>,

    /// Most recent hit outcome (one per executed target).
    pub last_outcome: HitOutcome,

    cur_target: usize,
    cur_repeat: u32,
}

impl BattleAction {
    #[must_use]
    pub fn new(source: CombatantId, verb: ActionVerb) -> Self {
        Self {
            source,
            verb,
            targets: SmallVec::new(),
            payload_id: None,
            command_id: None,
            animation_id: None,
            start_message: None,
            hits: 1,
            reflect: false,
            switches_on: SmallVec::new(),
            switches_off: SmallVec::new(),
            last_outcome: HitOutcome::default(),
            cur_target: 0,
            cur_repeat: 0,
        }
    }

    /// A normal attack against one target.
    #[must_use]
    pub fn attack(source: CombatantId, target: CombatantId) -> Self {
        let mut action = Self::new(source, ActionVerb::Attack);
        action.targets.push(target);
        action
    }

    /// A skill use against the given targets.
    #[must_use]
    pub fn skill(
        source: CombatantId,
        skill_id: u16,
        targets: impl IntoIterator<Item = CombatantId>,
    ) -> Self {
        let mut action = Self::new(source, ActionVerb::Skill);
        action.payload_id = Some(skill_id);
        action.targets.extend(targets);
        action
    }

    /// An item use against one target.
    #[must_use]
    pub fn item(source: CombatantId, item_id: u16, target: CombatantId) -> Self {
        let mut action = Self::new(source, ActionVerb::Item);
        action.payload_id = Some(item_id);
        action.targets.push(target);
        action
    }

    /// A self-targeted defend.
    #[must_use]
    pub fn defend(source: CombatantId) -> Self {
        let mut action = Self::new(source, ActionVerb::Defend);
        action.targets.push(source);
        action
    }

    /// A row change (no targets, no animation).
    #[must_use]
    pub fn row_change(source: CombatantId) -> Self {
        Self::new(source, ActionVerb::RowChange)
    }

    #[must_use]
    pub fn with_command(mut self, command_id: u16) -> Self {
        self.command_id = Some(command_id);
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.start_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_animation(mut self, animation_id: u16) -> Self {
        self.animation_id = Some(animation_id);
        self
    }

    // === Target sweep ===

    /// The target currently being resolved, if any remain.
    #[must_use]
    pub fn current_target(&self) -> Option<CombatantId> {
        self.targets.get(self.cur_target).copied()
    }

    /// Advance to the next target. Returns false when the sweep is done.
    pub fn target_next(&mut self) -> bool {
        self.cur_target += 1;
        self.cur_target < self.targets.len()
    }

    /// Restart the target sweep for a hit repetition.
    pub fn restart_targets(&mut self) {
        self.cur_target = 0;
    }

    /// Record one completed start-to-apply cycle. Returns true while
    /// further repetitions remain.
    pub fn repeat_next(&mut self) -> bool {
        self.cur_repeat += 1;
        self.cur_repeat < self.hits
    }

    /// Multiply the hit count (combo bonus).
    pub fn multiply_hits(&mut self, factor: u32) {
        self.hits = self.hits.saturating_mul(factor.max(1));
    }
}

/// A resolved action as remembered in the battle's append-only history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub turn: u32,
    pub source: CombatantId,
    pub verb: ActionVerb,
    pub targets: SmallVec<[CombatantId; 4]>,
}

impl ActionRecord {
    #[must_use]
    pub fn of(action: &BattleAction, turn: u32) -> Self {
        Self {
            turn,
            source: action.source,
            verb: action.verb,
            targets: action.targets.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_sweep() {
        let mut action = BattleAction::skill(
            CombatantId::ally(0),
            7,
            [CombatantId::enemy(0), CombatantId::enemy(1)],
        );
        assert_eq!(action.current_target(), Some(CombatantId::enemy(0)));
        assert!(action.target_next());
        assert_eq!(action.current_target(), Some(CombatantId::enemy(1)));
        assert!(!action.target_next());
        assert_eq!(action.current_target(), None);

        action.restart_targets();
        assert_eq!(action.current_target(), Some(CombatantId::enemy(0)));
    }

    #[test]
    fn test_repeat_counting() {
        let mut action = BattleAction::attack(CombatantId::ally(0), CombatantId::enemy(0));
        action.hits = 3;
        assert!(action.repeat_next());
        assert!(action.repeat_next());
        assert!(!action.repeat_next());
    }

    #[test]
    fn test_multiply_hits() {
        let mut action = BattleAction::attack(CombatantId::ally(0), CombatantId::enemy(0));
        action.multiply_hits(2);
        assert_eq!(action.hits, 2);
        action.multiply_hits(0);
        assert_eq!(action.hits, 2);
    }

    #[test]
    fn test_combo_eligibility() {
        assert!(ActionVerb::Attack.combo_eligible());
        assert!(ActionVerb::Skill.combo_eligible());
        assert!(!ActionVerb::Item.combo_eligible());
        assert!(!ActionVerb::Defend.combo_eligible());
        assert!(!ActionVerb::None.combo_eligible());
    }

    #[test]
    fn test_real_actions() {
        assert!(ActionVerb::Attack.is_real());
        assert!(ActionVerb::Item.is_real());
        assert!(!ActionVerb::RowChange.is_real());
        assert!(!ActionVerb::Flee.is_real());
    }

    #[test]
    fn test_record_captures_targets() {
        let action = BattleAction::attack(CombatantId::ally(1), CombatantId::enemy(2));
        let record = ActionRecord::of(&action, 4);
        assert_eq!(record.turn, 4);
        assert_eq!(record.source, CombatantId::ally(1));
        assert_eq!(record.targets.as_slice(), &[CombatantId::enemy(2)]);
    }

    #[test]
    fn test_action_serde() {
        let action = BattleAction::skill(CombatantId::ally(0), 3, [CombatantId::enemy(0)])
            .with_message("Fire!")
            .with_animation(12);
        let json = serde_json::to_string(&action).unwrap();
        let back: BattleAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
