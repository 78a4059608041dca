//! Scene states and the sub-state convention.

use serde::{Deserialize, Serialize};

/// Top-level battle scene state.
///
/// Each state owns an integer sub-state scoped to it; transitioning
/// always resets the sub-state to 0 (see `BattleScene::set_state`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneState {
    /// Opening messages and battle-start event pass.
    Start,
    /// Top menu: fight, auto-battle, or escape.
    SelectOption,
    /// Waiting for a ready, controllable actor to command.
    SelectActor,
    /// Every ally acts on the auto heuristic.
    AutoBattle,
    /// Per-actor command menu.
    SelectCommand,
    SelectItem,
    SelectSkill,
    SelectEnemyTarget,
    SelectAllyTarget,
    /// Queued actions resolve through the pipeline.
    Battle,
    Victory,
    Defeat,
    Escape,
}

impl SceneState {
    /// Terminal states never transition away once entered.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SceneState::Victory | SceneState::Defeat | SceneState::Escape)
    }

    /// States preempted to `Battle` the moment the queue is non-empty.
    /// Command selection is only preempted under active ATB mode; the
    /// caller checks the mode.
    #[must_use]
    pub fn preempted_by_queue(self) -> bool {
        matches!(self, SceneState::SelectActor | SceneState::AutoBattle)
    }
}

/// Sub-states of `SceneState::Battle`.
pub mod battle_substate {
    pub const BEGIN: i32 = 0;
    pub const PRE_ACTION: i32 = 1;
    pub const BATTLE_ACTION: i32 = 2;
    pub const POST_EVENTS: i32 = 3;
    pub const POST: i32 = 4;
}

/// Battle command identifiers (combo detection keys off these).
pub mod commands {
    pub const ATTACK: u16 = 1;
    pub const SKILL: u16 = 2;
    pub const ITEM: u16 = 3;
    pub const DEFEND: u16 = 4;
    pub const ROW_CHANGE: u16 = 5;
    pub const ESCAPE: u16 = 6;
}
