//! Encounter configuration: everything fixed before the first frame.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::condition::BattleCondition;

/// ATB gauge mode.
///
/// Under `Active`, gauges keep filling while the player browses menus.
/// Under `Wait`, menu-selection states suspend accumulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtbMode {
    #[default]
    Active,
    Wait,
}

/// A configured combo for one ally: repeating `command_id` at least
/// `times` consecutive selections multiplies the attack's hit count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboSetting {
    pub command_id: u16,
    pub times: u32,
}

/// UI vocabulary rendered through the message surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terms {
    pub battle_start: String,
    pub initiative: String,
    pub surround: String,
    pub escape_success: String,
    pub escape_failure: String,
    pub victory: String,
    pub defeat: String,
    /// Suffix appended after the experience amount.
    pub exp_received: String,
    /// Text around the gold amount.
    pub gold_received_prefix: String,
    pub gold_received_suffix: String,
    /// Suffix appended after a dropped item's name.
    pub item_received: String,
}

impl Default for Terms {
    fn default() -> Self {
        Self {
            battle_start: "A monster appears!".into(),
            initiative: "The party attacks first!".into(),
            surround: "The party surrounds the enemy!".into(),
            escape_success: "The party flees!".into(),
            escape_failure: "Couldn't escape!".into(),
            victory: "Victory!".into(),
            defeat: "The party was defeated...".into(),
            exp_received: " exp".into(),
            gold_received_prefix: "".into(),
            gold_received_suffix: " gold".into(),
            item_received: " received".into(),
        }
    }
}

/// Immutable encounter configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleConfig {
    pub atb_mode: AtbMode,

    /// The condition as configured; the effective one is resolved at
    /// battle start from visibility counts.
    pub condition: BattleCondition,

    /// Troop positions were hand-placed in the editor; rules out the
    /// flanking conditions.
    pub manual_placement: bool,

    /// One-time preemptive flag: allies start full, enemy actions are
    /// suppressed until the first ally action resolves.
    pub first_strike: bool,

    /// Whether the party can attempt to flee at all.
    pub escape_allowed: bool,

    /// Combo settings keyed by ally roster index.
    pub combos: FxHashMap<u16, ComboSetting>,

    pub terms: Terms,
}

impl BattleConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            escape_allowed: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_atb_mode(mut self, mode: AtbMode) -> Self {
        self.atb_mode = mode;
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: BattleCondition) -> Self {
        self.condition = condition;
        self
    }

    #[must_use]
    pub fn with_first_strike(mut self) -> Self {
        self.first_strike = true;
        self
    }

    #[must_use]
    pub fn with_combo(mut self, ally_index: u16, command_id: u16, times: u32) -> Self {
        self.combos.insert(ally_index, ComboSetting { command_id, times });
        self
    }

    /// Combo setting for the given ally, if configured.
    #[must_use]
    pub fn combo_for(&self, ally_index: u16) -> Option<ComboSetting> {
        self.combos.get(&ally_index).copied()
    }
}
