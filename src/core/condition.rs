//! Encounter-wide battle condition: the initiative modifier resolved
//! once at battle start.

use serde::{Deserialize, Serialize};

/// The encounter's initiative modifier. Immutable for the whole battle
/// once resolved; drives initial gauge values and facing directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleCondition {
    #[default]
    None,
    /// The party caught the enemies off guard.
    Initiative,
    /// The enemies caught the party off guard.
    Back,
    /// The party surrounds the enemies.
    Surround,
    /// The enemies surround the party.
    Pincers,
}

impl BattleCondition {
    /// Resolve the effective condition from the configured one.
    ///
    /// `Pincers` needs at least two visible enemies to flank with and is
    /// impossible under manual troop placement; it demotes to `Back`.
    /// `Surround` demotes to `Initiative` symmetrically for the party.
    /// The demoted-or-kept `Back`/`Pincers` conditions cancel any
    /// first-strike flag.
    #[must_use]
    pub fn resolve(
        configured: Self,
        manual_placement: bool,
        visible_allies: usize,
        visible_enemies: usize,
        first_strike: &mut bool,
    ) -> Self {
        let mut condition = configured;
        if condition == Self::Pincers && (manual_placement || visible_enemies <= 1) {
            condition = Self::Back;
        }
        if condition == Self::Surround && (manual_placement || visible_allies <= 1) {
            condition = Self::Initiative;
        }
        if matches!(condition, Self::Back | Self::Pincers) {
            *first_strike = false;
        }
        condition
    }

    /// Allies begin with a full ATB gauge under this condition.
    #[must_use]
    pub fn allies_start_full(self) -> bool {
        matches!(self, Self::Initiative | Self::Surround)
    }

    /// Enemies begin with a full ATB gauge under this condition.
    #[must_use]
    pub fn enemies_start_full(self) -> bool {
        matches!(self, Self::Back | Self::Pincers)
    }

    /// Both sides face in from alternating directions (per-unit flip).
    #[must_use]
    pub fn alternates_facing(self) -> bool {
        matches!(self, Self::Surround | Self::Pincers)
    }
}
