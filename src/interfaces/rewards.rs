//! Reward application contract, invoked only at victory.

use crate::core::CombatantId;

pub trait RewardSink {
    /// Grant experience to one surviving party member.
    fn gain_exp(&mut self, id: CombatantId, amount: i32);

    /// Add gold to the party purse.
    fn gain_gold(&mut self, amount: i32);

    /// Add one dropped item to the inventory.
    fn add_item(&mut self, item_id: u16);
}
