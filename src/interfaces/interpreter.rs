//! Scripted-event interpreter contract.
//!
//! The interpreter executes externally defined event pages; the engine
//! only schedules them and binds the context (acting actor, targeted
//! enemy) scripts can branch on.

use crate::core::CombatantId;
use crate::scheduler::PageFlags;

pub trait EventInterpreter {
    /// An event page is currently executing.
    fn is_running(&self) -> bool;

    /// The running page is parked on a blocking command (wait, choice).
    fn is_waiting_on_blocking_command(&self) -> bool;

    /// Start the next event page whose trigger conditions match the
    /// mask. Returns the page id, or 0 when nothing is eligible.
    fn schedule_next_eligible_page(&mut self, flags: PageFlags) -> u32;

    /// Bind the combatant about to act, for actor-conditioned pages.
    fn set_acting_actor(&mut self, actor: Option<CombatantId>);

    /// Bind the single targeted enemy, for enemy-conditioned pages.
    fn set_enemy_target(&mut self, enemy_index: Option<u16>);

    /// Forget which pages ran this turn, re-arming once-per-turn pages.
    fn reset_pages_executed(&mut self);

    /// Flip a game switch (post-action switch triggers).
    fn set_switch(&mut self, switch_id: u32, on: bool);
}
