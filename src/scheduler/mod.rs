//! Turn/event scheduler: decides when scripted-event pages run and
//! surfaces victory/defeat detected along the way.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Roster, Side};
use crate::interfaces::{EventInterpreter, MessageSurface};

/// Why events are being scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTrigger {
    /// Right before a queued action starts.
    BeforeAction,
    /// Right after a queued action finished.
    AfterAction,
    /// Battle start: everything is eligible.
    All,
}

/// Which page trigger conditions are eligible to fire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFlags {
    pub turn: bool,
    pub turn_actor: bool,
    pub turn_enemy: bool,
    pub command_actor: bool,
    pub switch_a: bool,
    pub switch_b: bool,
    pub fatigue: bool,
    pub enemy_hp: bool,
    pub actor_hp: bool,
}

impl PageFlags {
    /// Turn-count and actor/enemy-turn triggers.
    #[must_use]
    pub fn before_action() -> Self {
        Self {
            turn: true,
            turn_actor: true,
            turn_enemy: true,
            command_actor: true,
            ..Self::default()
        }
    }

    /// Switch, fatigue, and HP-threshold triggers.
    #[must_use]
    pub fn after_action() -> Self {
        Self {
            switch_a: true,
            switch_b: true,
            fatigue: true,
            enemy_hp: true,
            actor_hp: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn all() -> Self {
        Self {
            turn: true,
            turn_actor: true,
            turn_enemy: true,
            command_actor: true,
            switch_a: true,
            switch_b: true,
            fatigue: true,
            enemy_hp: true,
            actor_hp: true,
        }
    }
}

impl EventTrigger {
    #[must_use]
    pub fn page_flags(self) -> PageFlags {
        match self {
            EventTrigger::BeforeAction => PageFlags::before_action(),
            EventTrigger::AfterAction => PageFlags::after_action(),
            EventTrigger::All => PageFlags::all(),
        }
    }
}

/// Outcome of one scheduling call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleStatus {
    /// Nothing (further) to run; the caller may continue this frame.
    Settled,
    /// A page is queued or running; wait before continuing.
    Pending,
    /// Every enemy is gone; the scene must enter victory.
    Victory,
    /// Every ally is gone; the scene must enter defeat.
    Defeat,
}

/// Schedule the next eligible scripted page for the given trigger.
///
/// A running interpreter makes this a busy no-op. Before-action and
/// battle-start scheduling also settles without effect while a message
/// is visible or the running page is parked on a blocking command
/// (after-action triggers fire regardless, so switch-flip pages are
/// never starved). Victory and defeat are evaluated before any page is
/// requested and terminate scheduling early.
pub fn schedule_events(
    trigger: EventTrigger,
    interpreter: &mut dyn EventInterpreter,
    messages: &dyn MessageSurface,
    roster: &Roster,
) -> ScheduleStatus {
    if interpreter.is_running() {
        return ScheduleStatus::Pending;
    }
    if trigger != EventTrigger::AfterAction
        && (interpreter.is_waiting_on_blocking_command() || messages.is_message_visible())
    {
        return ScheduleStatus::Settled;
    }

    if !roster.any_active(Side::Enemy) {
        return ScheduleStatus::Victory;
    }
    if !roster.any_active(Side::Ally) {
        return ScheduleStatus::Defeat;
    }

    let page_id = interpreter.schedule_next_eligible_page(trigger.page_flags());
    if page_id != 0 {
        debug!(?trigger, page_id, "scheduled event page");
    }
    if interpreter.is_running() {
        ScheduleStatus::Pending
    } else {
        ScheduleStatus::Settled
    }
}
