//! The battle scene state machine: the top-level, frame-driven driver.
//!
//! ## Execution model
//!
//! `update` runs once per rendered frame. It checks for battle end,
//! then stops early while the interpreter runs, a message is visible,
//! or a wait is pending. On frames that pass those gates it advances
//! ATB gauges (in accumulating states), turns ready combatants into
//! queued actions, and loops `process_scene_action` while it returns
//! `ContinueThisFrame` — so a state may fully resolve across several
//! sub-states within one frame, while input-driven states yield once
//! per frame to sample fresh input.
//!
//! ## Input mapping
//!
//! The engine only knows the `{Confirm, Cancel, Menu}` action set.
//! Menus map onto it: `Menu` cycles the cursor, `Confirm` selects,
//! `Cancel` backs out (or, on the top option menu, attempts an escape).

pub mod state;
pub mod wait;

pub use state::{battle_substate, commands, SceneState};
pub use wait::WaitTimer;

use im::Vector;
use tracing::debug;

use crate::atb;
use crate::core::{
    ActionRecord, AtbMode, BattleAction, BattleCondition, BattleConfig, BattleRng, CombatantId,
    Restriction, Row, Side,
};
use crate::interfaces::{
    BattlerSprites, EffectPlayer, EventInterpreter, InputAction, InputSource, MessageSurface,
    RewardSink, SpritePose, SystemSound,
};
use crate::outcome::{BattleResult, Rewards};
use crate::pipeline::{ActionContext, ActionPipeline, StageResult};
use crate::queue::ActionQueue;
use crate::rules::CombatRules;
use crate::scheduler::{schedule_events, EventTrigger, ScheduleStatus};

/// Result of one logical scene step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneStep {
    ContinueThisFrame,
    WaitTillNextFrame,
}

/// The out-of-scope collaborators the scene drives.
pub struct SceneHooks {
    pub interpreter: Box<dyn EventInterpreter>,
    pub messages: Box<dyn MessageSurface>,
    pub effects: Box<dyn EffectPlayer>,
    pub sprites: Box<dyn BattlerSprites>,
    pub rewards: Box<dyn RewardSink>,
}

/// A command committed up to target selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PendingCommand {
    Attack,
    Skill(u16),
    Item(u16),
}

const COMMAND_LIST: [u16; 6] = [
    commands::ATTACK,
    commands::SKILL,
    commands::ITEM,
    commands::DEFEND,
    commands::ROW_CHANGE,
    commands::ESCAPE,
];

/// One running battle encounter.
pub struct BattleScene {
    roster: crate::core::Roster,
    config: BattleConfig,
    condition: BattleCondition,
    first_strike: bool,
    rng: BattleRng,
    rules: Box<dyn CombatRules>,

    interpreter: Box<dyn EventInterpreter>,
    messages: Box<dyn MessageSurface>,
    effects: Box<dyn EffectPlayer>,
    sprites: Box<dyn BattlerSprites>,
    rewards: Box<dyn RewardSink>,

    state: SceneState,
    previous_state: SceneState,
    substate: i32,
    wait: WaitTimer,

    queue: ActionQueue,
    pipeline: Option<ActionPipeline>,
    history: Vector<ActionRecord>,

    turn: u32,
    escape_attempts: u32,
    active_actor: Option<CombatantId>,
    pending_command: Option<PendingCommand>,
    command_cursor: usize,
    menu_cursor: usize,
    target_cursor: usize,
    inventory: Vec<u16>,
    running_away: bool,
    result: Option<BattleResult>,
}

impl BattleScene {
    /// Create the scene and perform battle-start setup: condition
    /// resolution (with demotions), forced front row, facing, and
    /// initial gauges.
    #[must_use]
    pub fn new(
        mut roster: crate::core::Roster,
        config: BattleConfig,
        rules: Box<dyn CombatRules>,
        hooks: SceneHooks,
        seed: u64,
    ) -> Self {
        let mut first_strike = config.first_strike;
        let condition = BattleCondition::resolve(
            config.condition,
            config.manual_placement,
            roster.visible_count(Side::Ally),
            roster.visible_count(Side::Enemy),
            &mut first_strike,
        );
        roster.force_front_row_if_needed();
        roster.init_facing(condition);
        atb::init_gauges(&mut roster, condition, first_strike);
        debug!(?condition, first_strike, "battle start");

        Self {
            roster,
            config,
            condition,
            first_strike,
            rng: BattleRng::new(seed),
            rules,
            interpreter: hooks.interpreter,
            messages: hooks.messages,
            effects: hooks.effects,
            sprites: hooks.sprites,
            rewards: hooks.rewards,
            state: SceneState::Start,
            previous_state: SceneState::Start,
            substate: 0,
            wait: WaitTimer::new(),
            queue: ActionQueue::new(),
            pipeline: None,
            history: Vector::new(),
            turn: 0,
            escape_attempts: 0,
            active_actor: None,
            pending_command: None,
            command_cursor: 0,
            menu_cursor: 0,
            target_cursor: 0,
            inventory: Vec::new(),
            running_away: false,
            result: None,
        }
    }

    // === Observers ===

    #[must_use]
    pub fn state(&self) -> SceneState {
        self.state
    }

    #[must_use]
    pub fn substate(&self) -> i32 {
        self.substate
    }

    #[must_use]
    pub fn condition(&self) -> BattleCondition {
        self.condition
    }

    #[must_use]
    pub fn first_strike(&self) -> bool {
        self.first_strike
    }

    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub fn result(&self) -> Option<BattleResult> {
        self.result
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    #[must_use]
    pub fn roster(&self) -> &crate::core::Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut crate::core::Roster {
        &mut self.roster
    }

    #[must_use]
    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    #[must_use]
    pub fn history(&self) -> &Vector<ActionRecord> {
        &self.history
    }

    #[must_use]
    pub fn active_actor(&self) -> Option<CombatantId> {
        self.active_actor
    }

    /// Party inventory of usable battle items.
    pub fn set_inventory(&mut self, items: Vec<u16>) {
        self.inventory = items;
    }

    // === Frame driver ===

    /// Advance the battle by one frame.
    pub fn update(&mut self, input: &dyn InputSource) {
        if self.result.is_some() {
            return;
        }

        self.check_battle_end();

        if self.interpreter.is_running() || self.messages.is_message_visible() {
            return;
        }
        if !self.wait.update(input) {
            return;
        }
        self.update_atb();

        loop {
            if self.result.is_some()
                || self.interpreter.is_running()
                || self.messages.is_message_visible()
                || self.wait.is_waiting()
            {
                break;
            }
            match self.process_scene_action(input) {
                SceneStep::ContinueThisFrame => {}
                SceneStep::WaitTillNextFrame => break,
            }
        }
    }

    /// Victory/defeat detection, checked every update before ATB moves.
    /// Terminal states are sticky.
    fn check_battle_end(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        if !self.roster.any_active(Side::Enemy) {
            self.set_state(SceneState::Victory);
        } else if !self.roster.any_active(Side::Ally) {
            self.set_state(SceneState::Defeat);
        }
    }

    /// Gauge accumulation and ready-action creation. Runs only on
    /// frames that passed the interpreter, message, and wait gates, so
    /// gauges freeze while any of those holds the scene.
    fn update_atb(&mut self) {
        if atb::accumulates_in(self.state, self.config.atb_mode)
            && !self.effects.is_effect_playing()
        {
            atb::advance(&mut self.roster);
        }
        self.create_auto_actions();
    }

    /// Assign actions to ready combatants whose selection is not
    /// player-driven: enemies, auto-battling or uncontrollable allies,
    /// and anyone under a forced-attack restriction.
    fn create_auto_actions(&mut self) {
        let ready: Vec<CombatantId> = self
            .roster
            .all()
            .filter(|c| c.exists() && c.can_act() && c.is_gauge_full() && !c.has_action())
            .map(|c| c.id)
            .collect();

        for id in ready {
            let restriction = self
                .roster
                .get(id)
                .map_or(Restriction::None, |c| c.significant_restriction());

            let action = match restriction {
                Restriction::AttackAlly => self
                    .roster
                    .random_active(Side::Ally, &mut self.rng)
                    .map(|target| BattleAction::attack(id, target)),
                Restriction::AttackEnemy => self
                    .roster
                    .random_active(Side::Enemy, &mut self.rng)
                    .map(|target| BattleAction::attack(id, target)),
                _ => match id.side {
                    Side::Enemy => {
                        let Some(enemy) = self.roster.get(id) else {
                            continue;
                        };
                        self.rules.select_enemy_action(enemy, &self.roster, &mut self.rng)
                    }
                    Side::Ally => {
                        let auto = self.state == SceneState::AutoBattle
                            || self.roster.get(id).is_some_and(|c| !c.controllable);
                        if !auto {
                            // Player-controlled: waits for the menus.
                            continue;
                        }
                        let Some(ally) = self.roster.get(id) else {
                            continue;
                        };
                        self.rules.select_auto_action(ally, &self.roster, &mut self.rng)
                    }
                },
            };

            if let Some(action) = action {
                self.commit_action(action);
            }
        }
    }

    /// The action-selected callback: record the command for combo
    /// tracking, hand the action to its owner (zeroing the gauge), and
    /// enqueue.
    fn commit_action(&mut self, action: BattleAction) {
        let source = action.source;
        let command_id = action.command_id;
        if let Some(combatant) = self.roster.get_mut(source) {
            match command_id {
                Some(cmd) => combatant.note_command(cmd),
                None => combatant.clear_last_command(),
            }
            combatant.assign_action(action);
            self.queue.enqueue(source);
        }
    }

    /// Transition. Always resets the sub-state; never leaves a
    /// terminal state.
    fn set_state(&mut self, new_state: SceneState) {
        if self.state.is_terminal() {
            return;
        }
        debug!(from = ?self.state, to = ?new_state, "scene transition");
        self.previous_state = self.state;
        self.state = new_state;
        self.substate = 0;
        if new_state.is_terminal() {
            self.queue.clear();
            self.pipeline = None;
        }
    }

    fn schedule(&mut self, trigger: EventTrigger) -> ScheduleStatus {
        schedule_events(
            trigger,
            self.interpreter.as_mut(),
            self.messages.as_ref(),
            &self.roster,
        )
    }

    /// A decided action preempts menu browsing: always from actor
    /// selection and auto-battle, from the command menu only under
    /// active ATB mode.
    fn queue_preempts(&self) -> bool {
        if self.queue.is_empty() {
            return false;
        }
        self.state.preempted_by_queue()
            || (self.state == SceneState::SelectCommand
                && self.config.atb_mode == AtbMode::Active)
    }

    /// Execute exactly one logical step of the outer state machine.
    fn process_scene_action(&mut self, input: &dyn InputSource) -> SceneStep {
        if self.queue_preempts() {
            self.set_state(SceneState::Battle);
            return SceneStep::ContinueThisFrame;
        }

        match self.state {
            SceneState::Start => self.process_start(),
            SceneState::SelectOption => self.process_select_option(input),
            SceneState::SelectActor => self.process_select_actor(),
            SceneState::AutoBattle => self.process_auto_battle(input),
            SceneState::SelectCommand => self.process_select_command(input),
            SceneState::SelectSkill => self.process_select_skill(input),
            SceneState::SelectItem => self.process_select_item(input),
            SceneState::SelectEnemyTarget => self.process_select_target(input, Side::Enemy),
            SceneState::SelectAllyTarget => self.process_select_target(input, Side::Ally),
            SceneState::Battle => self.process_battle(),
            SceneState::Victory => self.process_victory(),
            SceneState::Defeat => self.process_defeat(),
            SceneState::Escape => self.process_escape(),
        }
    }

    // === Start ===

    fn process_start(&mut self) -> SceneStep {
        match self.substate {
            0 => {
                let line = self.config.terms.battle_start.clone();
                self.messages.push_line(&line);
                self.wait.set(10, 80);
                self.substate = 1;
                SceneStep::ContinueThisFrame
            }
            1 => {
                let special = match self.condition {
                    BattleCondition::Initiative => Some(self.config.terms.initiative.clone()),
                    BattleCondition::Surround => Some(self.config.terms.surround.clone()),
                    _ if self.first_strike => Some(self.config.terms.initiative.clone()),
                    _ => None,
                };
                if let Some(line) = special {
                    self.messages.push_line(&line);
                    self.wait.set(30, 70);
                }
                self.substate = 2;
                SceneStep::ContinueThisFrame
            }
            _ => match self.schedule(EventTrigger::All) {
                ScheduleStatus::Pending => SceneStep::WaitTillNextFrame,
                ScheduleStatus::Victory => {
                    self.set_state(SceneState::Victory);
                    SceneStep::ContinueThisFrame
                }
                ScheduleStatus::Defeat => {
                    self.set_state(SceneState::Defeat);
                    SceneStep::ContinueThisFrame
                }
                ScheduleStatus::Settled => {
                    self.set_state(SceneState::SelectOption);
                    SceneStep::ContinueThisFrame
                }
            },
        }
    }

    // === Option menu ===

    /// Option-menu escape needs the very first exchange and a
    /// favorable opening.
    #[must_use]
    pub fn option_escape_allowed(&self) -> bool {
        self.config.escape_allowed
            && self.turn == 0
            && (self.first_strike
                || matches!(
                    self.condition,
                    BattleCondition::Initiative | BattleCondition::Surround
                ))
    }

    /// Command-menu escape is barred only while pincered.
    #[must_use]
    pub fn command_escape_allowed(&self) -> bool {
        self.config.escape_allowed && self.condition != BattleCondition::Pincers
    }

    fn process_select_option(&mut self, input: &dyn InputSource) -> SceneStep {
        if self.substate == 0 {
            self.substate = 1;
            return SceneStep::WaitTillNextFrame;
        }
        if input.is_triggered(InputAction::Confirm) {
            self.set_state(SceneState::SelectActor);
            return SceneStep::ContinueThisFrame;
        }
        if input.is_triggered(InputAction::Menu) {
            self.set_state(SceneState::AutoBattle);
            return SceneStep::ContinueThisFrame;
        }
        if input.is_triggered(InputAction::Cancel) && self.option_escape_allowed() {
            // Eligibility already decided it: no roll from here.
            self.begin_escape();
            return SceneStep::ContinueThisFrame;
        }
        SceneStep::WaitTillNextFrame
    }

    fn begin_escape(&mut self) {
        self.running_away = true;
        self.set_state(SceneState::Escape);
    }

    // === Actor selection ===

    fn process_select_actor(&mut self) -> SceneStep {
        let ready = self.roster.side(Side::Ally).iter().find(|a| {
            a.exists()
                && a.can_act()
                && a.controllable
                && a.is_gauge_full()
                && !a.has_action()
                && a.significant_restriction() == Restriction::None
        });
        if let Some(actor) = ready {
            self.active_actor = Some(actor.id);
            self.set_state(SceneState::SelectCommand);
            return SceneStep::ContinueThisFrame;
        }
        SceneStep::WaitTillNextFrame
    }

    fn process_auto_battle(&mut self, input: &dyn InputSource) -> SceneStep {
        if input.is_triggered(InputAction::Cancel) {
            self.set_state(SceneState::SelectOption);
            return SceneStep::ContinueThisFrame;
        }
        SceneStep::WaitTillNextFrame
    }

    // === Command menu ===

    fn process_select_command(&mut self, input: &dyn InputSource) -> SceneStep {
        let Some(actor) = self.active_actor.filter(|id| {
            self.roster
                .get(*id)
                .is_some_and(|c| c.exists() && c.can_act())
        }) else {
            self.active_actor = None;
            self.set_state(SceneState::SelectActor);
            return SceneStep::ContinueThisFrame;
        };

        if self.substate == 0 {
            self.command_cursor = 0;
            self.substate = 1;
            return SceneStep::WaitTillNextFrame;
        }

        if input.is_triggered(InputAction::Menu) {
            self.command_cursor = (self.command_cursor + 1) % COMMAND_LIST.len();
            return SceneStep::WaitTillNextFrame;
        }
        if input.is_triggered(InputAction::Cancel) {
            self.active_actor = None;
            self.set_state(SceneState::SelectOption);
            return SceneStep::ContinueThisFrame;
        }
        if !input.is_triggered(InputAction::Confirm) {
            return SceneStep::WaitTillNextFrame;
        }

        match COMMAND_LIST[self.command_cursor] {
            commands::ATTACK => {
                self.pending_command = Some(PendingCommand::Attack);
                self.set_state(SceneState::SelectEnemyTarget);
            }
            commands::SKILL => {
                self.set_state(SceneState::SelectSkill);
            }
            commands::ITEM => {
                self.set_state(SceneState::SelectItem);
            }
            commands::DEFEND => {
                let action = BattleAction::defend(actor).with_command(commands::DEFEND);
                self.commit_action(action);
                self.active_actor = None;
                self.set_state(SceneState::SelectActor);
            }
            commands::ROW_CHANGE => {
                if self.roster.row_change_allowed(actor) {
                    if let Some(combatant) = self.roster.get_mut(actor) {
                        combatant.row = match combatant.row {
                            Row::Front => Row::Back,
                            Row::Back => Row::Front,
                        };
                    }
                    let action =
                        BattleAction::row_change(actor).with_command(commands::ROW_CHANGE);
                    self.commit_action(action);
                    self.active_actor = None;
                    self.set_state(SceneState::SelectActor);
                }
                // Ineligible: the cursor stays put.
            }
            _ => return self.command_escape(actor),
        }
        SceneStep::ContinueThisFrame
    }

    /// Escape attempted from an actor's command menu: the actor spends
    /// its readiness on the attempt, then the escape formula rolls.
    fn command_escape(&mut self, actor: CombatantId) -> SceneStep {
        if let Some(combatant) = self.roster.get_mut(actor) {
            combatant.set_gauge(0);
        }

        if !self.command_escape_allowed() {
            return self.escape_failed();
        }

        let chance = self.rules.escape_chance(&self.roster, self.escape_attempts);
        if self.rng.gen_bool(chance) {
            self.begin_escape();
            SceneStep::ContinueThisFrame
        } else {
            self.escape_failed()
        }
    }

    fn escape_failed(&mut self) -> SceneStep {
        self.escape_attempts += 1;
        let line = self.config.terms.escape_failure.clone();
        self.messages.push_line(&line);
        self.wait.set(10, 30);
        self.active_actor = None;
        self.set_state(SceneState::SelectActor);
        SceneStep::ContinueThisFrame
    }

    // === Skill / item menus ===

    fn process_select_skill(&mut self, input: &dyn InputSource) -> SceneStep {
        let Some(actor) = self.active_actor else {
            self.set_state(SceneState::SelectActor);
            return SceneStep::ContinueThisFrame;
        };
        let skills: Vec<u16> = self
            .roster
            .get(actor)
            .map(|c| c.skills.clone())
            .unwrap_or_default();
        if skills.is_empty() {
            self.set_state(SceneState::SelectCommand);
            return SceneStep::ContinueThisFrame;
        }

        if self.substate == 0 {
            self.menu_cursor = 0;
            self.substate = 1;
            return SceneStep::WaitTillNextFrame;
        }
        if input.is_triggered(InputAction::Menu) {
            self.menu_cursor = (self.menu_cursor + 1) % skills.len();
            return SceneStep::WaitTillNextFrame;
        }
        if input.is_triggered(InputAction::Cancel) {
            self.set_state(SceneState::SelectCommand);
            return SceneStep::ContinueThisFrame;
        }
        if input.is_triggered(InputAction::Confirm) {
            self.pending_command = Some(PendingCommand::Skill(skills[self.menu_cursor]));
            self.set_state(SceneState::SelectEnemyTarget);
            return SceneStep::ContinueThisFrame;
        }
        SceneStep::WaitTillNextFrame
    }

    fn process_select_item(&mut self, input: &dyn InputSource) -> SceneStep {
        if self.active_actor.is_none() {
            self.set_state(SceneState::SelectActor);
            return SceneStep::ContinueThisFrame;
        }
        if self.inventory.is_empty() {
            self.set_state(SceneState::SelectCommand);
            return SceneStep::ContinueThisFrame;
        }

        if self.substate == 0 {
            self.menu_cursor = 0;
            self.substate = 1;
            return SceneStep::WaitTillNextFrame;
        }
        if input.is_triggered(InputAction::Menu) {
            self.menu_cursor = (self.menu_cursor + 1) % self.inventory.len();
            return SceneStep::WaitTillNextFrame;
        }
        if input.is_triggered(InputAction::Cancel) {
            self.set_state(SceneState::SelectCommand);
            return SceneStep::ContinueThisFrame;
        }
        if input.is_triggered(InputAction::Confirm) {
            self.pending_command = Some(PendingCommand::Item(self.inventory[self.menu_cursor]));
            self.set_state(SceneState::SelectAllyTarget);
            return SceneStep::ContinueThisFrame;
        }
        SceneStep::WaitTillNextFrame
    }

    // === Target selection ===

    fn process_select_target(&mut self, input: &dyn InputSource, side: Side) -> SceneStep {
        let Some(actor) = self.active_actor else {
            self.set_state(SceneState::SelectActor);
            return SceneStep::ContinueThisFrame;
        };
        let candidates: Vec<CombatantId> = self.roster.active_on(side).map(|c| c.id).collect();
        if candidates.is_empty() {
            self.set_state(SceneState::SelectCommand);
            return SceneStep::ContinueThisFrame;
        }

        if self.substate == 0 {
            self.target_cursor = 0;
            self.substate = 1;
            return SceneStep::WaitTillNextFrame;
        }
        if input.is_triggered(InputAction::Menu) {
            self.target_cursor = (self.target_cursor + 1) % candidates.len();
            return SceneStep::WaitTillNextFrame;
        }
        if input.is_triggered(InputAction::Cancel) {
            self.set_state(SceneState::SelectCommand);
            return SceneStep::ContinueThisFrame;
        }
        if !input.is_triggered(InputAction::Confirm) {
            return SceneStep::WaitTillNextFrame;
        }

        let target = candidates[self.target_cursor.min(candidates.len() - 1)];
        let action = match self.pending_command.take() {
            Some(PendingCommand::Skill(skill_id)) => {
                BattleAction::skill(actor, skill_id, [target])
                    .with_command(commands::SKILL)
                    .with_animation(skill_id)
                    .with_message(format!("Skill {skill_id}!"))
            }
            Some(PendingCommand::Item(item_id)) => {
                BattleAction::item(actor, item_id, target).with_command(commands::ITEM)
            }
            _ => BattleAction::attack(actor, target).with_command(commands::ATTACK),
        };
        self.commit_action(action);
        self.active_actor = None;
        self.set_state(SceneState::SelectActor);
        SceneStep::ContinueThisFrame
    }

    // === Battle (action resolution) ===

    fn process_battle(&mut self) -> SceneStep {
        match self.substate {
            battle_substate::BEGIN => {
                self.substate = battle_substate::PRE_ACTION;
                SceneStep::ContinueThisFrame
            }
            battle_substate::PRE_ACTION => self.battle_pre_action(),
            battle_substate::BATTLE_ACTION => self.battle_action(),
            battle_substate::POST_EVENTS => self.battle_post_events(),
            _ => {
                // Queue drained: hand control back to selection.
                let back = if self.active_actor.is_some()
                    && self.previous_state != SceneState::Battle
                    && !self.previous_state.is_terminal()
                {
                    self.previous_state
                } else {
                    SceneState::SelectActor
                };
                self.set_state(back);
                SceneStep::ContinueThisFrame
            }
        }
    }

    /// Prepare the front queue entry and run before-action pages.
    fn battle_pre_action(&mut self) -> SceneStep {
        let Some(source) = self.queue.front() else {
            self.substate = battle_substate::POST;
            return SceneStep::ContinueThisFrame;
        };

        if self.pipeline.is_none() {
            let Some(action) = self.roster.get(source).and_then(|c| c.action().cloned())
            else {
                // Owner vanished or the slot is empty: skip the entry.
                self.queue.dequeue();
                return SceneStep::ContinueThisFrame;
            };

            // Turn bookkeeping happens when the action starts, not
            // when it was assigned.
            self.turn += 1;
            if let Some(combatant) = self.roster.get_mut(source) {
                combatant.next_turn();
            }
            self.interpreter.reset_pages_executed();
            self.pipeline = Some(ActionPipeline::new(action));
        }

        match self.schedule(EventTrigger::BeforeAction) {
            ScheduleStatus::Pending => SceneStep::WaitTillNextFrame,
            ScheduleStatus::Victory => {
                self.set_state(SceneState::Victory);
                SceneStep::ContinueThisFrame
            }
            ScheduleStatus::Defeat => {
                self.set_state(SceneState::Defeat);
                SceneStep::ContinueThisFrame
            }
            ScheduleStatus::Settled => {
                self.substate = battle_substate::BATTLE_ACTION;
                SceneStep::ContinueThisFrame
            }
        }
    }

    /// Step the in-flight pipeline.
    fn battle_action(&mut self) -> SceneStep {
        let Some(mut pipeline) = self.pipeline.take() else {
            self.substate = battle_substate::POST_EVENTS;
            return SceneStep::ContinueThisFrame;
        };

        let result = {
            let mut ctx = ActionContext {
                roster: &mut self.roster,
                config: &self.config,
                rng: &mut self.rng,
                rules: self.rules.as_ref(),
                interpreter: self.interpreter.as_mut(),
                messages: self.messages.as_mut(),
                effects: self.effects.as_mut(),
                sprites: self.sprites.as_mut(),
                wait: &mut self.wait,
                first_strike: &mut self.first_strike,
            };
            pipeline.step(&mut ctx)
        };

        match result {
            StageResult::Continue => {
                self.pipeline = Some(pipeline);
                SceneStep::ContinueThisFrame
            }
            StageResult::Wait => {
                self.pipeline = Some(pipeline);
                SceneStep::WaitTillNextFrame
            }
            StageResult::Finished => {
                self.history
                    .push_back(ActionRecord::of(pipeline.action(), self.turn));
                self.pipeline = Some(pipeline);
                self.substate = battle_substate::POST_EVENTS;
                SceneStep::ContinueThisFrame
            }
        }
    }

    /// After-action pages, then dequeue and loop for the next entry.
    fn battle_post_events(&mut self) -> SceneStep {
        let source = self.pipeline.as_ref().map(ActionPipeline::source);

        // TODO: legacy quirk kept deliberately: after-action pages run
        // only when the source was an enemy; ally actions skip them.
        if source.map(|id| id.side) == Some(Side::Enemy) {
            match self.schedule(EventTrigger::AfterAction) {
                ScheduleStatus::Pending => return SceneStep::WaitTillNextFrame,
                ScheduleStatus::Victory => {
                    self.set_state(SceneState::Victory);
                    return SceneStep::ContinueThisFrame;
                }
                ScheduleStatus::Defeat => {
                    self.set_state(SceneState::Defeat);
                    return SceneStep::ContinueThisFrame;
                }
                ScheduleStatus::Settled => {}
            }
        }

        if source.is_some() && self.active_actor == source {
            self.active_actor = None;
        }
        self.queue.dequeue();
        self.pipeline = None;
        self.check_battle_end();
        if self.state == SceneState::Battle {
            self.substate = battle_substate::PRE_ACTION;
        }
        SceneStep::ContinueThisFrame
    }

    // === Terminal states ===

    fn process_victory(&mut self) -> SceneStep {
        match self.substate {
            0 => {
                let ids: Vec<CombatantId> =
                    self.roster.active_on(Side::Ally).map(|c| c.id).collect();
                for id in ids {
                    self.sprites.set_pose(id, SpritePose::Victory);
                }
                let line = self.config.terms.victory.clone();
                self.messages.push_line(&line);
                self.wait.set(30, 30);
                self.substate = 1;
                SceneStep::ContinueThisFrame
            }
            1 => {
                let mut drop_rng = self.rng.for_context("drops");
                let rewards = Rewards::collect(&self.roster, &mut drop_rng);
                for line in rewards.lines(&self.config.terms) {
                    self.messages.push_line(&line);
                }
                rewards.apply(&self.roster, self.rewards.as_mut());
                self.substate = 2;
                SceneStep::ContinueThisFrame
            }
            _ => {
                self.result = Some(BattleResult::Victory);
                SceneStep::WaitTillNextFrame
            }
        }
    }

    fn process_defeat(&mut self) -> SceneStep {
        match self.substate {
            0 => {
                let line = self.config.terms.defeat.clone();
                self.messages.push_line(&line);
                self.wait.set(60, 60);
                self.substate = 1;
                SceneStep::ContinueThisFrame
            }
            _ => {
                self.result = Some(BattleResult::Defeat);
                SceneStep::WaitTillNextFrame
            }
        }
    }

    fn process_escape(&mut self) -> SceneStep {
        match self.substate {
            0 => {
                debug_assert!(self.running_away);
                self.effects.play_sound(SystemSound::Escape);
                let line = self.config.terms.escape_success.clone();
                self.messages.push_line(&line);
                let ids: Vec<CombatantId> =
                    self.roster.active_on(Side::Ally).map(|c| c.id).collect();
                for id in ids {
                    self.sprites.set_pose(id, SpritePose::Walk);
                }
                self.wait.set(30, 30);
                self.substate = 1;
                SceneStep::ContinueThisFrame
            }
            _ => {
                self.result = Some(BattleResult::Escape);
                SceneStep::WaitTillNextFrame
            }
        }
    }
}
