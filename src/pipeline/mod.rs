//! The battle action pipeline: a resumable state machine resolving one
//! queued action to completion.
//!
//! ## Model
//!
//! The pipeline owns a working copy of the action plus the current
//! stage, so it can park on a "wait" result and resume at the exact
//! same position next frame. Exactly one pipeline is in flight at a
//! time; the scene constructs it when the queue's front action starts
//! and drops it after the terminal stage.

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::core::{
    ActionVerb, BattleAction, BattleConfig, BattleRng, CombatantId, Roster, Side,
};
use crate::interfaces::{
    BattlerSprites, EffectPlayer, EventInterpreter, FloatTextKind, MessageSurface, SpritePose,
    SystemSound,
};
use crate::rules::CombatRules;
use crate::scene::WaitTimer;

/// Stages of one action's resolution, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionStage {
    Begin,
    PreEvents,
    Conditions,
    Notify,
    Combo,
    StartAlgo,
    Animation,
    AnimationReflect,
    Apply,
    Finished,
}

/// Result of advancing the pipeline by one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageResult {
    /// Keep stepping within this frame.
    Continue,
    /// Hold this stage until next frame (effect in flight, pose not
    /// settled).
    Wait,
    /// Terminal stage ran; the scene may dequeue.
    Finished,
}

/// Everything a pipeline step may observe or mutate, borrowed from the
/// scene for the duration of one step.
pub struct ActionContext<'a> {
    pub roster: &'a mut Roster,
    pub config: &'a BattleConfig,
    pub rng: &'a mut BattleRng,
    pub rules: &'a dyn CombatRules,
    pub interpreter: &'a mut dyn EventInterpreter,
    pub messages: &'a mut dyn MessageSurface,
    pub effects: &'a mut dyn EffectPlayer,
    pub sprites: &'a mut dyn BattlerSprites,
    pub wait: &'a mut WaitTimer,
    pub first_strike: &'a mut bool,
}

/// One in-flight action resolution.
#[derive(Debug)]
pub struct ActionPipeline {
    action: BattleAction,
    stage: ActionStage,
    aborted: bool,
    effect_started: bool,
    pending_sounds: SmallVec<[SystemSound; 4]>,
}

impl ActionPipeline {
    #[must_use]
    pub fn new(action: BattleAction) -> Self {
        Self {
            action,
            stage: ActionStage::Begin,
            aborted: false,
            effect_started: false,
            pending_sounds: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn stage(&self) -> ActionStage {
        self.stage
    }

    #[must_use]
    pub fn action(&self) -> &BattleAction {
        &self.action
    }

    #[must_use]
    pub fn source(&self) -> CombatantId {
        self.action.source
    }

    /// Advance by one step. Callers loop on `Continue` and yield the
    /// frame on `Wait`.
    pub fn step(&mut self, ctx: &mut ActionContext<'_>) -> StageResult {
        // An in-flight battle animation parks every stage except the
        // two that drive it. The action's opening stages additionally
        // wait for the source sprite to settle into its idle pose.
        if ctx.effects.is_effect_playing()
            && !matches!(
                self.stage,
                ActionStage::Begin | ActionStage::Animation | ActionStage::AnimationReflect
            )
        {
            return StageResult::Wait;
        }
        if self.stage == ActionStage::Notify && !ctx.sprites.is_idling(self.action.source) {
            return StageResult::Wait;
        }

        trace!(stage = ?self.stage, source = %self.action.source, "pipeline step");
        match self.stage {
            ActionStage::Begin => self.begin(ctx),
            ActionStage::PreEvents => self.pre_events(ctx),
            ActionStage::Conditions => self.conditions(ctx),
            ActionStage::Notify => self.notify(ctx),
            ActionStage::Combo => self.combo(ctx),
            ActionStage::StartAlgo => self.start_algo(ctx),
            ActionStage::Animation => self.animation(ctx, false),
            ActionStage::AnimationReflect => self.animation(ctx, true),
            ActionStage::Apply => self.apply(ctx),
            ActionStage::Finished => self.finished(ctx),
        }
    }

    /// Bind the scripted-event context: which actor is acting and, for
    /// an ally action against exactly one enemy, which enemy is
    /// targeted, so event pages can branch on both.
    fn begin(&mut self, ctx: &mut ActionContext<'_>) -> StageResult {
        ctx.interpreter.set_acting_actor(Some(self.action.source));

        let single_enemy = if self.action.source.side == Side::Ally
            && self.action.verb.is_real()
            && self.action.targets.len() == 1
            && self.action.targets[0].side == Side::Enemy
        {
            Some(self.action.targets[0].index)
        } else {
            None
        };
        ctx.interpreter.set_enemy_target(single_enemy);

        self.stage = ActionStage::PreEvents;
        StageResult::Continue
    }

    /// Re-validate the source after the before-action event pages ran:
    /// the scripts may have hidden, killed, or paralyzed it. A live
    /// first-strike flag cancels enemy actions outright.
    fn pre_events(&mut self, ctx: &mut ActionContext<'_>) -> StageResult {
        let source = self.action.source;
        let eligible = ctx
            .roster
            .get(source)
            .is_some_and(|c| c.exists() && c.can_act());

        if !eligible || (*ctx.first_strike && source.side == Side::Enemy) {
            debug!(source = %source, "action aborted before start");
            self.aborted = true;
            self.stage = ActionStage::Finished;
            return StageResult::Continue;
        }

        if source.side == Side::Enemy && self.action.verb.is_real() {
            ctx.effects.play_sound(SystemSound::EnemyAttacks);
            ctx.sprites.flash(source);
        }

        self.stage = ActionStage::Conditions;
        StageResult::Continue
    }

    /// Ongoing status effects tick on every active combatant, not just
    /// the actor, with damage feedback per affected battler.
    fn conditions(&mut self, ctx: &mut ActionContext<'_>) -> StageResult {
        let ids: Vec<CombatantId> = ctx.roster.active().map(|c| c.id).collect();
        for id in ids {
            let Some(combatant) = ctx.roster.get_mut(id) else {
                continue;
            };
            let delta = combatant.tick_statuses();
            if delta < 0 {
                ctx.sprites.float_text(id, FloatTextKind::Damage, -delta);
            } else if delta > 0 {
                ctx.sprites.float_text(id, FloatTextKind::Heal, delta);
            }
        }
        self.stage = ActionStage::Notify;
        StageResult::Continue
    }

    fn notify(&mut self, ctx: &mut ActionContext<'_>) -> StageResult {
        if let Some(message) = &self.action.start_message {
            ctx.messages.push_line(message);
            if self.action.verb == ActionVerb::Skill {
                ctx.wait.set(15, 50);
            } else {
                ctx.wait.set(10, 40);
            }
        }
        self.stage = ActionStage::Combo;
        StageResult::Continue
    }

    /// Repeating the configured command enough consecutive times
    /// multiplies the hit count, for attack-class verbs only.
    fn combo(&mut self, ctx: &mut ActionContext<'_>) -> StageResult {
        let source = self.action.source;
        if source.side == Side::Ally && self.action.verb.combo_eligible() {
            let combo = ctx.config.combo_for(source.index);
            let repeats = ctx.roster.get(source).map_or(0, |c| c.combo_repeats());
            if let Some(setting) = combo {
                if self.action.command_id == Some(setting.command_id)
                    && repeats >= setting.times
                {
                    debug!(source = %source, times = setting.times, "combo multiplier");
                    self.action.multiply_hits(setting.times);
                }
            }
        }
        self.stage = ActionStage::StartAlgo;
        StageResult::Continue
    }

    /// Commit the target: face it and strike the attack pose.
    fn start_algo(&mut self, ctx: &mut ActionContext<'_>) -> StageResult {
        if let Some(target) = self.action.current_target() {
            if ctx.roster.get(target).is_some_and(|t| t.exists()) {
                ctx.roster.face_target(self.action.source, target);
            }
        }
        if self.action.verb.is_real() {
            ctx.sprites.set_pose(self.action.source, SpritePose::Attack);
        }
        self.stage = ActionStage::Animation;
        StageResult::Continue
    }

    /// Play the primary effect (and the mirrored replay when a target
    /// reflects it). Parks until the effect finishes.
    fn animation(&mut self, ctx: &mut ActionContext<'_>, mirrored: bool) -> StageResult {
        let Some(effect_id) = self.action.animation_id else {
            self.stage = ActionStage::Apply;
            return StageResult::Continue;
        };

        if !self.effect_started {
            ctx.effects.play_effect(effect_id, mirrored);
            self.effect_started = true;
            return StageResult::Wait;
        }
        if ctx.effects.is_effect_playing() {
            return StageResult::Wait;
        }
        self.effect_started = false;

        self.stage = if !mirrored && self.action.reflect {
            ActionStage::AnimationReflect
        } else {
            ActionStage::Apply
        };
        StageResult::Continue
    }

    /// Execute the effect on every remaining target, then either loop
    /// back for the next hit repetition or finish.
    fn apply(&mut self, ctx: &mut ActionContext<'_>) -> StageResult {
        let mut executed_any = false;

        loop {
            let Some(target_id) = self.action.current_target() else {
                break;
            };
            if self.execute_one(ctx, target_id) {
                executed_any = true;
            }
            if !self.action.target_next() {
                break;
            }
        }

        for sound in self.pending_sounds.drain(..) {
            ctx.effects.play_sound(sound);
        }

        if !executed_any {
            // Every target became invalid: straight to cleanup, no
            // visible pause.
            self.stage = ActionStage::Finished;
            return StageResult::Continue;
        }

        ctx.wait.set(30, 30);
        if self.action.repeat_next() {
            self.action.restart_targets();
            self.stage = ActionStage::StartAlgo;
        } else {
            self.stage = ActionStage::Finished;
        }
        StageResult::Continue
    }

    /// Execute one hit against one target. Returns false when the
    /// target was no longer a valid recipient.
    fn execute_one(&mut self, ctx: &mut ActionContext<'_>, target_id: CombatantId) -> bool {
        let outcome = {
            let Some(source) = ctx.roster.get(self.action.source) else {
                return false;
            };
            let Some(target) = ctx.roster.get(target_id) else {
                return false;
            };
            if !target.exists() {
                return false;
            }
            ctx.rules.execute_hit(&self.action, source, target, ctx.rng)
        };
        self.action.last_outcome = outcome;

        if !outcome.success {
            ctx.sprites.float_text(target_id, FloatTextKind::Miss, 0);
            self.queue_sound(SystemSound::Evasion);
            return true;
        }

        if let Some(delta) = outcome.affected_hp {
            let applied = ctx
                .roster
                .get_mut(target_id)
                .map_or(0, |t| t.adjust_hp(delta));
            if applied < 0 {
                ctx.sprites.float_text(target_id, FloatTextKind::Damage, -applied);
                ctx.sprites.set_pose(target_id, SpritePose::Damage);
                self.queue_sound(match target_id.side {
                    Side::Ally => SystemSound::AllyDamage,
                    Side::Enemy => SystemSound::EnemyDamage,
                });
            } else if applied > 0 {
                ctx.sprites.float_text(target_id, FloatTextKind::Heal, applied);
            }

            // TODO: legacy quirk kept deliberately: a target dying here
            // is marked immediately, before victory is re-evaluated at
            // the end of the full action.
            let died = ctx.roster.get(target_id).is_some_and(|t| !t.is_alive());
            if died && target_id.side == Side::Enemy {
                self.queue_sound(SystemSound::EnemyDeath);
                ctx.sprites.set_pose(target_id, SpritePose::Dead);
            }
        }
        true
    }

    /// Queue a sound once per apply sweep.
    fn queue_sound(&mut self, sound: SystemSound) {
        if !self.pending_sounds.contains(&sound) {
            self.pending_sounds.push(sound);
        }
    }

    /// Terminal cleanup: release the actor's action slot, flip
    /// post-action switches, drop any first-strike, settle the pose.
    fn finished(&mut self, ctx: &mut ActionContext<'_>) -> StageResult {
        let source = self.action.source;
        if let Some(combatant) = ctx.roster.get_mut(source) {
            combatant.take_action();
            if combatant.is_alive() {
                ctx.sprites.set_pose(source, SpritePose::Idle);
            }
        }

        for &switch_id in &self.action.switches_on {
            ctx.interpreter.set_switch(switch_id, true);
        }
        for &switch_id in &self.action.switches_off {
            ctx.interpreter.set_switch(switch_id, false);
        }

        *ctx.first_strike = false;
        ctx.interpreter.set_acting_actor(None);
        ctx.interpreter.set_enemy_target(None);

        if !self.aborted && self.action.verb != ActionVerb::None {
            ctx.wait.set(30, 30);
        }
        debug!(source = %source, verb = ?self.action.verb, aborted = self.aborted, "action finished");
        StageResult::Finished
    }
}
