//! Shared mock collaborators for the integration suites.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use atb_battle::core::{
    BattleAction, BattleConfig, BattleRng, Combatant, CombatantId, HitOutcome, Roster, Side,
};
use atb_battle::interfaces::{
    BattlerSprites, EffectPlayer, EventInterpreter, FloatTextKind, InputAction, InputSource,
    MessageSurface, RewardSink, SpritePose, SystemSound,
};
use atb_battle::rules::CombatRules;
use atb_battle::scene::{BattleScene, SceneHooks};
use atb_battle::scheduler::PageFlags;

// === Input ===

/// No input this frame.
pub struct NoInput;

impl InputSource for NoInput {
    fn is_triggered(&self, _action: InputAction) -> bool {
        false
    }
    fn is_pressed(&self, _action: InputAction) -> bool {
        false
    }
}

/// One action pressed and held this frame.
pub struct Press(pub InputAction);

impl InputSource for Press {
    fn is_triggered(&self, action: InputAction) -> bool {
        action == self.0
    }
    fn is_pressed(&self, action: InputAction) -> bool {
        action == self.0
    }
}

// === Interpreter ===

#[derive(Default)]
pub struct InterpreterState {
    pub scheduled: Vec<PageFlags>,
    pub acting: Vec<Option<CombatantId>>,
    pub switches: Vec<(u32, bool)>,
    pub page_resets: u32,
}

pub struct SharedInterpreter(pub Rc<RefCell<InterpreterState>>);

impl EventInterpreter for SharedInterpreter {
    fn is_running(&self) -> bool {
        false
    }
    fn is_waiting_on_blocking_command(&self) -> bool {
        false
    }
    fn schedule_next_eligible_page(&mut self, flags: PageFlags) -> u32 {
        self.0.borrow_mut().scheduled.push(flags);
        0
    }
    fn set_acting_actor(&mut self, actor: Option<CombatantId>) {
        self.0.borrow_mut().acting.push(actor);
    }
    fn set_enemy_target(&mut self, _enemy_index: Option<u16>) {}
    fn reset_pages_executed(&mut self) {
        self.0.borrow_mut().page_resets += 1;
    }
    fn set_switch(&mut self, switch_id: u32, on: bool) {
        self.0.borrow_mut().switches.push((switch_id, on));
    }
}

// === Messages ===

#[derive(Default)]
pub struct MessageState {
    pub lines: Vec<String>,
    pub visible: bool,
}

pub struct SharedMessages(pub Rc<RefCell<MessageState>>);

impl MessageSurface for SharedMessages {
    fn push_line(&mut self, line: &str) {
        self.0.borrow_mut().lines.push(line.to_string());
    }
    fn is_message_visible(&self) -> bool {
        self.0.borrow().visible
    }
}

// === Effects ===

#[derive(Default)]
pub struct EffectState {
    pub effects: Vec<(u16, bool)>,
    pub sounds: Vec<SystemSound>,
}

/// Effects record their playback and finish instantly.
pub struct SharedEffects(pub Rc<RefCell<EffectState>>);

impl EffectPlayer for SharedEffects {
    fn play_effect(&mut self, effect_id: u16, mirrored: bool) {
        self.0.borrow_mut().effects.push((effect_id, mirrored));
    }
    fn is_effect_playing(&self) -> bool {
        false
    }
    fn play_sound(&mut self, sound: SystemSound) {
        self.0.borrow_mut().sounds.push(sound);
    }
}

// === Sprites ===

#[derive(Default)]
pub struct SpriteState {
    pub poses: Vec<(CombatantId, SpritePose)>,
    pub floats: Vec<(CombatantId, FloatTextKind, i32)>,
}

/// Sprites record pose changes and are always idling.
pub struct SharedSprites(pub Rc<RefCell<SpriteState>>);

impl BattlerSprites for SharedSprites {
    fn set_pose(&mut self, id: CombatantId, pose: SpritePose) {
        self.0.borrow_mut().poses.push((id, pose));
    }
    fn is_idling(&self, _id: CombatantId) -> bool {
        true
    }
    fn flash(&mut self, _id: CombatantId) {}
    fn float_text(&mut self, id: CombatantId, kind: FloatTextKind, amount: i32) {
        self.0.borrow_mut().floats.push((id, kind, amount));
    }
}

// === Rewards ===

#[derive(Default)]
pub struct RewardState {
    pub exp: Vec<(CombatantId, i32)>,
    pub gold: i32,
    pub items: Vec<u16>,
}

pub struct SharedRewards(pub Rc<RefCell<RewardState>>);

impl RewardSink for SharedRewards {
    fn gain_exp(&mut self, id: CombatantId, amount: i32) {
        self.0.borrow_mut().exp.push((id, amount));
    }
    fn gain_gold(&mut self, amount: i32) {
        self.0.borrow_mut().gold += amount;
    }
    fn add_item(&mut self, item_id: u16) {
        self.0.borrow_mut().items.push(item_id);
    }
}

// === Rules ===

/// Deterministic rules: every hit lands for a fixed amount, escapes
/// succeed or fail by configuration, and AI picks the first active
/// opponent.
pub struct TestRules {
    pub damage: i32,
    pub escape: f64,
}

impl Default for TestRules {
    fn default() -> Self {
        Self {
            damage: 10,
            escape: 1.0,
        }
    }
}

impl CombatRules for TestRules {
    fn execute_hit(
        &self,
        _action: &BattleAction,
        _source: &Combatant,
        _target: &Combatant,
        _rng: &mut BattleRng,
    ) -> HitOutcome {
        HitOutcome {
            success: true,
            affected_hp: Some(-self.damage),
            ..HitOutcome::default()
        }
    }

    fn escape_chance(&self, _roster: &Roster, _attempts: u32) -> f64 {
        self.escape
    }

    fn select_enemy_action(
        &self,
        enemy: &Combatant,
        roster: &Roster,
        _rng: &mut BattleRng,
    ) -> Option<BattleAction> {
        let target = roster.active_on(Side::Ally).next()?;
        Some(BattleAction::attack(enemy.id, target.id))
    }

    fn select_auto_action(
        &self,
        ally: &Combatant,
        roster: &Roster,
        _rng: &mut BattleRng,
    ) -> Option<BattleAction> {
        let target = roster.active_on(Side::Enemy).next()?;
        Some(BattleAction::attack(ally.id, target.id))
    }
}

// === Scene assembly ===

/// Handles into every mock's recorded state.
pub struct Mocks {
    pub interpreter: Rc<RefCell<InterpreterState>>,
    pub messages: Rc<RefCell<MessageState>>,
    pub effects: Rc<RefCell<EffectState>>,
    pub sprites: Rc<RefCell<SpriteState>>,
    pub rewards: Rc<RefCell<RewardState>>,
}

pub fn hooks() -> (SceneHooks, Mocks) {
    let mocks = Mocks {
        interpreter: Rc::new(RefCell::new(InterpreterState::default())),
        messages: Rc::new(RefCell::new(MessageState::default())),
        effects: Rc::new(RefCell::new(EffectState::default())),
        sprites: Rc::new(RefCell::new(SpriteState::default())),
        rewards: Rc::new(RefCell::new(RewardState::default())),
    };
    let hooks = SceneHooks {
        interpreter: Box::new(SharedInterpreter(Rc::clone(&mocks.interpreter))),
        messages: Box::new(SharedMessages(Rc::clone(&mocks.messages))),
        effects: Box::new(SharedEffects(Rc::clone(&mocks.effects))),
        sprites: Box::new(SharedSprites(Rc::clone(&mocks.sprites))),
        rewards: Box::new(SharedRewards(Rc::clone(&mocks.rewards))),
    };
    (hooks, mocks)
}

/// Two allies against two enemies, with rewards on the troop.
pub fn duel_roster() -> Roster {
    use atb_battle::core::{DropEntry, EnemyReward};
    use smallvec::smallvec;

    let allies = vec![
        Combatant::new(CombatantId::ally(0), "Aluxes", 100, 50),
        Combatant::new(CombatantId::ally(1), "Hilda", 80, 60),
    ];
    let mut enemies = vec![
        Combatant::new(CombatantId::enemy(0), "Slime", 30, 40),
        Combatant::new(CombatantId::enemy(1), "Bat", 20, 45),
    ];
    enemies[0].reward = Some(EnemyReward {
        exp: 30,
        gold: 20,
        drops: smallvec![DropEntry {
            item_id: 7,
            chance: 1.0
        }],
    });
    enemies[1].reward = Some(EnemyReward {
        exp: 20,
        gold: 0,
        drops: smallvec![],
    });
    Roster::new(allies, enemies)
}

pub fn scene_with(roster: Roster, config: BattleConfig, rules: TestRules) -> (BattleScene, Mocks) {
    let (hooks, mocks) = hooks();
    let scene = BattleScene::new(roster, config, Box::new(rules), hooks, 42);
    (scene, mocks)
}

/// Drive frames with the given input until the predicate holds.
/// Panics after `max` frames.
pub fn run_until(
    scene: &mut BattleScene,
    input: &dyn InputSource,
    max: u32,
    pred: impl Fn(&BattleScene) -> bool,
) {
    for _ in 0..max {
        if pred(scene) {
            return;
        }
        scene.update(input);
    }
    panic!(
        "predicate not reached in {max} frames (state {:?}, substate {})",
        scene.state(),
        scene.substate()
    );
}
