//! # atb-battle
//!
//! A frame-accurate Active-Time-Battle turn-resolution engine.
//!
//! The crate decides, frame by frame, whose turn it is, what action
//! each combatant performs, in what order effects resolve, and when an
//! encounter ends. Rendering, audio, asset loading, and event-script
//! execution stay outside, behind the traits in [`interfaces`].
//!
//! ## Architecture
//!
//! - [`core`] — combatants, actions, battle conditions, configuration,
//!   rosters, and the deterministic RNG
//! - [`atb`] — gauge initialization, accumulation, and suspension
//! - [`queue`] — FIFO queue of ready combatants
//! - [`pipeline`] — the resumable per-action resolution state machine
//! - [`scheduler`] — scripted-event scheduling around actions
//! - [`scene`] — the top-level battle scene state machine
//! - [`outcome`] — terminal results and victory rewards
//! - [`rules`] — pluggable combat formulas and AI selection
//!
//! ## Example
//!
//! ```no_run
//! use atb_battle::core::{BattleConfig, Combatant, CombatantId, Roster};
//! use atb_battle::rules::BasicRules;
//! use atb_battle::scene::{BattleScene, SceneHooks};
//! # fn hooks() -> SceneHooks { unimplemented!() }
//! # fn input() -> Box<dyn atb_battle::interfaces::InputSource> { unimplemented!() }
//!
//! let roster = Roster::new(
//!     vec![Combatant::new(CombatantId::ally(0), "Aluxes", 100, 50)],
//!     vec![Combatant::new(CombatantId::enemy(0), "Slime", 30, 40)],
//! );
//! let mut scene = BattleScene::new(
//!     roster,
//!     BattleConfig::new(),
//!     Box::new(BasicRules),
//!     hooks(),
//!     42,
//! );
//! let input = input();
//! while !scene.is_over() {
//!     scene.update(input.as_ref());
//! }
//! ```

pub mod atb;
pub mod core;
pub mod interfaces;
pub mod outcome;
pub mod pipeline;
pub mod queue;
pub mod rules;
pub mod scene;
pub mod scheduler;

pub use crate::core::{
    ActionVerb, BattleAction, BattleCondition, BattleConfig, BattleRng, Combatant, CombatantId,
    Roster, Side, GAUGE_MAX,
};
pub use crate::outcome::{BattleResult, Rewards};
pub use crate::pipeline::{ActionPipeline, ActionStage, StageResult};
pub use crate::queue::ActionQueue;
pub use crate::rules::{BasicRules, CombatRules};
pub use crate::scene::{BattleScene, SceneHooks, SceneState, SceneStep, WaitTimer};
pub use crate::scheduler::{schedule_events, EventTrigger, PageFlags, ScheduleStatus};
