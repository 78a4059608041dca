//! Contracts for out-of-scope collaborators: input, the scripted-event
//! interpreter, message output, effects, sprites, and rewards.
//!
//! The scene owns one boxed implementation of each; tests substitute
//! recording mocks.

pub mod effects;
pub mod input;
pub mod interpreter;
pub mod message;
pub mod rewards;
pub mod sprites;

pub use effects::{EffectPlayer, FloatTextKind, SystemSound};
pub use input::{InputAction, InputSource};
pub use interpreter::EventInterpreter;
pub use message::MessageSurface;
pub use rewards::RewardSink;
pub use sprites::{BattlerSprites, SpritePose};
