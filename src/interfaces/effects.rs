//! Visual/audio effect playback contract.

/// Fixed system sounds the engine requests by kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SystemSound {
    EnemyAttacks,
    EnemyDamage,
    AllyDamage,
    Evasion,
    EnemyDeath,
    Escape,
}

/// Battle animation and sound playback. Sounds are fire-and-forget;
/// the engine deduplicates per pipeline sweep before requesting them.
pub trait EffectPlayer {
    /// Play a battle animation, optionally mirrored.
    fn play_effect(&mut self, effect_id: u16, mirrored: bool);

    /// Any battle animation is still in flight.
    fn is_effect_playing(&self) -> bool;

    fn play_sound(&mut self, sound: SystemSound);
}

/// Floating combat text rendered over a battler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatTextKind {
    Damage,
    Heal,
    Miss,
}
