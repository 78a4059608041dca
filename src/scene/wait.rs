//! The frame-local wait timer gating visible-time transitions.

use serde::{Deserialize, Serialize};

use crate::interfaces::{InputAction, InputSource};

/// Countdown timer decremented once per frame.
///
/// `set(min, max)` waits up to `max` frames. After `min` frames a held
/// confirm skips the rest; a cancel press cancels the remaining wait
/// outright at any point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitTimer {
    wait: u32,
    min_wait: u32,
}

impl WaitTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a wait of `max` frames, skippable once `min` have passed.
    pub fn set(&mut self, min: u32, max: u32) {
        debug_assert!(min <= max);
        self.wait = max;
        self.min_wait = max.saturating_sub(min);
    }

    /// Cancel any remaining wait.
    pub fn clear(&mut self) {
        self.wait = 0;
    }

    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.wait > 0
    }

    /// Advance one frame. Returns true once the wait has elapsed (or
    /// was skipped/cancelled); the scene may then proceed.
    pub fn update(&mut self, input: &dyn InputSource) -> bool {
        if self.wait == 0 {
            return true;
        }
        self.wait -= 1;
        if input.is_triggered(InputAction::Cancel) {
            self.wait = 0;
        } else if self.wait <= self.min_wait && input.is_pressed(InputAction::Confirm) {
            self.wait = 0;
        }
        self.wait == 0
    }
}
