//! Polled input contract.

/// The fixed set of input actions the battle scene reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
    Confirm,
    Cancel,
    Menu,
}

/// Edge-triggered input queries, sampled once per frame. No buffering
/// is guaranteed beyond the current frame's state.
pub trait InputSource {
    /// True on the frame the action was pressed.
    fn is_triggered(&self, action: InputAction) -> bool;

    /// True while the action is held.
    fn is_pressed(&self, action: InputAction) -> bool;
}
