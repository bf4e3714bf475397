//! Per-frame input snapshot.
//!
//! Window and device callbacks only ever mutate this struct; the update step
//! reads it exactly once per frame. Keeping the snapshot explicit decouples
//! the core update logic from callback registration and avoids re-entrant
//! rendering calls from inside an input handler.

/// Accumulated keyboard and pointer state for one frame.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
    /// Pointer travel since the last frame, in pixels. Only accumulated
    /// while the cursor is locked.
    pub look_delta: (f32, f32),
    pub cursor_locked: bool,
}

impl InputState {
    /// Read and reset the accumulated pointer delta.
    pub fn take_look_delta(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.look_delta)
    }

    pub fn accumulate_look(&mut self, dx: f64, dy: f64) {
        self.look_delta.0 += dx as f32;
        self.look_delta.1 += dy as f32;
    }
}
