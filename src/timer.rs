//! Cancellable scheduled tasks
//!
//! The host owns the clock: engines hand it an [`crate::AlarmMessage`] and a
//! delay, and the host delivers the alarm back once the delay has passed.
//! Alarms cannot be recalled once handed out, so every alarm carries the
//! [`TaskToken`] that was current when it was armed. Arming a new task or
//! cancelling the slot invalidates all earlier tokens, and alarms bearing an
//! invalid token are dropped on arrival.

use serde::{Deserialize, Serialize};

/// Identifies one armed activity of a [`TaskSlot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskToken(u64);

/// Holds at most one live activity at a time
#[derive(Debug, Clone, Default)]
pub struct TaskSlot {
    generation: u64,
    armed: bool,
}

impl TaskSlot {
    /// Invalidates the current activity and arms a new one
    ///
    /// # Returns
    ///
    /// The token to attach to every alarm belonging to the new activity
    pub fn arm(&mut self) -> TaskToken {
        self.generation += 1;
        self.armed = true;
        TaskToken(self.generation)
    }

    /// Invalidates the current activity without arming a new one
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.armed = false;
    }

    /// Whether an alarm carrying `token` still belongs to the live activity
    pub fn is_current(&self, token: TaskToken) -> bool {
        self.armed && token.0 == self.generation
    }

    /// Whether any activity is currently armed
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
