//! Rendering collaborator ports
//!
//! The presentation core never touches a rendering technology directly.
//! Everything it wants to show, animate or play leaves through the traits in
//! this module, which a host (a DOM binding, a terminal front end, a test
//! recorder) implements.

use serde::{Deserialize, Serialize};

use super::{SyncMessage, UpdateMessage};

/// Ambient animations that a slide can declare
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, enum_map::Enum,
)]
#[serde(rename_all = "snake_case")]
pub enum AnimationKind {
    /// Floating comments that appear one after another
    CommentCarousel,
    /// Periodic shake of the highlighted element
    Shake,
}

/// Trait for sending render events to the surface showing the presentation
///
/// Implementations might write into a DOM, repaint a terminal, or simply
/// record the events for later inspection.
pub trait Surface {
    /// Sends an incremental update event
    ///
    /// # Arguments
    ///
    /// * `message` - The update to render
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a complete state snapshot
    ///
    /// Snapshots are used when a surface attaches late or needs to redraw
    /// everything from scratch.
    ///
    /// # Arguments
    ///
    /// * `state` - The snapshot to render
    fn send_state(&self, state: &SyncMessage);
}

/// Starts and stops ambient animations tied to slide entry and exit
pub trait AnimationPort {
    /// Starts the given animation, restarting it if it is already running
    fn start(&self, kind: AnimationKind);

    /// Stops the given animation and clears any visible leftovers
    fn stop(&self, kind: AnimationKind);
}

/// Controls the countdown audio cue of quiz slides
pub trait AudioPort {
    /// Rewinds the cue and plays it from the beginning
    fn play_from_start(&self);

    /// Pauses the cue and rewinds it to the beginning
    fn pause_and_rewind(&self);
}

/// Every collaborator the presentation needs, bundled behind one bound
pub trait Stage: Surface + AnimationPort + AudioPort {}

impl<T: Surface + AnimationPort + AudioPort> Stage for T {}
