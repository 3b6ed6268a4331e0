//! # Quizdeck Presentation Library
//!
//! This library provides the core logic of an interactive slide deck: slide
//! navigation, a numeric raffle that gates entry into quiz slides, and a
//! timed multiple-choice quiz with feedback. Rendering, audio, animation and
//! input capture are left to the host, which talks to the core through the
//! ports in [`session`] and drives time by delivering scheduled alarms.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
use serde::{Deserialize, Serialize};

pub mod constants;

pub mod deck;
pub mod presentation;
pub mod raffle;
pub mod session;
pub mod timer;

#[cfg(test)]
pub(crate) mod test_support;

/// Incremental render events emitted by the core
///
/// Each engine has its own update vocabulary; this enum tags them so that
/// a single surface can dispatch on the origin.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum UpdateMessage {
    /// Slide navigation updates
    Presentation(presentation::UpdateMessage),
    /// Raffle view updates
    Raffle(raffle::UpdateMessage),
    /// Quiz countdown and result updates
    Quiz(deck::quiz::UpdateMessage),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Complete snapshot of everything a surface needs to draw
#[derive(Debug, Serialize, Clone)]
pub struct SyncMessage {
    /// Current slide, navigation metadata and control state
    pub presentation: presentation::SyncMessage,
    /// Raffle view and pool state
    pub raffle: raffle::SyncMessage,
    /// Quiz attempt state, present only while a quiz slide is active
    pub quiz: Option<deck::quiz::SyncMessage>,
}

impl SyncMessage {
    /// Converts the snapshot to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Alarm messages for deferred work
///
/// The core hands these to the host together with a delay. Once the delay
/// has passed the host returns them through
/// [`presentation::Presentation::receive_alarm`].
#[derive(Debug, Clone, Copy, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Raffle spin alarms
    Raffle(raffle::AlarmMessage),
    /// Quiz countdown and suspense alarms
    Quiz(deck::quiz::AlarmMessage),
}
