//! Test doubles shared by the unit tests
//!
//! [`RecordingStage`] stands in for every rendering collaborator and
//! [`ManualClock`] plays the host's timer queue.

use std::cell::RefCell;

use web_time::Duration;

use crate::{
    AlarmMessage, SyncMessage, UpdateMessage,
    session::{AnimationKind, AnimationPort, AudioPort, Surface},
};

/// Side effects that do not travel as update messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Start(AnimationKind),
    Stop(AnimationKind),
    AudioPlay,
    AudioRewind,
}

#[derive(Debug, Default)]
pub struct RecordingStage {
    updates: RefCell<Vec<UpdateMessage>>,
    states: RefCell<Vec<SyncMessage>>,
    signals: RefCell<Vec<Signal>>,
}

impl RecordingStage {
    pub fn take_updates(&self) -> Vec<UpdateMessage> {
        self.updates.take()
    }

    pub fn take_signals(&self) -> Vec<Signal> {
        self.signals.take()
    }

    pub fn states(&self) -> Vec<SyncMessage> {
        self.states.borrow().clone()
    }
}

impl Surface for RecordingStage {
    fn send_message(&self, message: &UpdateMessage) {
        self.updates.borrow_mut().push(message.clone());
    }

    fn send_state(&self, state: &SyncMessage) {
        self.states.borrow_mut().push(state.clone());
    }
}

impl AnimationPort for RecordingStage {
    fn start(&self, kind: AnimationKind) {
        self.signals.borrow_mut().push(Signal::Start(kind));
    }

    fn stop(&self, kind: AnimationKind) {
        self.signals.borrow_mut().push(Signal::Stop(kind));
    }
}

impl AudioPort for RecordingStage {
    fn play_from_start(&self) {
        self.signals.borrow_mut().push(Signal::AudioPlay);
    }

    fn pause_and_rewind(&self) {
        self.signals.borrow_mut().push(Signal::AudioRewind);
    }
}

struct Pending {
    due: Duration,
    seq: u64,
    alarm: AlarmMessage,
}

/// Deterministic timer queue
///
/// Alarms due at the same instant fire in the order they were scheduled.
#[derive(Default)]
pub struct ManualClock {
    now: Duration,
    seq: u64,
    queue: Vec<Pending>,
}

impl ManualClock {
    pub fn schedule(&mut self) -> impl FnMut(AlarmMessage, Duration) + '_ {
        move |alarm, delay| {
            self.seq += 1;
            self.queue.push(Pending {
                due: self.now + delay,
                seq: self.seq,
                alarm,
            });
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn pop_due(&mut self, until: Duration) -> Option<AlarmMessage> {
        let (position, _) = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, pending)| pending.due <= until)
            .min_by_key(|(_, pending)| (pending.due, pending.seq))?;
        let pending = self.queue.swap_remove(position);
        self.now = pending.due;
        Some(pending.alarm)
    }

    /// Moves time forward, handing every alarm that falls due to `deliver`
    pub fn advance(&mut self, by: Duration, mut deliver: impl FnMut(&mut Self, AlarmMessage)) {
        let until = self.now + by;
        while let Some(alarm) = self.pop_due(until) {
            deliver(self, alarm);
        }
        self.now = until;
    }
}

pub fn secs(seconds: u64) -> Duration {
    Duration::from_secs(seconds)
}

pub fn millis(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
