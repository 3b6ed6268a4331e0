//! Numeric raffle
//!
//! Before a quiz slide is entered the audience is asked how many people
//! take part, and a number between one and that count is drawn to decide
//! who answers. Numbers are drawn without replacement: every participant is
//! picked once before anyone is picked twice. The pool survives slide
//! transitions for the whole session.
//!
//! Drawing takes a few seconds of cosmetic spinning during which the
//! display flickers through the numbers still in the pool.

use std::{
    collections::BTreeSet,
    fmt::Display,
    num::{IntErrorKind, ParseIntError},
};

use web_time::Duration;

use garde::Validate;
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_with::SerializeDisplay;
use thiserror::Error;

use crate::{
    constants,
    session::Stage,
    timer::{TaskSlot, TaskToken},
};

/// Errors that reject a participant count entry
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryError {
    /// The entry is empty or not an integer
    #[error("entry is not a number")]
    NotANumber,
    /// The entry is an integer outside the accepted range
    #[error("participant count must be between 1 and 99")]
    OutOfRange,
}

impl From<ParseIntError> for EntryError {
    fn from(e: ParseIntError) -> Self {
        match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => Self::OutOfRange,
            _ => Self::NotANumber,
        }
    }
}

impl From<garde::Report> for EntryError {
    fn from(_: garde::Report) -> Self {
        Self::OutOfRange
    }
}

/// A validated number of raffle participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct ParticipantCount(
    #[garde(range(
        min = crate::constants::raffle::MIN_PARTICIPANTS,
        max = crate::constants::raffle::MAX_PARTICIPANTS
    ))]
    u32,
);

impl ParticipantCount {
    /// Validates a participant count
    ///
    /// # Errors
    ///
    /// Returns [`EntryError::OutOfRange`] unless `1 <= count <= 99`.
    pub fn new(count: u32) -> Result<Self, EntryError> {
        let count = Self(count);
        count.validate()?;
        Ok(count)
    }

    /// Parses a participant count typed by a person
    ///
    /// # Errors
    ///
    /// * [`EntryError::NotANumber`] for empty or non-numeric input
    /// * [`EntryError::OutOfRange`] for zero, negative or too large numbers
    pub fn parse(input: &str) -> Result<Self, EntryError> {
        let value: i64 = input.trim().parse()?;
        Self::new(u32::try_from(value).map_err(|_| EntryError::OutOfRange)?)
    }

    /// The count itself
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Which raffle view is showing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    /// The raffle is not shown
    #[default]
    Closed,
    /// The participant count keypad
    Entry,
    /// Ready to draw
    Draw,
    /// A draw is in progress
    Spinning,
    /// The winner is shown
    Result,
}

/// Value in the big number display of the draw view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, SerializeDisplay)]
pub enum DisplayValue {
    /// Nothing drawn yet
    #[default]
    Placeholder,
    /// Spinning over an exhausted pool
    Unknown,
    /// A number
    Number(u32),
}

impl Display for DisplayValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Placeholder => f.write_str("--"),
            Self::Unknown => f.write_str("??"),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

/// Update messages sent while the raffle is in use
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// The raffle switched views
    ViewChanged {
        /// The view now showing
        view: View,
        /// The number display
        display: DisplayValue,
    },
    /// The keypad entry changed
    EntryChanged(String),
    /// The keypad entry was rejected and cleared
    EntryRejected(EntryError),
    /// The spinning display refreshed
    DisplayChanged(DisplayValue),
}

/// Alarms scheduled by the raffle
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Time to refresh the spinning display
    SpinFrame(TaskToken),
    /// The spin is over and the winner must be drawn
    SpinEnd(TaskToken),
}

impl AlarmMessage {
    fn token(self) -> TaskToken {
        match self {
            Self::SpinFrame(token) | Self::SpinEnd(token) => token,
        }
    }
}

/// Snapshot of the raffle
#[derive(Debug, Serialize, Clone)]
pub struct SyncMessage {
    /// The view now showing
    pub view: View,
    /// The number display
    pub display: DisplayValue,
    /// Current keypad entry
    pub entry: String,
    /// Participant count, zero while unset
    pub participants: u32,
    /// Numbers not yet drawn in this cycle
    pub remaining: usize,
}

/// Session-wide raffle state
#[derive(Debug, Clone)]
pub struct Raffle {
    participants: u32,
    remaining: BTreeSet<u32>,
    view: View,
    entry: String,
    display: DisplayValue,
    timer: TaskSlot,
    rng: fastrand::Rng,
}

impl Default for Raffle {
    fn default() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }
}

impl Raffle {
    /// Creates a raffle drawing from the given random source
    ///
    /// Passing a seeded generator makes draws reproducible.
    pub fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            participants: 0,
            remaining: BTreeSet::new(),
            view: View::Closed,
            entry: String::new(),
            display: DisplayValue::Placeholder,
            timer: TaskSlot::default(),
            rng,
        }
    }

    /// Participant count, zero while unset
    pub fn participants(&self) -> u32 {
        self.participants
    }

    /// Numbers not yet drawn in this cycle, in ascending order
    pub fn remaining(&self) -> Vec<u32> {
        self.remaining.iter().copied().collect_vec()
    }

    /// The view now showing
    pub fn view(&self) -> View {
        self.view
    }

    /// The number display
    pub fn display(&self) -> DisplayValue {
        self.display
    }

    /// Current keypad entry
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Whether any raffle view is showing
    pub fn is_open(&self) -> bool {
        self.view != View::Closed
    }

    /// The number drawn last, while its result is showing
    pub fn winner(&self) -> Option<u32> {
        match (self.view, self.display) {
            (View::Result, DisplayValue::Number(winner)) => Some(winner),
            _ => None,
        }
    }

    fn set_view<S: Stage>(&mut self, view: View, stage: &S) {
        self.view = view;
        stage.send_message(
            &UpdateMessage::ViewChanged {
                view,
                display: self.display,
            }
            .into(),
        );
    }

    fn refill(&mut self) {
        self.remaining = (1..=self.participants).collect();
    }

    /// Opens the raffle in front of a gated slide
    ///
    /// Shows the keypad when no participant count is known yet, and the
    /// draw view otherwise.
    pub fn open<S: Stage>(&mut self, stage: &S) {
        self.timer.cancel();
        self.display = DisplayValue::Placeholder;
        if self.participants == 0 {
            self.open_entry(stage);
        } else {
            self.set_view(View::Draw, stage);
        }
    }

    /// Shows the keypad with an empty entry
    pub fn open_entry<S: Stage>(&mut self, stage: &S) {
        self.entry.clear();
        self.set_view(View::Entry, stage);
        stage.send_message(&UpdateMessage::EntryChanged(String::new()).into());
    }

    /// Appends a keypad digit to the entry
    pub fn push_digit<S: Stage>(&mut self, digit: u8, stage: &S) {
        if self.view != View::Entry || digit > 9 {
            debug!("ignoring raffle digit {digit} in {:?}", self.view);
            return;
        }
        if self.entry.len() >= constants::raffle::MAX_ENTRY_DIGITS {
            debug!("ignoring raffle digit {digit}, entry {:?} is full", self.entry);
            return;
        }
        self.entry.push(char::from(b'0' + digit));
        stage.send_message(&UpdateMessage::EntryChanged(self.entry.clone()).into());
    }

    /// Removes the last digit of the entry
    pub fn delete_digit<S: Stage>(&mut self, stage: &S) {
        if self.view != View::Entry {
            return;
        }
        self.entry.pop();
        stage.send_message(&UpdateMessage::EntryChanged(self.entry.clone()).into());
    }

    /// Accepts the typed entry as the participant count
    ///
    /// # Errors
    ///
    /// Returns the reason the entry was rejected. The entry is cleared and
    /// the keypad stays open.
    pub fn accept<S: Stage>(&mut self, stage: &S) -> Result<(), EntryError> {
        if self.view != View::Entry {
            return Ok(());
        }
        match ParticipantCount::parse(&self.entry) {
            Ok(count) => {
                self.confirm_participant_count(count, stage);
                Ok(())
            }
            Err(e) => {
                self.entry.clear();
                stage.send_message(&UpdateMessage::EntryRejected(e).into());
                stage.send_message(&UpdateMessage::EntryChanged(String::new()).into());
                Err(e)
            }
        }
    }

    /// Sets the participant count, refills the pool and shows the draw view
    pub fn confirm_participant_count<S: Stage>(&mut self, count: ParticipantCount, stage: &S) {
        self.participants = count.get();
        self.refill();
        self.display = DisplayValue::Placeholder;
        info!("raffle set up for {} participants", self.participants);
        self.set_view(View::Draw, stage);
    }

    /// Returns from the draw view to the keypad, keeping the count
    ///
    /// Only possible before a draw has started.
    pub fn go_back_to_entry<S: Stage>(&mut self, stage: &S) {
        if self.view == View::Draw {
            self.set_view(View::Entry, stage);
            stage.send_message(&UpdateMessage::EntryChanged(self.entry.clone()).into());
        }
    }

    /// Starts the spin that ends with a draw
    ///
    /// # Returns
    ///
    /// `false` if the draw view is not ready, including while a draw is
    /// already spinning
    pub fn run_draw<S: Stage, F: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        stage: &S,
        mut schedule_message: F,
    ) -> bool {
        if self.view != View::Draw || self.participants == 0 {
            debug!("ignoring draw request in {:?}", self.view);
            return false;
        }

        let token = self.timer.arm();
        self.set_view(View::Spinning, stage);

        schedule_message(
            AlarmMessage::SpinFrame(token).into(),
            Duration::from_millis(constants::raffle::SPIN_FRAME_MILLIS),
        );
        schedule_message(
            AlarmMessage::SpinEnd(token).into(),
            Duration::from_millis(constants::raffle::SPIN_MILLIS),
        );

        true
    }

    /// Draws one number without replacement
    ///
    /// An exhausted pool is refilled first, so a draw always succeeds once a
    /// participant count is set.
    ///
    /// # Returns
    ///
    /// The winner, or `None` if no participant count is set
    pub fn draw(&mut self) -> Option<u32> {
        if self.participants == 0 {
            return None;
        }
        if self.remaining.is_empty() {
            self.refill();
        }
        let winner = self
            .remaining
            .iter()
            .nth(self.rng.usize(..self.remaining.len()))
            .copied()?;
        self.remaining.remove(&winner);
        Some(winner)
    }

    /// Handles a raffle alarm delivered by the host
    pub fn receive_alarm<S: Stage, F: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        message: AlarmMessage,
        stage: &S,
        mut schedule_message: F,
    ) {
        if !self.timer.is_current(message.token()) || self.view != View::Spinning {
            debug!("dropping stale raffle alarm {message:?}");
            return;
        }

        match message {
            AlarmMessage::SpinFrame(token) => {
                self.display = if self.remaining.is_empty() {
                    DisplayValue::Unknown
                } else {
                    self.remaining
                        .iter()
                        .nth(self.rng.usize(..self.remaining.len()))
                        .copied()
                        .map_or(DisplayValue::Unknown, DisplayValue::Number)
                };
                stage.send_message(&UpdateMessage::DisplayChanged(self.display).into());
                schedule_message(
                    AlarmMessage::SpinFrame(token).into(),
                    Duration::from_millis(constants::raffle::SPIN_FRAME_MILLIS),
                );
            }
            AlarmMessage::SpinEnd(_) => {
                self.timer.cancel();
                if let Some(winner) = self.draw() {
                    info!("raffle winner: {winner}");
                    self.display = DisplayValue::Number(winner);
                }
                self.set_view(View::Result, stage);
            }
        }
    }

    /// Hides the raffle, abandoning a draw in progress
    pub fn close<S: Stage>(&mut self, stage: &S) {
        self.timer.cancel();
        if self.view != View::Closed {
            self.set_view(View::Closed, stage);
        }
    }

    /// Snapshot of the raffle
    pub fn state_message(&self) -> SyncMessage {
        SyncMessage {
            view: self.view,
            display: self.display,
            entry: self.entry.clone(),
            participants: self.participants,
            remaining: self.remaining.len(),
        }
    }
}
