//! Slide navigation and orchestration
//!
//! This module contains the [`Presentation`], the top-level state of a
//! session. It owns the current slide index, routes forward navigation into
//! quiz slides through the raffle, and runs the exit and entry effects of
//! every slide transition.

use web_time::Duration;

use enum_map::EnumMap;
use garde::Validate;
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{
    AlarmMessage, constants,
    deck::{config::Deck, quiz},
    raffle::Raffle,
    session::{AnimationKind, Stage},
};

/// Session options
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Validate)]
pub struct Options {
    /// Whether forward navigation into a quiz slide passes through the raffle
    #[garde(skip)]
    #[serde(default = "default_raffle_gate")]
    raffle_gate: bool,
}

fn default_raffle_gate() -> bool {
    true
}

impl Default for Options {
    fn default() -> Self {
        Self { raffle_gate: true }
    }
}

impl Options {
    /// Enables or disables the raffle in front of quiz slides
    #[must_use]
    pub fn with_raffle_gate(mut self, raffle_gate: bool) -> Self {
        self.raffle_gate = raffle_gate;
        self
    }
}

/// Direction of a horizontal swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SwipeDirection {
    /// Finger moved left, revealing the next slide
    Left,
    /// Finger moved right, revealing the previous slide
    Right,
}

impl SwipeDirection {
    /// Classifies a horizontal gesture by its displacement in pixels
    ///
    /// # Returns
    ///
    /// `None` for gestures shorter than the swipe threshold and for
    /// non-finite displacements
    pub fn from_delta(delta_x: f32) -> Option<Self> {
        if !delta_x.is_finite() || delta_x.abs() < constants::input::SWIPE_THRESHOLD {
            None
        } else if delta_x < 0. {
            Some(Self::Left)
        } else {
            Some(Self::Right)
        }
    }
}

/// Normalized input commands
#[derive(Debug, Deserialize, Clone, Copy)]
pub enum Command {
    /// Advance to the next slide
    Next,
    /// Go back to the previous slide
    Previous,
    /// Jump to a slide by index
    GoTo(usize),
    /// A horizontal swipe
    Swipe(SwipeDirection),
    /// Reveal the panel of the current slide
    Reveal,
    /// A keypad digit
    RaffleDigit(u8),
    /// Remove the last keypad digit
    RaffleDelete,
    /// Accept the keypad entry
    RaffleAccept,
    /// Close the raffle without drawing
    RaffleSkip,
    /// Return from the draw view to the keypad
    RaffleBack,
    /// Start a draw
    RaffleStart,
    /// Close the raffle after a draw
    RaffleContinue,
    /// Select a quiz option by index
    QuizOptionSelected(usize),
    /// Withdraw the quiz selection
    QuizCancel,
    /// Confirm the quiz selection
    QuizConfirm,
    /// Dismiss the quiz result and move on
    QuizResultContinue,
}

/// Update messages about navigation
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// A new slide became active
    SlideChanged {
        /// Index of the active slide
        index: usize,
        /// Header text of the active slide
        header: String,
    },
    /// Whether the previous and next controls are usable
    NavEnabledState {
        /// `false` on the first slide
        prev_enabled: bool,
        /// `false` on the last slide
        next_enabled: bool,
    },
    /// The panel of the current slide was revealed or collapsed
    PanelRevealed(bool),
}

/// Metadata for one numbered navigation button
#[derive(Debug, Serialize, Clone)]
pub struct NavEntry {
    /// One-based slide number
    pub number: usize,
    /// Header text of the slide
    pub header: String,
    /// Whether the slide runs a quiz
    pub is_quiz: bool,
    /// Accessible label of the button
    pub label: String,
}

/// Snapshot of the navigation state
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone)]
pub struct SyncMessage {
    /// Title of the deck
    pub title: String,
    /// Index of the active slide
    pub index: usize,
    /// Header text of the active slide
    pub header: String,
    /// Whether the previous control is usable
    pub prev_enabled: bool,
    /// Whether the next control is usable
    pub next_enabled: bool,
    /// Whether the panel of the current slide is revealed
    pub revealed: bool,
    /// Slide waiting behind the raffle
    pub pending: Option<usize>,
    /// Every slide, for numbered navigation
    pub slides: Vec<NavEntry>,
}

/// A running presentation
#[derive(Debug, Clone)]
pub struct Presentation {
    deck: Deck,
    options: Options,
    current: usize,
    pending: Option<usize>,
    revealed: bool,
    animations: EnumMap<AnimationKind, bool>,
    raffle: Raffle,
    quiz: quiz::Engine,
}

impl Presentation {
    /// Creates a presentation of the given deck
    ///
    /// Nothing is shown until [`Presentation::start`] is called.
    pub fn new(deck: Deck, options: Options) -> Self {
        Self::with_raffle(deck, options, Raffle::default())
    }

    /// Creates a presentation with a specific raffle, usually one with a
    /// seeded random source
    pub fn with_raffle(deck: Deck, options: Options, raffle: Raffle) -> Self {
        Self {
            deck,
            options,
            current: 0,
            pending: None,
            revealed: false,
            animations: EnumMap::default(),
            raffle,
            quiz: quiz::Engine::default(),
        }
    }

    /// Index of the active slide
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Slide waiting behind the raffle, if any
    pub fn pending_index(&self) -> Option<usize> {
        self.pending
    }

    /// Whether the panel of the current slide is revealed
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// The deck being presented
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// The session raffle
    pub fn raffle(&self) -> &Raffle {
        &self.raffle
    }

    /// The quiz engine
    pub fn quiz(&self) -> &quiz::Engine {
        &self.quiz
    }

    /// Whether a dialog is open that suppresses navigation
    pub fn modal_open(&self) -> bool {
        self.raffle.is_open() || self.quiz.blocks_navigation()
    }

    /// Shows the first slide and sends a full snapshot
    ///
    /// The first slide is entered directly, even if it runs a quiz.
    ///
    /// # Arguments
    ///
    /// * `stage` - Rendering collaborators
    /// * `schedule_message` - Function to schedule delayed alarms
    pub fn start<S: Stage, F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        stage: &S,
        schedule_message: F,
    ) {
        self.current = 0;
        self.pending = None;
        self.enter_current(stage, schedule_message);
        self.announce_slide(stage);
        stage.send_state(&self.state_message());
    }

    /// Handles an input command
    ///
    /// Commands that make no sense in the current state are ignored.
    ///
    /// # Arguments
    ///
    /// * `command` - The normalized input
    /// * `stage` - Rendering collaborators
    /// * `schedule_message` - Function to schedule delayed alarms
    pub fn receive_command<S: Stage, F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        command: Command,
        stage: &S,
        schedule_message: F,
    ) {
        match command {
            Command::Next | Command::Previous | Command::GoTo(_) | Command::Swipe(_)
                if self.modal_open() =>
            {
                debug!("ignoring {command:?} while a dialog is open");
            }
            Command::Reveal
            | Command::QuizOptionSelected(_)
            | Command::QuizCancel
            | Command::QuizConfirm
            | Command::QuizResultContinue
                if self.raffle.is_open() =>
            {
                debug!("ignoring {command:?} while the raffle is open");
            }
            Command::Next | Command::Swipe(SwipeDirection::Left) => {
                self.request_next(stage, schedule_message);
            }
            Command::Previous | Command::Swipe(SwipeDirection::Right) => {
                self.request_previous(stage, schedule_message);
            }
            Command::GoTo(index) => self.request_go_to(index, stage, schedule_message),
            Command::Reveal => self.reveal(stage),
            Command::RaffleDigit(digit) => self.raffle.push_digit(digit, stage),
            Command::RaffleDelete => self.raffle.delete_digit(stage),
            Command::RaffleAccept => {
                if let Err(e) = self.raffle.accept(stage) {
                    debug!("rejected raffle entry: {e}");
                }
            }
            Command::RaffleBack => self.raffle.go_back_to_entry(stage),
            Command::RaffleStart => {
                self.raffle.run_draw(stage, schedule_message);
            }
            Command::RaffleSkip => self.skip_raffle(stage, schedule_message),
            Command::RaffleContinue => self.continue_after_draw(stage, schedule_message),
            Command::QuizOptionSelected(index) => {
                self.quiz.select_option(index, stage);
            }
            Command::QuizCancel => {
                self.quiz.cancel_selection(stage, schedule_message);
            }
            Command::QuizConfirm => {
                self.quiz.confirm_selection(stage, schedule_message);
            }
            Command::QuizResultContinue => {
                if self.quiz.continue_after_result(stage) {
                    self.request_next(stage, schedule_message);
                }
            }
        }
    }

    /// Handles an alarm delivered by the host
    ///
    /// # Arguments
    ///
    /// * `message` - The alarm that fell due
    /// * `stage` - Rendering collaborators
    /// * `schedule_message` - Function to schedule delayed alarms
    pub fn receive_alarm<S: Stage, F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        message: AlarmMessage,
        stage: &S,
        schedule_message: F,
    ) {
        match message {
            AlarmMessage::Raffle(message) => {
                self.raffle.receive_alarm(message, stage, schedule_message);
            }
            AlarmMessage::Quiz(message) => {
                self.quiz.receive_alarm(message, stage, schedule_message);
            }
        }
    }

    /// Navigates to a slide
    ///
    /// Out-of-range targets and the current slide are ignored. A quiz slide
    /// is not entered right away: the raffle opens and the target waits
    /// until the raffle is skipped or its draw is acknowledged. A quiz
    /// running on the slide being left is reset before the raffle opens.
    pub fn request_go_to<S: Stage, F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        target: usize,
        stage: &S,
        schedule_message: F,
    ) {
        let Some(slide) = self.deck.slide(target) else {
            debug!("ignoring navigation to missing slide {target}");
            return;
        };
        if target == self.current {
            return;
        }

        if self.options.raffle_gate && slide.is_quiz() {
            info!("slide {target} waits behind the raffle");
            self.quiz.reset(stage);
            self.pending = Some(target);
            self.raffle.open(stage);
        } else {
            self.commit_transition(target, stage, schedule_message);
        }
    }

    /// Advances to the next slide
    ///
    /// On a slide with an unrevealed panel, the panel is revealed instead.
    pub fn request_next<S: Stage, F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        stage: &S,
        schedule_message: F,
    ) {
        let reveal_first = self
            .deck
            .slide(self.current)
            .is_some_and(|slide| slide.reveal_first);

        if reveal_first && !self.revealed {
            self.reveal(stage);
        } else {
            self.request_go_to(self.current + 1, stage, schedule_message);
        }
    }

    /// Goes back one slide, never passing through the raffle
    pub fn request_previous<S: Stage, F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        stage: &S,
        schedule_message: F,
    ) {
        let Some(target) = self.current.checked_sub(1) else {
            return;
        };
        self.commit_transition(target, stage, schedule_message);
    }

    /// Reveals the panel of the current slide
    pub fn reveal<S: Stage>(&mut self, stage: &S) {
        let reveal_first = self
            .deck
            .slide(self.current)
            .is_some_and(|slide| slide.reveal_first);

        if reveal_first && !self.revealed {
            self.revealed = true;
            stage.send_message(&UpdateMessage::PanelRevealed(true).into());
        }
    }

    /// Closes the raffle without drawing and enters the waiting slide
    pub fn skip_raffle<S: Stage, F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        stage: &S,
        schedule_message: F,
    ) {
        if !self.raffle.is_open() {
            return;
        }
        self.leave_raffle(stage, schedule_message);
    }

    /// Closes the raffle once its winner is shown and enters the waiting
    /// slide
    pub fn continue_after_draw<S: Stage, F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        stage: &S,
        schedule_message: F,
    ) {
        if self.raffle.winner().is_none() {
            debug!("ignoring raffle continue before a winner is drawn");
            return;
        }
        self.leave_raffle(stage, schedule_message);
    }

    fn leave_raffle<S: Stage, F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        stage: &S,
        schedule_message: F,
    ) {
        self.raffle.close(stage);
        if let Some(target) = self.pending.take() {
            self.commit_transition(target, stage, schedule_message);
        }
    }

    fn commit_transition<S: Stage, F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        target: usize,
        stage: &S,
        schedule_message: F,
    ) {
        if target == self.current || self.deck.slide(target).is_none() {
            return;
        }

        self.exit_current(stage);
        self.current = target;
        info!("entering slide {target}");
        self.enter_current(stage, schedule_message);
        self.announce_slide(stage);
    }

    fn exit_current<S: Stage>(&mut self, stage: &S) {
        for (kind, running) in &mut self.animations {
            if *running {
                stage.stop(kind);
                *running = false;
            }
        }

        self.quiz.reset(stage);

        if self.revealed {
            self.revealed = false;
            stage.send_message(&UpdateMessage::PanelRevealed(false).into());
        }
    }

    fn enter_current<S: Stage, F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        stage: &S,
        schedule_message: F,
    ) {
        let Some(slide) = self.deck.slide(self.current) else {
            return;
        };

        for &kind in &slide.animations {
            stage.start(kind);
            self.animations[kind] = true;
        }

        if let Some(quiz) = slide.playable_quiz() {
            self.quiz.start(quiz, stage, schedule_message);
        }
    }

    fn nav_enabled(&self) -> (bool, bool) {
        (self.current > 0, self.current + 1 < self.deck.len())
    }

    fn announce_slide<S: Stage>(&self, stage: &S) {
        let (prev_enabled, next_enabled) = self.nav_enabled();

        stage.send_message(
            &UpdateMessage::SlideChanged {
                index: self.current,
                header: self
                    .deck
                    .slide(self.current)
                    .map(|slide| slide.header.clone())
                    .unwrap_or_default(),
            }
            .into(),
        );
        stage.send_message(
            &UpdateMessage::NavEnabledState {
                prev_enabled,
                next_enabled,
            }
            .into(),
        );
    }

    /// Returns the snapshot a freshly attached surface needs
    pub fn state_message(&self) -> crate::SyncMessage {
        let (prev_enabled, next_enabled) = self.nav_enabled();

        crate::SyncMessage {
            presentation: SyncMessage {
                title: self.deck.title().to_owned(),
                index: self.current,
                header: self
                    .deck
                    .slide(self.current)
                    .map(|slide| slide.header.clone())
                    .unwrap_or_default(),
                prev_enabled,
                next_enabled,
                revealed: self.revealed,
                pending: self.pending,
                slides: (0..self.deck.len())
                    .filter_map(|index| self.deck.slide(index).map(|slide| (index, slide)))
                    .map(|(index, slide)| NavEntry {
                        number: index + 1,
                        header: slide.header.clone(),
                        is_quiz: slide.is_quiz(),
                        label: format!("Go to slide {}", index + 1),
                    })
                    .collect_vec(),
            },
            raffle: self.raffle.state_message(),
            quiz: self.quiz.state_message(),
        }
    }
}
