//! Timed multiple-choice quiz slides
//!
//! A quiz slide shows a handful of labelled options and a countdown. The
//! presenter picks an option, confirms it, and after a short suspense the
//! verdict is revealed together with the explanation of every option. If
//! nobody picks an option before the countdown runs out, the attempt is
//! resolved as expired.
//!
//! The [`Engine`] outlives individual slides and owns the [`TaskSlot`] that
//! all quiz alarms are tied to; the per-slide [`Attempt`] is created on entry
//! and discarded on exit.

use web_time::Duration;

use garde::Validate;
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{
    constants,
    session::Stage,
    timer::{TaskSlot, TaskToken},
};

/// Phase of a quiz attempt
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Phase {
    /// No attempt is running, or its result has been dismissed
    #[default]
    Idle,
    /// The countdown is running and options can be selected
    Running,
    /// An option was selected and the confirmation prompt is open
    AwaitingConfirmation,
    /// The selection was confirmed and the verdict is being held back
    Suspense,
    /// The verdict is known
    Resolved,
}

type ValidationResult = garde::Result;

/// Validates that a duration falls within specified bounds
fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    field: &'static str,
    val: &Duration,
) -> ValidationResult {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "{field} is outside of the bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

fn validate_time_limit(val: &Duration) -> ValidationResult {
    validate_duration::<
        { crate::constants::quiz::MIN_TIME_LIMIT },
        { crate::constants::quiz::MAX_TIME_LIMIT },
    >("time_limit", val)
}

fn validate_danger_after(val: &Duration) -> ValidationResult {
    validate_duration::<0, { crate::constants::quiz::MAX_TIME_LIMIT }>("danger_after", val)
}

/// A playable quiz has exactly one correct option
///
/// An empty option list passes; such a slide is shown without its quiz.
fn validate_single_correct(options: &[OptionConfig]) -> ValidationResult {
    match options.iter().filter(|option| option.correct).count() {
        _ if options.is_empty() => Ok(()),
        1 => Ok(()),
        count => Err(garde::Error::new(format!(
            "exactly one option must be correct, found {count}"
        ))),
    }
}

fn default_time_limit() -> Duration {
    Duration::from_secs(constants::quiz::DEFAULT_TIME_LIMIT)
}

fn default_danger_after() -> Duration {
    Duration::from_secs(constants::quiz::DEFAULT_DANGER_AFTER)
}

/// A single answer option of a quiz slide
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OptionConfig {
    /// Short prefix shown before the option, such as "A"
    #[garde(length(min = 1, max = crate::constants::quiz::MAX_LABEL_LENGTH))]
    pub label: String,
    /// The option text
    #[garde(length(max = crate::constants::quiz::MAX_TEXT_LENGTH))]
    pub text: String,
    /// Whether this is the correct option
    #[garde(skip)]
    #[serde(default)]
    pub correct: bool,
    /// Why this option is right or wrong, shown with the verdict
    #[garde(length(max = crate::constants::quiz::MAX_TEXT_LENGTH))]
    #[serde(default)]
    pub explanation: String,
}

impl OptionConfig {
    /// Creates an option
    pub fn new(label: &str, text: &str, correct: bool, explanation: &str) -> Self {
        Self {
            label: label.to_owned(),
            text: text.to_owned(),
            correct,
            explanation: explanation.to_owned(),
        }
    }
}

/// Configuration of the quiz on a slide
#[serde_with::serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizConfig {
    /// Length of the countdown
    #[garde(custom(|v, _| validate_time_limit(v)))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[serde(default = "default_time_limit")]
    time_limit: Duration,
    /// Elapsed time after which the countdown turns to danger mode
    #[garde(custom(|v, _| validate_danger_after(v)))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[serde(default = "default_danger_after")]
    danger_after: Duration,
    /// The options in display order
    #[garde(
        length(max = crate::constants::quiz::MAX_OPTION_COUNT),
        custom(|v, _| validate_single_correct(v)),
        dive
    )]
    options: Vec<OptionConfig>,
}

impl QuizConfig {
    /// Creates a quiz with the default 60 second countdown
    pub fn new(options: Vec<OptionConfig>) -> Self {
        Self {
            time_limit: default_time_limit(),
            danger_after: default_danger_after(),
            options,
        }
    }

    /// Replaces the countdown length and danger threshold
    #[must_use]
    pub fn with_timing(mut self, time_limit: Duration, danger_after: Duration) -> Self {
        self.time_limit = time_limit;
        self.danger_after = danger_after;
        self
    }

    /// Length of the countdown
    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Elapsed time after which danger mode engages
    pub fn danger_after(&self) -> Duration {
        self.danger_after
    }

    /// The options in display order
    pub fn options(&self) -> &[OptionConfig] {
        &self.options
    }

    /// Whether the slide can run its quiz at all
    pub fn is_playable(&self) -> bool {
        !self.options.is_empty()
    }

    /// Creates a fresh attempt with a full countdown
    pub fn to_attempt(&self) -> Attempt {
        Attempt {
            config: self.clone(),
            phase: Phase::Idle,
            selected: None,
            seconds_remaining: self.time_limit.as_secs(),
            danger: false,
            result: None,
            result_visible: false,
        }
    }

    /// Builds the feedback shown once an attempt is resolved
    ///
    /// # Arguments
    ///
    /// * `selected` - Index of the chosen option, `None` if time ran out
    pub fn result_for(&self, selected: Option<usize>) -> QuizResult {
        let selected_option = selected.and_then(|index| self.options.get(index));
        let verdict = match selected_option {
            None => Verdict::TimeUp,
            Some(option) if option.correct => Verdict::Correct,
            Some(_) => Verdict::Incorrect,
        };

        QuizResult {
            verdict,
            title: verdict.title().to_owned(),
            class: verdict.class().to_owned(),
            selected: selected_option.map(OptionFeedback::from),
            explanation: selected_option.map_or_else(
                || TIME_EXPIRED_EXPLANATION.to_owned(),
                |option| option.explanation.clone(),
            ),
            others: self
                .options
                .iter()
                .enumerate()
                .filter(|(index, _)| Some(*index) != selected)
                .map(|(_, option)| OptionFeedback::from(option))
                .collect_vec(),
        }
    }
}

/// Explanation shown when the countdown ran out
pub const TIME_EXPIRED_EXPLANATION: &str = "Time ran out before an answer was chosen.";

/// Outcome of a quiz attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// The selected option was correct
    Correct,
    /// The selected option was wrong
    Incorrect,
    /// No option was selected in time
    TimeUp,
}

impl Verdict {
    /// Heading of the result view
    pub fn title(self) -> &'static str {
        match self {
            Self::Correct => "Correct!",
            Self::Incorrect => "Incorrect!",
            Self::TimeUp => "Time's up!",
        }
    }

    /// Icon and styling class of the result view
    pub fn class(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect | Self::TimeUp => "incorrect",
        }
    }
}

/// An option as presented in the result view
#[derive(Debug, Clone, Serialize)]
pub struct OptionFeedback {
    /// Option prefix
    pub label: String,
    /// Option text
    pub text: String,
    /// Whether the option was the correct one
    pub correct: bool,
    /// Explanation of the option
    pub explanation: String,
}

impl From<&OptionConfig> for OptionFeedback {
    fn from(option: &OptionConfig) -> Self {
        Self {
            label: option.label.clone(),
            text: option.text.clone(),
            correct: option.correct,
            explanation: option.explanation.clone(),
        }
    }
}

/// Everything the result view shows
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    /// The outcome
    pub verdict: Verdict,
    /// Heading, derived from the verdict
    pub title: String,
    /// Icon and styling class, derived from the verdict
    pub class: String,
    /// The option that was chosen, if any
    pub selected: Option<OptionFeedback>,
    /// Explanation of the chosen option, or the time-expired message
    pub explanation: String,
    /// Every option that was not chosen, in display order
    pub others: Vec<OptionFeedback>,
}

/// Update messages sent while a quiz slide is active
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// The countdown display changed
    TimerTick {
        /// Whole seconds left on the countdown
        seconds_left: u64,
    },
    /// Danger mode was switched on or off
    DangerModeChanged(bool),
    /// The attempt moved to another phase
    PhaseChanged {
        /// The new phase
        phase: Phase,
        /// The option awaiting confirmation or resolved, if any
        selected: Option<usize>,
    },
    /// The verdict is ready to be shown
    ResultReady(QuizResult),
    /// The result view was dismissed
    ResultClosed,
}

/// Alarms scheduled by the quiz engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// One second of the countdown has passed
    Tick(TaskToken),
    /// The danger threshold has been reached
    Danger(TaskToken),
    /// The countdown ran out
    Expire(TaskToken),
    /// The suspense after confirmation is over
    Suspense(TaskToken),
}

impl AlarmMessage {
    fn token(self) -> TaskToken {
        match self {
            Self::Tick(token)
            | Self::Danger(token)
            | Self::Expire(token)
            | Self::Suspense(token) => token,
        }
    }
}

/// Snapshot of the active attempt
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone)]
pub struct SyncMessage {
    /// Current phase
    pub phase: Phase,
    /// Whole seconds left on the countdown
    pub seconds_left: u64,
    /// Whether danger mode is engaged
    pub danger: bool,
    /// The selected option, if any
    pub selected: Option<usize>,
    /// The verdict, while the result view is open
    pub result: Option<QuizResult>,
}

/// State of the quiz on the active slide
#[derive(Debug, Clone)]
pub struct Attempt {
    /// The configuration this attempt was created from
    config: QuizConfig,
    phase: Phase,
    selected: Option<usize>,
    seconds_remaining: u64,
    danger: bool,
    result: Option<QuizResult>,
    result_visible: bool,
}

impl Attempt {
    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The option awaiting confirmation or resolved, if any
    pub fn selected_option(&self) -> Option<&OptionConfig> {
        self.selected.and_then(|index| self.config.options.get(index))
    }

    /// Whole seconds left on the countdown
    pub fn seconds_remaining(&self) -> u64 {
        self.seconds_remaining
    }

    /// Whether danger mode is engaged
    pub fn danger(&self) -> bool {
        self.danger
    }

    /// The verdict, once resolved
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    fn announce_phase<S: Stage>(&self, stage: &S) {
        stage.send_message(
            &UpdateMessage::PhaseChanged {
                phase: self.phase,
                selected: self.selected,
            }
            .into(),
        );
    }

    fn resolve<S: Stage>(&mut self, stage: &S) {
        let result = self.config.result_for(self.selected);
        info!("quiz resolved: {:?}", result.verdict);

        self.phase = Phase::Resolved;
        self.result_visible = true;
        self.result = Some(result.clone());

        self.announce_phase(stage);
        stage.send_message(&UpdateMessage::ResultReady(result).into());
    }
}

/// Runs quiz attempts and owns their timers
#[derive(Debug, Clone, Default)]
pub struct Engine {
    timer: TaskSlot,
    attempt: Option<Attempt>,
}

impl Engine {
    /// The attempt of the active quiz slide, if any
    pub fn attempt(&self) -> Option<&Attempt> {
        self.attempt.as_ref()
    }

    /// Phase of the active attempt, `Idle` when there is none
    pub fn phase(&self) -> Phase {
        self.attempt.as_ref().map_or(Phase::Idle, Attempt::phase)
    }

    /// Whether a quiz dialog (prompt, suspense or result) is open
    pub fn blocks_navigation(&self) -> bool {
        self.attempt.as_ref().is_some_and(|attempt| {
            matches!(
                attempt.phase,
                Phase::AwaitingConfirmation | Phase::Suspense
            ) || attempt.result_visible
        })
    }

    /// Starts a new attempt for the slide being entered
    ///
    /// Any earlier attempt and its pending alarms are discarded.
    ///
    /// # Arguments
    ///
    /// * `config` - The quiz of the slide being entered
    /// * `stage` - Rendering collaborators
    /// * `schedule_message` - Function to schedule delayed alarms
    pub fn start<S: Stage, F: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        config: &QuizConfig,
        stage: &S,
        schedule_message: F,
    ) {
        self.attempt = Some(config.to_attempt());
        self.run_countdown(stage, schedule_message);
    }

    /// Restarts the countdown from the top for the current attempt
    fn run_countdown<S: Stage, F: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        stage: &S,
        mut schedule_message: F,
    ) {
        let Some(attempt) = &mut self.attempt else {
            return;
        };
        let token = self.timer.arm();

        attempt.phase = Phase::Running;
        attempt.selected = None;
        attempt.danger = false;
        attempt.result = None;
        attempt.result_visible = false;
        attempt.seconds_remaining = attempt.config.time_limit.as_secs();

        stage.play_from_start();
        stage.send_message(
            &UpdateMessage::TimerTick {
                seconds_left: attempt.seconds_remaining,
            }
            .into(),
        );
        stage.send_message(&UpdateMessage::DangerModeChanged(false).into());
        attempt.announce_phase(stage);

        schedule_message(
            AlarmMessage::Tick(token).into(),
            Duration::from_millis(constants::quiz::TICK_MILLIS),
        );
        if attempt.config.danger_after < attempt.config.time_limit {
            schedule_message(
                AlarmMessage::Danger(token).into(),
                attempt.config.danger_after,
            );
        }
        schedule_message(
            AlarmMessage::Expire(token).into(),
            attempt.config.time_limit,
        );
    }

    /// Selects an option and opens the confirmation prompt
    ///
    /// Only valid while the countdown is running. The countdown and the
    /// danger trigger stop; danger mode itself stays as it is.
    ///
    /// # Returns
    ///
    /// `true` if the selection was accepted
    pub fn select_option<S: Stage>(&mut self, index: usize, stage: &S) -> bool {
        let Some(attempt) = &mut self.attempt else {
            return false;
        };
        if attempt.phase != Phase::Running || index >= attempt.config.options.len() {
            debug!("ignoring selection of option {index} in {:?}", attempt.phase);
            return false;
        }

        self.timer.cancel();
        stage.pause_and_rewind();

        attempt.selected = Some(index);
        attempt.phase = Phase::AwaitingConfirmation;
        attempt.announce_phase(stage);

        true
    }

    /// Withdraws the selection and restarts the countdown from the top
    ///
    /// # Returns
    ///
    /// `true` if there was a selection to withdraw
    pub fn cancel_selection<S: Stage, F: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        stage: &S,
        schedule_message: F,
    ) -> bool {
        if self.phase() != Phase::AwaitingConfirmation {
            return false;
        }

        self.run_countdown(stage, schedule_message);

        true
    }

    /// Confirms the selection and starts the suspense before the verdict
    ///
    /// # Returns
    ///
    /// `true` if there was a selection to confirm
    pub fn confirm_selection<S: Stage, F: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        stage: &S,
        mut schedule_message: F,
    ) -> bool {
        let Some(attempt) = &mut self.attempt else {
            return false;
        };
        if attempt.phase != Phase::AwaitingConfirmation {
            return false;
        }

        let token = self.timer.arm();
        attempt.phase = Phase::Suspense;
        attempt.announce_phase(stage);

        schedule_message(
            AlarmMessage::Suspense(token).into(),
            Duration::from_millis(constants::quiz::SUSPENSE_MILLIS),
        );

        true
    }

    /// Dismisses the result view
    ///
    /// # Returns
    ///
    /// `true` if the result view was open, in which case the presentation
    /// should move on to the next slide
    pub fn continue_after_result<S: Stage>(&mut self, stage: &S) -> bool {
        let Some(attempt) = &mut self.attempt else {
            return false;
        };
        if attempt.phase != Phase::Resolved || !attempt.result_visible {
            return false;
        }

        attempt.result_visible = false;
        stage.send_message(&UpdateMessage::ResultClosed.into());

        true
    }

    /// Tears down the attempt of the slide being left
    ///
    /// Stops every timer and the audio cue regardless of phase and returns
    /// the countdown display to its initial state.
    pub fn reset<S: Stage>(&mut self, stage: &S) {
        self.timer.cancel();

        if let Some(attempt) = self.attempt.take() {
            stage.pause_and_rewind();
            stage.send_message(
                &UpdateMessage::TimerTick {
                    seconds_left: attempt.config.time_limit.as_secs(),
                }
                .into(),
            );
            stage.send_message(&UpdateMessage::DangerModeChanged(false).into());
            stage.send_message(
                &UpdateMessage::PhaseChanged {
                    phase: Phase::Idle,
                    selected: None,
                }
                .into(),
            );
        }
    }

    /// Handles a quiz alarm delivered by the host
    ///
    /// Alarms armed before the latest restart, selection or reset are
    /// dropped.
    pub fn receive_alarm<S: Stage, F: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        message: AlarmMessage,
        stage: &S,
        mut schedule_message: F,
    ) {
        if !self.timer.is_current(message.token()) {
            debug!("dropping stale quiz alarm {message:?}");
            return;
        }
        let Some(attempt) = &mut self.attempt else {
            return;
        };

        match (message, attempt.phase) {
            (AlarmMessage::Tick(token), Phase::Running) => {
                attempt.seconds_remaining = attempt.seconds_remaining.saturating_sub(1);
                stage.send_message(
                    &UpdateMessage::TimerTick {
                        seconds_left: attempt.seconds_remaining,
                    }
                    .into(),
                );
                if attempt.seconds_remaining > 0 {
                    schedule_message(
                        AlarmMessage::Tick(token).into(),
                        Duration::from_millis(constants::quiz::TICK_MILLIS),
                    );
                }
            }
            (AlarmMessage::Danger(_), Phase::Running) => {
                attempt.danger = true;
                stage.send_message(&UpdateMessage::DangerModeChanged(true).into());
            }
            (AlarmMessage::Expire(_), Phase::Running) => {
                self.timer.cancel();
                stage.pause_and_rewind();

                attempt.seconds_remaining = 0;
                attempt.selected = None;
                stage.send_message(&UpdateMessage::TimerTick { seconds_left: 0 }.into());

                attempt.resolve(stage);
            }
            (AlarmMessage::Suspense(_), Phase::Suspense) => {
                self.timer.cancel();
                attempt.resolve(stage);
            }
            (message, phase) => debug!("ignoring quiz alarm {message:?} in {phase:?}"),
        }
    }

    /// Snapshot of the active attempt
    pub fn state_message(&self) -> Option<SyncMessage> {
        self.attempt.as_ref().map(|attempt| SyncMessage {
            phase: attempt.phase,
            seconds_left: attempt.seconds_remaining,
            danger: attempt.danger,
            selected: attempt.selected,
            result: attempt
                .result
                .clone()
                .filter(|_| attempt.result_visible),
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::test_support::{ManualClock, RecordingStage, Signal, millis, secs};

    fn create_test_quiz() -> QuizConfig {
        QuizConfig::new(vec![
            OptionConfig::new("A", "Always", false, "Too absolute."),
            OptionConfig::new("B", "Check the source", true, "Verify before sharing."),
            OptionConfig::new("C", "Trust the likes", false, "Popularity is not proof."),
            OptionConfig::new("D", "Share first", false, "Spreads misinformation."),
        ])
    }

    fn started(stage: &RecordingStage, clock: &mut ManualClock) -> Engine {
        let mut engine = Engine::default();
        engine.start(&create_test_quiz(), stage, clock.schedule());
        engine
    }

    fn advance(engine: &mut Engine, stage: &RecordingStage, clock: &mut ManualClock, by: Duration) {
        clock.advance(by, |clock, alarm| {
            if let crate::AlarmMessage::Quiz(alarm) = alarm {
                engine.receive_alarm(alarm, stage, clock.schedule());
            }
        });
    }

    fn danger_updates(updates: &[crate::UpdateMessage]) -> Vec<bool> {
        updates
            .iter()
            .filter_map(|update| match update {
                crate::UpdateMessage::Quiz(UpdateMessage::DangerModeChanged(on)) => Some(*on),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_quiz_config_validation() {
        assert!(create_test_quiz().validate().is_ok());
    }

    #[test]
    fn test_quiz_config_requires_single_correct_option() {
        let none_correct = QuizConfig::new(vec![
            OptionConfig::new("A", "One", false, ""),
            OptionConfig::new("B", "Two", false, ""),
        ]);
        assert!(none_correct.validate().is_err());

        let two_correct = QuizConfig::new(vec![
            OptionConfig::new("A", "One", true, ""),
            OptionConfig::new("B", "Two", true, ""),
        ]);
        assert!(two_correct.validate().is_err());
    }

    #[test]
    fn test_quiz_config_without_options_is_valid_but_unplayable() {
        let empty = QuizConfig::new(vec![]);
        assert!(empty.validate().is_ok());
        assert!(!empty.is_playable());
    }

    #[test]
    fn test_quiz_config_time_limit_bounds() {
        let too_short = create_test_quiz().with_timing(
            secs(crate::constants::quiz::MIN_TIME_LIMIT - 1),
            secs(0),
        );
        assert!(too_short.validate().is_err());

        let too_long = create_test_quiz().with_timing(
            secs(crate::constants::quiz::MAX_TIME_LIMIT + 1),
            secs(48),
        );
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_quiz_config_deserializes_with_default_timing() {
        let config: QuizConfig = serde_json::from_str(
            r#"{"options":[{"label":"A","text":"Yes","correct":true,"explanation":"Right."}]}"#,
        )
        .unwrap();

        assert_eq!(config.time_limit(), secs(60));
        assert_eq!(config.danger_after(), secs(48));
        assert!(config.options()[0].correct);
    }

    #[test]
    fn test_start_resets_countdown_and_plays_audio() {
        let stage = RecordingStage::default();
        let mut clock = ManualClock::default();
        let engine = started(&stage, &mut clock);

        assert_eq!(engine.phase(), Phase::Running);
        assert_eq!(engine.attempt().unwrap().seconds_remaining(), 60);
        assert_eq!(stage.take_signals(), vec![Signal::AudioPlay]);
        assert!(stage.take_updates().iter().any(|update| matches!(
            update,
            crate::UpdateMessage::Quiz(UpdateMessage::TimerTick { seconds_left: 60 })
        )));
        // tick, danger and expiry
        assert_eq!(clock.pending(), 3);
    }

    #[test]
    fn test_countdown_ticks_every_second() {
        let stage = RecordingStage::default();
        let mut clock = ManualClock::default();
        let mut engine = started(&stage, &mut clock);

        advance(&mut engine, &stage, &mut clock, secs(5));

        assert_eq!(engine.attempt().unwrap().seconds_remaining(), 55);
    }

    #[test]
    fn test_expiry_resolves_as_time_up() {
        let stage = RecordingStage::default();
        let mut clock = ManualClock::default();
        let mut engine = started(&stage, &mut clock);
        stage.take_signals();

        advance(&mut engine, &stage, &mut clock, secs(60));

        let attempt = engine.attempt().unwrap();
        assert_eq!(attempt.phase(), Phase::Resolved);
        assert!(attempt.selected_option().is_none());
        assert_eq!(attempt.seconds_remaining(), 0);

        let result = attempt.result().unwrap();
        assert_eq!(result.verdict, Verdict::TimeUp);
        assert_eq!(result.title, "Time's up!");
        assert_eq!(result.explanation, TIME_EXPIRED_EXPLANATION);
        assert_eq!(result.others.len(), 4);
        assert!(stage.take_signals().contains(&Signal::AudioRewind));
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_selection_before_threshold_never_engages_danger() {
        let stage = RecordingStage::default();
        let mut clock = ManualClock::default();
        let mut engine = started(&stage, &mut clock);

        advance(&mut engine, &stage, &mut clock, secs(47));
        assert!(engine.select_option(0, &stage));
        advance(&mut engine, &stage, &mut clock, secs(30));

        let attempt = engine.attempt().unwrap();
        assert!(!attempt.danger());
        assert_eq!(attempt.phase(), Phase::AwaitingConfirmation);
        assert!(!danger_updates(&stage.take_updates()).contains(&true));
    }

    #[test]
    fn test_selection_after_threshold_keeps_danger() {
        let stage = RecordingStage::default();
        let mut clock = ManualClock::default();
        let mut engine = started(&stage, &mut clock);

        advance(&mut engine, &stage, &mut clock, secs(50));
        assert!(engine.attempt().unwrap().danger());

        assert!(engine.select_option(2, &stage));
        advance(&mut engine, &stage, &mut clock, secs(20));

        assert!(engine.attempt().unwrap().danger());
        assert_eq!(engine.phase(), Phase::AwaitingConfirmation);
    }

    #[test]
    fn test_selection_stops_countdown() {
        let stage = RecordingStage::default();
        let mut clock = ManualClock::default();
        let mut engine = started(&stage, &mut clock);

        advance(&mut engine, &stage, &mut clock, secs(10));
        stage.take_signals();
        assert!(engine.select_option(1, &stage));
        advance(&mut engine, &stage, &mut clock, secs(120));

        let attempt = engine.attempt().unwrap();
        assert_eq!(attempt.seconds_remaining(), 50);
        assert_eq!(attempt.selected_option().unwrap().label, "B");
        assert!(attempt.result().is_none());
        assert_eq!(stage.take_signals(), vec![Signal::AudioRewind]);
    }

    #[test]
    fn test_selection_only_while_running() {
        let stage = RecordingStage::default();
        let mut clock = ManualClock::default();
        let mut engine = Engine::default();
        assert!(!engine.select_option(0, &stage));

        engine.start(&create_test_quiz(), &stage, clock.schedule());
        assert!(!engine.select_option(7, &stage));
        assert!(engine.select_option(0, &stage));
        assert!(!engine.select_option(1, &stage));
        assert_eq!(engine.attempt().unwrap().selected_option().unwrap().label, "A");
    }

    #[test]
    fn test_cancel_restarts_full_countdown() {
        let stage = RecordingStage::default();
        let mut clock = ManualClock::default();
        let mut engine = started(&stage, &mut clock);

        advance(&mut engine, &stage, &mut clock, secs(50));
        assert!(engine.select_option(3, &stage));
        assert!(engine.cancel_selection(&stage, clock.schedule()));

        let attempt = engine.attempt().unwrap();
        assert_eq!(attempt.phase(), Phase::Running);
        assert_eq!(attempt.seconds_remaining(), 60);
        assert!(attempt.selected_option().is_none());
        assert!(!attempt.danger());

        // the first countdown would have expired 10 seconds from now
        advance(&mut engine, &stage, &mut clock, secs(15));
        assert_eq!(engine.phase(), Phase::Running);
        assert_eq!(engine.attempt().unwrap().seconds_remaining(), 45);

        assert!(engine.select_option(1, &stage));
    }

    #[test]
    fn test_cancel_without_selection_is_ignored() {
        let stage = RecordingStage::default();
        let mut clock = ManualClock::default();
        let mut engine = started(&stage, &mut clock);

        assert!(!engine.cancel_selection(&stage, clock.schedule()));
        assert!(!engine.confirm_selection(&stage, clock.schedule()));
    }

    #[test]
    fn test_confirm_incorrect_selection_after_suspense() {
        let stage = RecordingStage::default();
        let mut clock = ManualClock::default();
        let mut engine = started(&stage, &mut clock);

        assert!(engine.select_option(2, &stage));
        assert!(engine.confirm_selection(&stage, clock.schedule()));
        assert_eq!(engine.phase(), Phase::Suspense);
        assert!(engine.blocks_navigation());

        advance(&mut engine, &stage, &mut clock, millis(2999));
        assert_eq!(engine.phase(), Phase::Suspense);

        advance(&mut engine, &stage, &mut clock, millis(1));
        let result = engine.attempt().unwrap().result().unwrap();
        assert_eq!(result.verdict, Verdict::Incorrect);
        assert_eq!(result.title, "Incorrect!");
        assert_eq!(result.class, "incorrect");
        assert_eq!(result.explanation, "Popularity is not proof.");
        assert_eq!(
            result.others.iter().map(|o| o.label.as_str()).collect_vec(),
            vec!["A", "B", "D"]
        );
        assert!(
            result
                .others
                .iter()
                .any(|o| o.label == "B" && o.correct && o.explanation == "Verify before sharing.")
        );
    }

    #[test]
    fn test_confirm_correct_selection() {
        let stage = RecordingStage::default();
        let mut clock = ManualClock::default();
        let mut engine = started(&stage, &mut clock);

        engine.select_option(1, &stage);
        engine.confirm_selection(&stage, clock.schedule());
        advance(&mut engine, &stage, &mut clock, secs(3));

        let result = engine.attempt().unwrap().result().unwrap();
        assert_eq!(result.verdict, Verdict::Correct);
        assert_eq!(result.title, "Correct!");
        assert_eq!(result.class, "correct");
        assert!(result.others.iter().all(|o| !o.correct));
    }

    #[test]
    fn test_continue_after_result_closes_view_once() {
        let stage = RecordingStage::default();
        let mut clock = ManualClock::default();
        let mut engine = started(&stage, &mut clock);
        assert!(!engine.continue_after_result(&stage));

        advance(&mut engine, &stage, &mut clock, secs(60));
        assert!(engine.blocks_navigation());

        assert!(engine.continue_after_result(&stage));
        assert!(!engine.blocks_navigation());
        assert!(engine.state_message().unwrap().result.is_none());
        assert!(!engine.continue_after_result(&stage));
    }

    #[test]
    fn test_reset_cancels_everything() {
        let stage = RecordingStage::default();
        let mut clock = ManualClock::default();
        let mut engine = started(&stage, &mut clock);

        advance(&mut engine, &stage, &mut clock, secs(50));
        stage.take_updates();
        stage.take_signals();
        engine.reset(&stage);

        assert!(engine.attempt().is_none());
        assert_eq!(stage.take_signals(), vec![Signal::AudioRewind]);
        let updates = stage.take_updates();
        assert!(updates.iter().any(|update| matches!(
            update,
            crate::UpdateMessage::Quiz(UpdateMessage::TimerTick { seconds_left: 60 })
        )));
        assert_eq!(danger_updates(&updates), vec![false]);

        advance(&mut engine, &stage, &mut clock, secs(30));
        assert!(stage.take_updates().is_empty());
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn test_result_for_without_selection() {
        let result = create_test_quiz().result_for(None);

        assert_eq!(result.verdict, Verdict::TimeUp);
        assert!(result.selected.is_none());
        assert_eq!(result.others.len(), 4);
    }
}
