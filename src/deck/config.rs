//! Slide registry
//!
//! A [`Deck`] is the ordered, read-only list of slides shown during a
//! session. It is usually loaded from JSON once at start-up and then only
//! looked up by index.

use garde::Validate;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::quiz::QuizConfig;
use crate::session::AnimationKind;

/// Errors that can occur while loading a deck
#[derive(Error, Debug)]
pub enum Error {
    /// The input is not a well-formed deck document
    #[error("malformed deck: {0}")]
    Parse(#[from] serde_json::Error),
    /// The deck violates a size or content limit
    #[error("invalid deck: {0}")]
    Invalid(#[from] garde::Report),
}

/// A complete slide deck
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct Deck {
    /// Title of the presentation
    #[garde(length(max = crate::constants::deck::MAX_TITLE_LENGTH))]
    #[serde(default)]
    title: String,

    /// The slides in presentation order
    #[garde(length(min = 1, max = crate::constants::deck::MAX_SLIDES_COUNT), dive)]
    slides: Vec<SlideConfig>,
}

/// A single slide
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct SlideConfig {
    /// Text shown in the presentation header while the slide is active
    #[garde(length(max = crate::constants::deck::MAX_HEADER_LENGTH))]
    #[serde(default)]
    pub header: String,
    /// Whether the slide holds a panel that the first "next" reveals
    #[garde(skip)]
    #[serde(default)]
    pub reveal_first: bool,
    /// Ambient animations running while the slide is active
    #[garde(skip)]
    #[serde(default)]
    pub animations: Vec<AnimationKind>,
    /// The quiz shown on this slide, if any
    #[garde(dive)]
    #[serde(default)]
    pub quiz: Option<QuizConfig>,
}

impl SlideConfig {
    /// Creates a plain content slide
    pub fn content(header: &str) -> Self {
        Self {
            header: header.to_owned(),
            reveal_first: false,
            animations: Vec::new(),
            quiz: None,
        }
    }

    /// Creates a quiz slide
    pub fn quiz(header: &str, quiz: QuizConfig) -> Self {
        Self {
            quiz: Some(quiz),
            ..Self::content(header)
        }
    }

    /// The quiz of this slide, if it has a playable one
    pub fn playable_quiz(&self) -> Option<&QuizConfig> {
        self.quiz.as_ref().filter(|quiz| quiz.is_playable())
    }

    /// Whether this slide runs a quiz when entered
    pub fn is_quiz(&self) -> bool {
        self.playable_quiz().is_some()
    }
}

impl Deck {
    /// Creates a deck from slides, validating every limit
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invalid`] if the deck is empty, too large, or holds
    /// a slide that breaks a content rule.
    pub fn new(title: &str, slides: Vec<SlideConfig>) -> Result<Self, Error> {
        let deck = Self {
            title: title.to_owned(),
            slides,
        };
        deck.validate()?;
        deck.warn_degraded();
        Ok(deck)
    }

    /// Parses and validates a deck from its JSON form
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed JSON and [`Error::Invalid`]
    /// if the parsed deck breaks a limit.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let deck: Self = serde_json::from_str(json)?;
        deck.validate()?;
        deck.warn_degraded();
        Ok(deck)
    }

    fn warn_degraded(&self) {
        for (index, slide) in self.slides.iter().enumerate() {
            if slide.quiz.is_some() && !slide.is_quiz() {
                warn!("slide {index} declares a quiz without options, showing it as content");
            }
        }
    }

    /// Title of the presentation
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the number of slides in this deck
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Checks if this deck contains any slides
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Looks up a slide by its position
    pub fn slide(&self, index: usize) -> Option<&SlideConfig> {
        self.slides.get(index)
    }
}
