//! Configuration constants for the presentation
//!
//! This module contains the timing values and size limits used by the
//! slide registry, the quiz countdown, the raffle and input normalization.

/// Slide registry limits
pub mod deck {
    /// Maximum number of slides in a single deck
    pub const MAX_SLIDES_COUNT: usize = 100;
    /// Maximum length of a deck title in characters
    pub const MAX_TITLE_LENGTH: usize = 200;
    /// Maximum length of a slide header in characters
    pub const MAX_HEADER_LENGTH: usize = 120;
}

/// Quiz slide configuration constants
pub mod quiz {
    /// Default countdown length in seconds
    pub const DEFAULT_TIME_LIMIT: u64 = 60;
    /// Default number of elapsed seconds after which danger mode engages
    pub const DEFAULT_DANGER_AFTER: u64 = 48;
    /// Minimum countdown length in seconds
    pub const MIN_TIME_LIMIT: u64 = 5;
    /// Maximum countdown length in seconds
    pub const MAX_TIME_LIMIT: u64 = 240;
    /// Milliseconds between confirming an answer and revealing the verdict
    pub const SUSPENSE_MILLIS: u64 = 3000;
    /// Milliseconds between two countdown ticks
    pub const TICK_MILLIS: u64 = 1000;
    /// Maximum number of options on a quiz slide
    pub const MAX_OPTION_COUNT: usize = 8;
    /// Maximum length of an option label
    pub const MAX_LABEL_LENGTH: usize = 4;
    /// Maximum length of option and explanation text
    pub const MAX_TEXT_LENGTH: usize = 500;
}

/// Raffle configuration constants
pub mod raffle {
    /// Smallest accepted participant count
    pub const MIN_PARTICIPANTS: u32 = 1;
    /// Largest accepted participant count
    pub const MAX_PARTICIPANTS: u32 = 99;
    /// Longest keypad entry, the number of digits in the largest count
    pub const MAX_ENTRY_DIGITS: usize = 2;
    /// Length of the cosmetic spin before the winner is drawn
    pub const SPIN_MILLIS: u64 = 3000;
    /// Interval between two spin display refreshes
    pub const SPIN_FRAME_MILLIS: u64 = 80;
}

/// Input normalization constants
pub mod input {
    /// Minimum horizontal travel in pixels for a gesture to count as a swipe
    pub const SWIPE_THRESHOLD: f32 = 50.;
}
