//! Slide deck content
//!
//! This module contains the slide registry loaded at start-up and the quiz
//! slides embedded in it.

pub mod config;
pub mod quiz;
