//! CaliCoach — scripted conversational coach.
//!
//! Walks the user through a fixed question sequence, accumulates a profile,
//! and generates a WhatsApp-ready calisthenics routine with one Gemini call.

pub mod cli;
pub mod coach;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod script;
