//! Shared configuration, error, time and logging primitives for PaperBot.

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod time;
pub mod types;
