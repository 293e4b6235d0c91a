//! # stride-core
//!
//! Core types, configuration, and error handling for the Stride bot.

pub mod config;
pub mod error;
pub mod types;

pub use config::shellexpand;
