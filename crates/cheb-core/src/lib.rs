//! Core of the Cheburashka bot: command dispatch, model queries and reply
//! formatting.
//!
//! This crate is framework-agnostic. Telegram and Gemini live behind ports
//! (traits) implemented in adapter crates.

pub mod app;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod model;
pub mod query;
pub mod texts;

pub use errors::{Error, QueryError, Result};
