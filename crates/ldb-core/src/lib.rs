//! Core domain + application logic for the lucky draw bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind ports
//! (traits) implemented in the adapter crate.

pub mod config;
pub mod domain;
pub mod draw;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod template;

pub use errors::{Error, Result};
