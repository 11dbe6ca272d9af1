//! Core domain + application logic for the co-owner moderation bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the AI endpoint
//! live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod principals;
pub mod routing;
pub mod security;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::{Error, Result};
