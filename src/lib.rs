//! Wraith: an autonomous social-media persona.
//!
//! A simulated mood shapes LLM-written posts and replies, which are published
//! through a browser session that heals itself after failures. Persona state
//! survives restarts in a single JSON document.

pub mod agent;
pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod persona;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{ConfigError, DriverError, LlmError, StateError};
