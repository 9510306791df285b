//! Durable persona state.
//!
//! The state lives in a single pretty-printed JSON document. Loading never
//! fails: a missing, unreadable or malformed file yields a fresh default state.
//! Saving is synchronous and reports every failure to the caller.

use std::path::{Path, PathBuf};

use crate::error::StateError;
use crate::persona::state::PersonaState;

/// File-backed persona state store.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state, falling back to defaults.
    pub fn load(&self) -> PersonaState {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "No state file at {}, starting from defaults",
                    self.path.display()
                );
                return PersonaState::default();
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read state file {}: {}, starting from defaults",
                    self.path.display(),
                    e
                );
                return PersonaState::default();
            }
        };

        match serde_json::from_str::<PersonaState>(&data) {
            Ok(state) => {
                tracing::info!(
                    "Loaded state from {} (mood: {}, {} remembered posts)",
                    self.path.display(),
                    state.mood.current,
                    state.memory.recent_posts.len()
                );
                state
            }
            Err(e) => {
                tracing::warn!(
                    "State file {} is malformed: {}, starting from defaults",
                    self.path.display(),
                    e
                );
                PersonaState::default()
            }
        }
    }

    /// Write the state, replacing the previous document atomically.
    pub fn save(&self, state: &PersonaState) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(state)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        tracing::debug!("State saved to {}", self.path.display());
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> StateError {
        StateError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
