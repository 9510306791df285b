//! The autonomous persona loop.
//!
//! - [`generator`]: mood-shaped post and reply text
//! - [`selector`]: weighted-random action and engagement choices
//! - [`interaction`]: feed sampling and engagement
//! - [`orchestrator`]: session state machine with self-healing restarts
//! - [`shutdown`]: cancellable waits

pub mod generator;
pub mod interaction;
pub mod orchestrator;
pub mod selector;
pub mod shutdown;

pub use generator::{ContentGenerator, GenerationRequest, MAX_CONTENT_CHARS, clean_completion};
pub use interaction::{InteractionEngine, InteractionSummary, item_id};
pub use orchestrator::{Phase, SessionOrchestrator, SharedRng};
pub use selector::{Action, ActionSelector, EngagementPlan};
pub use shutdown::{Shutdown, ShutdownTrigger};
