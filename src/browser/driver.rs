//! Browser automation driver contract.
//!
//! The persona never touches page markup directly: it issues these calls and
//! only cares whether they succeed. [`BrowserDriver`] creates sessions,
//! [`BrowserSession`] drives one page.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::BrowserConfig;
use crate::error::DriverError;

/// Opaque handle to an element inside a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// The document finished loading.
    Load,
    /// The document loaded and the network went quiet.
    #[default]
    NetworkIdle,
}

/// Whether an element wait also requires the element to be visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Attached,
    Visible,
}

/// Special keys the scripts press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
}

/// Creates browser sessions.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn launch(&self, config: &BrowserConfig) -> Result<Box<dyn BrowserSession>, DriverError>;
}

/// One live browser page.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&self, url: &str, wait: WaitPolicy) -> Result<(), DriverError>;

    /// Wait until an element matching `selector` exists (and is visible if
    /// requested), up to `timeout`.
    async fn wait_for_element(
        &self,
        selector: &str,
        visibility: Visibility,
        timeout: Duration,
    ) -> Result<ElementHandle, DriverError>;

    /// First element matching `selector`, if any.
    async fn query(&self, selector: &str) -> Result<Option<ElementHandle>, DriverError>;

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, DriverError>;

    /// First descendant of `parent` matching `selector`, if any.
    async fn query_within(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>, DriverError>;

    /// Text content of the first descendant of `parent` matching `inner_selector`.
    async fn extract_text(
        &self,
        parent: &ElementHandle,
        inner_selector: &str,
    ) -> Result<String, DriverError>;

    async fn type_text(
        &self,
        element: &ElementHandle,
        text: &str,
        per_char_delay: Duration,
    ) -> Result<(), DriverError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError>;

    async fn press_key(&self, key: Key) -> Result<(), DriverError>;

    /// Scroll the viewport down by `pixels`.
    async fn scroll_by(&self, pixels: u32) -> Result<(), DriverError>;

    /// Write a PNG of the current page to `path`.
    async fn screenshot(&self, path: &Path) -> Result<(), DriverError>;

    /// End the session. Calling it twice is harmless.
    async fn close(&self) -> Result<(), DriverError>;
}
