//! Test doubles shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::RngCore;

use crate::browser::{
    BrowserDriver, BrowserSession, ElementHandle, Key, Visibility, WaitPolicy, selectors,
};
use crate::config::BrowserConfig;
use crate::error::{DriverError, LlmError};
use crate::llm::{CompletionRequest, CompletionResponse, TextGenerator};

/// RNG that replays a fixed list of uniform `f64` draws.
///
/// Each value `x` in `[0, 1)` comes back from `rng.gen::<f64>()` as the
/// smallest representable draw not below `x`, so threshold comparisons behave
/// as written. Panics once the script runs out.
pub struct ScriptedRng {
    draws: VecDeque<f64>,
}

impl ScriptedRng {
    pub fn new(draws: &[f64]) -> Self {
        Self {
            draws: draws.iter().copied().collect(),
        }
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let x = self.draws.pop_front().expect("scripted rng exhausted");
        let scale = (1u64 << 53) as f64;
        let mantissa = ((x * scale).ceil() as u64).min((1u64 << 53) - 1);
        mantissa << 11
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Text generator returning queued results, then numbered fallbacks.
#[derive(Default)]
pub struct FakeGenerator {
    queued: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
    counter: AtomicUsize,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(replies: &[&str]) -> Self {
        let generator = Self::default();
        for reply in replies {
            generator.push_ok(reply);
        }
        generator
    }

    pub fn push_ok(&self, text: &str) {
        self.queued.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn push_err(&self, err: LlmError) {
        self.queued.lock().unwrap().push_back(Err(err));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    fn model_name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.prompts.lock().unwrap().push(request.prompt);
        let next = self.queued.lock().unwrap().pop_front();
        match next {
            Some(result) => result.map(|content| CompletionResponse { content }),
            None => {
                let n = self.counter.fetch_add(1, Ordering::SeqCst);
                Ok(CompletionResponse {
                    content: format!("generated thought {}", n),
                })
            }
        }
    }
}

/// Static description of a page for [`FakeSession`].
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    elements: HashMap<String, Vec<String>>,
    children: HashMap<(String, String), String>,
    texts: HashMap<(String, String), String>,
    /// Every call fails with `SessionLost`.
    pub lost: bool,
    /// Navigations to this URL fail with a timeout.
    pub fail_navigation_to: Option<String>,
    /// Clicks fail with `SessionLost`, as if the browser died mid-action.
    pub lose_on_click: bool,
    /// Screenshots fail.
    pub fail_screenshot: bool,
}

impl FakePage {
    pub fn with_element(mut self, selector: &str, id: &str) -> Self {
        self.elements
            .entry(selector.to_string())
            .or_default()
            .push(id.to_string());
        self
    }

    pub fn with_child(mut self, parent: &str, selector: &str, id: &str) -> Self {
        self.children
            .insert((parent.to_string(), selector.to_string()), id.to_string());
        self
    }

    pub fn with_text(mut self, parent: &str, selector: &str, text: &str) -> Self {
        self.texts
            .insert((parent.to_string(), selector.to_string()), text.to_string());
        self
    }

    /// A feed item with text, author and all three engagement buttons.
    pub fn with_feed_item(self, id: &str, text: &str, author: &str) -> Self {
        self.with_element(selectors::FEED_ITEM, id)
            .with_text(id, selectors::ITEM_TEXT, text)
            .with_text(id, selectors::ITEM_AUTHOR, author)
            .with_child(id, selectors::LIKE_BUTTON, &format!("{}/like", id))
            .with_child(id, selectors::RETWEET_BUTTON, &format!("{}/retweet", id))
            .with_child(id, selectors::REPLY_BUTTON, &format!("{}/reply", id))
    }

    /// Composer, submit and retweet-confirm controls.
    pub fn with_composer(self) -> Self {
        self.with_element(selectors::COMPOSE_BUTTON, "compose")
            .with_element(selectors::COMPOSER_TEXTAREA, "textarea")
            .with_element(selectors::SUBMIT_BUTTON, "submit")
            .with_element(selectors::RETWEET_CONFIRM, "confirm")
    }
}

/// In-memory browser session that records every side-effecting call.
pub struct FakeSession {
    page: FakePage,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeSession {
    pub fn new(page: FakePage) -> Self {
        Self::with_log(page, Arc::new(Mutex::new(Vec::new())))
    }

    pub fn with_log(page: FakePage, calls: Arc<Mutex<Vec<String>>>) -> Self {
        Self { page, calls }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_alive(&self) -> Result<(), DriverError> {
        if self.page.lost {
            return Err(DriverError::SessionLost {
                reason: "browser went away".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str, _wait: WaitPolicy) -> Result<(), DriverError> {
        self.check_alive()?;
        self.record(format!("navigate:{}", url));
        if self.page.fail_navigation_to.as_deref() == Some(url) {
            return Err(DriverError::Timeout {
                what: format!("navigation to {}", url),
                timeout: Duration::from_secs(60),
            });
        }
        Ok(())
    }

    async fn wait_for_element(
        &self,
        selector: &str,
        _visibility: Visibility,
        timeout: Duration,
    ) -> Result<ElementHandle, DriverError> {
        self.check_alive()?;
        self.query(selector).await?.ok_or(DriverError::Timeout {
            what: selector.to_string(),
            timeout,
        })
    }

    async fn query(&self, selector: &str) -> Result<Option<ElementHandle>, DriverError> {
        self.check_alive()?;
        Ok(self
            .page
            .elements
            .get(selector)
            .and_then(|ids| ids.first())
            .map(ElementHandle::new))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, DriverError> {
        self.check_alive()?;
        Ok(self
            .page
            .elements
            .get(selector)
            .map(|ids| ids.iter().map(ElementHandle::new).collect())
            .unwrap_or_default())
    }

    async fn query_within(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>, DriverError> {
        self.check_alive()?;
        Ok(self
            .page
            .children
            .get(&(parent.id().to_string(), selector.to_string()))
            .map(ElementHandle::new))
    }

    async fn extract_text(
        &self,
        parent: &ElementHandle,
        inner_selector: &str,
    ) -> Result<String, DriverError> {
        self.check_alive()?;
        self.page
            .texts
            .get(&(parent.id().to_string(), inner_selector.to_string()))
            .cloned()
            .ok_or(DriverError::ElementNotFound {
                selector: inner_selector.to_string(),
            })
    }

    async fn type_text(
        &self,
        element: &ElementHandle,
        text: &str,
        _per_char_delay: Duration,
    ) -> Result<(), DriverError> {
        self.check_alive()?;
        self.record(format!("type:{}:{}", element.id(), text));
        Ok(())
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.check_alive()?;
        if self.page.lose_on_click {
            return Err(DriverError::SessionLost {
                reason: "browser crashed".to_string(),
            });
        }
        self.record(format!("click:{}", element.id()));
        Ok(())
    }

    async fn press_key(&self, key: Key) -> Result<(), DriverError> {
        self.check_alive()?;
        self.record(format!("key:{:?}", key));
        Ok(())
    }

    async fn scroll_by(&self, pixels: u32) -> Result<(), DriverError> {
        self.check_alive()?;
        self.record(format!("scroll:{}", pixels));
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError> {
        self.record(format!("screenshot:{}", path.display()));
        if self.page.fail_screenshot || self.page.lost {
            return Err(DriverError::Protocol {
                code: "unknown error".to_string(),
                message: "cannot capture".to_string(),
            });
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.record("close".to_string());
        Ok(())
    }
}

/// Driver handing out [`FakeSession`]s over a shared call log.
pub struct FakeDriver {
    page: Option<FakePage>,
    calls: Arc<Mutex<Vec<String>>>,
    launches: Mutex<Vec<tokio::time::Instant>>,
}

impl FakeDriver {
    /// Every launch succeeds with a session over `page`.
    pub fn with_page(page: FakePage) -> Self {
        Self {
            page: Some(page),
            calls: Arc::new(Mutex::new(Vec::new())),
            launches: Mutex::new(Vec::new()),
        }
    }

    /// Every launch fails.
    pub fn failing() -> Self {
        Self {
            page: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            launches: Mutex::new(Vec::new()),
        }
    }

    pub fn launches(&self) -> Vec<tokio::time::Instant> {
        self.launches.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn launch(&self, _config: &BrowserConfig) -> Result<Box<dyn BrowserSession>, DriverError> {
        self.launches.lock().unwrap().push(tokio::time::Instant::now());
        match &self.page {
            Some(page) => Ok(Box::new(FakeSession::with_log(
                page.clone(),
                Arc::clone(&self.calls),
            ))),
            None => Err(DriverError::LaunchFailed {
                reason: "no browser available".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn test_scripted_rng_replays_draws() {
        let mut rng = ScriptedRng::new(&[0.0, 0.25, 0.33, 0.999]);
        assert_eq!(rng.r#gen::<f64>(), 0.0);
        assert_eq!(rng.r#gen::<f64>(), 0.25);
        let third: f64 = rng.r#gen();
        assert!(third >= 0.33 && third < 0.33 + 1e-12);
        assert!(rng.r#gen::<f64>() < 1.0);
    }
}
