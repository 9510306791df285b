//! W3C WebDriver implementation of the driver contract.
//!
//! Talks JSON over HTTP to chromedriver (or any W3C-compliant endpoint such as
//! geckodriver or a Selenium grid).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, Method};
use serde_json::{Value, json};

use crate::browser::driver::{
    BrowserDriver, BrowserSession, ElementHandle, Key, Visibility, WaitPolicy,
};
use crate::config::BrowserConfig;
use crate::error::DriverError;

/// Key under which W3C endpoints return element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735e2f0c8d";

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const NETWORK_QUIET: Duration = Duration::from_millis(500);

/// Session factory backed by a WebDriver endpoint.
pub struct WebDriver {
    client: Client,
    base_url: String,
}

impl WebDriver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

fn capabilities(config: &BrowserConfig) -> Value {
    let mut args = config.args.clone();
    if config.headless {
        args.push("--headless=new".to_string());
    }
    args.push(format!(
        "--window-size={},{}",
        config.viewport.0, config.viewport.1
    ));
    args.push(format!("--user-agent={}", config.user_agent));

    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "pageLoadStrategy": "normal",
                "timeouts": { "pageLoad": config.navigation_timeout.as_millis() as u64 },
                "goog:chromeOptions": { "args": args }
            }
        }
    })
}

#[async_trait]
impl BrowserDriver for WebDriver {
    async fn launch(&self, config: &BrowserConfig) -> Result<Box<dyn BrowserSession>, DriverError> {
        let url = format!("{}/session", self.base_url);
        tracing::debug!("Requesting WebDriver session from {}", url);

        let response = self
            .client
            .post(&url)
            .json(&capabilities(config))
            .send()
            .await
            .map_err(|e| DriverError::LaunchFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|e| DriverError::LaunchFailed {
            reason: format!("unreadable session response: {}", e),
        })?;
        if !status.is_success() {
            return Err(DriverError::LaunchFailed {
                reason: error_from_body(&body).to_string(),
            });
        }

        let session_id = body["value"]["sessionId"]
            .as_str()
            .ok_or_else(|| DriverError::LaunchFailed {
                reason: "response carries no sessionId".to_string(),
            })?
            .to_string();

        tracing::info!("Browser session {} started", session_id);
        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            session_url: format!("{}/session/{}", self.base_url, session_id),
            navigation_timeout: config.navigation_timeout,
        }))
    }
}

/// A live WebDriver session.
pub struct WebDriverSession {
    client: Client,
    session_url: String,
    navigation_timeout: Duration,
}

impl WebDriverSession {
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, DriverError> {
        let url = format!("{}{}", self.session_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            return Err(error_from_body(&body));
        }
        Ok(body.get("value").cloned().unwrap_or(Value::Null))
    }

    async fn find(&self, path: &str, selector: &str) -> Result<ElementHandle, DriverError> {
        let value = self
            .command(
                Method::POST,
                path,
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await
            .map_err(|e| match e {
                DriverError::ElementNotFound { .. } => DriverError::ElementNotFound {
                    selector: selector.to_string(),
                },
                other => other,
            })?;
        element_from_value(&value)
    }

    async fn find_optional(&self, path: &str, selector: &str) -> Result<Option<ElementHandle>, DriverError> {
        match self.find(path, selector).await {
            Ok(element) => Ok(Some(element)),
            Err(DriverError::ElementNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        let value = self
            .command(
                Method::GET,
                &format!("/element/{}/displayed", element.id()),
                None,
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn execute(&self, script: &str, args: Value) -> Result<Value, DriverError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn wait_until_loaded(&self) -> Result<(), DriverError> {
        let started = tokio::time::Instant::now();
        loop {
            let state = self.execute("return document.readyState;", json!([])).await?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            if started.elapsed() >= self.navigation_timeout {
                return Err(DriverError::Timeout {
                    what: "page load".to_string(),
                    timeout: self.navigation_timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&self, url: &str, wait: WaitPolicy) -> Result<(), DriverError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        self.wait_until_loaded().await?;
        if wait == WaitPolicy::NetworkIdle {
            tokio::time::sleep(NETWORK_QUIET).await;
        }
        Ok(())
    }

    async fn wait_for_element(
        &self,
        selector: &str,
        visibility: Visibility,
        timeout: Duration,
    ) -> Result<ElementHandle, DriverError> {
        let started = tokio::time::Instant::now();
        loop {
            if let Some(element) = self.find_optional("/element", selector).await? {
                if visibility == Visibility::Attached || self.is_displayed(&element).await? {
                    return Ok(element);
                }
            }
            if started.elapsed() >= timeout {
                return Err(DriverError::Timeout {
                    what: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn query(&self, selector: &str) -> Result<Option<ElementHandle>, DriverError> {
        self.find_optional("/element", selector).await
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, DriverError> {
        let value = self
            .command(
                Method::POST,
                "/elements",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await?;
        value
            .as_array()
            .map(|items| items.iter().map(element_from_value).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn query_within(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>, DriverError> {
        self.find_optional(&format!("/element/{}/element", parent.id()), selector)
            .await
    }

    async fn extract_text(
        &self,
        parent: &ElementHandle,
        inner_selector: &str,
    ) -> Result<String, DriverError> {
        let child = self
            .find(&format!("/element/{}/element", parent.id()), inner_selector)
            .await?;
        let value = self
            .command(Method::GET, &format!("/element/{}/text", child.id()), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn type_text(
        &self,
        element: &ElementHandle,
        text: &str,
        per_char_delay: Duration,
    ) -> Result<(), DriverError> {
        let path = format!("/element/{}/value", element.id());
        if per_char_delay.is_zero() {
            self.command(Method::POST, &path, Some(json!({ "text": text })))
                .await?;
            return Ok(());
        }
        for ch in text.chars() {
            self.command(
                Method::POST,
                &path,
                Some(json!({ "text": ch.to_string() })),
            )
            .await?;
            tokio::time::sleep(per_char_delay).await;
        }
        Ok(())
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.command(
            Method::POST,
            &format!("/element/{}/click", element.id()),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    async fn press_key(&self, key: Key) -> Result<(), DriverError> {
        let code = key_code(key);
        self.command(
            Method::POST,
            "/actions",
            Some(json!({
                "actions": [{
                    "type": "key",
                    "id": "keyboard",
                    "actions": [
                        { "type": "keyDown", "value": code },
                        { "type": "keyUp", "value": code }
                    ]
                }]
            })),
        )
        .await?;
        Ok(())
    }

    async fn scroll_by(&self, pixels: u32) -> Result<(), DriverError> {
        self.execute(
            "window.scrollBy({ top: arguments[0], behavior: 'smooth' });",
            json!([pixels]),
        )
        .await?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError> {
        let value = self.command(Method::GET, "/screenshot", None).await?;
        let encoded = value.as_str().ok_or_else(|| DriverError::Protocol {
            code: "invalid response".to_string(),
            message: "screenshot payload is not a string".to_string(),
        })?;
        let png = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| DriverError::Protocol {
                code: "invalid response".to_string(),
                message: format!("screenshot is not base64: {}", e),
            })?;
        tokio::fs::write(path, png).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), DriverError> {
        match self.command(Method::DELETE, "", None).await {
            Ok(_) | Err(DriverError::SessionLost { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn key_code(key: Key) -> &'static str {
    match key {
        Key::Enter => "\u{E007}",
    }
}

fn element_from_value(value: &Value) -> Result<ElementHandle, DriverError> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(ElementHandle::new)
        .ok_or_else(|| DriverError::Protocol {
            code: "invalid response".to_string(),
            message: format!("not an element reference: {}", value),
        })
}

/// Map a W3C error payload to a driver error.
fn error_from_body(body: &Value) -> DriverError {
    let value = body.get("value").unwrap_or(body);
    let code = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match code {
        "invalid session id" | "no such window" | "session not created" => {
            DriverError::SessionLost { reason: message }
        }
        "no such element" => DriverError::ElementNotFound { selector: message },
        "timeout" | "script timeout" => DriverError::Timeout {
            what: message,
            timeout: Duration::ZERO,
        },
        other => DriverError::Protocol {
            code: other.to_string(),
            message,
        },
    }
}
