//! Session lifecycle: launch, authenticate, run ticks, recover.
//!
//! The orchestrator is an explicit state machine:
//!
//! ```text
//! Starting ──launch ok──▶ Authenticating ──login ok──▶ Running
//!    ▲   └─launch failed─┐        └─login failed─┐       │ session lost /
//!    │                   ▼                       ▼       │ too many failures
//!    └──────backoff──── Degraded ◀───────────────────────┘
//! ```
//!
//! Any state moves to `Terminated` once shutdown is requested. Every wait is
//! cancellable, so a shutdown request never has to sit out a backoff.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use rand::RngCore;

use crate::agent::generator::ContentGenerator;
use crate::agent::interaction::InteractionEngine;
use crate::agent::selector::{Action, ActionSelector};
use crate::agent::shutdown::Shutdown;
use crate::browser::scripts::pause;
use crate::browser::{BrowserDriver, BrowserSession, WaitPolicy, login, post_content};
use crate::config::{BrowserConfig, Config, CredentialsConfig, PacingConfig, SessionConfig};
use crate::error::DriverError;
use crate::llm::TextGenerator;
use crate::persona::Persona;

/// Randomness source shared by every decision the orchestrator makes.
pub type SharedRng = Box<dyn RngCore + Send + Sync>;

/// Lifecycle phase of the browser session.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Starting,
    Authenticating,
    Running,
    Degraded { reason: String, backoff: Duration },
    Terminated,
}

/// Why a tick did not complete.
enum TickFailure {
    Error(DriverError),
    Panic(String),
}

impl std::fmt::Display for TickFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TickFailure::Error(e) => write!(f, "{}", e),
            TickFailure::Panic(msg) => write!(f, "panic: {}", msg),
        }
    }
}

pub struct SessionOrchestrator {
    driver: Arc<dyn BrowserDriver>,
    persona: Persona,
    generator: Arc<ContentGenerator>,
    selector: ActionSelector,
    engine: InteractionEngine,
    browser: BrowserConfig,
    credentials: CredentialsConfig,
    session: SessionConfig,
    pacing: PacingConfig,
    rng: SharedRng,
    shutdown: Shutdown,
}

impl SessionOrchestrator {
    pub fn new(
        config: &Config,
        driver: Arc<dyn BrowserDriver>,
        llm: Arc<dyn TextGenerator>,
        persona: Persona,
        rng: SharedRng,
        shutdown: Shutdown,
    ) -> Self {
        let generator = Arc::new(ContentGenerator::new(llm, &config.llm));
        let selector = ActionSelector::new(config.behavior.clone());
        let engine = InteractionEngine::new(
            selector.clone(),
            Arc::clone(&generator),
            config.pacing.clone(),
            config.browser.home_url.clone(),
        );
        Self {
            driver,
            persona,
            generator,
            selector,
            engine,
            browser: config.browser.clone(),
            credentials: config.credentials.clone(),
            session: config.session.clone(),
            pacing: config.pacing.clone(),
            rng,
            shutdown,
        }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Drive the state machine until shutdown, then persist a final time.
    pub async fn run(&mut self) {
        let shutdown = self.shutdown.clone();
        let mut session: Option<Box<dyn BrowserSession>> = None;
        let mut phase = Phase::Starting;

        loop {
            if shutdown.is_triggered() && phase != Phase::Terminated {
                phase = Phase::Terminated;
            }

            let next = match phase {
                Phase::Starting => self.start(&shutdown, &mut session).await,
                Phase::Authenticating => match session.as_deref() {
                    Some(active) => self.authenticate(&shutdown, active).await,
                    None => Phase::Starting,
                },
                Phase::Running => match session.as_deref() {
                    Some(active) => self.run_ticks(&shutdown, active).await,
                    None => Phase::Starting,
                },
                Phase::Degraded { ref reason, backoff } => {
                    tracing::warn!(
                        "Session degraded: {}. Restarting in {:?}",
                        reason,
                        backoff
                    );
                    close_session(session.take()).await;
                    if shutdown.sleep(backoff).await {
                        Phase::Starting
                    } else {
                        Phase::Terminated
                    }
                }
                Phase::Terminated => {
                    close_session(session.take()).await;
                    break;
                }
            };

            tracing::debug!(from = ?phase, to = ?next, "Session phase transition");
            phase = next;
        }

        tracing::info!("Shutting down, saving state...");
        if let Err(e) = self.persona.persist() {
            tracing::error!("Final state save failed: {}", e);
        }
    }

    async fn start(
        &mut self,
        shutdown: &Shutdown,
        session: &mut Option<Box<dyn BrowserSession>>,
    ) -> Phase {
        tracing::info!("Starting new browser session...");
        match shutdown.guard(self.driver.launch(&self.browser)).await {
            None => Phase::Terminated,
            Some(Ok(launched)) => {
                *session = Some(launched);
                Phase::Authenticating
            }
            Some(Err(e)) => Phase::Degraded {
                reason: format!("browser launch failed: {}", e),
                backoff: self.session.launch_backoff,
            },
        }
    }

    async fn authenticate(&mut self, shutdown: &Shutdown, session: &dyn BrowserSession) -> Phase {
        let attempt = login(session, &self.browser, &self.credentials, &self.pacing);
        match shutdown.guard(attempt).await {
            None => Phase::Terminated,
            Some(true) => {
                tracing::info!("Login successful, starting main loop");
                Phase::Running
            }
            Some(false) => Phase::Degraded {
                reason: "login failed".to_string(),
                backoff: self.session.auth_backoff,
            },
        }
    }

    /// The running loop. Returns the phase to move to when it ends.
    async fn run_ticks(&mut self, shutdown: &Shutdown, session: &dyn BrowserSession) -> Phase {
        let mut consecutive_failures: u32 = 0;

        loop {
            let outcome = shutdown
                .guard(AssertUnwindSafe(self.tick(session)).catch_unwind())
                .await;

            let failure = match outcome {
                None => return Phase::Terminated,
                Some(Ok(Ok(()))) => None,
                Some(Ok(Err(e))) if e.is_session_fatal() => {
                    return Phase::Degraded {
                        reason: format!("session lost: {}", e),
                        backoff: self.session.restart_delay,
                    };
                }
                Some(Ok(Err(e))) => Some(TickFailure::Error(e)),
                Some(Err(payload)) => Some(TickFailure::Panic(panic_message(payload.as_ref()))),
            };

            if let Some(failure) = failure {
                consecutive_failures += 1;
                tracing::error!(
                    consecutive_failures,
                    "Error in main loop: {}",
                    failure
                );
                self.capture_diagnostics(session).await;

                if consecutive_failures >= self.session.max_consecutive_failures {
                    return Phase::Degraded {
                        reason: format!("{} consecutive tick failures", consecutive_failures),
                        backoff: self.session.restart_delay,
                    };
                }
                if !shutdown.sleep(self.session.tick_error_pause).await {
                    return Phase::Terminated;
                }
                continue;
            }
            consecutive_failures = 0;

            let delay = self.selector.tick_delay(self.rng.as_mut());
            tracing::info!("Waiting {} seconds before next action", delay.as_secs());
            if !shutdown.sleep(delay).await {
                return Phase::Terminated;
            }

            if self.selector.should_refresh(self.rng.as_mut()) {
                tracing::info!("Refreshing feed...");
                match shutdown
                    .guard(session.navigate(&self.browser.home_url, WaitPolicy::Load))
                    .await
                {
                    None => return Phase::Terminated,
                    Some(Err(e)) => {
                        return Phase::Degraded {
                            reason: format!("feed refresh failed: {}", e),
                            backoff: self.session.restart_delay,
                        };
                    }
                    Some(Ok(())) => pause(self.pacing.long).await,
                }
            }
        }
    }

    /// One post-or-interact decision and its execution.
    async fn tick(&mut self, session: &dyn BrowserSession) -> Result<(), DriverError> {
        let last_post = self.persona.memory().last_post_time;
        let action = self.selector.choose(self.rng.as_mut(), last_post, Utc::now());
        tracing::info!("Selected action: {}", action);

        match action {
            Action::Post => {
                let generated = self
                    .generator
                    .generate_post(&mut self.persona, self.rng.as_mut())
                    .await;
                match generated {
                    Some(text) => {
                        post_content(session, &text, &self.pacing).await?;
                        self.persona.record_post(Utc::now());
                        tracing::info!("Posted: {}", text);
                    }
                    None => tracing::info!("No tweet generated, skipping post"),
                }
            }
            Action::Interact => {
                self.engine
                    .run(session, &mut self.persona, self.rng.as_mut())
                    .await?;
            }
        }
        Ok(())
    }

    /// Best-effort screenshot after a failed tick.
    async fn capture_diagnostics(&self, session: &dyn BrowserSession) {
        let path = self
            .session
            .diagnostics_dir
            .join(format!("error-{}.png", Utc::now().timestamp_millis()));
        match session.screenshot(&path).await {
            Ok(()) => tracing::info!("Saved error screenshot to {}", path.display()),
            Err(e) => tracing::warn!("Failed to capture error screenshot: {}", e),
        }
    }
}

async fn close_session(session: Option<Box<dyn BrowserSession>>) {
    if let Some(session) = session {
        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
