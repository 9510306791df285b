//! Fixed page scripts: login and posting.
//!
//! The orchestrator only sees the outcome; the step sequence here mirrors what
//! a person would do in the web client.

use std::time::Duration;

use futures::future::select_ok;
use secrecy::ExposeSecret;

use crate::browser::driver::{BrowserSession, Key, Visibility, WaitPolicy};
use crate::browser::selectors;
use crate::config::{BrowserConfig, CredentialsConfig, PacingConfig};
use crate::error::DriverError;

const INPUT_TIMEOUT: Duration = Duration::from_secs(30);
const LOGIN_CONFIRM_TIMEOUT: Duration = Duration::from_secs(20);
const COMPOSER_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Run the login flow. Returns whether a logged-in page was reached.
pub async fn login(
    session: &dyn BrowserSession,
    browser: &BrowserConfig,
    credentials: &CredentialsConfig,
    pacing: &PacingConfig,
) -> bool {
    tracing::info!("Starting login process...");
    match try_login(session, browser, credentials, pacing).await {
        Ok(success) => {
            tracing::info!("Login success: {}", success);
            success
        }
        Err(e) => {
            tracing::error!("Login error: {}", e);
            false
        }
    }
}

async fn try_login(
    session: &dyn BrowserSession,
    browser: &BrowserConfig,
    credentials: &CredentialsConfig,
    pacing: &PacingConfig,
) -> Result<bool, DriverError> {
    session
        .navigate(&browser.login_url, WaitPolicy::NetworkIdle)
        .await?;
    pause(pacing.long).await;

    tracing::info!("Waiting for email input...");
    let email_input = session
        .wait_for_element(selectors::USERNAME_INPUT, Visibility::Visible, INPUT_TIMEOUT)
        .await?;
    session
        .type_text(&email_input, &credentials.email, pacing.credential_keystroke)
        .await?;
    tracing::info!("Email entered");
    pause(pacing.short).await;

    session.press_key(Key::Enter).await?;
    pause(pacing.long).await;

    // Optional "confirm your username" step; absence is the common case.
    match session.query(selectors::VERIFICATION_INPUT).await {
        Ok(Some(input)) => {
            tracing::info!("Entering username for verification...");
            session
                .type_text(&input, &credentials.username, pacing.credential_keystroke)
                .await?;
            session.press_key(Key::Enter).await?;
            pause(pacing.long).await;
        }
        Ok(None) => tracing::info!("No username verification needed"),
        Err(e) if e.is_session_fatal() => return Err(e),
        Err(e) => tracing::info!("Skipping username verification: {}", e),
    }

    tracing::info!("Waiting for password input...");
    let password_input = session
        .wait_for_element(selectors::PASSWORD_INPUT, Visibility::Visible, INPUT_TIMEOUT)
        .await?;
    session
        .type_text(
            &password_input,
            credentials.password.expose_secret(),
            pacing.credential_keystroke,
        )
        .await?;
    tracing::info!("Password entered");
    pause(pacing.short).await;

    session.press_key(Key::Enter).await?;
    pause(pacing.settle).await;

    let indicators = selectors::LOGGED_IN_INDICATORS.iter().map(|selector| {
        session.wait_for_element(selector, Visibility::Attached, LOGIN_CONFIRM_TIMEOUT)
    });
    let logged_in = matches!(
        tokio::time::timeout(LOGIN_CONFIRM_TIMEOUT, select_ok(indicators)).await,
        Ok(Ok(_))
    );
    Ok(logged_in)
}

/// Open the composer, type `content` and submit it.
pub async fn post_content(
    session: &dyn BrowserSession,
    content: &str,
    pacing: &PacingConfig,
) -> Result<(), DriverError> {
    tracing::info!("Starting tweet posting process...");

    let compose = session
        .wait_for_element(selectors::COMPOSE_BUTTON, Visibility::Visible, COMPOSER_TIMEOUT)
        .await?;
    session.click(&compose).await?;
    pause(pacing.short).await;

    let textbox = session
        .wait_for_element(selectors::COMPOSER_TEXTAREA, Visibility::Visible, COMPOSER_TIMEOUT)
        .await?;
    session.click(&textbox).await?;
    session
        .type_text(&textbox, content, pacing.content_keystroke)
        .await?;
    tracing::info!("Tweet content entered");
    pause(pacing.short).await;

    let submit = session
        .wait_for_element(selectors::SUBMIT_BUTTON, Visibility::Visible, COMPOSER_TIMEOUT)
        .await?;
    session.click(&submit).await?;
    pause(pacing.long).await;

    tracing::info!("Tweet posted successfully");
    Ok(())
}
