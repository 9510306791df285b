//! Configuration for the persona runtime.
//!
//! Everything is read from the process environment (after `.env` is loaded by
//! the binary). Every knob has a default matching the reference behavior, so an
//! empty environment yields a runnable configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Full runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: CredentialsConfig,
    pub llm: LlmConfig,
    pub behavior: BehaviorConfig,
    pub session: SessionConfig,
    pub pacing: PacingConfig,
    pub browser: BrowserConfig,
    /// Path of the durable persona state document.
    pub state_path: PathBuf,
    /// Directory receiving `combined.log` and `error.log`.
    pub log_dir: PathBuf,
    pub mode: RuntimeMode,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

/// Account identity used by the login script.
#[derive(Debug, Clone)]
pub struct CredentialsConfig {
    pub email: String,
    pub username: String,
    pub password: SecretString,
}

/// Text-generation service settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "tinyllama".to_string(),
            temperature: 0.8,
            top_p: 0.9,
            max_tokens: 150,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Probability weights and intervals that shape the persona's behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorConfig {
    /// Chance that a tick posts instead of interacting.
    pub post_probability: f64,
    /// Chance that a sampled feed item is engaged at all.
    pub engagement_probability: f64,
    pub like_probability: f64,
    pub reply_probability: f64,
    pub retweet_probability: f64,
    /// Lower bound of the delay between ticks.
    pub min_delay: Duration,
    /// Upper bound of the delay between ticks.
    pub max_delay: Duration,
    /// Minimum spacing between two posts (zero disables the check).
    pub post_interval: Duration,
    /// How many feed items are considered per interaction cycle.
    pub feed_sample_size: usize,
    /// Chance of reloading the feed after a tick.
    pub refresh_probability: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            post_probability: 0.3,
            engagement_probability: 0.6,
            like_probability: 0.7,
            reply_probability: 0.5,
            retweet_probability: 0.3,
            min_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(180),
            post_interval: Duration::ZERO,
            feed_sample_size: 8,
            refresh_probability: 0.2,
        }
    }
}

impl BehaviorConfig {
    /// Check probabilities and the delay window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let probabilities = [
            ("WRAITH_POST_PROBABILITY", self.post_probability),
            ("WRAITH_ENGAGEMENT_PROBABILITY", self.engagement_probability),
            ("WRAITH_LIKE_PROBABILITY", self.like_probability),
            ("WRAITH_REPLY_PROBABILITY", self.reply_probability),
            ("WRAITH_RETWEET_PROBABILITY", self.retweet_probability),
            ("WRAITH_REFRESH_PROBABILITY", self.refresh_probability),
        ];
        for (key, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{} is outside [0, 1]", p),
                });
            }
        }
        if self.min_delay > self.max_delay {
            return Err(ConfigError::InvalidValue {
                key: "WRAITH_MIN_DELAY_SECS".to_string(),
                message: format!(
                    "min delay {:?} exceeds max delay {:?}",
                    self.min_delay, self.max_delay
                ),
            });
        }
        Ok(())
    }
}

/// Timings of the session state machine.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Wait after a failed browser launch.
    pub launch_backoff: Duration,
    /// Wait after a failed login.
    pub auth_backoff: Duration,
    /// Wait after a failed tick before the next one.
    pub tick_error_pause: Duration,
    /// Wait before recreating a session that broke while running.
    pub restart_delay: Duration,
    /// Consecutive failed ticks tolerated before the session is recycled.
    pub max_consecutive_failures: u32,
    /// Where failure screenshots are written.
    pub diagnostics_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            launch_backoff: Duration::from_secs(60),
            auth_backoff: Duration::from_secs(60),
            tick_error_pause: Duration::from_secs(30),
            restart_delay: Duration::from_secs(5),
            max_consecutive_failures: 10,
            diagnostics_dir: PathBuf::from("."),
        }
    }
}

/// Human-pacing pauses between sub-actions.
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// Per-character delay when typing credentials.
    pub credential_keystroke: Duration,
    /// Per-character delay when typing post and reply text.
    pub content_keystroke: Duration,
    /// Pause after a click or a key press.
    pub short: Duration,
    /// Pause after a navigation or a submitted step.
    pub long: Duration,
    /// Pause between two feed items.
    pub between_items: Duration,
    /// Pause after submitting the login form.
    pub settle: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            credential_keystroke: Duration::from_millis(150),
            content_keystroke: Duration::from_millis(100),
            short: Duration::from_millis(1000),
            long: Duration::from_millis(2000),
            between_items: Duration::from_millis(1500),
            settle: Duration::from_millis(5000),
        }
    }
}

impl PacingConfig {
    /// No pauses at all.
    pub fn none() -> Self {
        Self {
            credential_keystroke: Duration::ZERO,
            content_keystroke: Duration::ZERO,
            short: Duration::ZERO,
            long: Duration::ZERO,
            between_items: Duration::ZERO,
            settle: Duration::ZERO,
        }
    }
}

/// Browser session settings.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// W3C WebDriver endpoint (chromedriver, geckodriver, selenium).
    pub webdriver_url: String,
    pub headless: bool,
    pub viewport: (u32, u32),
    pub user_agent: String,
    pub args: Vec<String>,
    pub login_url: String,
    pub home_url: String,
    /// Upper bound for a single navigation.
    pub navigation_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            viewport: (1920, 1080),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            args: vec![
                "--no-sandbox".to_string(),
                "--disable-setuid-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--disable-gpu".to_string(),
            ],
            login_url: "https://twitter.com/i/flow/login".to_string(),
            home_url: "https://twitter.com/home".to_string(),
            navigation_timeout: Duration::from_secs(60),
        }
    }
}

/// Deployment mode. Production drops the console log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

impl FromStr for RuntimeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(RuntimeMode::Production),
            "development" | "dev" | "" => Ok(RuntimeMode::Development),
            _ => Err(format!(
                "invalid runtime mode '{}', expected 'production' or 'development'",
                s
            )),
        }
    }
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let username = env
            .string("TWITTER_USERNAME")
            .unwrap_or_else(|| "cyruswraith".to_string());
        let credentials = CredentialsConfig {
            email: env.string("TWITTER_EMAIL").unwrap_or_else(|| username.clone()),
            password: SecretString::from(env.string("TWITTER_PASSWORD").unwrap_or_default()),
            username,
        };

        let llm_defaults = LlmConfig::default();
        let llm = LlmConfig {
            base_url: env
                .string("WRAITH_LLM_URL")
                .unwrap_or(llm_defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            model: env.non_blank("WRAITH_MODEL")?.unwrap_or(llm_defaults.model),
            temperature: env.parse("WRAITH_TEMPERATURE")?.unwrap_or(llm_defaults.temperature),
            top_p: env.parse("WRAITH_TOP_P")?.unwrap_or(llm_defaults.top_p),
            max_tokens: env.parse("WRAITH_MAX_TOKENS")?.unwrap_or(llm_defaults.max_tokens),
            timeout: env
                .secs("WRAITH_LLM_TIMEOUT_SECS")?
                .unwrap_or(llm_defaults.timeout),
        };

        let b = BehaviorConfig::default();
        let behavior = BehaviorConfig {
            post_probability: env.parse("WRAITH_POST_PROBABILITY")?.unwrap_or(b.post_probability),
            engagement_probability: env
                .parse("WRAITH_ENGAGEMENT_PROBABILITY")?
                .unwrap_or(b.engagement_probability),
            like_probability: env.parse("WRAITH_LIKE_PROBABILITY")?.unwrap_or(b.like_probability),
            reply_probability: env
                .parse("WRAITH_REPLY_PROBABILITY")?
                .unwrap_or(b.reply_probability),
            retweet_probability: env
                .parse("WRAITH_RETWEET_PROBABILITY")?
                .unwrap_or(b.retweet_probability),
            min_delay: env.secs("WRAITH_MIN_DELAY_SECS")?.unwrap_or(b.min_delay),
            max_delay: env.secs("WRAITH_MAX_DELAY_SECS")?.unwrap_or(b.max_delay),
            post_interval: env.secs("WRAITH_POST_INTERVAL_SECS")?.unwrap_or(b.post_interval),
            feed_sample_size: env.parse("WRAITH_FEED_SAMPLE_SIZE")?.unwrap_or(b.feed_sample_size),
            refresh_probability: env
                .parse("WRAITH_REFRESH_PROBABILITY")?
                .unwrap_or(b.refresh_probability),
        };
        behavior.validate()?;

        let s = SessionConfig::default();
        let session = SessionConfig {
            launch_backoff: env.secs("WRAITH_LAUNCH_BACKOFF_SECS")?.unwrap_or(s.launch_backoff),
            auth_backoff: env.secs("WRAITH_AUTH_BACKOFF_SECS")?.unwrap_or(s.auth_backoff),
            tick_error_pause: env
                .secs("WRAITH_TICK_ERROR_PAUSE_SECS")?
                .unwrap_or(s.tick_error_pause),
            restart_delay: env.secs("WRAITH_RESTART_DELAY_SECS")?.unwrap_or(s.restart_delay),
            max_consecutive_failures: env
                .parse("WRAITH_MAX_CONSECUTIVE_FAILURES")?
                .unwrap_or(s.max_consecutive_failures),
            diagnostics_dir: env
                .string("WRAITH_DIAGNOSTICS_DIR")
                .map(PathBuf::from)
                .unwrap_or(s.diagnostics_dir),
        };

        let br = BrowserConfig::default();
        let browser = BrowserConfig {
            webdriver_url: env
                .string("WRAITH_WEBDRIVER_URL")
                .unwrap_or(br.webdriver_url)
                .trim_end_matches('/')
                .to_string(),
            headless: env.parse("WRAITH_HEADLESS")?.unwrap_or(br.headless),
            ..br
        };

        let mode = match env.string("WRAITH_ENV") {
            Some(raw) => raw.parse::<RuntimeMode>().map_err(|message| ConfigError::InvalidValue {
                key: "WRAITH_ENV".to_string(),
                message,
            })?,
            None => RuntimeMode::default(),
        };

        Ok(Self {
            credentials,
            llm,
            behavior,
            session,
            pacing: PacingConfig::default(),
            browser,
            state_path: env
                .string("WRAITH_STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("state.json")),
            log_dir: env
                .string("WRAITH_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            mode,
            seed: env.parse("WRAITH_SEED")?,
        })
    }
}

/// Typed accessors over a key lookup.
struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Like `string`, but a variable that is set and blank is an error.
    fn non_blank(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match (self.0)(key) {
            Some(raw) if raw.trim().is_empty() => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: "must not be empty".to_string(),
            }),
            _ => Ok(self.string(key)),
        }
    }

    fn parse<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.string(key) {
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("'{}': {}", raw, e),
                }),
            None => Ok(None),
        }
    }

    fn secs(&self, key: &str) -> Result<Option<Duration>, ConfigError> {
        Ok(self.parse::<u64>(key)?.map(Duration::from_secs))
    }
}
