//! Command-line interface.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::agent::ContentGenerator;
use crate::config::Config;
use crate::llm::create_text_generator;
use crate::persona::{Persona, PersonaState, StateStore};

#[derive(Parser, Debug)]
#[command(name = "wraith", version, about = "Autonomous social persona")]
pub struct Cli {
    /// Persona state file (overrides WRAITH_STATE_FILE)
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,

    /// WebDriver endpoint (overrides WRAITH_WEBDRIVER_URL)
    #[arg(long, global = true)]
    pub webdriver_url: Option<String>,

    /// Seed for every random decision (overrides WRAITH_SEED)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the persona until interrupted (default)
    Run,

    /// Print the persisted persona state
    Status {
        /// Print the raw state document as pretty JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate one post, or a reply with --reply-to, and print it
    Generate {
        /// Text to reply to
        #[arg(long)]
        reply_to: Option<String>,

        /// Author of the text being replied to
        #[arg(long, default_value = "@someone")]
        author: String,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    /// Apply flag overrides on top of the environment configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.state_file {
            config.state_path = path.clone();
        }
        if let Some(url) = &self.webdriver_url {
            config.browser.webdriver_url = url.trim_end_matches('/').to_string();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}

/// Seeded RNG if a seed is configured, otherwise one from OS entropy.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Print the persisted persona state.
pub fn run_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let state = StateStore::new(&config.state_path).load();
    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }
    println!("State file: {}", config.state_path.display());
    println!();
    print!("{}", format_status(&state));
    Ok(())
}

fn format_status(state: &PersonaState) -> String {
    let mood = &state.mood;
    let memory = &state.memory;
    let counters = &memory.interaction_counters;

    let mut out = String::new();
    out.push_str(&format!(
        "Mood:        {} (intensity {:.2}){}\n",
        mood.current,
        mood.intensity,
        if mood.delusions { ", delusional" } else { "" }
    ));
    out.push_str(&format!(
        "Changed:     {}\n",
        mood.last_change_time.to_rfc3339()
    ));
    out.push_str(&format!(
        "Last post:   {}\n",
        memory.last_post_time.to_rfc3339()
    ));
    out.push_str(&format!(
        "Engagement:  {} likes, {} replies, {} retweets\n",
        counters.likes, counters.replies, counters.retweets
    ));
    out.push_str(&format!(
        "Seen items:  {}\n",
        memory.processed_items.len()
    ));
    out.push_str(&format!("Recent posts ({}):\n", memory.recent_posts.len()));
    for post in memory.recent_posts.iter().rev().take(5) {
        out.push_str(&format!("  - {}\n", post));
    }
    out
}

/// Generate one piece of text and print it.
///
/// Runs the same mood update and memory bookkeeping as the live loop, so a
/// generated post counts towards duplicate detection.
pub async fn run_generate(
    config: &Config,
    reply_to: Option<String>,
    author: &str,
) -> anyhow::Result<()> {
    let llm = create_text_generator(&config.llm);
    let generator = ContentGenerator::new(Arc::clone(&llm), &config.llm);
    let mut persona = Persona::load(StateStore::new(&config.state_path));
    let mut rng = make_rng(config.seed);

    let text = match reply_to {
        Some(text) => {
            generator
                .generate_reply(&mut persona, &text, author, &mut rng)
                .await
        }
        None => generator.generate_post(&mut persona, &mut rng).await,
    };

    match text {
        Some(text) => {
            println!("[{} @ {:.2}] {}", persona.mood().current, persona.mood().intensity, text);
            Ok(())
        }
        None => anyhow::bail!("no text generated via {}", llm.model_name()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::persona::Mood;

    #[test]
    fn test_defaults_to_run() {
        let cli = Cli::parse_from(["wraith"]);
        assert_eq!(cli.command(), Command::Run);
    }

    #[test]
    fn test_generate_flags() {
        let cli = Cli::parse_from(["wraith", "generate", "--reply-to", "hello", "--author", "@a"]);
        assert_eq!(
            cli.command(),
            Command::Generate {
                reply_to: Some("hello".to_string()),
                author: "@a".to_string(),
            }
        );
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::parse_from([
            "wraith",
            "--state-file",
            "/tmp/other.json",
            "--webdriver-url",
            "http://remote:4444/",
            "--seed",
            "9",
            "status",
            "--json",
        ]);
        let mut config = Config::from_lookup(|_| None).unwrap();
        cli.apply(&mut config);

        assert_eq!(config.state_path, PathBuf::from("/tmp/other.json"));
        assert_eq!(config.browser.webdriver_url, "http://remote:4444");
        assert_eq!(config.seed, Some(9));
        assert_eq!(cli.command(), Command::Status { json: true });
    }

    #[test]
    fn test_flags_absent_keep_environment() {
        let cli = Cli::parse_from(["wraith"]);
        let mut config =
            Config::from_lookup(|key| (key == "WRAITH_SEED").then(|| "4".to_string())).unwrap();
        cli.apply(&mut config);
        assert_eq!(config.seed, Some(4));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        use rand::Rng;
        let a: u64 = make_rng(Some(5)).r#gen();
        let b: u64 = make_rng(Some(5)).r#gen();
        assert_eq!(a, b);
    }

    #[test]
    fn test_format_status() {
        let mut state = PersonaState::default();
        state.mood.current = Mood::Depressive;
        state.mood.intensity = 0.75;
        state.mood.delusions = true;
        state.memory.remember_post("first");
        state.memory.remember_post("second");
        state.memory.interaction_counters.likes = 3;

        let out = format_status(&state);
        assert!(out.contains("Mood:        depressive (intensity 0.75), delusional"));
        assert!(out.contains("3 likes, 0 replies, 0 retweets"));
        assert!(out.contains("Recent posts (2):\n  - second\n  - first\n"));
    }
}
