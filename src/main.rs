use std::sync::Arc;

use clap::Parser;
use secrecy::ExposeSecret;

use wraith::agent::{SessionOrchestrator, shutdown};
use wraith::browser::WebDriver;
use wraith::cli::{Cli, Command, make_rng, run_generate, run_status};
use wraith::config::Config;
use wraith::llm::create_text_generator;
use wraith::logging;
use wraith::persona::{Persona, StateStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    cli.apply(&mut config);

    match cli.command() {
        Command::Status { json } => run_status(&config, json),
        Command::Generate { reply_to, author } => {
            logging::init(&config.log_dir, config.mode)?;
            run_generate(&config, reply_to, &author).await
        }
        Command::Run => {
            logging::init(&config.log_dir, config.mode)?;
            run(config).await
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("Unhandled panic: {}", info);
        default_hook(info);
    }));

    if config.credentials.password.expose_secret().is_empty() {
        tracing::warn!("TWITTER_PASSWORD is not set, login will fail");
    }
    tracing::info!(
        mode = ?config.mode,
        state = %config.state_path.display(),
        webdriver = %config.browser.webdriver_url,
        model = %config.llm.model,
        "Starting wraith"
    );

    let llm = create_text_generator(&config.llm);
    let driver = Arc::new(WebDriver::new(&config.browser.webdriver_url));
    let persona = Persona::load(StateStore::new(&config.state_path));

    let (trigger, shutdown) = shutdown::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received interrupt signal, stopping");
                trigger.trigger();
            }
            Err(e) => tracing::error!("Failed to listen for interrupt signal: {}", e),
        }
    });

    let mut orchestrator = SessionOrchestrator::new(
        &config,
        driver,
        llm,
        persona,
        Box::new(make_rng(config.seed)),
        shutdown,
    );
    orchestrator.run().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
