mod config;
mod input;
mod logging;
mod repl;
mod run;

use anyhow::{Context, Result};
use clap::Parser;
use extract::{ExtractionClient, ParameterScheduler};
use graph::{DotSink, NullSink, RenderSink};
use session::Session;
use std::sync::Arc;

use config::{AppConfig, Cli, Command, OutputArgs};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.log_json);

    let config = AppConfig::load(&cli)?;
    tracing::info!(endpoint = %config.extract.endpoint, "Using extraction service");

    match cli.command {
        Command::Run(args) => run::run(&config, args).await,
        Command::Repl(args) => repl::repl(&config, args).await,
    }
}

/// Build the client and sink, then start the session (warm-up included).
fn start_session(config: &AppConfig, output: &OutputArgs) -> Result<Session> {
    let client = ExtractionClient::from_config(&config.extract)
        .context("Failed to create extraction client")?;
    let scheduler = ParameterScheduler::new(config.scheduler.clone())
        .context("Invalid scheduler configuration")?;

    let sink: Box<dyn RenderSink> = match &output.dot {
        Some(path) => Box::new(DotSink::new(path)),
        None => Box::new(NullSink),
    };

    Ok(Session::start(
        Arc::new(client),
        sink,
        scheduler,
        &config.session,
    ))
}
