#![forbid(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use services::{AppServices, Clock};
use tokio::net::TcpListener;
use tracing::info;

mod cli;
mod logger;
mod seed;

use cli::{Cli, Command, ServeArgs};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("aet error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let (level, prefer_level) = cli.log_filter();
    logger::init(level, prefer_level)?;

    let services = AppServices::new_sqlite(&cli.db, Clock::default_clock(), cli.services_config())
        .await
        .with_context(|| format!("opening database {}", cli.db))?;

    match cli.command {
        Some(Command::Seed) => seed::run(&services).await,
        Some(Command::Serve) | None => serve(services, cli.serve).await,
    }
}

async fn serve(services: AppServices, args: ServeArgs) -> anyhow::Result<()> {
    let ai_enabled = services.assistant().enabled();
    let router = api::router(api::ApiState::new(services));

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    info!(addr = %args.bind, ai_enabled, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("could not listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
}
