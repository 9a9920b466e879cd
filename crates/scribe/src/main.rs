//! # scribe
//!
//! Server binary: loads settings, sets up logging, and starts the upload
//! server.

#![deny(unsafe_code)]

mod app;
mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::Cli;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let mut settings = logging::bootstrap(|| match &args.config {
        Some(path) => scribe_settings::load_settings_from_path(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => scribe_settings::load_settings().context("failed to load settings"),
    })?;
    args.apply(&mut settings);

    logging::init(&settings.logging)?;
    tracing::info!(config = ?args.config, "starting scribe");

    app::run(settings).await
}
