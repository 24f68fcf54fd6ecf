// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - a terminal chat client for Azure AI Foundry agents.
//!
//! This is the binary entry point.

mod app;
mod command;
mod prompt;
mod settings_form;
mod shell;
mod view;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;

use parley_core::ParleyError;

use crate::app::App;
use crate::prompt::TerminalPromptSink;

/// Parley - chat with an Azure AI Foundry agent from the terminal.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    /// Read runtime configuration from this file instead of the usual locations.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Launch the interactive chat shell (default).
    Shell,
    /// Print the stored chat settings.
    Settings,
    /// Sign in with Entra ID using a device code.
    Login,
    /// Sign out and clear cached tokens.
    Logout,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => parley_config::load_and_validate_path(path),
        None => parley_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.log.level);

    let app = App::new(config, Arc::new(TerminalPromptSink));
    let result = run(&app, cli.command.unwrap_or(Commands::Shell)).await;
    app.shutdown().await;

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

async fn run(app: &App, command: Commands) -> Result<(), ParleyError> {
    match command {
        Commands::Shell => shell::run_shell(app).await,
        Commands::Settings => print_settings(app),
        Commands::Login => login(app).await,
        Commands::Logout => {
            app.session().await?.logout().await;
            Ok(())
        }
    }
}

fn print_settings(app: &App) -> Result<(), ParleyError> {
    let settings = app.settings.current();
    let json = serde_json::to_string_pretty(&settings)
        .map_err(|e| ParleyError::Internal(format!("failed to serialize settings: {e}")))?;
    println!("{json}");
    let state = if settings.is_configured() {
        "configured".green()
    } else {
        "not configured".yellow()
    };
    eprintln!("{} ({state})", app.data_dir().display().to_string().dimmed());
    Ok(())
}

async fn login(app: &App) -> Result<(), ParleyError> {
    let session = app.session().await?;
    if !session.interaction_in_progress() {
        session.login().await?;
    }
    match session.wait_for_interaction().await? {
        Some(account) => {
            println!("{}", view::signed_in_as(&account.username));
            Ok(())
        }
        None => Err(ParleyError::auth("sign-in did not complete")),
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
