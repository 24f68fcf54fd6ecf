// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley shell` command implementation.
//!
//! Launches an interactive REPL with a colored prompt and readline history.
//! Each pass of the loop works out which screen applies, prints it when it
//! changes, then reads one line: a slash command or a chat turn.

use std::future::Future;
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use parley_chat::TurnOutcome;
use parley_core::ParleyError;

use crate::app::App;
use crate::command::{Command, Input, help_text, parse_input};
use crate::settings_form;
use crate::view::{self, View, select_view};

/// Runs the `parley shell` interactive REPL.
pub async fn run_shell(app: &App) -> Result<(), ParleyError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| ParleyError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "Azure AI Foundry Agent Chat".bold().green());
    println!("Type {} for commands, {} to exit.\n", "/help".yellow(), "/quit".yellow());

    if !app.settings.is_configured() {
        open_settings(app, &mut rl)?;
    }

    let prompt = format!("{}> ", "parley".green());
    let mut shown: Option<View> = None;
    loop {
        let view = settle_view(app).await;
        if shown != Some(view) {
            render_view(app, view).await;
            shown = Some(view);
        }

        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };
        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(&line);
        }

        match parse_input(&line) {
            Input::Command(Command::Quit) => break,
            Input::Command(command) => {
                if let Err(e) = run_command(app, &mut rl, command).await {
                    eprintln!("{}", view::format_error(&e.to_string()));
                }
                // Re-render whatever screen applies after the command.
                shown = None;
            }
            Input::Unknown(word) => {
                println!("unknown command {}; type {}", word.red(), "/help".yellow());
            }
            Input::Text(text) if view == View::Chat => chat_turn(app, &text).await,
            Input::Text(text) if text.trim().is_empty() => {}
            Input::Text(_) => {
                if let Some(gate) = view.render_gate() {
                    println!("{gate}");
                }
            }
        }
    }

    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Builds the session once settings allow it and waits out any interactive
/// sign-in, so the returned screen is one the user can act on.
async fn settle_view(app: &App) -> View {
    let settings = app.settings.current();
    if settings.is_configured() {
        match app.session().await {
            Ok(session) => {
                if session.interaction_in_progress() {
                    println!("{}", "Waiting for sign-in to finish... (Ctrl+C to stop waiting)".dimmed());
                    match interruptible(session.wait_for_interaction()).await {
                        Some(Ok(Some(account))) => {
                            println!("{}", view::signed_in_as(&account.username));
                        }
                        Some(Ok(None)) => {}
                        Some(Err(e)) => eprintln!("{}", view::format_error(&e.to_string())),
                        None => println!("{}", "stopped waiting; sign-in continues in the background".dimmed()),
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "identity session unavailable");
                eprintln!("{}", view::format_error(&e.to_string()));
            }
        }
    }
    let auth = app.auth_status().await;
    select_view(settings.is_configured(), auth.as_ref(), settings.agent_id().is_some())
}

async fn render_view(app: &App, view: View) {
    debug!(?view, "rendering view");
    if let Some(gate) = view.render_gate() {
        println!("{gate}");
        return;
    }
    if let Some(account) = app.auth_status().await.and_then(|s| s.account) {
        println!("{}", view::signed_in_as(&account.username));
    }
    let state = app.engine.snapshot();
    if let Some(error) = &state.error {
        println!("{}", view::format_error(error));
    }
    if state.is_empty() {
        println!("{}", view::welcome());
    }
    for message in &state.messages {
        println!("{}", view::format_message(message));
    }
}

async fn run_command(app: &App, rl: &mut DefaultEditor, command: Command) -> Result<(), ParleyError> {
    match command {
        Command::Settings => open_settings(app, rl),
        Command::Reset => {
            if settings_form::confirm(rl, "Are you sure you want to reset all settings?")? {
                app.settings.reset();
                println!("settings reset");
            }
            Ok(())
        }
        Command::Login => {
            let session = app.session().await?;
            session.login().await
        }
        Command::Logout => {
            if let Some(session) = app.built_session() {
                session.logout().await;
            }
            Ok(())
        }
        Command::Clear => {
            app.engine.clear_messages();
            Ok(())
        }
        Command::Help => {
            println!("{}", help_text());
            Ok(())
        }
        Command::Quit => Ok(()),
    }
}

fn open_settings(app: &App, rl: &mut DefaultEditor) -> Result<(), ParleyError> {
    let current = app.settings.current();
    match settings_form::edit(rl, &current)? {
        Some(patch) => {
            let saved = app.save_settings(patch);
            if saved.has_identity() {
                println!("{}", "settings saved".green());
            } else {
                println!(
                    "{}",
                    "endpoint, client ID and tenant ID are required; settings not saved to disk".yellow()
                );
            }
        }
        None => println!("{}", "settings unchanged".dimmed()),
    }
    Ok(())
}

async fn chat_turn(app: &App, text: &str) {
    let spinner = spinner("Thinking...");
    let outcome = interruptible_turn(app, text).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(TurnOutcome::Replied(reply)) => println!("{}", view::format_message(&reply)),
        Ok(TurnOutcome::NoReply) => println!("{}", "(the agent finished without a text reply)".dimmed()),
        Ok(TurnOutcome::Busy) => println!("{}", "still waiting on the previous message".yellow()),
        Ok(TurnOutcome::Skipped) => {}
        Ok(TurnOutcome::Failed(e)) => eprintln!("{}", view::format_error(&e.to_string())),
        Err(e) => eprintln!("{}", view::format_error(&e.to_string())),
    }
}

/// Runs a turn; Ctrl+C cancels it instead of killing the process.
async fn interruptible_turn(app: &App, text: &str) -> Result<TurnOutcome, ParleyError> {
    let turn = app.send(text);
    tokio::pin!(turn);
    loop {
        tokio::select! {
            outcome = &mut turn => return outcome,
            _ = tokio::signal::ctrl_c() => {
                app.engine.cancel_turn();
            }
        }
    }
}

/// Awaits `fut`, or gives up with `None` on Ctrl+C.
async fn interruptible<T>(fut: impl Future<Output = T>) -> Option<T> {
    let spinner = spinner("Signing in...");
    let result = tokio::select! {
        value = fut => Some(value),
        _ = tokio::signal::ctrl_c() => None,
    };
    spinner.finish_and_clear();
    result
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
