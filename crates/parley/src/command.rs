// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash commands understood by the shell.

use std::str::FromStr;

use colored::Colorize;
use strum::{EnumIter, IntoEnumIterator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Command {
    Settings,
    Reset,
    Login,
    Logout,
    Clear,
    Help,
    Quit,
}

impl Command {
    fn name(self) -> &'static str {
        match self {
            Command::Settings => "/settings",
            Command::Reset => "/reset",
            Command::Login => "/login",
            Command::Logout => "/logout",
            Command::Clear => "/clear",
            Command::Help => "/help",
            Command::Quit => "/quit",
        }
    }

    fn about(self) -> &'static str {
        match self {
            Command::Settings => "edit the Azure AI configuration",
            Command::Reset => "reset all settings to defaults",
            Command::Login => "sign in with Entra ID",
            Command::Logout => "sign out",
            Command::Clear => "clear the conversation and start a new thread",
            Command::Help => "show this help",
            Command::Quit => "leave the shell (also /exit)",
        }
    }
}

/// What a line of input turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Unknown(String),
    Text(String),
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "/exit" {
            return Ok(Command::Quit);
        }
        Command::iter().find(|c| c.name() == s).ok_or(())
    }
}

/// Classifies one line. Text keeps its original spacing.
pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.starts_with('/') {
        let word = trimmed.split_whitespace().next().unwrap_or(trimmed);
        return match word.parse::<Command>() {
            Ok(command) => Input::Command(command),
            Err(()) => Input::Unknown(word.to_string()),
        };
    }
    Input::Text(line.to_string())
}

pub fn help_text() -> String {
    Command::iter()
        .map(|c| format!("  {:<10} {}", c.name().yellow(), c.about()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_commands_parse() {
        assert_eq!(parse_input("/settings"), Input::Command(Command::Settings));
        assert_eq!(parse_input("  /clear  "), Input::Command(Command::Clear));
        assert_eq!(parse_input("/exit"), Input::Command(Command::Quit));
        assert_eq!(parse_input("/quit now"), Input::Command(Command::Quit));
    }

    #[test]
    fn unknown_command_is_reported() {
        assert_eq!(parse_input("/frobnicate"), Input::Unknown("/frobnicate".into()));
    }

    #[test]
    fn plain_text_is_kept_verbatim() {
        assert_eq!(parse_input(" hi there "), Input::Text(" hi there ".into()));
        assert_eq!(parse_input(""), Input::Text(String::new()));
    }

    #[test]
    fn help_lists_every_command() {
        colored::control::set_override(false);
        let help = help_text();
        for command in Command::iter() {
            assert!(help.contains(command.name()));
        }
    }
}
