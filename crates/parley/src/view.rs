// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Which screen the shell shows, and how chat turns are printed.

use chrono::Local;
use colored::Colorize;

use parley_auth::AuthStatus;
use parley_core::{Message, Role};

/// The five screens of the shell, in gate order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    ConfigurationRequired,
    LoadingAuth,
    AgentRequired,
    SignInRequired,
    Chat,
}

/// Picks the screen for the current settings and session.
///
/// `auth` is `None` while no session has been built.
pub fn select_view(is_configured: bool, auth: Option<&AuthStatus>, has_agent: bool) -> View {
    if !is_configured {
        return View::ConfigurationRequired;
    }
    let Some(auth) = auth else {
        return View::LoadingAuth;
    };
    if !auth.ready || auth.interaction_in_progress {
        View::LoadingAuth
    } else if !has_agent {
        View::AgentRequired
    } else if !auth.is_authenticated() {
        View::SignInRequired
    } else {
        View::Chat
    }
}

impl View {
    /// Heading and hint for the gate screens. `None` for the chat itself.
    pub fn gate_text(self) -> Option<(&'static str, &'static str)> {
        match self {
            View::ConfigurationRequired => Some((
                "Configuration Required",
                "Please configure your Azure AI settings to get started. Type /settings.",
            )),
            View::LoadingAuth => Some(("Loading...", "Processing authentication...")),
            View::AgentRequired => Some((
                "Agent ID Required",
                "Please configure your Agent ID in settings to start chatting. Type /settings.",
            )),
            View::SignInRequired => Some((
                "Authentication Required",
                "Please sign in with your Entra ID account to start chatting. Type /login.",
            )),
            View::Chat => None,
        }
    }

    pub fn render_gate(self) -> Option<String> {
        self.gate_text()
            .map(|(title, hint)| format!("{}\n{}", title.bold().yellow(), hint))
    }
}

/// One chat turn with its local time of day.
pub fn format_message(message: &Message) -> String {
    let time = message
        .timestamp
        .with_timezone(&Local)
        .format("%H:%M:%S")
        .to_string();
    let label = match message.role {
        Role::User => "you".cyan().bold(),
        Role::Assistant => "agent".green().bold(),
    };
    format!("{} {} {}", time.dimmed(), label, message.content)
}

pub fn format_error(error: &str) -> String {
    format!("{} {error}", "Error:".red().bold())
}

pub fn welcome() -> String {
    format!(
        "{}\nStart a conversation with your Azure AI Agent.",
        "Welcome".bold()
    )
}

pub fn signed_in_as(username: &str) -> String {
    format!("Signed in as: {}", username.bold())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::Account;

    fn status(ready: bool, in_progress: bool, signed_in: bool) -> AuthStatus {
        AuthStatus {
            ready,
            interaction_in_progress: in_progress,
            account: signed_in.then(|| Account {
                home_account_id: "oid.tid".into(),
                username: "ada@contoso.com".into(),
                tenant_id: "tid".into(),
            }),
        }
    }

    #[test]
    fn unconfigured_wins_over_everything() {
        let auth = status(true, false, true);
        assert_eq!(select_view(false, Some(&auth), true), View::ConfigurationRequired);
        assert_eq!(select_view(false, None, false), View::ConfigurationRequired);
    }

    #[test]
    fn no_session_or_not_ready_is_loading() {
        assert_eq!(select_view(true, None, true), View::LoadingAuth);
        assert_eq!(select_view(true, Some(&status(false, false, false)), true), View::LoadingAuth);
    }

    #[test]
    fn interaction_in_progress_is_loading_even_when_signed_in() {
        let auth = status(true, true, true);
        assert_eq!(select_view(true, Some(&auth), true), View::LoadingAuth);
    }

    #[test]
    fn missing_agent_is_checked_before_sign_in() {
        let auth = status(true, false, false);
        assert_eq!(select_view(true, Some(&auth), false), View::AgentRequired);
    }

    #[test]
    fn signed_out_with_agent_needs_sign_in() {
        let auth = status(true, false, false);
        assert_eq!(select_view(true, Some(&auth), true), View::SignInRequired);
    }

    #[test]
    fn signed_in_with_agent_is_chat() {
        let auth = status(true, false, true);
        assert_eq!(select_view(true, Some(&auth), true), View::Chat);
        assert!(View::Chat.render_gate().is_none());
    }

    #[test]
    fn every_gate_has_text() {
        for view in [
            View::ConfigurationRequired,
            View::LoadingAuth,
            View::AgentRequired,
            View::SignInRequired,
        ] {
            let (title, hint) = view.gate_text().unwrap();
            assert!(!title.is_empty() && !hint.is_empty());
        }
    }

    #[test]
    fn message_line_contains_content() {
        colored::control::set_override(false);
        let line = format_message(&Message::user("Hello"));
        assert!(line.contains("you Hello"), "{line}");
    }
}
