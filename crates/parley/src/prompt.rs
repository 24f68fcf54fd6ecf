// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prints identity prompts (device codes, sign-out links) to the terminal.

use colored::Colorize;

use parley_core::PromptSink;
use parley_core::types::IdentityPrompt;

pub struct TerminalPromptSink;

impl PromptSink for TerminalPromptSink {
    fn show(&self, prompt: &IdentityPrompt) {
        println!("{}", render(prompt));
    }
}

pub fn render(prompt: &IdentityPrompt) -> String {
    match prompt {
        IdentityPrompt::DeviceCode {
            verification_uri,
            user_code,
            message,
            expires_in,
        } => {
            let summary = format!(
                "To sign in, open {} and enter the code {} (expires in {} min).",
                verification_uri.underline(),
                user_code.bold().yellow(),
                expires_in.as_secs().div_ceil(60),
            );
            // The authority's own instructions, localized for the user.
            match message.trim() {
                "" => summary,
                text => format!("{summary}\n{}", text.dimmed()),
            }
        }
        IdentityPrompt::SignedOut { end_session_url } => format!(
            "Signed out. To also end the browser session, visit {}",
            end_session_url.underline()
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn device_code_prompt_shows_uri_and_code() {
        colored::control::set_override(false);
        let text = render(&IdentityPrompt::DeviceCode {
            verification_uri: "https://microsoft.com/devicelogin".into(),
            user_code: "ABCD-1234".into(),
            message: "server text".into(),
            expires_in: Duration::from_secs(900),
        });
        assert!(text.contains("https://microsoft.com/devicelogin"));
        assert!(text.contains("ABCD-1234"));
        assert!(text.contains("15 min"));
        assert!(text.ends_with("\nserver text"));
    }

    #[test]
    fn blank_server_message_adds_no_line() {
        colored::control::set_override(false);
        let text = render(&IdentityPrompt::DeviceCode {
            verification_uri: "https://microsoft.com/devicelogin".into(),
            user_code: "ABCD-1234".into(),
            message: "  ".into(),
            expires_in: Duration::from_secs(60),
        });
        assert!(!text.contains('\n'));
    }

    #[test]
    fn sign_out_prompt_shows_url() {
        colored::control::set_override(false);
        let text = render(&IdentityPrompt::SignedOut {
            end_session_url: "https://login.microsoftonline.com/t/oauth2/v2.0/logout".into(),
        });
        assert!(text.contains("oauth2/v2.0/logout"));
    }
}
