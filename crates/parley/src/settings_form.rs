// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings editor: prompts for each field pre-filled with its current value.

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use parley_core::types::DEFAULT_SCOPE;
use parley_core::{ChatSettings, ParleyError, SettingsPatch};

/// Raw text of the editor fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    pub endpoint: String,
    pub client_id: String,
    pub tenant_id: String,
    /// Comma-separated.
    pub scopes: String,
    pub agent_id: String,
}

impl SettingsForm {
    pub fn from_settings(settings: &ChatSettings) -> Self {
        let scopes = if settings.scopes.is_empty() {
            DEFAULT_SCOPE.to_string()
        } else {
            settings.scopes.join(", ")
        };
        Self {
            endpoint: settings.endpoint.clone(),
            client_id: settings.client_id.clone(),
            tenant_id: settings.tenant_id.clone(),
            scopes,
            agent_id: settings.agent_id.clone().unwrap_or_default(),
        }
    }

    /// Trims every field. An empty agent id clears it.
    pub fn into_patch(self) -> SettingsPatch {
        let scopes = self
            .scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let agent_id = self.agent_id.trim();
        SettingsPatch {
            endpoint: Some(self.endpoint.trim().to_string()),
            client_id: Some(self.client_id.trim().to_string()),
            tenant_id: Some(self.tenant_id.trim().to_string()),
            scopes: Some(scopes),
            agent_id: Some((!agent_id.is_empty()).then(|| agent_id.to_string())),
        }
    }
}

struct Field {
    label: &'static str,
    help: &'static str,
    required: bool,
}

const FIELDS: [Field; 5] = [
    Field {
        label: "Azure AI Foundry Endpoint",
        help: "e.g., https://your-project.services.ai.azure.com/api/projects/<name>",
        required: true,
    },
    Field {
        label: "Entra ID Client ID",
        help: "Your app registration client ID",
        required: true,
    },
    Field {
        label: "Tenant ID",
        help: "Your Azure AD tenant ID",
        required: true,
    },
    Field {
        label: "Scopes",
        help: "Comma-separated list of scopes",
        required: true,
    },
    Field {
        label: "Agent ID (optional)",
        help: "The ID of your Azure AI agent, asst_...",
        required: false,
    },
];

/// True when a field holds nothing but whitespace and commas.
fn is_blank(value: &str) -> bool {
    value.split(',').all(|part| part.trim().is_empty())
}

/// Runs the editor. `Ok(None)` when the user backs out with Ctrl+C or Ctrl+D.
pub fn edit(
    editor: &mut DefaultEditor,
    current: &ChatSettings,
) -> Result<Option<SettingsPatch>, ParleyError> {
    println!("{}", "Azure AI Configuration".bold());
    println!("{}", "Ctrl+C cancels without saving.".dimmed());

    let mut form = SettingsForm::from_settings(current);
    let slots: [&mut String; 5] = [
        &mut form.endpoint,
        &mut form.client_id,
        &mut form.tenant_id,
        &mut form.scopes,
        &mut form.agent_id,
    ];
    for (field, value) in FIELDS.iter().zip(slots) {
        println!("{}", field.help.dimmed());
        loop {
            let prompt = format!("{}: ", field.label);
            match editor.readline_with_initial(&prompt, (value.as_str(), "")) {
                Ok(line) if field.required && is_blank(&line) => {
                    println!("{}", format!("{} is required", field.label).yellow());
                }
                Ok(line) => {
                    *value = line;
                    break;
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(None),
                Err(e) => return Err(ParleyError::Internal(format!("readline failed: {e}"))),
            }
        }
    }
    Ok(Some(form.into_patch()))
}

/// Yes/no question; anything but `y`/`yes` is no.
pub fn confirm(editor: &mut DefaultEditor, question: &str) -> Result<bool, ParleyError> {
    match editor.readline(&format!("{question} [y/N] ")) {
        Ok(answer) => Ok(is_yes(&answer)),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(false),
        Err(e) => Err(ParleyError::Internal(format!("readline failed: {e}"))),
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
