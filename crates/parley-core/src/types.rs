// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Parley client.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Scope requested when the user has not configured any.
pub const DEFAULT_SCOPE: &str = "https://ai.azure.com/.default";

/// Identifies the type of adapter behind a trait object, for logging.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Identity,
    AgentService,
    KeyValueStore,
}

// --- Chat settings ---

/// The user-editable chat configuration record.
///
/// Field names on the wire match the settings blob written by the browser
/// build of this client, so an exported record loads unchanged. Missing
/// fields deserialize to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatSettings {
    /// Base URL of the agent service project.
    #[serde(rename = "azureEndpoint")]
    pub endpoint: String,
    /// Entra ID application (client) identifier.
    pub client_id: String,
    /// Entra ID tenant identifier.
    pub tenant_id: String,
    /// Scopes requested for the agent service token.
    pub scopes: Vec<String>,
    /// Identifier of the agent that runs on each thread.
    #[serde(rename = "assistantId", skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            client_id: String::new(),
            tenant_id: String::new(),
            scopes: vec![DEFAULT_SCOPE.to_string()],
            agent_id: None,
        }
    }
}

impl ChatSettings {
    /// True when the three identity fields needed to sign in are present.
    ///
    /// Settings are only written to disk once this holds.
    pub fn has_identity(&self) -> bool {
        !self.endpoint.is_empty() && !self.client_id.is_empty() && !self.tenant_id.is_empty()
    }

    /// True when the client can reach the sign-in gate: identity fields set
    /// and at least one scope.
    pub fn is_configured(&self) -> bool {
        self.has_identity() && !self.scopes.is_empty()
    }

    /// The agent identifier, treating an empty string as unset.
    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Shallow-merges `patch` into these settings.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(endpoint) = patch.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(client_id) = patch.client_id {
            self.client_id = client_id;
        }
        if let Some(tenant_id) = patch.tenant_id {
            self.tenant_id = tenant_id;
        }
        if let Some(scopes) = patch.scopes {
            self.scopes = scopes;
        }
        if let Some(agent_id) = patch.agent_id {
            self.agent_id = agent_id;
        }
    }
}

/// A partial update to [`ChatSettings`]. `None` leaves a field untouched.
///
/// `agent_id: Some(None)` clears the agent identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub endpoint: Option<String>,
    pub client_id: Option<String>,
    pub tenant_id: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub agent_id: Option<Option<String>>,
}

// --- Conversation ---

/// Author of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single rendered chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Builds a user turn with a client-generated identifier and the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

// --- Identity ---

/// A signed-in account known to the identity client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier of the account within the token cache.
    pub home_account_id: String,
    /// Login name shown to the user (`preferred_username` claim).
    pub username: String,
    /// Tenant that issued the account's tokens.
    pub tenant_id: String,
}

/// The interactive flow an identity client is currently running, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Default)]
#[strum(serialize_all = "snake_case")]
pub enum InteractionStatus {
    #[default]
    None,
    Startup,
    Login,
    AcquireToken,
    Logout,
}

/// Something the identity client needs the user to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityPrompt {
    /// A device-code sign-in is waiting for the user to enter `user_code`.
    DeviceCode {
        verification_uri: String,
        user_code: String,
        message: String,
        expires_in: Duration,
    },
    /// The account was removed locally; the browser session ends at this URL.
    SignedOut { end_session_url: String },
}

// --- Agent service ---

/// A server-side conversation thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentThread {
    pub id: String,
}

/// A server-side run of an agent over a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRun {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    /// `code: message` reported by the service for failed runs.
    pub last_error: Option<String>,
}

/// Lifecycle status of a run. Unknown values are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    Other(String),
}

impl RunStatus {
    /// Statuses the poll loop keeps waiting on.
    pub fn is_pending(&self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }

    /// Statuses after which the run no longer holds its thread.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Expired
                | RunStatus::Incomplete
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Other(s) => s,
        }
    }
}

impl From<String> for RunStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "requires_action" => RunStatus::RequiresAction,
            "cancelling" => RunStatus::Cancelling,
            "cancelled" => RunStatus::Cancelled,
            "failed" => RunStatus::Failed,
            "completed" => RunStatus::Completed,
            "incomplete" => RunStatus::Incomplete,
            "expired" => RunStatus::Expired,
            _ => RunStatus::Other(value),
        }
    }
}

impl From<&str> for RunStatus {
    fn from(value: &str) -> Self {
        RunStatus::from(value.to_string())
    }
}

impl From<RunStatus> for String {
    fn from(value: RunStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One content part of a thread message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePart {
    Text(String),
    /// Non-text parts (images, files), kept by their type tag only.
    Other(String),
}

/// A message as listed from a remote thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    pub id: String,
    pub role: String,
    pub run_id: Option<String>,
    /// Unix seconds.
    pub created_at: i64,
    pub content: Vec<MessagePart>,
}

impl ThreadMessage {
    /// The text of the first content part, if that part is text.
    pub fn first_text(&self) -> Option<&str> {
        match self.content.first() {
            Some(MessagePart::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Converts an assistant reply into a renderable [`Message`].
    ///
    /// Returns `None` when the first content part is not text.
    pub fn to_message(&self) -> Option<Message> {
        let text = self.first_text()?;
        Some(Message {
            id: self.id.clone(),
            role: Role::Assistant,
            content: text.to_string(),
            timestamp: DateTime::from_timestamp(self.created_at, 0).unwrap_or_else(Utc::now),
        })
    }
}
