// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assistants v2 wire types for the thread, message and run resources.

use serde::{Deserialize, Serialize};

use parley_core::types::{AgentRun, AgentThread, MessagePart, ThreadMessage};
use parley_core::RunStatus;

// --- Request types ---

/// Body of `POST /threads/{thread}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Body of `POST /threads/{thread}/runs`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRunRequest<'a> {
    pub assistant_id: &'a str,
}

// --- Response types ---

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadObject {
    pub id: String,
}

impl From<ThreadObject> for AgentThread {
    fn from(value: ThreadObject) -> Self {
        AgentThread { id: value.id }
    }
}

/// A run as returned by create and retrieve.
#[derive(Debug, Clone, Deserialize)]
pub struct RunObject {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

/// Why a run failed.
#[derive(Debug, Clone, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl RunError {
    /// `code: message`, or whichever half is present.
    pub fn summary(&self) -> String {
        match (self.code.is_empty(), self.message.is_empty()) {
            (false, false) => format!("{}: {}", self.code, self.message),
            (false, true) => self.code.clone(),
            _ => self.message.clone(),
        }
    }
}

impl From<RunObject> for AgentRun {
    fn from(value: RunObject) -> Self {
        AgentRun {
            id: value.id,
            thread_id: value.thread_id,
            status: value.status,
            last_error: value
                .last_error
                .map(|e| e.summary())
                .filter(|s| !s.is_empty()),
        }
    }
}

/// `GET /threads/{thread}/messages` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageList {
    pub data: Vec<MessageObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageObject {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

/// One content part. Only `text` parts carry a payload we read.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    pub value: String,
}

impl From<ContentPart> for MessagePart {
    fn from(part: ContentPart) -> Self {
        match (part.kind.as_str(), part.text) {
            ("text", Some(text)) => MessagePart::Text(text.value),
            _ => MessagePart::Other(part.kind),
        }
    }
}

impl From<MessageObject> for ThreadMessage {
    fn from(value: MessageObject) -> Self {
        ThreadMessage {
            id: value.id,
            role: value.role,
            run_id: value.run_id,
            created_at: value.created_at,
            content: value.content.into_iter().map(MessagePart::from).collect(),
        }
    }
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}
