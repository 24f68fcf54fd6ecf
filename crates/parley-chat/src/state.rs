// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observable conversation state.

use parley_core::Message;

/// Everything the chat view renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatState {
    /// Turns in display order.
    pub messages: Vec<Message>,
    /// Remote thread backing the conversation, once created.
    pub thread_id: Option<String>,
    pub is_loading: bool,
    /// Banner text for the last failed turn.
    pub error: Option<String>,
}

impl ChatState {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
