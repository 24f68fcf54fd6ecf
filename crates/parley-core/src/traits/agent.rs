// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent service trait for the thread / message / run resources.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::ParleyError;
use crate::traits::adapter::ServiceAdapter;
use crate::types::{AgentRun, AgentThread, ThreadMessage};

/// An authorized client for a hosted agent service.
#[async_trait]
pub trait AgentService: ServiceAdapter {
    /// Creates an empty conversation thread.
    async fn create_thread(&self) -> Result<AgentThread, ParleyError>;

    /// Appends a user message to a thread.
    async fn create_message(&self, thread_id: &str, content: &str) -> Result<(), ParleyError>;

    /// Starts a run of `agent_id` over a thread.
    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<AgentRun, ParleyError>;

    /// Fetches the current state of a run.
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<AgentRun, ParleyError>;

    /// Asks the service to stop a run and returns the run as it now stands.
    ///
    /// The returned status may still be `cancelling`.
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<AgentRun, ParleyError>;

    /// Lists a thread's messages, newest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ParleyError>;
}

/// Builds an [`AgentService`] bound to an endpoint and a bearer credential.
///
/// Called once per turn, since the credential may have been refreshed.
pub trait AgentConnector: Send + Sync {
    fn connect(
        &self,
        endpoint: &str,
        token: &SecretString,
    ) -> Result<Arc<dyn AgentService>, ParleyError>;
}
