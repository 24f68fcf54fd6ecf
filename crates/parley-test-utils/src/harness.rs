// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation test harness wiring a [`ChatEngine`] to mock services.
//!
//! ```ignore
//! let harness = TestHarness::builder()
//!     .with_statuses([RunStatus::InProgress, RunStatus::Completed])
//!     .with_reply("hi")
//!     .build();
//! let outcome = harness.send("hello").await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use parley_chat::{ChatEngine, PollPolicy, TurnOutcome};
use parley_core::{ChatSettings, CredentialProvider, RunStatus};

use crate::mock_agents::{MockAgentService, MockConnector};
use crate::mock_identity::StaticCredential;

/// Fully wired conversation engine over in-memory services.
pub struct TestHarness {
    pub engine: Arc<ChatEngine>,
    pub service: Arc<MockAgentService>,
    pub connector: Arc<MockConnector>,
    pub credentials: Arc<dyn CredentialProvider>,
    pub settings: ChatSettings,
}

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    service: MockAgentService,
    settings: ChatSettings,
    signed_in: bool,
    policy: PollPolicy,
}

/// Settings that pass every completeness check.
pub fn test_settings() -> ChatSettings {
    ChatSettings {
        endpoint: "https://contoso.services.ai.azure.com/api/projects/demo".into(),
        client_id: "00000000-0000-0000-0000-000000000001".into(),
        tenant_id: "00000000-0000-0000-0000-000000000002".into(),
        agent_id: Some("asst_test".into()),
        ..ChatSettings::default()
    }
}

/// A fast policy so paused-clock tests stay readable.
pub fn test_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(100),
        max_interval: Duration::from_millis(400),
        multiplier: 2.0,
        deadline: Duration::from_secs(5),
    }
}

impl TestHarnessBuilder {
    pub fn new() -> Self {
        Self {
            service: MockAgentService::new(),
            settings: test_settings(),
            signed_in: true,
            policy: test_policy(),
        }
    }

    /// Replaces the scripted agent service.
    pub fn with_service(mut self, service: MockAgentService) -> Self {
        self.service = service;
        self
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = RunStatus>) -> Self {
        self.service = self.service.with_statuses(statuses);
        self
    }

    pub fn with_reply(mut self, text: &str) -> Self {
        self.service = self.service.with_reply(text);
        self
    }

    pub fn with_agent_id(mut self, agent_id: Option<&str>) -> Self {
        self.settings.agent_id = agent_id.map(str::to_string);
        self
    }

    /// When false, the credential provider yields no token.
    pub fn signed_in(mut self, signed_in: bool) -> Self {
        self.signed_in = signed_in;
        self
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> TestHarness {
        let service = Arc::new(self.service);
        let connector = Arc::new(MockConnector::new(service.clone()));
        let credentials: Arc<dyn CredentialProvider> = if self.signed_in {
            Arc::new(StaticCredential::token("test-token"))
        } else {
            Arc::new(StaticCredential::none())
        };
        TestHarness {
            engine: Arc::new(ChatEngine::new(self.policy)),
            service,
            connector,
            credentials,
            settings: self.settings,
        }
    }
}

impl Default for TestHarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Submits one turn with the harness settings and mocks.
    pub async fn send(&self, text: &str) -> TurnOutcome {
        self.engine
            .submit(
                text,
                &self.settings,
                self.credentials.as_ref(),
                self.connector.as_ref(),
            )
            .await
    }
}
