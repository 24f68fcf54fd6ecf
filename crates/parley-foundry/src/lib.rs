// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Azure AI Foundry Agents adapter for Parley.
//!
//! This crate implements [`AgentService`] over the Assistants v2 wire format
//! and an [`AgentConnector`] that builds a fresh authorized client per turn.

pub mod client;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::debug;

use parley_config::ServiceConfig;
use parley_core::types::{AdapterType, AgentRun, AgentThread, ThreadMessage};
use parley_core::{AgentConnector, AgentService, ParleyError, ServiceAdapter};

pub use crate::client::FoundryClient;
use crate::types::{
    CreateMessageRequest, CreateRunRequest, MessageList, RunObject, ThreadObject,
};

#[async_trait]
impl ServiceAdapter for FoundryClient {
    fn name(&self) -> &str {
        "foundry"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::AgentService
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        Ok(())
    }
}

#[async_trait]
impl AgentService for FoundryClient {
    async fn create_thread(&self) -> Result<AgentThread, ParleyError> {
        let thread: ThreadObject = self
            .send_json(self.post("threads").json(&serde_json::json!({})))
            .await?;
        debug!(thread_id = %thread.id, "created thread");
        Ok(thread.into())
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<(), ParleyError> {
        let body = CreateMessageRequest {
            role: "user",
            content,
        };
        self.send(self.post(&format!("threads/{thread_id}/messages")).json(&body))
            .await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<AgentRun, ParleyError> {
        let body = CreateRunRequest {
            assistant_id: agent_id,
        };
        let run: RunObject = self
            .send_json(self.post(&format!("threads/{thread_id}/runs")).json(&body))
            .await?;
        Ok(run.into())
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<AgentRun, ParleyError> {
        let run: RunObject = self
            .send_json(self.get(&format!("threads/{thread_id}/runs/{run_id}")))
            .await?;
        Ok(run.into())
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<AgentRun, ParleyError> {
        let run: RunObject = self
            .send_json(self.post(&format!("threads/{thread_id}/runs/{run_id}/cancel")))
            .await?;
        debug!(run_id = %run.id, status = %run.status, "run cancel requested");
        Ok(run.into())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ParleyError> {
        let list: MessageList = self
            .send_json(self.get(&format!("threads/{thread_id}/messages")))
            .await?;
        Ok(list.data.into_iter().map(ThreadMessage::from).collect())
    }
}

/// Builds a [`FoundryClient`] for each turn from the runtime service settings.
#[derive(Debug, Clone, Default)]
pub struct FoundryConnector {
    config: ServiceConfig,
}

impl FoundryConnector {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }
}

impl AgentConnector for FoundryConnector {
    fn connect(
        &self,
        endpoint: &str,
        token: &SecretString,
    ) -> Result<Arc<dyn AgentService>, ParleyError> {
        Ok(Arc::new(FoundryClient::new(endpoint, token, &self.config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::RunStatus;
    use parley_core::types::MessagePart;
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn token() -> SecretString {
        SecretString::from("test-token")
    }

    fn test_client(base_url: &str) -> FoundryClient {
        FoundryClient::new(base_url, &token(), &ServiceConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn create_thread_sends_auth_and_version() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/threads"))
            .and(query_param("api-version", "2025-05-01"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("api-key", "test-token"))
            .and(header("openai-beta", "assistants=v2"))
            .and(header("ocp-apim-trace", "true"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "thread_1", "object": "thread"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let thread = test_client(&server.uri()).create_thread().await.unwrap();
        assert_eq!(thread.id, "thread_1");
    }

    #[tokio::test]
    async fn trace_header_can_be_disabled() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/threads"))
            .respond_with(|req: &Request| {
                if req.headers.contains_key("ocp-apim-trace") {
                    ResponseTemplate::new(400)
                } else {
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "thread_2"}))
                }
            })
            .mount(&server)
            .await;

        let config = ServiceConfig {
            trace_requests: false,
            ..ServiceConfig::default()
        };
        let client = FoundryClient::new(&server.uri(), &token(), &config).unwrap();
        assert_eq!(client.create_thread().await.unwrap().id, "thread_2");
    }

    #[tokio::test]
    async fn endpoint_with_project_path_and_trailing_slash() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/projects/demo/threads/thread_1/messages"))
            .and(body_json(serde_json::json!({"role": "user", "content": "Hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = format!("{}/api/projects/demo/", server.uri());
        test_client(&endpoint)
            .create_message("thread_1", "Hello")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_and_poll_run() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/threads/thread_1/runs"))
            .and(body_json(serde_json::json!({"assistant_id": "asst_1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "run_1", "thread_id": "thread_1", "status": "queued"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/threads/thread_1/runs/run_1"))
            .and(query_param("api-version", "2025-05-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "run_1", "thread_id": "thread_1", "status": "completed", "last_error": null
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let run = client.create_run("thread_1", "asst_1").await.unwrap();
        assert_eq!(run.status, RunStatus::Queued);
        let run = client.get_run("thread_1", &run.id).await.unwrap();
        assert_eq!(run.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn cancel_run_posts_to_cancel_resource() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/threads/thread_1/runs/run_1/cancel"))
            .and(query_param("api-version", "2025-05-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "run_1", "thread_id": "thread_1", "status": "cancelling"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let run = test_client(&server.uri())
            .cancel_run("thread_1", "run_1")
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::Cancelling);
        assert!(!run.status.is_terminal());
    }

    #[tokio::test]
    async fn list_messages_maps_parts() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/threads/thread_1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [
                    {
                        "id": "msg_2", "role": "assistant", "run_id": "run_1",
                        "created_at": 1717000001,
                        "content": [{"type": "text", "text": {"value": "Hi!", "annotations": []}}]
                    },
                    {
                        "id": "msg_1", "role": "user", "run_id": null,
                        "created_at": 1717000000,
                        "content": [{"type": "text", "text": {"value": "Hello", "annotations": []}}]
                    }
                ]
            })))
            .mount(&server)
            .await;

        let messages = test_client(&server.uri())
            .list_messages("thread_1")
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "assistant");
        assert_eq!(messages[0].content, vec![MessagePart::Text("Hi!".into())]);
        assert!(messages[1].run_id.is_none());
    }

    #[tokio::test]
    async fn error_status_carries_service_message_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/threads"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": {"code": "ServiceUnavailable", "message": "Try again later"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).create_thread().await.unwrap_err();
        match err {
            ParleyError::Service { message, status, .. } => {
                assert_eq!(status, Some(503));
                assert!(message.contains("Try again later"), "got: {message}");
                assert!(message.contains("ServiceUnavailable"), "got: {message}");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparseable_error_body_falls_back_to_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/threads/t/runs/r"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).get_run("t", "r").await.unwrap_err();
        assert!(err.to_string().contains("401"), "got: {err}");
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_service_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/threads"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).create_thread().await.unwrap_err();
        assert!(matches!(err, ParleyError::Service { status: Some(200), .. }));
    }

    #[tokio::test]
    async fn connector_builds_working_client() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/threads"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "thread_9"})))
            .mount(&server)
            .await;

        let connector = FoundryConnector::default();
        let service = connector.connect(&server.uri(), &token()).unwrap();
        assert_eq!(service.name(), "foundry");
        assert_eq!(service.create_thread().await.unwrap().id, "thread_9");
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let err = FoundryConnector::default().connect("  ", &token()).err().expect("empty endpoint should be rejected");
        assert!(matches!(err, ParleyError::Config(_)));
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let bad = SecretString::from("abc\ndef");
        let err = FoundryClient::new("https://x", &bad, &ServiceConfig::default()).unwrap_err();
        assert!(matches!(err, ParleyError::Auth { .. }));
    }
}
