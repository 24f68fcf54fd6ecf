// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests across settings, session, engine and the HTTP adapter.
//!
//! The identity provider is mocked; the agent service is a wiremock server
//! speaking the Assistants v2 wire format. Tests are independent.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use parley_auth::SessionManager;
use parley_chat::{ChatEngine, PollPolicy, TurnOutcome};
use parley_config::ServiceConfig;
use parley_core::{ChatSettings, KeyValueStore, ParleyError, Role, SettingsPatch};
use parley_foundry::FoundryConnector;
use parley_storage::{FileStore, SETTINGS_KEY, SettingsStore};
use parley_test_utils::{MockIdentityClient, test_account};

fn fast_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(10),
        max_interval: Duration::from_millis(20),
        multiplier: 1.5,
        deadline: Duration::from_secs(5),
    }
}

fn settings_for(endpoint: &str) -> ChatSettings {
    ChatSettings {
        endpoint: endpoint.to_string(),
        client_id: "client".into(),
        tenant_id: "tenant".into(),
        agent_id: Some("asst_e2e".into()),
        ..ChatSettings::default()
    }
}

async fn ready_session(client: MockIdentityClient) -> (Arc<MockIdentityClient>, SessionManager) {
    let client = Arc::new(client);
    let session = SessionManager::new(client.clone(), ChatSettings::default().scopes);
    session.initialize().await.unwrap();
    (client, session)
}

fn run_body(status: &str) -> serde_json::Value {
    serde_json::json!({"id": "run_1", "object": "thread.run", "thread_id": "thread_1", "status": status})
}

async fn mount_happy_path(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/threads"))
        .and(header("authorization", "Bearer e2e-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "thread_1"})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/messages"))
        .and(body_json(serde_json::json!({"role": "user", "content": "Hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg_u1"})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/runs"))
        .and(body_json(serde_json::json!({"assistant_id": "asst_e2e"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("queued")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("queued")))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("in_progress")))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("completed")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/messages"))
        .and(query_param("api-version", "2025-05-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "object": "list",
            "data": [
                {
                    "id": "msg_a1", "role": "assistant", "run_id": "run_1",
                    "created_at": 1717000002,
                    "content": [{"type": "text", "text": {"value": "Hello! How can I help?", "annotations": []}}]
                },
                {
                    "id": "msg_old", "role": "assistant", "run_id": "run_0",
                    "created_at": 1717000000,
                    "content": [{"type": "text", "text": {"value": "stale", "annotations": []}}]
                }
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn hello_turn_over_http() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;

    let (_client, session) = ready_session(MockIdentityClient::signed_in("e2e-token")).await;
    let engine = ChatEngine::new(fast_policy());
    let connector = FoundryConnector::new(ServiceConfig::default());

    let outcome = engine
        .submit("Hello", &settings_for(&server.uri()), &session, &connector)
        .await;

    match outcome {
        TurnOutcome::Replied(reply) => {
            assert_eq!(reply.id, "msg_a1");
            assert_eq!(reply.content, "Hello! How can I help?");
        }
        other => panic!("expected a reply, got {other:?}"),
    }
    let state = engine.snapshot();
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[0].role, Role::User);
    assert_eq!(state.messages[1].role, Role::Assistant);
    assert_eq!(state.thread_id.as_deref(), Some("thread_1"));
    assert!(state.error.is_none());
}

#[tokio::test]
async fn failed_run_over_http_shows_status_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "thread_1"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "m"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/runs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("queued")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "run_1", "thread_id": "thread_1", "status": "failed",
            "last_error": {"code": "server_error", "message": "Sorry, something went wrong."}
        })))
        .mount(&server)
        .await;

    let (_client, session) = ready_session(MockIdentityClient::signed_in("tok")).await;
    let engine = ChatEngine::new(fast_policy());
    let connector = FoundryConnector::new(ServiceConfig::default());

    let outcome = engine
        .submit("Hello", &settings_for(&server.uri()), &session, &connector)
        .await;

    assert!(matches!(outcome, TurnOutcome::Failed(ParleyError::RunFailed { .. })));
    let banner = engine.snapshot().error.unwrap();
    assert!(banner.contains("run failed with status: failed"), "{banner}");
    assert!(banner.contains("server_error"), "{banner}");
    assert!(!engine.snapshot().is_loading);
}

#[tokio::test]
async fn expired_session_starts_one_sign_in_and_reports_auth_error() {
    let server = MockServer::start().await;
    let (client, session) =
        ready_session(MockIdentityClient::new().with_account(test_account())).await;
    let engine = ChatEngine::new(fast_policy());
    let connector = FoundryConnector::new(ServiceConfig::default());
    let settings = settings_for(&server.uri());

    let outcome = engine.submit("Hello", &settings, &session, &connector).await;
    assert!(matches!(outcome, TurnOutcome::Failed(ParleyError::Auth { .. })));
    assert_eq!(client.interactive_calls(), 1);

    // A retry while the sign-in is pending does not start another one.
    engine.submit("Hello", &settings, &session, &connector).await;
    assert_eq!(client.interactive_calls(), 1);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[test]
fn settings_survive_restart_and_reset() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path()));

    let settings = SettingsStore::load(store.clone());
    settings.update(SettingsPatch {
        endpoint: Some("https://proj.services.ai.azure.com/api/projects/p".into()),
        client_id: Some("client".into()),
        tenant_id: Some("tenant".into()),
        agent_id: Some(Some("asst_1".into())),
        ..SettingsPatch::default()
    });
    assert!(dir.path().join(format!("{SETTINGS_KEY}.json")).exists());

    let reloaded = SettingsStore::load(store.clone());
    assert!(reloaded.is_configured());
    assert_eq!(reloaded.current().agent_id.as_deref(), Some("asst_1"));

    reloaded.reset();
    let fresh = SettingsStore::load(store);
    assert_eq!(fresh.current(), ChatSettings::default());
    assert!(!fresh.is_configured());
}

#[test]
fn browser_exported_settings_load_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(format!("{SETTINGS_KEY}.json")),
        r#"{"azureEndpoint":"https://e","clientId":"c","tenantId":"t","scopes":["s"],"assistantId":"asst_x"}"#,
    )
    .unwrap();

    let settings = SettingsStore::load(Arc::new(FileStore::new(dir.path())));

    let current = settings.current();
    assert_eq!(current.endpoint, "https://e");
    assert_eq!(current.scopes, vec!["s".to_string()]);
    assert_eq!(current.agent_id.as_deref(), Some("asst_x"));
}
