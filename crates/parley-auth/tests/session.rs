// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session manager and slot behaviour over the mock identity client.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use secrecy::ExposeSecret;

use parley_auth::{SessionManager, SessionPhase, SessionSlot};
use parley_core::types::InteractionStatus;
use parley_test_utils::{MockIdentityClient, test_account};

fn scopes() -> Vec<String> {
    vec!["https://ai.azure.com/.default".to_string()]
}

fn manager(client: &Arc<MockIdentityClient>) -> SessionManager {
    SessionManager::new(client.clone(), scopes())
}

#[tokio::test]
async fn nothing_is_reported_before_initialize() {
    let client = Arc::new(MockIdentityClient::signed_in("tok"));
    let session = manager(&client);

    assert_eq!(session.phase(), SessionPhase::Uninitialized);
    assert!(session.get_token().await.is_none());
    assert!(!session.is_authenticated().await);
    assert_eq!(client.silent_calls(), 0);

    session.initialize().await.unwrap();

    assert_eq!(session.phase(), SessionPhase::Ready);
    assert!(session.is_authenticated().await);
    assert_eq!(session.get_token().await.unwrap().expose_secret(), "tok");
}

#[tokio::test]
async fn failed_handshake_returns_to_uninitialized() {
    let client = Arc::new(MockIdentityClient::new().failing_initialize("cache unreadable"));
    let session = manager(&client);

    let err = session.initialize().await.unwrap_err();

    assert!(err.to_string().contains("cache unreadable"));
    assert_eq!(session.phase(), SessionPhase::Uninitialized);
}

#[tokio::test]
#[tracing_test::traced_test]
async fn failed_pending_interaction_still_reaches_ready() {
    let client = Arc::new(
        MockIdentityClient::new().with_pending(Err("authorization_declined".to_string())),
    );
    let session = manager(&client);

    session.initialize().await.unwrap();

    assert!(session.is_ready());
    assert!(!session.is_authenticated().await);
    assert!(logs_contain("pending sign-in failed"));
}

#[tokio::test]
async fn pending_interaction_account_is_picked_up_at_startup() {
    let client = Arc::new(MockIdentityClient::new().with_pending(Ok(test_account())));
    let session = manager(&client);

    session.initialize().await.unwrap();

    let account = session.active_account().await.unwrap();
    assert_eq!(account.username, "tester@contoso.com");
}

#[tokio::test]
async fn no_account_yields_no_token_and_no_interaction() {
    let client = Arc::new(MockIdentityClient::new());
    let session = manager(&client);
    session.initialize().await.unwrap();

    assert!(session.get_token().await.is_none());
    assert_eq!(client.silent_calls(), 0);
    assert_eq!(client.interactive_calls(), 0);
}

#[tokio::test]
async fn silent_failure_starts_exactly_one_interactive_flow() {
    let client = Arc::new(MockIdentityClient::new().with_account(test_account()));
    let session = manager(&client);
    session.initialize().await.unwrap();

    assert!(session.get_token().await.is_none());
    assert_eq!(client.interactive_calls(), 1);
    assert!(session.interaction_in_progress());

    // The flow is still running, so a second miss does not start another.
    assert!(session.get_token().await.is_none());
    assert_eq!(client.silent_calls(), 2);
    assert_eq!(client.interactive_calls(), 1);
}

#[tokio::test]
async fn interaction_in_progress_suppresses_fallback() {
    let client = Arc::new(
        MockIdentityClient::new()
            .with_account(test_account())
            .with_status(InteractionStatus::Login),
    );
    let session = manager(&client);
    session.initialize().await.unwrap();

    assert!(session.get_token().await.is_none());
    assert_eq!(client.interactive_calls(), 0);
}

#[tokio::test]
async fn login_then_wait_signs_the_user_in() {
    let client = Arc::new(MockIdentityClient::new());
    let session = manager(&client);
    session.initialize().await.unwrap();

    session.login().await.unwrap();
    assert!(session.interaction_in_progress());
    let status = session.status().await;
    assert!(status.ready);
    assert!(status.interaction_in_progress);
    assert!(!status.is_authenticated());

    let account = session.wait_for_interaction().await.unwrap();
    assert_eq!(account, Some(test_account()));
    assert!(!session.interaction_in_progress());
    assert!(session.status().await.is_authenticated());
    assert_eq!(client.login_calls(), 1);
}

#[tokio::test]
async fn login_failure_propagates() {
    let client = Arc::new(MockIdentityClient::new().with_status(InteractionStatus::AcquireToken));
    let session = manager(&client);
    session.initialize().await.unwrap();

    assert!(session.login().await.is_err());
}

#[tokio::test]
async fn logout_removes_accounts() {
    let client = Arc::new(MockIdentityClient::signed_in("tok"));
    let session = manager(&client);
    session.initialize().await.unwrap();

    session.logout().await;

    assert!(!session.is_authenticated().await);
    assert_eq!(client.logout_calls(), 1);
}

#[tokio::test]
async fn scopes_can_be_refreshed() {
    let client = Arc::new(MockIdentityClient::new());
    let session = manager(&client);

    session.set_scopes(vec!["api://custom/.default".into()]);

    assert_eq!(session.scopes(), vec!["api://custom/.default".to_string()]);
}

#[tokio::test]
async fn slot_builds_once_and_reuses() {
    let slot = SessionSlot::new();
    let builds = AtomicUsize::new(0);
    let client = Arc::new(MockIdentityClient::signed_in("tok"));

    for _ in 0..3 {
        let manager = slot
            .get_or_init(|| async {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(SessionManager::new(client.clone(), scopes()))
            })
            .await
            .unwrap();
        assert!(manager.is_ready());
    }

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(slot.get().is_some());
    slot.shutdown().await.unwrap();
}

#[tokio::test]
async fn slot_stays_empty_after_failed_build() {
    let slot = SessionSlot::new();

    let result = slot
        .get_or_init(|| async {
            let client = Arc::new(MockIdentityClient::new().failing_initialize("boom"));
            Ok(SessionManager::new(client, scopes()))
        })
        .await;
    assert!(result.is_err());
    assert!(slot.get().is_none());

    let client = Arc::new(MockIdentityClient::new());
    let manager = slot
        .get_or_init(|| async { Ok(SessionManager::new(client, scopes())) })
        .await
        .unwrap();
    assert!(manager.is_ready());
}

#[tokio::test]
async fn slot_shutdown_without_session_is_noop() {
    assert!(SessionSlot::new().shutdown().await.is_ok());
}
