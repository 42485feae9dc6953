//! Tests for `delete_token` and `delete_authorization` event ordering

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use oauth_app_core::{ClientType, EventContext, EventKey, OAuthAppError};
use tests::fixtures::recorded_app;
use tests::ProviderCall;

#[tokio::test]
async fn delete_token_emits_before_and_after() {
    let (app, provider, recorder) = recorded_app(ClientType::OAuthApp);

    app.delete_token("ghu_123").await.unwrap();

    assert_eq!(
        recorder.keys(),
        vec!["token.before_deleted", "token.deleted"]
    );
    let events = recorder.events();
    assert!(events[0].authenticated, "before_deleted client is authenticated");
    assert!(!events[1].authenticated, "deleted client is unauthenticated");
    assert!(events.iter().all(|event| event.token == "ghu_123"));
    assert_eq!(
        provider.calls(),
        vec![ProviderCall::DeleteToken("ghu_123".to_string())]
    );
}

#[tokio::test]
async fn delete_authorization_emits_four_events_in_order() {
    let (app, provider, recorder) = recorded_app(ClientType::OAuthApp);

    app.delete_authorization("ghu_123").await.unwrap();

    assert_eq!(
        recorder.keys(),
        vec![
            "authorization.before_deleted",
            "token.before_deleted",
            "token.deleted",
            "authorization.deleted",
        ]
    );
    let authenticated: Vec<bool> = recorder
        .events()
        .iter()
        .map(|event| event.authenticated)
        .collect();
    assert_eq!(authenticated, vec![true, true, false, false]);
    assert_eq!(
        provider.calls(),
        vec![ProviderCall::DeleteAuthorization("ghu_123".to_string())]
    );
}

#[tokio::test]
async fn failed_deletion_skips_after_events() {
    let (app, provider, recorder) = recorded_app(ClientType::OAuthApp);
    provider.fail_with(422, "Validation Failed");

    let err = app.delete_authorization("ghu_123").await.unwrap_err();

    assert!(matches!(err, OAuthAppError::Provider(_)));
    assert_eq!(
        recorder.keys(),
        vec!["authorization.before_deleted", "token.before_deleted"]
    );
}

#[tokio::test]
async fn deleted_client_explains_why_it_cannot_be_used() {
    let (app, _provider, _recorder) = recorded_app(ClientType::OAuthApp);
    let seen = Arc::new(Mutex::new(None));
    let seen_by_handler = seen.clone();

    app.on(EventKey::TOKEN_DELETED, move |context: EventContext| {
        let seen = seen_by_handler.clone();
        async move {
            let err = context.client().get("/user").await.unwrap_err();
            *seen.lock() = Some(err.to_string());
            Ok::<(), anyhow::Error>(())
        }
    });

    app.delete_token("ghu_123").await.unwrap();

    let message = seen.lock().clone().unwrap();
    assert!(message.starts_with("[github-oauth-app]"));
    assert!(message.contains("\"token.deleted\""));
    assert!(message.contains("has been revoked"));
}

#[tokio::test]
async fn before_deleted_client_is_bound_to_the_token() {
    let (app, _provider, _recorder) = recorded_app(ClientType::OAuthApp);
    let seen = Arc::new(Mutex::new(None));
    let seen_by_handler = seen.clone();

    app.on(EventKey::TOKEN_BEFORE_DELETED, move |context: EventContext| {
        let seen = seen_by_handler.clone();
        async move {
            let token = context
                .client()
                .authentication()
                .map(|authentication| authentication.token.clone());
            *seen.lock() = token;
            Ok::<(), anyhow::Error>(())
        }
    });

    app.delete_token("ghu_123").await.unwrap();

    assert_eq!(seen.lock().as_deref(), Some("ghu_123"));
}
