//! Tests for `create_token` through both flows

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use oauth_app_core::{
    ClientType, CreateTokenOptions, DeviceVerification, OAuthAppBuilder, OAuthAppError,
    WebFlowExchange,
};
use tests::fixtures::{recorded_app, test_app, CLIENT_SECRET, OAUTH_APP_CLIENT_ID};
use tests::{EventRecorder, MockOAuthProvider, ProviderCall};

#[tokio::test]
async fn web_flow_emits_token_created_once() {
    let (app, provider, recorder) = recorded_app(ClientType::OAuthApp);

    let result = app
        .create_token(CreateTokenOptions::web_flow("code123"))
        .await
        .unwrap();

    assert_eq!(result.authentication.token, "token-for-code123");
    assert_eq!(
        result.authentication.client_secret.as_deref(),
        Some(CLIENT_SECRET)
    );
    assert_eq!(recorder.keys(), vec!["token.created"]);

    let event = &recorder.events()[0];
    assert_eq!(event.token, "token-for-code123");
    assert!(event.authenticated);

    assert_eq!(
        provider.calls(),
        vec![ProviderCall::ExchangeWebFlowCode(WebFlowExchange {
            code: "code123".to_string(),
            state: None,
            redirect_url: None,
        })]
    );
}

#[tokio::test]
async fn web_flow_passes_state_and_configured_redirect_url() {
    let provider = Arc::new(MockOAuthProvider::new());
    let app = OAuthAppBuilder::new(OAUTH_APP_CLIENT_ID, CLIENT_SECRET)
        .with_redirect_url("https://example.com/callback")
        .with_provider(provider.clone())
        .build()
        .unwrap();

    app.create_token(CreateTokenOptions::WebFlow {
        code: "code123".to_string(),
        state: Some("state123".to_string()),
        redirect_url: None,
    })
    .await
    .unwrap();

    assert_eq!(
        provider.calls(),
        vec![ProviderCall::ExchangeWebFlowCode(WebFlowExchange {
            code: "code123".to_string(),
            state: Some("state123".to_string()),
            redirect_url: Some("https://example.com/callback".to_string()),
        })]
    );
}

#[tokio::test]
async fn created_event_carries_scopes_for_oauth_apps() {
    let provider = Arc::new(MockOAuthProvider::new().with_scopes(&["repo", "gist"]));
    let app = test_app(ClientType::OAuthApp, provider);
    let recorder = EventRecorder::new();
    app.on(
        oauth_app_core::EventKey::TOKEN_CREATED,
        recorder.handler(oauth_app_core::EventKey::TOKEN_CREATED),
    );

    app.create_token(CreateTokenOptions::web_flow("code123"))
        .await
        .unwrap();

    assert_eq!(
        recorder.events()[0].scopes,
        Some(vec!["repo".to_string(), "gist".to_string()])
    );
}

#[tokio::test]
async fn device_flow_hands_verification_to_callback() {
    let provider = Arc::new(MockOAuthProvider::new());
    let app = OAuthAppBuilder::new(OAUTH_APP_CLIENT_ID, CLIENT_SECRET)
        .with_default_scopes(vec!["repo".to_string()])
        .with_provider(provider.clone())
        .build()
        .unwrap();

    let seen = Arc::new(Mutex::new(None));
    let seen_by_callback = seen.clone();
    let result = app
        .create_token(CreateTokenOptions::device_flow(
            move |verification: DeviceVerification| {
                let seen = seen_by_callback.clone();
                async move {
                    *seen.lock() = Some(verification.user_code);
                    Ok::<(), anyhow::Error>(())
                }
            },
        ))
        .await
        .unwrap();

    assert_eq!(result.authentication.token, "device-token");
    assert_eq!(seen.lock().as_deref(), Some("ABCD-1234"));
    assert_eq!(
        provider.calls(),
        vec![ProviderCall::DeviceFlow {
            scopes: vec!["repo".to_string()]
        }]
    );
}

#[tokio::test]
async fn device_flow_sends_no_scopes_for_github_apps() {
    let provider = Arc::new(MockOAuthProvider::new());
    let app = test_app(ClientType::GitHubApp, provider.clone());

    app.create_token(CreateTokenOptions::DeviceFlow {
        on_verification: Arc::new(|_: DeviceVerification| async {
            Ok::<(), anyhow::Error>(())
        }),
        scopes: Some(vec!["repo".to_string()]),
    })
    .await
    .unwrap();

    assert_eq!(
        provider.calls(),
        vec![ProviderCall::DeviceFlow { scopes: vec![] }]
    );
}

#[tokio::test]
async fn provider_failure_emits_nothing() {
    let (app, provider, recorder) = recorded_app(ClientType::OAuthApp);
    provider.fail_with(401, "Bad credentials");

    let err = app
        .create_token(CreateTokenOptions::web_flow("code123"))
        .await
        .unwrap_err();

    assert!(matches!(err, OAuthAppError::Provider(_)));
    assert_eq!(err.to_string(), "Bad credentials (HTTP 401)");
    assert!(recorder.is_empty());
}

#[tokio::test]
async fn handler_error_fails_the_operation() {
    let (app, _provider, _recorder) = recorded_app(ClientType::OAuthApp);
    app.on(
        oauth_app_core::EventKey::TOKEN_CREATED,
        |_ctx: oauth_app_core::EventContext| async move {
            Err::<(), _>(anyhow::anyhow!("listener exploded"))
        },
    );

    let err = app
        .create_token(CreateTokenOptions::web_flow("code123"))
        .await
        .unwrap_err();

    match err {
        OAuthAppError::EventHandler { key, source } => {
            assert_eq!(key.to_string(), "token.created");
            assert_eq!(source.to_string(), "listener exploded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
