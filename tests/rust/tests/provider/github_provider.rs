//! `GitHubOAuthProvider` request and response handling

use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oauth_app_core::{
    ClientType, DeviceVerification, OAuthProvider, ProviderError, ScopeTokenOptions,
    WebFlowExchange,
};

use super::{basic_auth, credentials, provider_for, CLIENT_SECRET};

#[tokio::test]
async fn exchange_web_flow_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .and(header("accept", "application/json"))
        .and(body_json(json!({
            "client_id": "0123",
            "client_secret": CLIENT_SECRET,
            "code": "code123",
            "state": "state123",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "gho_123",
            "scope": "repo,gist",
            "token_type": "bearer",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let authentication = provider_for(&server)
        .exchange_web_flow_code(
            &credentials(ClientType::OAuthApp),
            WebFlowExchange {
                code: "code123".to_string(),
                state: Some("state123".to_string()),
                redirect_url: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(authentication.token, "gho_123");
    assert_eq!(
        authentication.scopes,
        Some(vec!["repo".to_string(), "gist".to_string()])
    );
    assert_eq!(authentication.client_secret.as_deref(), Some(CLIENT_SECRET));
    assert_eq!(authentication.expires_at, None);
}

#[tokio::test]
async fn oauth_error_in_200_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired.",
            "error_uri": "https://docs.github.com/apps/troubleshooting",
        })))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .exchange_web_flow_code(
            &credentials(ClientType::OAuthApp),
            WebFlowExchange {
                code: "expired".to_string(),
                state: None,
                redirect_url: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::OAuth(_)));
    assert_eq!(
        err.to_string(),
        "The code passed is incorrect or expired. (bad_verification_code, https://docs.github.com/apps/troubleshooting)"
    );
}

#[tokio::test]
async fn github_app_tokens_expire_and_have_no_scopes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .and(body_partial_json(json!({
            "grant_type": "refresh_token",
            "refresh_token": "ghr_123",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ghu_456",
            "expires_in": 28800,
            "refresh_token": "ghr_456",
            "refresh_token_expires_in": 15811200,
            "scope": "",
            "token_type": "bearer",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let before = Utc::now();
    let response = provider_for(&server)
        .refresh_token(&credentials(ClientType::GitHubApp), "ghr_123")
        .await
        .unwrap();

    let authentication = response.authentication;
    assert_eq!(authentication.token, "ghu_456");
    assert_eq!(authentication.refresh_token.as_deref(), Some("ghr_456"));
    assert_eq!(authentication.scopes, None);
    let expires_at = authentication.expires_at.unwrap();
    assert!(expires_at > before + chrono::Duration::hours(7));
    assert!(authentication.refresh_token_expires_at.unwrap() > expires_at);
    assert_eq!(response.data["access_token"], json!("ghu_456"));
}

#[tokio::test]
async fn device_flow_polls_until_authorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/device/code"))
        .and(body_json(json!({ "client_id": "0123", "scope": "repo gist" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_code": "dc_123",
            "user_code": "WDJB-MJHT",
            "verification_uri": "https://github.com/login/device",
            "expires_in": 900,
            "interval": 0,
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .and(body_partial_json(json!({ "device_code": "dc_123" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "authorization_pending" })),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .and(body_partial_json(json!({
            "device_code": "dc_123",
            "grant_type": "urn:ietf:params:oauth:grant-type:device_code",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "gho_device",
            "scope": "repo,gist",
            "token_type": "bearer",
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let user_codes = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen = user_codes.clone();
    let authentication = provider_for(&server)
        .device_flow(
            &credentials(ClientType::OAuthApp),
            vec!["repo".to_string(), "gist".to_string()],
            Arc::new(move |verification: DeviceVerification| {
                let seen = seen.clone();
                async move {
                    seen.lock().push(verification.user_code);
                    Ok::<(), anyhow::Error>(())
                }
            }),
        )
        .await
        .unwrap();

    assert_eq!(authentication.token, "gho_device");
    assert_eq!(*user_codes.lock(), vec!["WDJB-MJHT"]);
}

#[tokio::test]
async fn device_flow_stops_on_denial() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/device/code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_code": "dc_123",
            "user_code": "WDJB-MJHT",
            "verification_uri": "https://github.com/login/device",
            "expires_in": 900,
            "interval": 0,
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "access_denied",
            "error_description": "The authorization request was denied.",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .device_flow(
            &credentials(ClientType::GitHubApp),
            vec![],
            Arc::new(|_: DeviceVerification| async { Ok::<(), anyhow::Error>(()) }),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "The authorization request was denied. (access_denied)"
    );
}

#[tokio::test]
async fn check_token_uses_basic_auth() {
    let server = MockServer::start().await;
    let credentials = credentials(ClientType::OAuthApp);
    Mock::given(method("POST"))
        .and(path("/applications/0123/token"))
        .and(header("authorization", basic_auth(&credentials).as_str()))
        .and(body_json(json!({ "access_token": "gho_123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "token": "gho_123",
            "scopes": ["repo"],
            "expires_at": null,
            "app": { "client_id": "0123" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider_for(&server)
        .check_token(&credentials, "gho_123")
        .await
        .unwrap();

    assert_eq!(response.authentication.token, "gho_123");
    assert_eq!(response.authentication.scopes, Some(vec!["repo".to_string()]));
    assert_eq!(response.data["id"], json!(1));
}

#[tokio::test]
async fn reset_token_returns_new_token() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/applications/lv1.0123/token"))
        .and(body_json(json!({ "access_token": "ghu_old" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "ghu_new",
            "expires_at": "2030-01-01T00:00:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider_for(&server)
        .reset_token(&credentials(ClientType::GitHubApp), "ghu_old")
        .await
        .unwrap();

    assert_eq!(response.authentication.token, "ghu_new");
    assert_eq!(
        response.authentication.expires_at.unwrap().to_rfc3339(),
        "2030-01-01T00:00:00+00:00"
    );
}

#[tokio::test]
async fn scope_token_sends_only_given_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/applications/lv1.0123/token/scoped"))
        .and(body_json(json!({
            "access_token": "ghu_123",
            "target": "octokit",
            "repository_ids": [1296269],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "ghu_scoped",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider_for(&server)
        .scope_token(
            &credentials(ClientType::GitHubApp),
            &ScopeTokenOptions {
                token: "ghu_123".to_string(),
                target: Some("octokit".to_string()),
                repository_ids: Some(vec![1296269]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(response.authentication.token, "ghu_scoped");
}

#[tokio::test]
async fn delete_token_and_grant() {
    let server = MockServer::start().await;
    for endpoint in ["/applications/0123/token", "/applications/0123/grant"] {
        Mock::given(method("DELETE"))
            .and(path(endpoint))
            .and(body_json(json!({ "access_token": "gho_123" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
    }

    let provider = provider_for(&server);
    let credentials = credentials(ClientType::OAuthApp);
    provider.delete_token(&credentials, "gho_123").await.unwrap();
    provider
        .delete_authorization(&credentials, "gho_123")
        .await
        .unwrap();
}

#[tokio::test]
async fn api_errors_use_github_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/applications/0123/token"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest",
        })))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .check_token(&credentials(ClientType::OAuthApp), "gho_unknown")
        .await
        .unwrap_err();

    match err {
        ProviderError::Http { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
