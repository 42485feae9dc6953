//! Happy paths of the nine routes

use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;

use oauth_app_core::{ClientType, ScopeTokenOptions, WebFlowExchange};
use oauth_app_gateway::OAuthRequest;
use tests::ProviderCall;

use super::RouterHarness;

fn location(response: &oauth_app_gateway::OAuthResponse) -> Url {
    Url::parse(response.header("location").expect("location header")).unwrap()
}

#[tokio::test]
async fn login_redirects_to_authorize_url() {
    let harness = RouterHarness::new(ClientType::OAuthApp);

    let response = harness
        .expect(OAuthRequest::new(
            Method::GET,
            "/api/github/oauth/login?state=s1",
        ))
        .await;

    assert_eq!(response.status, StatusCode::FOUND);
    let url = response.header("location").unwrap();
    assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
    assert!(url.contains("client_id=0123&state=s1&allow_signup=true"));
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    assert!(harness.recorder.is_empty());
}

#[tokio::test]
async fn login_passes_scopes_signup_and_redirect() {
    let harness = RouterHarness::new(ClientType::OAuthApp);

    let response = harness
        .expect(OAuthRequest::new(
            Method::GET,
            "/api/github/oauth/login?scopes=repo,gist&allowSignup=false&redirectUrl=https%3A%2F%2Fexample.com%2Fcb",
        ))
        .await;

    let url = location(&response);
    let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let get = |key: &str| {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    assert_eq!(get("scope"), Some("repo,gist"));
    assert_eq!(get("allow_signup"), Some("false"));
    assert_eq!(get("redirect_uri"), Some("https://example.com/cb"));
    assert!(get("state").is_some_and(|state| !state.is_empty()));
}

#[tokio::test]
async fn callback_shows_token_once() {
    let harness = RouterHarness::new(ClientType::OAuthApp);

    let response = harness
        .expect(OAuthRequest::new(
            Method::GET,
            "/api/github/oauth/callback?code=code123",
        ))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("text/html"));
    assert!(response
        .body
        .as_deref()
        .unwrap()
        .contains("<strong>token-for-code123</strong>"));
    assert_eq!(harness.recorder.keys(), vec!["token.created"]);
}

#[tokio::test]
async fn create_token_strips_client_secret() {
    let harness = RouterHarness::new(ClientType::OAuthApp);

    let response = harness
        .expect(
            OAuthRequest::new(Method::POST, "/api/github/oauth/token")
                .with_body(r#"{"code":"code123","state":"state123","redirectUrl":"https://example.com/cb"}"#),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let body = response.json_body().unwrap();
    assert_eq!(body["authentication"]["token"], json!("token-for-code123"));
    assert_eq!(body["authentication"]["clientId"], json!("0123"));
    assert_eq!(body["authentication"]["clientType"], json!("oauth-app"));
    assert!(body["authentication"].get("clientSecret").is_none());

    assert_eq!(
        harness.provider.calls(),
        vec![ProviderCall::ExchangeWebFlowCode(WebFlowExchange {
            code: "code123".to_string(),
            state: Some("state123".to_string()),
            redirect_url: Some("https://example.com/cb".to_string()),
        })]
    );
}

#[tokio::test]
async fn check_token_uses_authorization_header() {
    let harness = RouterHarness::new(ClientType::OAuthApp);

    let response = harness
        .expect(
            OAuthRequest::new(Method::GET, "/api/github/oauth/token")
                .with_header("authorization", "token ghu_123"),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json_body().unwrap();
    assert_eq!(body["authentication"]["token"], json!("ghu_123"));
    assert!(body["authentication"].get("clientSecret").is_none());
    assert_eq!(
        harness.provider.calls(),
        vec![ProviderCall::CheckToken("ghu_123".to_string())]
    );
    assert!(harness.recorder.is_empty());
}

#[tokio::test]
async fn header_prefix_is_stripped_by_length() {
    let harness = RouterHarness::new(ClientType::OAuthApp);

    harness
        .expect(
            OAuthRequest::new(Method::GET, "/api/github/oauth/token")
                .with_header("authorization", "Bearer ghu_123"),
        )
        .await;

    // "Bearer " is one character longer than "token "
    assert_eq!(
        harness.provider.calls(),
        vec![ProviderCall::CheckToken(" ghu_123".to_string())]
    );
}

#[tokio::test]
async fn reset_token() {
    let harness = RouterHarness::new(ClientType::OAuthApp);

    let response = harness
        .expect(
            OAuthRequest::new(Method::PATCH, "/api/github/oauth/token")
                .with_header("authorization", "token ghu_123"),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json_body().unwrap()["authentication"]["token"],
        json!("reset-ghu_123")
    );
    assert_eq!(harness.recorder.keys(), vec!["token.reset"]);
}

#[tokio::test]
async fn refresh_token() {
    let harness = RouterHarness::new(ClientType::GitHubApp);

    let response = harness
        .expect(
            OAuthRequest::new(Method::PATCH, "/api/github/oauth/refresh-token")
                .with_header("authorization", "token ghu_123")
                .with_body(r#"{"refreshToken":"ghr_123"}"#),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        harness.provider.calls(),
        vec![ProviderCall::RefreshToken("ghr_123".to_string())]
    );
    assert_eq!(harness.recorder.keys(), vec!["token.refreshed"]);
}

#[tokio::test]
async fn scoped_token_merges_header_token_into_body() {
    let harness = RouterHarness::new(ClientType::GitHubApp);

    let response = harness
        .expect(
            OAuthRequest::new(Method::POST, "/api/github/oauth/token/scoped")
                .with_header("authorization", "token ghu_123")
                .with_body(r#"{"target":"octokit","repositories":["oauth-app.js"]}"#),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        harness.provider.calls(),
        vec![ProviderCall::ScopeToken(ScopeTokenOptions {
            token: "ghu_123".to_string(),
            target: Some("octokit".to_string()),
            repositories: Some(vec!["oauth-app.js".to_string()]),
            ..Default::default()
        })]
    );
    assert_eq!(harness.recorder.keys(), vec!["token.scoped"]);
}

#[tokio::test]
async fn delete_token_is_204() {
    let harness = RouterHarness::new(ClientType::OAuthApp);

    let response = harness
        .expect(
            OAuthRequest::new(Method::DELETE, "/api/github/oauth/token")
                .with_header("authorization", "token ghu_123"),
        )
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(response.body, None);
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    assert_eq!(
        harness.recorder.keys(),
        vec!["token.before_deleted", "token.deleted"]
    );
}

#[tokio::test]
async fn delete_grant_is_204() {
    let harness = RouterHarness::new(ClientType::OAuthApp);

    let response = harness
        .expect(
            OAuthRequest::new(Method::DELETE, "/api/github/oauth/grant")
                .with_header("authorization", "token ghu_123"),
        )
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(
        harness.provider.calls(),
        vec![ProviderCall::DeleteAuthorization("ghu_123".to_string())]
    );
    assert_eq!(harness.recorder.len(), 4);
}
