//! End-to-end tests for account registration, login and logout.

mod common;

use common::{TestClient, TestServer, TEST_EMAIL, TEST_PASS, TEST_USER};
use reqwest::StatusCode;

#[tokio::test]
async fn register_login_logout_lifecycle() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.register(TEST_USER, TEST_EMAIL, TEST_PASS).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client.login(TEST_USER, TEST_PASS).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], TEST_USER);
    assert_eq!(body["roles"], serde_json::json!(["user"]));
    let token = body["token"].as_str().unwrap();
    assert_eq!(token.len(), 64);

    // The cookie store now carries the session, logout works.
    let response = client.logout().await;
    assert_eq!(response.status(), StatusCode::OK);

    // The token is gone, a second logout has no session to present.
    let response = client.logout().await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_username_and_email_are_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.register(TEST_USER, TEST_EMAIL, TEST_PASS).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .register(TEST_USER, "other@example.com", TEST_PASS)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().contains("taken"));

    let response = client.register("otheruser", TEST_EMAIL, TEST_PASS).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().contains("registered"));
}

#[tokio::test]
async fn login_with_bad_credentials_is_unauthorized() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.register(TEST_USER, TEST_EMAIL, TEST_PASS).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client.login(TEST_USER, "wrong password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client.login("nosuchuser", TEST_PASS).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_with_missing_fields_is_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.register("", TEST_EMAIL, TEST_PASS).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.register(TEST_USER, TEST_EMAIL, "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn session_token_works_via_authorization_header() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    client.register(TEST_USER, TEST_EMAIL, TEST_PASS).await;
    let response = client.login(TEST_USER, TEST_PASS).await;
    let body: serde_json::Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    // A cookie-less client presenting the raw token in the header.
    let bare_client = TestClient::new(server.base_url.clone());
    let response = bare_client
        .client
        .post(format!("{}/auth/logout", bare_client.base_url))
        .header("Authorization", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn core_endpoints_are_open_without_a_session() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    assert_eq!(client.list_songs().await.status(), StatusCode::OK);
    assert_eq!(
        client.emotion_statistics().await.status(),
        StatusCode::OK
    );
    assert_eq!(client.get_playlist("happy").await.status(), StatusCode::OK);
    assert_eq!(client.get_identity().await.status(), StatusCode::OK);
    assert_eq!(client.get_metrics().await.status(), StatusCode::OK);
}
