use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{extract::{Extension, State}, http::{HeaderMap, HeaderValue}};
use axum_extra::TypedHeader;
use headers::Authorization;
use serde_json::json;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{header, method, path, query_param};

use auth_cell::handlers::{get_profile, validate_token, verify_token};
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, MockStoreRows, TestConfig, TestUser};

fn create_test_config() -> Arc<AppConfig> {
    TestConfig::default().to_arc()
}

fn create_auth_header(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}

#[tokio::test]
async fn test_validate_token_success() {
    let config = create_test_config();
    let user = TestUser::doctor("doc@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let response = validate_token(State(config), create_auth_header(&token)).await.unwrap().0;

    assert!(response.valid);
    assert_eq!(response.user_id, user.id);
    assert_eq!(response.email, Some(user.email));
    assert_eq!(response.role, Some("Doctor".to_string()));
}

#[tokio::test]
async fn test_validate_token_missing_header() {
    let result = validate_token(State(create_test_config()), HeaderMap::new()).await;

    assert_matches!(result, Err(AppError::Auth(msg)) if msg == "Missing authorization header");
}

#[tokio::test]
async fn test_validate_token_without_bearer_prefix() {
    let mut headers = HeaderMap::new();
    headers.insert("authorization", HeaderValue::from_static("Token abc"));

    let result = validate_token(State(create_test_config()), headers).await;

    assert_matches!(result, Err(AppError::Auth(msg)) if msg == "Invalid authorization header format");
}

#[tokio::test]
async fn test_validate_token_expired() {
    let config = create_test_config();
    let token = JwtTestUtils::create_expired_token(&TestUser::default(), &config.supabase_jwt_secret);

    let result = validate_token(State(config), create_auth_header(&token)).await;

    assert_matches!(result, Err(AppError::Auth(msg)) if msg == "Token expired");
}

#[tokio::test]
async fn test_validate_token_invalid_signature() {
    let token = JwtTestUtils::create_invalid_signature_token(&TestUser::default());

    let result = validate_token(State(create_test_config()), create_auth_header(&token)).await;

    assert_matches!(result, Err(AppError::Auth(msg)) if msg == "Invalid token signature");
}

#[tokio::test]
async fn test_verify_token_reports_validity() {
    let config = create_test_config();
    let token = JwtTestUtils::create_test_token(&TestUser::default(), &config.supabase_jwt_secret, Some(1));

    let valid = verify_token(State(config.clone()), create_auth_header(&token)).await.unwrap().0;
    let invalid = verify_token(
        State(config),
        create_auth_header(&JwtTestUtils::create_malformed_token()),
    ).await.unwrap().0;

    assert_eq!(valid, json!({ "valid": true }));
    assert_eq!(invalid, json!({ "valid": false }));
}

#[tokio::test]
async fn test_get_profile_includes_role_record() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_arc();
    let user = TestUser::lab("lab@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    let lab_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::user_row(&user.id, "City Diagnostics", "Lab", Some("9876543210"))
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/labs"))
        .and(query_param("user_id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::lab_row(&lab_id, &user.id, "City Diagnostics")
        ])))
        .mount(&server)
        .await;

    let result = get_profile(
        State(config),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_user()),
    ).await;

    let body = result.unwrap().0;
    assert_eq!(body["user_id"], user.id);
    assert_eq!(body["user"]["role"], "Lab");
    assert_eq!(body["profile"]["id"], lab_id);
}

#[tokio::test]
async fn test_get_profile_admin_has_no_role_record() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_arc();
    let user = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::user_row(&user.id, "Site Admin", "Admin", None)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let body = get_profile(
        State(config),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_user()),
    ).await.unwrap().0;

    assert!(body["profile"].is_null());
}

#[tokio::test]
async fn test_get_profile_store_error() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_arc();
    let user = TestUser::patient("asha@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(500).set_body_json(
            MockStoreRows::error_response("Internal server error", "INTERNAL_ERROR")
        ))
        .mount(&server)
        .await;

    let result = get_profile(
        State(config),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_user()),
    ).await;

    assert_matches!(result, Err(AppError::ExternalService(_)));
}
