use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};

use auth_cell::auth_routes;
use shared_utils::test_utils::{JwtTestUtils, MockStoreRows, TestConfig, TestUser};

async fn post(app: axum::Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_validate_endpoint() {
    let config = TestConfig::default();
    let user = TestUser::patient("asha@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    let (status, body) = post(auth_routes(config.to_arc()), "/validate", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["user_id"], user.id);
    assert_eq!(body["role"], "Patient");
}

#[tokio::test]
async fn test_validate_endpoint_without_token() {
    let (status, body) = post(auth_routes(TestConfig::default().to_arc()), "/validate", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing authorization header");
}

#[tokio::test]
async fn test_verify_endpoint_with_bad_token() {
    let (status, body) = post(
        auth_routes(TestConfig::default().to_arc()),
        "/verify",
        Some(&JwtTestUtils::create_malformed_token()),
    ).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "valid": false }));
}

#[tokio::test]
async fn test_profile_endpoint_requires_token() {
    let (status, _) = post(auth_routes(TestConfig::default().to_arc()), "/profile", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_endpoint_rejects_expired_token() {
    let config = TestConfig::default();
    let token = JwtTestUtils::create_expired_token(&TestUser::default(), &config.jwt_secret);

    let (status, body) = post(auth_routes(config.to_arc()), "/profile", Some(&token)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token expired");
}

#[tokio::test]
async fn test_profile_endpoint_for_patient() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri());
    let user = TestUser::patient("asha@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));
    let patient_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::user_row(&user.id, "Asha Menon", "Patient", Some("9876543210"))
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("primary_patient_id", "is.null"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::patient_row(&patient_id, &user.id, "Asha Menon", None)
        ])))
        .mount(&server)
        .await;

    let (status, body) = post(auth_routes(config.to_arc()), "/profile", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Asha Menon");
    assert_eq!(body["profile"]["id"], patient_id);
}

#[tokio::test]
async fn test_profile_endpoint_unknown_user() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri());
    let user = TestUser::doctor("doc@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (status, body) = post(auth_routes(config.to_arc()), "/profile", Some(&token)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, _) = post(auth_routes(TestConfig::default().to_arc()), "/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
