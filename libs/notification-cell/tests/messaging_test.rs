use assert_matches::assert_matches;
use serde_json::json;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{body_string_contains, header_exists, method, path};

use notification_cell::models::{DeliveryMode, MessagingError};
use notification_cell::services::{Messenger, TwilioClient};
use shared_utils::test_utils::{MockStoreRows, TestConfig};

const MESSAGES_PATH: &str = "/Accounts/AC_test_account/Messages.json";
const CALLS_PATH: &str = "/Accounts/AC_test_account/Calls.json";

#[tokio::test]
async fn test_send_sms_formats_number_and_returns_sid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .and(header_exists("authorization"))
        .and(body_string_contains("To=%2B919876543210"))
        .and(body_string_contains("Body=Your+appointment+is+confirmed"))
        .respond_with(ResponseTemplate::new(201).set_body_json(MockStoreRows::twilio_resource("SM123")))
        .expect(1)
        .mount(&server)
        .await;

    let client = TwilioClient::new(&TestConfig::with_mock_server(&server.uri()).to_app_config());
    let receipt = client
        .send_sms("098765 43210", "Your appointment is confirmed", DeliveryMode::BestEffort)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(receipt.sid, "SM123");
}

#[tokio::test]
async fn test_make_call_posts_twiml_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CALLS_PATH))
        .and(body_string_contains("Url=https%3A%2F%2Fexample.com%2Freminder.xml"))
        .respond_with(ResponseTemplate::new(201).set_body_json(MockStoreRows::twilio_resource("CA42")))
        .expect(1)
        .mount(&server)
        .await;

    let client = TwilioClient::new(&TestConfig::with_mock_server(&server.uri()).to_app_config());
    let receipt = client
        .make_call("+919876543210", "https://example.com/reminder.xml", DeliveryMode::Strict)
        .await
        .unwrap();

    assert_eq!(receipt.map(|r| r.sid), Some("CA42".to_string()));
}

#[tokio::test]
async fn test_invalid_number_never_reaches_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let client = TwilioClient::new(&TestConfig::with_mock_server(&server.uri()).to_app_config());

    let best_effort = client.send_sms("12345", "hello", DeliveryMode::BestEffort).await;
    assert_matches!(best_effort, Ok(None));

    let strict = client.send_sms("12345", "hello", DeliveryMode::Strict).await;
    assert_matches!(strict, Err(MessagingError::InvalidPhoneNumber(n)) if n == "12345");
}

#[tokio::test]
async fn test_missing_input_is_skipped() {
    let server = MockServer::start().await;
    let client = TwilioClient::new(&TestConfig::with_mock_server(&server.uri()).to_app_config());

    assert_matches!(client.send_sms("", "hello", DeliveryMode::Strict).await, Ok(None));
    assert_matches!(client.send_sms("9876543210", "  ", DeliveryMode::Strict).await, Ok(None));
    assert_matches!(client.make_call("9876543210", "", DeliveryMode::BestEffort).await, Ok(None));
    assert_matches!(client.make_call("", "https://example.com/reminder.xml", DeliveryMode::Strict).await, Ok(None));
}

#[tokio::test]
async fn test_provider_error_carries_twilio_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 21211,
            "message": "The 'To' number is not a valid phone number.",
            "more_info": "https://www.twilio.com/docs/errors/21211",
            "status": 400
        })))
        .mount(&server)
        .await;

    let client = TwilioClient::new(&TestConfig::with_mock_server(&server.uri()).to_app_config());

    let strict = client.send_sms("9876543210", "hello", DeliveryMode::Strict).await;
    assert_matches!(strict, Err(MessagingError::Provider { status: 400, code: Some(21211), .. }));

    let best_effort = client.send_sms("9876543210", "hello", DeliveryMode::BestEffort).await;
    assert_matches!(best_effort, Ok(None));
}

#[tokio::test]
async fn test_unconfigured_client_skips_delivery() {
    let mut config = TestConfig::default().to_app_config();
    config.twilio_account_sid.clear();

    let client = TwilioClient::new(&config);
    assert_matches!(
        client.send_sms("9876543210", "hello", DeliveryMode::Strict).await,
        Err(MessagingError::NotConfigured)
    );
}
