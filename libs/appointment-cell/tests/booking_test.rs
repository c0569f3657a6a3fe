// libs/appointment-cell/tests/booking_test.rs
// Service-level checks for the side effects of booking: reminder calls and status SMS.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Local};
use serde_json::json;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};

use appointment_cell::models::{AppointmentStatus, CreateAppointmentRequest, DoctorChoice, UpdateAppointmentRequest};
use appointment_cell::AppointmentBookingService;
use notification_cell::{DeliveryMode, DeliveryReceipt, Messenger, MessagingError};
use shared_utils::test_utils::{MockStoreRows, TestConfig, TestUser};

#[derive(Default)]
struct RecordingMessenger {
    sms: Mutex<Vec<(String, String)>>,
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_sms(&self, to: &str, body: &str, _mode: DeliveryMode) -> Result<Option<DeliveryReceipt>, MessagingError> {
        self.sms.lock().unwrap().push((to.to_string(), body.to_string()));
        Ok(Some(DeliveryReceipt { sid: "SM1".to_string(), status: None }))
    }

    async fn make_call(&self, to: &str, _twiml_url: &str, _mode: DeliveryMode) -> Result<Option<DeliveryReceipt>, MessagingError> {
        self.calls.lock().unwrap().push(to.to_string());
        Ok(Some(DeliveryReceipt { sid: "CA1".to_string(), status: None }))
    }
}

async fn mount_booking_store(server: &MockServer, user: &TestUser, patient_id: &str, doctor_id: &str, hospital_id: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::patient_row(patient_id, &user.id, "Asha Menon", None)
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::doctor_row(doctor_id, &Uuid::new_v4().to_string(), hospital_id, "Priya Raman", true)
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::user_row(&user.id, "Asha Menon", "Patient", Some("9876543210"))
        ])))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::notification_row(&Uuid::new_v4().to_string(), patient_id, "Patient", false)
        ])))
        .mount(server)
        .await;
}

async fn mount_insert(server: &MockServer, patient_id: &str, doctor_id: &str, hospital_id: &str, date: &str, time: &str) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::appointment_row(&Uuid::new_v4().to_string(), patient_id, doctor_id, hospital_id, date, time, "Pending", 1)
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_future_booking_schedules_reminder_call() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let user = TestUser::patient("asha@example.com");
    let (patient_id, doctor_id, hospital_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let date = Local::now().date_naive() + Duration::days(2);

    mount_booking_store(&server, &user, &patient_id.to_string(), &doctor_id.to_string(), &hospital_id.to_string()).await;
    mount_insert(&server, &patient_id.to_string(), &doctor_id.to_string(), &hospital_id.to_string(), &date.to_string(), "10:00").await;

    let messenger = Arc::new(RecordingMessenger::default());
    let service = AppointmentBookingService::with_messenger(&config, messenger.clone());

    let request = CreateAppointmentRequest {
        doctor_id: DoctorChoice::Doctor(doctor_id),
        hospital_id,
        date,
        time: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        reason: None,
        specialty: None,
        for_family_member_id: None,
    };

    let outcome = service.create(&user.to_user(), request, "test-token").await.unwrap();

    let reminder = outcome.reminder.expect("reminder should be scheduled for a future visit");
    assert!(!reminder.is_finished());
    assert!(messenger.calls.lock().unwrap().is_empty());
    reminder.abort();
}

#[tokio::test]
async fn test_past_booking_skips_reminder() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let user = TestUser::patient("asha@example.com");
    let (patient_id, doctor_id, hospital_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let date = Local::now().date_naive() - Duration::days(1);

    mount_booking_store(&server, &user, &patient_id.to_string(), &doctor_id.to_string(), &hospital_id.to_string()).await;
    mount_insert(&server, &patient_id.to_string(), &doctor_id.to_string(), &hospital_id.to_string(), &date.to_string(), "10:00").await;

    let messenger = Arc::new(RecordingMessenger::default());
    let service = AppointmentBookingService::with_messenger(&config, messenger.clone());

    let request = CreateAppointmentRequest {
        doctor_id: DoctorChoice::Doctor(doctor_id),
        hospital_id,
        date,
        time: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        reason: Some("Follow-up".to_string()),
        specialty: None,
        for_family_member_id: None,
    };

    let outcome = service.create(&user.to_user(), request, "test-token").await.unwrap();

    assert!(outcome.reminder.is_none());
    assert_eq!(outcome.appointment.status, AppointmentStatus::Pending);
}

#[tokio::test]
async fn test_status_change_texts_both_parties() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let admin = TestUser::admin("admin@example.com");
    let (appointment_id, patient_id, doctor_id, hospital_id) =
        (Uuid::new_v4().to_string(), Uuid::new_v4().to_string(), Uuid::new_v4().to_string(), Uuid::new_v4().to_string());

    let mut row = MockStoreRows::appointment_row(&appointment_id, &patient_id, &doctor_id, &hospital_id, "2025-10-14", "10:30", "Pending", 2);
    row["patient"] = json!({
        "id": patient_id, "user_id": Uuid::new_v4(), "patient_id": "PAT-0002", "name": "Meera Menon",
        "user": { "name": "Asha Menon", "phone_number": "9876543210" }
    });
    row["doctor"] = json!({
        "id": doctor_id, "user_id": Uuid::new_v4(), "specialty": "Cardiology",
        "user": { "name": "Priya Raman", "phone_number": "+14155550100" }
    });
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::appointment_row(&appointment_id, &patient_id, &doctor_id, &hospital_id, "2025-10-14", "10:30", "Cancelled", 2)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::notification_row(&Uuid::new_v4().to_string(), &patient_id, "Patient", false)
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let messenger = Arc::new(RecordingMessenger::default());
    let service = AppointmentBookingService::with_messenger(&config, messenger.clone());

    let request = UpdateAppointmentRequest {
        status: Some(AppointmentStatus::Cancelled),
        ..Default::default()
    };
    let outcome = service
        .update(Uuid::parse_str(&appointment_id).unwrap(), &admin.to_user(), request, "test-token")
        .await
        .unwrap();

    for task in outcome.sms_tasks {
        task.await.unwrap();
    }

    let sms = messenger.sms.lock().unwrap();
    assert_eq!(sms.len(), 2);
    assert!(sms.contains(&(
        "9876543210".to_string(),
        "Hello Asha Menon, your appointment with Dr. Priya Raman on Tue Oct 14 2025 at 10:30 has been Cancelled.".to_string()
    )));
    assert!(sms.contains(&(
        "+14155550100".to_string(),
        "Hello Dr. Priya Raman, the appointment for Meera Menon (ID: PAT-0002) on Tue Oct 14 2025 at 10:30 has been Cancelled.".to_string()
    )));
}

#[tokio::test]
async fn test_unchanged_status_sends_nothing() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let admin = TestUser::admin("admin@example.com");
    let (appointment_id, patient_id, doctor_id, hospital_id) =
        (Uuid::new_v4().to_string(), Uuid::new_v4().to_string(), Uuid::new_v4().to_string(), Uuid::new_v4().to_string());

    let row = MockStoreRows::appointment_row(&appointment_id, &patient_id, &doctor_id, &hospital_id, "2025-10-14", "10:30", "Confirmed", 2);
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row.clone()])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let messenger = Arc::new(RecordingMessenger::default());
    let service = AppointmentBookingService::with_messenger(&config, messenger.clone());

    let request = UpdateAppointmentRequest {
        status: Some(AppointmentStatus::Confirmed),
        reason: Some("Rescheduled by phone".to_string()),
        ..Default::default()
    };
    let outcome = service
        .update(Uuid::parse_str(&appointment_id).unwrap(), &admin.to_user(), request, "test-token")
        .await
        .unwrap();

    assert!(outcome.sms_tasks.is_empty());
    assert!(messenger.sms.lock().unwrap().is_empty());
}
