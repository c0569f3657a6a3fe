use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub twilio_api_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            twilio_api_base_url: "http://localhost:54322".to_string(),
        }
    }
}

impl TestConfig {
    /// Point both the record store and the messaging API at one mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            twilio_api_base_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            twilio_account_sid: "AC_test_account".to_string(),
            twilio_auth_token: "twilio-test-token".to_string(),
            twilio_phone_number: "+15005550006".to_string(),
            twilio_recorded_call_url: "https://example.com/reminder.xml".to_string(),
            twilio_api_base_url: self.twilio_api_base_url.clone(),
            default_country_code: "91".to_string(),
            reminder_lead_minutes: 10,
            port: 5000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "Patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "Doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "Patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "Admin")
    }

    pub fn lab(email: &str) -> Self {
        Self::new(email, "Lab")
    }

    pub fn shop(email: &str) -> Self {
        Self::new(email, "Shop")
    }

    pub fn uuid(&self) -> Uuid {
        Uuid::parse_str(&self.id).unwrap_or_default()
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "user_metadata": { "role": user.role },
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned PostgREST rows shaped like the platform tables.
pub struct MockStoreRows;

impl MockStoreRows {
    pub fn user_row(user_id: &str, name: &str, role: &str, phone: Option<&str>) -> serde_json::Value {
        json!({
            "id": user_id,
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            "phone_number": phone,
            "role": role,
            "profile_picture": null,
            "status": "Active",
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn patient_row(patient_id: &str, user_id: &str, name: &str, primary_patient_id: Option<&str>) -> serde_json::Value {
        json!({
            "id": patient_id,
            "user_id": user_id,
            "patient_id": "PAT-0001",
            "name": name,
            "dob": "1990-05-17",
            "gender": "Female",
            "blood_group": "O+",
            "is_premium": false,
            "primary_patient_id": primary_patient_id,
            "relationship": null,
            "profile_picture": null,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn doctor_row(doctor_id: &str, user_id: &str, hospital_id: &str, name: &str, is_available: bool) -> serde_json::Value {
        json!({
            "id": doctor_id,
            "user_id": user_id,
            "hospital_id": hospital_id,
            "specialty": "Cardiology",
            "qualifications": ["MBBS", "MD"],
            "average_rating": 4.5,
            "number_of_reviews": 12,
            "is_available": is_available,
            "consultation_start": "09:00",
            "consultation_end": "12:00",
            "slot_duration_minutes": 30,
            "working_days": ["Mon", "Tue", "Wed", "Thu", "Fri"],
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z",
            "user": { "name": name, "phone_number": "9876543210", "profile_picture": null }
        })
    }

    pub fn hospital_row(hospital_id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": hospital_id,
            "name": name,
            "location": "Kochi",
            "phone": null,
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn appointment_row(
        appointment_id: &str,
        patient_id: &str,
        doctor_id: &str,
        hospital_id: &str,
        date: &str,
        time: &str,
        status: &str,
        token_number: i32,
    ) -> serde_json::Value {
        json!({
            "id": appointment_id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "hospital_id": hospital_id,
            "date": date,
            "time": time,
            "reason": "Chest pain",
            "status": status,
            "token_number": token_number,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn notification_row(notification_id: &str, recipient_id: &str, on_model: &str, is_read: bool) -> serde_json::Value {
        json!({
            "id": notification_id,
            "recipient_id": recipient_id,
            "on_model": on_model,
            "title": "Appointment Created",
            "message": "Your appointment is pending.",
            "category": "Appointment",
            "link": null,
            "is_read": is_read,
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn lab_row(lab_id: &str, user_id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": lab_id,
            "user_id": user_id,
            "name": name,
            "lab_id": "LAB-001",
            "address": "MG Road",
            "phone": "9876543210",
            "email": "lab@example.com",
            "website": null,
            "hospital_id": null,
            "tests_offered": [
                { "test_name": "Complete Blood Count", "test_type": "Blood", "price": 350.0 },
                { "test_name": "Lipid Profile", "test_type": "Blood", "price": 600.0 }
            ],
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn lab_order_row(order_id: &str, patient_id: &str, lab_id: &str, test_name: &str, status: &str) -> serde_json::Value {
        json!({
            "id": order_id,
            "patient_id": patient_id,
            "lab_id": lab_id,
            "test_name": test_name,
            "test_type": "Blood",
            "price": 600.0,
            "order_date": "2025-03-10T09:00:00Z",
            "status": status,
            "report_url": null,
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn shop_row(shop_id: &str, user_id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": shop_id,
            "user_id": user_id,
            "name": name,
            "license_number": "KL-PH-2291",
            "address": "Broadway, Kochi",
            "phone": "9876543210",
            "email": "shop@example.com",
            "plan": "basic",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn staff_row(staff_id: &str, shop_id: &str, name: &str, role: &str) -> serde_json::Value {
        json!({
            "id": staff_id,
            "shop_id": shop_id,
            "name": name,
            "role": role,
            "email": null,
            "phone": null,
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn twilio_resource(sid: &str) -> serde_json::Value {
        json!({
            "sid": sid,
            "status": "queued"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::validate_token;
    use shared_models::auth::Role;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::with_mock_server("http://127.0.0.1:9999");
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://127.0.0.1:9999");
        assert_eq!(app_config.twilio_api_base_url, "http://127.0.0.1:9999");
        assert!(app_config.is_configured());
        assert!(app_config.is_messaging_configured());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor("doc@example.com");
        assert_eq!(user.role, "Doctor");

        let user_model = user.to_user();
        assert_eq!(user_model.id, user.id);
        assert!(user_model.has_role(Role::Doctor));
    }

    #[test]
    fn test_token_round_trips_through_validation() {
        let user = TestUser::lab("lab@example.com");
        let secret = "test-secret";
        let token = JwtTestUtils::create_test_token(&user, secret, Some(1));

        let validated = validate_token(&token, secret).unwrap();
        assert_eq!(validated.id, user.id);
        assert_eq!(validated.platform_role(), Some(Role::Lab));
    }

    #[test]
    fn test_rejected_tokens() {
        let user = TestUser::default();
        let secret = "test-secret";

        assert_eq!(
            validate_token(&JwtTestUtils::create_expired_token(&user, secret), secret).unwrap_err(),
            "Token expired"
        );
        assert_eq!(
            validate_token(&JwtTestUtils::create_invalid_signature_token(&user), secret).unwrap_err(),
            "Invalid token signature"
        );
        assert!(validate_token(&JwtTestUtils::create_malformed_token(), secret).is_err());
        assert_eq!(validate_token("a.b", secret).unwrap_err(), "Invalid token format");
    }
}
