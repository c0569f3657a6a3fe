use std::env;
use tracing::warn;

pub const DEFAULT_TWILIO_API_BASE_URL: &str = "https://api.twilio.com/2010-04-01";
pub const DEFAULT_COUNTRY_CODE: &str = "91";
pub const DEFAULT_REMINDER_LEAD_MINUTES: i64 = 10;
pub const MAX_REMINDER_LEAD_MINUTES: i64 = 24 * 60;
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_phone_number: String,
    pub twilio_recorded_call_url: String,
    pub twilio_api_base_url: String,
    pub default_country_code: String,
    pub reminder_lead_minutes: i64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: required_var("SUPABASE_URL"),
            supabase_anon_key: required_var("SUPABASE_ANON_PUBLIC_KEY"),
            supabase_jwt_secret: required_var("SUPABASE_JWT_SECRET"),
            twilio_account_sid: required_var("TWILIO_ACCOUNT_SID"),
            twilio_auth_token: required_var("TWILIO_AUTH_TOKEN"),
            twilio_phone_number: required_var("TWILIO_PHONE_NUMBER"),
            twilio_recorded_call_url: required_var("TWILIO_RECORDED_CALL_URL"),
            twilio_api_base_url: env::var("TWILIO_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_TWILIO_API_BASE_URL.to_string()),
            default_country_code: env::var("DEFAULT_COUNTRY_CODE")
                .unwrap_or_else(|_| DEFAULT_COUNTRY_CODE.to_string()),
            reminder_lead_minutes: lead_minutes_or_default(
                parsed_var("REMINDER_LEAD_MINUTES", DEFAULT_REMINDER_LEAD_MINUTES),
            ),
            port: parsed_var("PORT", DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        if !config.is_messaging_configured() {
            warn!("Twilio messaging not configured - SMS and reminder calls will be skipped");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    /// Reminder lead in minutes, always within `0..=MAX_REMINDER_LEAD_MINUTES`.
    pub fn reminder_lead(&self) -> i64 {
        if is_valid_lead(self.reminder_lead_minutes) {
            self.reminder_lead_minutes
        } else {
            DEFAULT_REMINDER_LEAD_MINUTES
        }
    }

    pub fn is_messaging_configured(&self) -> bool {
        !self.twilio_account_sid.is_empty()
            && !self.twilio_auth_token.is_empty()
            && !self.twilio_phone_number.is_empty()
    }
}

fn required_var(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", name);
        String::new()
    })
}

fn is_valid_lead(minutes: i64) -> bool {
    (0..=MAX_REMINDER_LEAD_MINUTES).contains(&minutes)
}

fn lead_minutes_or_default(minutes: i64) -> i64 {
    if is_valid_lead(minutes) {
        return minutes;
    }
    warn!(
        "REMINDER_LEAD_MINUTES {} outside 0..={}, using default {}",
        minutes, MAX_REMINDER_LEAD_MINUTES, DEFAULT_REMINDER_LEAD_MINUTES
    );
    DEFAULT_REMINDER_LEAD_MINUTES
}

fn parsed_var<T: std::str::FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_var_falls_back_on_garbage() {
        env::set_var("CARELINK_TEST_LEAD", "not-a-number");
        assert_eq!(parsed_var("CARELINK_TEST_LEAD", 10i64), 10);
        env::set_var("CARELINK_TEST_LEAD", "25");
        assert_eq!(parsed_var("CARELINK_TEST_LEAD", 10i64), 25);
        env::remove_var("CARELINK_TEST_LEAD");
    }

    #[test]
    fn test_out_of_range_reminder_lead_uses_default() {
        assert_eq!(lead_minutes_or_default(30), 30);
        assert_eq!(lead_minutes_or_default(0), 0);
        assert_eq!(lead_minutes_or_default(-5), DEFAULT_REMINDER_LEAD_MINUTES);
        assert_eq!(lead_minutes_or_default(i64::MAX / 10), DEFAULT_REMINDER_LEAD_MINUTES);
    }

    #[test]
    fn test_messaging_configuration_requires_all_credentials() {
        let mut config = AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "anon".to_string(),
            supabase_jwt_secret: "secret".to_string(),
            twilio_account_sid: "AC123".to_string(),
            twilio_auth_token: "token".to_string(),
            twilio_phone_number: "+15005550006".to_string(),
            twilio_recorded_call_url: String::new(),
            twilio_api_base_url: DEFAULT_TWILIO_API_BASE_URL.to_string(),
            default_country_code: DEFAULT_COUNTRY_CODE.to_string(),
            reminder_lead_minutes: DEFAULT_REMINDER_LEAD_MINUTES,
            port: DEFAULT_PORT,
        };
        assert!(config.is_configured());
        assert!(config.is_messaging_configured());

        config.twilio_auth_token.clear();
        assert!(!config.is_messaging_configured());

        assert_eq!(config.reminder_lead(), DEFAULT_REMINDER_LEAD_MINUTES);
        config.reminder_lead_minutes = i64::MAX / 10;
        assert_eq!(config.reminder_lead(), DEFAULT_REMINDER_LEAD_MINUTES);
        config.reminder_lead_minutes = 45;
        assert_eq!(config.reminder_lead(), 45);
    }
}
