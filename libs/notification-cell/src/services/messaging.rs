// libs/notification-cell/src/services/messaging.rs
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;
use shared_utils::phone::format_phone_number;

use crate::models::{DeliveryMode, DeliveryReceipt, MessagingError, TwilioErrorBody};

/// Outbound SMS and voice calls.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_sms(
        &self,
        to: &str,
        body: &str,
        mode: DeliveryMode,
    ) -> Result<Option<DeliveryReceipt>, MessagingError>;

    async fn make_call(
        &self,
        to: &str,
        twiml_url: &str,
        mode: DeliveryMode,
    ) -> Result<Option<DeliveryReceipt>, MessagingError>;
}

/// Twilio Programmable Messaging / Voice client.
/// POST {base}/Accounts/{sid}/Messages.json and .../Calls.json, form encoded.
pub struct TwilioClient {
    client: Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    base_url: String,
    default_country_code: String,
}

enum Outbound<'a> {
    Sms { body: &'a str },
    Call { twiml_url: &'a str },
}

impl Outbound<'_> {
    fn resource(&self) -> &'static str {
        match self {
            Outbound::Sms { .. } => "Messages.json",
            Outbound::Call { .. } => "Calls.json",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Outbound::Sms { .. } => "SMS",
            Outbound::Call { .. } => "Call",
        }
    }
}

impl TwilioClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.twilio_phone_number.clone(),
            base_url: config.twilio_api_base_url.trim_end_matches('/').to_string(),
            default_country_code: config.default_country_code.clone(),
        }
    }

    fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty() && !self.from_number.is_empty()
    }

    async fn dispatch(
        &self,
        to: &str,
        outbound: Outbound<'_>,
        mode: DeliveryMode,
    ) -> Result<Option<DeliveryReceipt>, MessagingError> {
        let content = match &outbound {
            Outbound::Sms { body } => *body,
            Outbound::Call { twiml_url } => *twiml_url,
        };

        if to.trim().is_empty() || content.trim().is_empty() {
            warn!("{} not sent: missing phone number or content", outbound.describe());
            return Ok(None);
        }

        if !self.is_configured() {
            warn!("{} to {} skipped: Twilio credentials not configured", outbound.describe(), to);
            return settle(MessagingError::NotConfigured, mode);
        }

        let formatted = match format_phone_number(to, &self.default_country_code) {
            Some(number) => number,
            None => {
                error!("Invalid phone number format: {}. {} not sent.", to, outbound.describe());
                return settle(MessagingError::InvalidPhoneNumber(to.to_string()), mode);
            }
        };

        let url = format!("{}/Accounts/{}/{}", self.base_url, self.account_sid, outbound.resource());
        let mut params = vec![
            ("To", formatted.as_str()),
            ("From", self.from_number.as_str()),
        ];
        match &outbound {
            Outbound::Sms { body } => params.push(("Body", *body)),
            Outbound::Call { twiml_url } => params.push(("Url", *twiml_url)),
        }

        debug!("Sending {} request to {}", outbound.describe(), url);

        let result = self.client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                error!("Error sending {} to {} (raw: {}): {}", outbound.describe(), formatted, to, e);
                return settle(MessagingError::from(e), mode);
            }
        };

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let body: Option<TwilioErrorBody> = serde_json::from_str(&text).ok();
            let failure = MessagingError::Provider {
                status: status.as_u16(),
                code: body.as_ref().and_then(|b| b.code),
                message: body.as_ref()
                    .and_then(|b| b.message.clone())
                    .unwrap_or_else(|| text.clone()),
                more_info: body.and_then(|b| b.more_info),
            };

            error!("Error sending {} to {} (raw: {}): HTTP {}", outbound.describe(), formatted, to, status);
            if let MessagingError::Provider { code: Some(code), more_info, .. } = &failure {
                error!("Twilio Error Code: {} - {}", code, more_info.as_deref().unwrap_or(""));
            }
            return settle(failure, mode);
        }

        match serde_json::from_str::<DeliveryReceipt>(&text) {
            Ok(receipt) => {
                info!("{} sent successfully to {}: {}", outbound.describe(), formatted, receipt.sid);
                Ok(Some(receipt))
            }
            Err(e) => {
                error!("Unreadable Twilio response for {} to {}: {}", outbound.describe(), formatted, e);
                settle(MessagingError::Transport(e.to_string()), mode)
            }
        }
    }
}

fn settle(err: MessagingError, mode: DeliveryMode) -> Result<Option<DeliveryReceipt>, MessagingError> {
    match mode {
        DeliveryMode::BestEffort => Ok(None),
        DeliveryMode::Strict => Err(err),
    }
}

#[async_trait]
impl Messenger for TwilioClient {
    async fn send_sms(
        &self,
        to: &str,
        body: &str,
        mode: DeliveryMode,
    ) -> Result<Option<DeliveryReceipt>, MessagingError> {
        self.dispatch(to, Outbound::Sms { body }, mode).await
    }

    async fn make_call(
        &self,
        to: &str,
        twiml_url: &str,
        mode: DeliveryMode,
    ) -> Result<Option<DeliveryReceipt>, MessagingError> {
        self.dispatch(to, Outbound::Call { twiml_url }, mode).await
    }
}
