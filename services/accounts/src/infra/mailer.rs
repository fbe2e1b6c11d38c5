use std::time::Duration;

use anyhow::Context as _;
use serde_json::{Value, json};

use endoville_domain::identifier::Identifier;

use crate::domain::repository::NotificationSender;

pub const ZEPTOMAIL_TEMPLATE_URL: &str = "https://api.zeptomail.com/v1.1/email/template";
pub const PRODUCT_NAME: &str = "Endoville Health";
pub const TEAM_NAME: &str = "Endoville Health Team";

#[derive(Debug, Clone)]
pub struct MailSettings {
    /// ZeptoMail `authorization` header value. `None` selects the log-only sender.
    pub api_key: Option<String>,
    pub template_key: Option<String>,
    pub from_address: String,
    pub from_name: String,
    pub timeout: Duration,
}

/// ZeptoMail template sender.
#[derive(Clone)]
struct ZeptoMail {
    client: reqwest::Client,
    api_key: String,
    template_key: String,
    from_address: String,
    from_name: String,
}

impl ZeptoMail {
    /// Template body. `merge_info` fills the OTP template's placeholders.
    fn payload(&self, to: &str, code: &str, name: &str, action: Option<&str>) -> Value {
        json!({
            "mail_template_key": self.template_key,
            "from": { "address": self.from_address, "name": self.from_name },
            "to": [{ "email_address": { "address": to, "name": name } }],
            "merge_info": {
                "name": name,
                "OTP": code,
                "product_name": PRODUCT_NAME,
                "action": action,
                "team": TEAM_NAME,
            },
        })
    }

    fn request(&self, payload: &Value) -> reqwest::Result<reqwest::Request> {
        self.client
            .post(ZEPTOMAIL_TEMPLATE_URL)
            .header("accept", "application/json")
            .header("authorization", &self.api_key)
            .json(payload)
            .build()
    }

    async fn send(&self, to: &str, code: &str, name: &str, action: Option<&str>) -> bool {
        let payload = self.payload(to, code, name, action);
        let result = match self.request(&payload) {
            Ok(request) => self
                .client
                .execute(request)
                .await
                .and_then(reqwest::Response::error_for_status),
            Err(e) => Err(e),
        };
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "ZeptoMail template send failed");
                false
            }
        }
    }
}

#[derive(Clone)]
enum EmailChannel {
    ZeptoMail(ZeptoMail),
    /// Development sender: writes the code to the log.
    Log,
}

/// Routes OTPs to email (ZeptoMail or log) or to the SMS stub.
#[derive(Clone)]
pub struct OtpNotifier {
    email: EmailChannel,
}

impl OtpNotifier {
    pub fn new(settings: &MailSettings) -> anyhow::Result<Self> {
        let email = match (&settings.api_key, &settings.template_key) {
            (Some(api_key), Some(template_key)) => EmailChannel::ZeptoMail(ZeptoMail {
                client: reqwest::Client::builder()
                    .timeout(settings.timeout)
                    .build()
                    .context("build mail client")?,
                api_key: api_key.clone(),
                template_key: template_key.clone(),
                from_address: settings.from_address.clone(),
                from_name: settings.from_name.clone(),
            }),
            (Some(_), None) => {
                tracing::warn!("ZEPTOMAIL_OTP_TEMPLATE_KEY unset, OTP emails go to the log");
                EmailChannel::Log
            }
            (None, _) => EmailChannel::Log,
        };
        Ok(Self { email })
    }

    pub fn log_only() -> Self {
        Self {
            email: EmailChannel::Log,
        }
    }

    async fn send_email(&self, to: &str, code: &str, name: &str, action: Option<&str>) -> bool {
        match &self.email {
            EmailChannel::ZeptoMail(zeptomail) => zeptomail.send(to, code, name, action).await,
            EmailChannel::Log => {
                tracing::info!(to, code, name, "OTP email (log sender)");
                true
            }
        }
    }
}

// TODO: replace with a real SMS provider once one is contracted.
fn send_sms(phone: &str, code: &str) -> bool {
    tracing::info!(phone, code, "OTP SMS (stub)");
    true
}

impl NotificationSender for OtpNotifier {
    async fn send_otp(
        &self,
        to: &Identifier,
        code: &str,
        display_name: &str,
        action: Option<&str>,
    ) -> bool {
        match to {
            Identifier::Email(email) => self.send_email(email, code, display_name, action).await,
            Identifier::Phone(phone) => send_sms(phone, code),
        }
    }
}
