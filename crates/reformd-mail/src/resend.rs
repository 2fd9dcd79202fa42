//! [`Notifier`] over the Resend HTTP API.
//!
//! Credentials are checked per send rather than at startup, so a
//! deployment without them still accepts signups and reports the gap
//! on the first email it tries to send.

use std::time::Duration;

use reformd_core::error::ReformdResult;
use reformd_core::notifier::{Delivery, Notifier, OutgoingEmail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MailError;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: Option<String>,
    /// Verified sender, e.g. `Re:Formd <hello@getreformd.com>`.
    pub from: Option<String>,
    pub endpoint: String,
    /// Per-request timeout in seconds (default: 5).
    pub timeout_secs: u64,
}

impl Default for ResendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from: None,
            endpoint: RESEND_ENDPOINT.into(),
            timeout_secs: 5,
        }
    }
}

impl ResendConfig {
    pub fn is_configured(&self) -> bool {
        present(&self.api_key).is_some() && present(&self.from).is_some()
    }
}

#[derive(Debug, Serialize)]
struct ResendSendEmailBody<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResendSendEmailResponse {
    id: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn require<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str, MailError> {
    present(value).ok_or(MailError::NotConfigured(key))
}

/// Interpret Resend's reply. Anything without a message id is a failed
/// delivery.
fn delivery_from_response(status: u16, body: &str) -> Delivery {
    if !(200..=299).contains(&status) {
        return Delivery::Failed {
            reason: format!("Resend send failed (status={status}): {body}"),
        };
    }

    match serde_json::from_str::<ResendSendEmailResponse>(body) {
        Ok(ResendSendEmailResponse { id: Some(id) }) if !id.is_empty() => Delivery::Sent { id },
        _ => Delivery::Failed {
            reason: format!("Resend response carried no message id: {body}"),
        },
    }
}

/// Resend-backed notifier.
#[derive(Clone)]
pub struct ResendNotifier {
    client: reqwest::Client,
    config: ResendConfig,
}

impl ResendNotifier {
    pub fn new(config: ResendConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Reformd-Waitlist/0.1")
            .build()?;
        Ok(Self { client, config })
    }
}

impl Notifier for ResendNotifier {
    async fn send(&self, email: OutgoingEmail) -> ReformdResult<Delivery> {
        let api_key = require(&self.config.api_key, "RESEND_API_KEY")?;
        let from = require(&self.config.from, "RESEND_FROM")?;

        let body = ResendSendEmailBody {
            from,
            to: vec![email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
        };

        let response = match self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Ok(Delivery::Failed {
                    reason: format!("Resend request failed: {e}"),
                });
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return Ok(Delivery::Failed {
                    reason: format!("Resend response body unreadable (status={status}): {e}"),
                });
            }
        };
        debug!(status, "Resend responded");

        Ok(delivery_from_response(status, &text))
    }
}
