use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_utils::time::{format_date, format_time};

pub const CONFIRMATION_SUBJECT: &str = "Appointment confirmed";

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("mail relay unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail relay rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConfirmation {
    pub patient_email: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

pub fn confirmation_email_body(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> String {
    format!(
        "<h2>Appointment confirmation</h2>\n\
         <p>Your appointment has been booked.</p>\n\
         <p><strong>Date:</strong> {}</p>\n\
         <p><strong>Start:</strong> {}</p>\n\
         <p><strong>End:</strong> {}</p>\n",
        format_date(date),
        format_time(start),
        format_time(end)
    )
}

/// Best-effort delivery of booking side effects. Callers log failures and move on.
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn notify_booking_confirmed(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotificationError>;
}

/// Posts `{from, to, subject, html}` to an HTTP mail relay.
pub struct MailRelayNotifier {
    client: Client,
    relay_url: String,
    api_key: Option<String>,
    from: String,
}

impl MailRelayNotifier {
    /// `timeout` bounds each relay call, connect through body.
    pub fn new(
        relay_url: impl Into<String>,
        api_key: Option<String>,
        from: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotificationError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            relay_url: relay_url.into(),
            api_key,
            from: from.into(),
        })
    }
}

#[async_trait]
impl BookingNotifier for MailRelayNotifier {
    async fn notify_booking_confirmed(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotificationError> {
        let payload = json!({
            "from": self.from,
            "to": confirmation.patient_email,
            "subject": CONFIRMATION_SUBJECT,
            "html": confirmation_email_body(confirmation.date, confirmation.start_time, confirmation.end_time),
        });

        let mut request = self.client.post(&self.relay_url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Confirmation sent to {}", confirmation.patient_email);
        Ok(())
    }
}

/// Used when no relay is configured.
#[derive(Debug, Default)]
pub struct LogOnlyNotifier;

#[async_trait]
impl BookingNotifier for LogOnlyNotifier {
    async fn notify_booking_confirmed(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotificationError> {
        info!(
            "Booking confirmed for {} on {} {}-{} (mail relay not configured)",
            confirmation.patient_email,
            format_date(confirmation.date),
            format_time(confirmation.start_time),
            format_time(confirmation.end_time)
        );
        Ok(())
    }
}

pub fn build_notifier(config: &AppConfig) -> Result<Arc<dyn BookingNotifier>, NotificationError> {
    match &config.mail_relay_url {
        Some(url) => Ok(Arc::new(MailRelayNotifier::new(
            url.clone(),
            config.mail_relay_api_key.clone(),
            config.mail_from.clone(),
            config.mail_relay_timeout,
        )?)),
        None => Ok(Arc::new(LogOnlyNotifier)),
    }
}
