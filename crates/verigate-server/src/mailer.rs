use async_trait::async_trait;
use serde::Serialize;

use crate::config::MailerConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Email API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Email API rejected the message (status={status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Outbound notification boundary. Delivery is awaited, fallible, and never
/// retried by the core; a failed send during registration leaves the account
/// in place and resend is the recovery path.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_verification_link(
        &self,
        to_email: &str,
        to_name: &str,
        confirmation_url: &str,
    ) -> Result<(), MailError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoEmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendEmailBody {
    sender: BrevoEmailAddress,
    to: Vec<BrevoEmailAddress>,
    subject: String,
    html_content: String,
    text_content: String,
}

/// Brevo transactional-email client.
pub struct BrevoMailer {
    http: reqwest::Client,
    config: MailerConfig,
}

impl BrevoMailer {
    pub fn new(http: reqwest::Client, config: MailerConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl NotificationSender for BrevoMailer {
    async fn send_verification_link(
        &self,
        to_email: &str,
        to_name: &str,
        confirmation_url: &str,
    ) -> Result<(), MailError> {
        let body = BrevoSendEmailBody {
            sender: BrevoEmailAddress {
                email: self.config.sender_email.clone(),
                name: self.config.sender_name.clone(),
            },
            to: vec![BrevoEmailAddress {
                email: to_email.to_string(),
                name: Some(to_name.to_string()),
            }],
            subject: "Verify your email address".to_string(),
            html_content: format!(
                "<p>Hi {to_name},</p>\
                 <p>Please confirm your email address by clicking the link below:</p>\
                 <p><a href=\"{confirmation_url}\">Verify email</a></p>\
                 <p>The link expires in 24 hours.</p>"
            ),
            text_content: format!(
                "Hi {to_name},\n\nPlease confirm your email address:\n{confirmation_url}\n\n\
                 The link expires in 24 hours.\n"
            ),
        };

        let resp = self
            .http
            .post(&self.config.api_url)
            .header("api-key", &self.config.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone)]
    pub struct SentMail {
        pub to_email: String,
        pub to_name: String,
        pub confirmation_url: String,
    }

    /// Records outbound mail; can be told to fail every send.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<SentMail>>,
        pub fail: AtomicBool,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            let mailer = Self::default();
            mailer.fail.store(true, Ordering::SeqCst);
            mailer
        }

        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        pub fn last_sent(&self) -> Option<SentMail> {
            self.sent.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl NotificationSender for RecordingMailer {
        async fn send_verification_link(
            &self,
            to_email: &str,
            to_name: &str,
            confirmation_url: &str,
        ) -> Result<(), MailError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(MailError::Rejected {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            self.sent.lock().unwrap().push(SentMail {
                to_email: to_email.to_string(),
                to_name: to_name.to_string(),
                confirmation_url: confirmation_url.to_string(),
            });
            Ok(())
        }
    }
}
