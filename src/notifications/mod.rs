// ============================================================================
// Notifications - outbound tracking emails
// ============================================================================
//
// Structure:
// - Mailer trait: the generic `send_email({to, subject, html})` collaborator
// - LogMailer: default implementation, writes the message to the log
// - NotificationActor: owns the mailer behind a circuit breaker
//
// ============================================================================

use async_trait::async_trait;
use serde::Serialize;

mod actor;

pub use actor::{NotificationActor, SendEmail};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, message: &EmailMessage) -> anyhow::Result<()>;
}

/// Logs each message instead of delivering it
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_email(&self, message: &EmailMessage) -> anyhow::Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            html_len = message.html.len(),
            "Email dispatched"
        );
        tracing::debug!(html = %message.html, "Email body");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records messages; fails for recipients listed in `failing`
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<EmailMessage>>,
        pub failing: Vec<String>,
    }

    impl RecordingMailer {
        pub fn failing_for(recipients: &[&str]) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                failing: recipients.iter().map(|r| r.to_string()).collect(),
            }
        }

        pub fn sent(&self) -> Vec<EmailMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_email(&self, message: &EmailMessage) -> anyhow::Result<()> {
            if self.failing.contains(&message.to) {
                anyhow::bail!("mailbox unavailable: {}", message.to);
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }
}
