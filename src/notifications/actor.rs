use actix::prelude::*;
use std::sync::Arc;

use super::{EmailMessage, Mailer};
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};

// ============================================================================
// Actor Messages
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Mailer circuit is open")]
    CircuitOpen,

    #[error("Mailer failed: {0}")]
    Delivery(String),

    #[error("Notification actor unavailable: {0}")]
    Mailbox(#[from] MailboxError),
}

#[derive(Message)]
#[rtype(result = "Result<(), NotificationError>")]
pub struct SendEmail(pub EmailMessage);

// ============================================================================
// Notification Actor - one mailer, one circuit breaker, no retries
// ============================================================================

pub struct NotificationActor {
    mailer: Arc<dyn Mailer>,
    breaker: CircuitBreaker,
    metrics: Arc<Metrics>,
}

impl NotificationActor {
    pub fn new(mailer: Arc<dyn Mailer>, breaker: CircuitBreakerConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            mailer,
            breaker: CircuitBreaker::new(breaker),
            metrics,
        }
    }
}

impl Actor for NotificationActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("NotificationActor started");
    }
}

impl Handler<SendEmail> for NotificationActor {
    type Result = ResponseFuture<Result<(), NotificationError>>;

    fn handle(&mut self, msg: SendEmail, _: &mut Self::Context) -> Self::Result {
        let mailer = self.mailer.clone();
        let breaker = self.breaker.clone();
        let metrics = self.metrics.clone();
        let message = msg.0;

        Box::pin(async move {
            let result = breaker.call(mailer.send_email(&message)).await;
            metrics.set_mailer_circuit_state(breaker.state().await);

            match result {
                Ok(()) => {
                    metrics.record_notification("sent");
                    tracing::debug!(to = %message.to, "Tracking email sent");
                    Ok(())
                }
                Err(CircuitBreakerError::CircuitOpen) => {
                    metrics.record_notification("circuit_open");
                    tracing::error!(to = %message.to, "Mailer circuit open, email not sent");
                    Err(NotificationError::CircuitOpen)
                }
                Err(CircuitBreakerError::OperationFailed(e)) => {
                    metrics.record_notification("failed");
                    tracing::error!(to = %message.to, error = %e, "Failed to send email");
                    Err(NotificationError::Delivery(e.to_string()))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::testing::RecordingMailer;
    use std::time::Duration;

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: "Your order has been placed".to_string(),
            html: "<p>Thanks</p>".to_string(),
        }
    }

    #[actix::test]
    async fn test_sends_through_mailer() {
        let mailer = Arc::new(RecordingMailer::default());
        let actor = NotificationActor::new(
            mailer.clone(),
            CircuitBreakerConfig::default(),
            Arc::new(Metrics::new().unwrap()),
        )
        .start();

        actor.send(SendEmail(message("ada@example.com"))).await.unwrap().unwrap();

        assert_eq!(mailer.sent().len(), 1);
        assert_eq!(mailer.sent()[0].to, "ada@example.com");
    }

    #[actix::test]
    async fn test_circuit_opens_after_repeated_failures() {
        let mailer = Arc::new(RecordingMailer::failing_for(&["down@example.com"]));
        let metrics = Arc::new(Metrics::new().unwrap());
        let actor = NotificationActor::new(
            mailer.clone(),
            CircuitBreakerConfig {
                failure_threshold: 2,
                open_for: Duration::from_secs(60),
                success_threshold: 1,
            },
            metrics.clone(),
        )
        .start();

        for _ in 0..2 {
            let result = actor.send(SendEmail(message("down@example.com"))).await.unwrap();
            assert!(matches!(result, Err(NotificationError::Delivery(_))));
        }

        let result = actor.send(SendEmail(message("ada@example.com"))).await.unwrap();
        assert!(matches!(result, Err(NotificationError::CircuitOpen)));
        assert!(mailer.sent().is_empty());
        assert_eq!(metrics.mailer_circuit_state.get(), 1);
    }
}
