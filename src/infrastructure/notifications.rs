//! Outbound account emails.
//!
//! Messages are rendered here and handed to a transport. The bundled
//! transport writes them to the tracing log, which is enough for local
//! development and tests.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::{DomainResult, NotificationSender};

/// A rendered plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Builds the verification / reset messages with links into this service.
#[derive(Debug, Clone)]
pub struct MessageRenderer {
    base_url: String,
    verification_ttl_hours: i64,
    reset_ttl_minutes: i64,
}

impl MessageRenderer {
    pub fn new(base_url: &str, verification_ttl_hours: i64, reset_ttl_minutes: i64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            verification_ttl_hours,
            reset_ttl_minutes,
        }
    }

    pub fn verification(&self, to: &str, token: &str) -> EmailMessage {
        let link = format!("{}/api/v1/auth/verify-email?token={}", self.base_url, token);
        EmailMessage {
            to: to.to_string(),
            subject: "Please verify your email address".to_string(),
            body: format!(
                "Thank you for registering!\n\n\
                 Please open the link below to verify your email address:\n{}\n\n\
                 This link will expire in {} hours.\n",
                link, self.verification_ttl_hours
            ),
        }
    }

    pub fn password_reset(&self, to: &str, token: &str) -> EmailMessage {
        let link = format!("{}/api/v1/auth/reset-password?token={}", self.base_url, token);
        EmailMessage {
            to: to.to_string(),
            subject: "Password reset request".to_string(),
            body: format!(
                "We received a request to reset the password of your account.\n\n\
                 Please open the link below to choose a new password:\n{}\n\n\
                 If you did not request a password reset, ignore this email. \
                 This link will expire in {} minutes.\n",
                link, self.reset_ttl_minutes
            ),
        }
    }
}

/// [`NotificationSender`] that logs every message instead of delivering it.
pub struct LogNotificationSender {
    renderer: MessageRenderer,
}

impl LogNotificationSender {
    pub fn new(renderer: MessageRenderer) -> Self {
        Self { renderer }
    }

    fn deliver(&self, message: EmailMessage) {
        info!(to = %message.to, subject = %message.subject, "Email queued");
        // body carries the token
        debug!(to = %message.to, body = %message.body, "Email body");
    }
}

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send_verification(&self, email: &str, token: &str) -> DomainResult<()> {
        self.deliver(self.renderer.verification(email, token));
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, token: &str) -> DomainResult<()> {
        self.deliver(self.renderer.password_reset(email, token));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_point_at_the_auth_endpoints() {
        let renderer = MessageRenderer::new("http://localhost:8080/", 24, 15);

        let verify = renderer.verification("a@x.com", "tok");
        assert_eq!(verify.to, "a@x.com");
        assert!(verify
            .body
            .contains("http://localhost:8080/api/v1/auth/verify-email?token=tok"));
        assert!(verify.body.contains("24 hours"));

        let reset = renderer.password_reset("a@x.com", "tok");
        assert!(reset
            .body
            .contains("http://localhost:8080/api/v1/auth/reset-password?token=tok"));
        assert!(reset.body.contains("15 minutes"));
    }

    #[tokio::test]
    async fn log_sender_never_fails() {
        let sender = LogNotificationSender::new(MessageRenderer::new("http://h", 24, 15));
        assert!(sender.send_verification("a@x.com", "t").await.is_ok());
        assert!(sender.send_password_reset("a@x.com", "t").await.is_ok());
    }
}
