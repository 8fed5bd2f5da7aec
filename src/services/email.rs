//! Mail dispatch for account verification.

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};

use crate::config::SmtpConfig;
use crate::error::AppError;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_email(
        &self,
        to_email: &str,
        username: &str,
        verification_url: &str,
    ) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    mailer: SmtpTransport,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "Email service initialized");

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        let email = Message::builder()
            .from(self.from_address.parse().map_err(
                |e: lettre::address::AddressError| AppError::Internal(e.into()),
            )?)
            .to(to_email.parse().map_err(
                |e: lettre::address::AddressError| AppError::Internal(e.into()),
            )?)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body.to_string()),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::Internal(e.into()))?;

        // SMTP send blocks; keep it off the async runtime.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e.to_string(), to = %to_email, "Failed to send email");
                Err(AppError::Email(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification_email(
        &self,
        to_email: &str,
        username: &str,
        verification_url: &str,
    ) -> Result<(), AppError> {
        let plain_body = format!(
            "Hi {username},\n\nWelcome to StagePass! Confirm your email address by opening:\n\n{verification_url}\n\nIf you did not create this account, ignore this message.\n"
        );

        let html_body = format!(
            r#"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>Welcome to StagePass, {username}!</h2>
        <p>Confirm your email address to activate your account:</p>
        <p><a href="{verification_url}">Verify my email</a></p>
        <p>If you did not create this account, ignore this message.</p>
    </body>
</html>"#
        );

        self.send_email(to_email, "Verify your StagePass account", &plain_body, &html_body)
            .await
    }
}

/// Mailer that drops everything; used by tests.
pub struct NullMailer;

#[async_trait]
impl Mailer for NullMailer {
    async fn send_verification_email(
        &self,
        _to_email: &str,
        _username: &str,
        _verification_url: &str,
    ) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailer_creation() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            user: "mailer".to_string(),
            password: "password".to_string(),
            from_address: "noreply@stagepass.local".to_string(),
        };

        assert!(SmtpMailer::new(&config).is_ok());
    }
}
