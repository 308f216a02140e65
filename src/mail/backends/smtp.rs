use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{AppConfig, MailConfig};
use crate::declare_mailer_plugin;
use crate::errors::{LmsError, Result};
use crate::mail::{Mailer, OutgoingEmail};

declare_mailer_plugin!("smtp", SmtpMailer);

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new() -> std::result::Result<Self, String> {
        Self::from_config(&AppConfig::get().mail)
    }

    pub fn from_config(config: &MailConfig) -> std::result::Result<Self, String> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| format!("Invalid sender address '{}': {e}", config.from))?;

        let smtp = &config.smtp;
        let mut builder = if smtp.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                .map_err(|e| format!("Failed to configure SMTP relay {}: {e}", smtp.host))?
        } else {
            // 仅用于本地中继（如 mailpit）
            warn!("SMTP STARTTLS disabled, mail to {} is sent in plain text", smtp.host);
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
        };

        builder = builder
            .port(smtp.port)
            .timeout(Some(Duration::from_secs(smtp.timeout)));

        if !smtp.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.clone(),
            ));
        }

        debug!("SMTP mailer configured for {}:{}", smtp.host, smtp.port);
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message> {
        let address: Address = email
            .to
            .parse()
            .map_err(|e| LmsError::mail_delivery(format!("Invalid recipient '{}': {e}", email.to)))?;

        Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(email.to_name.clone(), address))
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| LmsError::mail_delivery(format!("Failed to build message: {e}")))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let message = self.build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| LmsError::mail_delivery(format!("SMTP delivery to {} failed: {e}", email.to)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmtpConfig;

    fn mail_config(from: &str) -> MailConfig {
        MailConfig {
            backend: "smtp".to_string(),
            from: from.to_string(),
            smtp: SmtpConfig {
                host: "localhost".to_string(),
                port: 2525,
                username: String::new(),
                password: String::new(),
                starttls: false,
                timeout: 1,
            },
        }
    }

    #[test]
    fn test_invalid_sender_is_rejected() {
        assert!(SmtpMailer::from_config(&mail_config("not an address")).is_err());
    }

    // 构造传输层需要运行时
    #[tokio::test]
    async fn test_build_message_headers() {
        let mailer = SmtpMailer::from_config(&mail_config("LMS Team <no-reply@lms.local>")).unwrap();
        let message = mailer
            .build_message(&OutgoingEmail {
                to: "ada@example.com".to_string(),
                to_name: Some("Ada".to_string()),
                subject: "Reminder".to_string(),
                body: "Due soon".to_string(),
            })
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Reminder"));
        assert!(raw.contains("ada@example.com"));

        assert!(
            mailer
                .build_message(&OutgoingEmail {
                    to: "broken".to_string(),
                    to_name: None,
                    subject: "x".to_string(),
                    body: "y".to_string(),
                })
                .is_err()
        );
    }
}
