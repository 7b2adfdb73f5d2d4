use crate::config::{ConfigError, SmtpConfig};
use crate::models::Result;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const MAX_ATTEMPTS: u32 = 3;

/// Delivery seam. Production uses the TLS SMTP transport; tests inject
/// scripted failures.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: Message) -> Result<()>;
    async fn test_connection(&self) -> Result<()>;
}

struct SmtpMailTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: Message) -> Result<()> {
        self.inner.send(message).await?;
        Ok(())
    }

    async fn test_connection(&self) -> Result<()> {
        if self.inner.test_connection().await? {
            Ok(())
        } else {
            Err("SMTP server refused the connection".into())
        }
    }
}

/// Sends report emails over SMTP with retry. Credentials come from the
/// `SMTP_USERNAME`/`SMTP_PASSWORD` environment variables only; they are never
/// part of the YAML config.
pub struct EmailSender {
    config: SmtpConfig,
    transport: Arc<dyn MailTransport>,
}

impl EmailSender {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let username = std::env::var("SMTP_USERNAME").unwrap_or_default();
        let password = std::env::var("SMTP_PASSWORD").unwrap_or_default();

        if username.is_empty() || password.is_empty() {
            return Err(ConfigError::MissingSmtpCredentials.into());
        }

        let inner = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
            .port(config.port)
            .credentials(Credentials::new(username, password))
            .build();

        Ok(Self {
            config,
            transport: Arc::new(SmtpMailTransport { inner }),
        })
    }

    /// Swap in a non-SMTP transport. Tests use this to script deliveries.
    pub fn with_transport(config: SmtpConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self { config, transport }
    }

    /// Send one multipart email. Up to 3 attempts with 2s/4s backoff; the
    /// last transport error surfaces after exhaustion.
    pub async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
        cc: &[String],
    ) -> Result<()> {
        let mut last_err: Option<Box<dyn std::error::Error + Send + Sync>> = None;

        for attempt in 1..=MAX_ATTEMPTS {
            // lettre consumes the message on send, so rebuild per attempt.
            let message = self.build_message(to, subject, html_body, text_body, cc)?;

            match self.transport.send(message).await {
                Ok(()) => {
                    info!(to = %to, subject = %subject, attempt, "Email sent");
                    return Ok(());
                }
                Err(e) => {
                    warn!(to = %to, attempt, error = %e, "Failed to send email, retrying");
                    last_err = Some(e);

                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(Duration::from_secs(u64::from(attempt) * 2)).await;
                    }
                }
            }
        }

        Err(format!(
            "failed to send email after {} attempts: {}",
            MAX_ATTEMPTS,
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )
        .into())
    }

    /// Dial the server without sending anything. Run once before a send
    /// batch; a failure here aborts the whole run.
    pub async fn test_connection(&self) -> Result<()> {
        self.transport.test_connection().await?;
        info!("SMTP connection test successful");
        Ok(())
    }

    fn build_message(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
        cc: &[String],
    ) -> Result<Message> {
        let from: Mailbox =
            format!("{} <{}>", self.config.from_name, self.config.from_email).parse()?;

        let mut builder = Message::builder()
            .from(from)
            .to(to.parse()?)
            .subject(subject);

        for cc_addr in cc {
            builder = builder.cc(cc_addr.parse()?);
        }

        Ok(builder.multipart(MultiPart::alternative_plain_html(
            text_body.to_string(),
            html_body.to_string(),
        ))?)
    }
}
