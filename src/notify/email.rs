use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::Notifier;
use crate::config::MailConfig;

/// SMTP sender over an upgraded (STARTTLS) connection.
///
/// Built without lettre's connection pool: each `notify` opens a session,
/// authenticates, sends, and closes it whether or not the send succeeded.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    pub fn new(cfg: &MailConfig) -> Result<Self> {
        let creds = Credentials::new(cfg.username(), cfg.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .with_context(|| format!("invalid smtp relay {}", cfg.host))?
            .port(cfg.port)
            .credentials(creds)
            .build();

        Ok(Self {
            mailer,
            from: cfg.from.clone(),
            to: cfg.to.clone(),
        })
    }

    pub fn build_message(&self, subject: &str, html_body: &str) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .context("build email")
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, subject: &str, html_body: &str) -> Result<()> {
        let msg = self.build_message(subject, html_body)?;
        self.mailer.send(msg).await.context("send email")?;
        tracing::info!(target: "notify", to = %self.to, "email sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
