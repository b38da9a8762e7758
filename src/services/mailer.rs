// src/services/mailer.rs
//! Best-effort email delivery.
//!
//! Messages are handed to a detached task; delivery failures are logged
//! and never reach the request that triggered them.

use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::{authentication::Credentials, Error as SmtpError},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use regex::Regex;
use std::sync::{Arc, Mutex, OnceLock};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::common::config::{EmailBackendKind, SmtpSettings};
use crate::common::safe_email_log;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// A fully rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

enum Transport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    Console,
    Memory(Mutex<Vec<OutgoingEmail>>),
}

pub struct EmailService {
    transport: Transport,
    from_address: String,
}

impl EmailService {
    pub fn from_config(backend: &EmailBackendKind, from_address: &str) -> Result<Self, EmailError> {
        let transport = match backend {
            EmailBackendKind::Smtp(settings) => Transport::Smtp(build_smtp_transport(settings)?),
            EmailBackendKind::Console => Transport::Console,
            EmailBackendKind::Memory => Transport::Memory(Mutex::new(Vec::new())),
        };

        Ok(Self {
            transport,
            from_address: from_address.to_string(),
        })
    }

    pub fn backend_name(&self) -> &'static str {
        match self.transport {
            Transport::Smtp(_) => "smtp",
            Transport::Console => "console",
            Transport::Memory(_) => "memory",
        }
    }

    /// Messages captured by the memory backend, oldest first
    #[cfg(test)]
    pub fn outbox(&self) -> Vec<OutgoingEmail> {
        match &self.transport {
            Transport::Memory(store) => store.lock().map(|s| s.clone()).unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    pub async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        match &self.transport {
            Transport::Smtp(mailer) => {
                let message = self.build_message(&email)?;
                mailer.send(message).await?;
                info!(
                    to = %safe_email_log(&email.to),
                    subject = %email.subject,
                    "Email sent successfully"
                );
            }
            Transport::Console => {
                info!(
                    to = %safe_email_log(&email.to),
                    subject = %email.subject,
                    "Email delivery disabled, logging message instead"
                );
                debug!(body = %redact_links(&email.text_body), "Console email body");
            }
            Transport::Memory(store) => {
                if let Ok(mut outbox) = store.lock() {
                    outbox.push(email);
                }
            }
        }
        Ok(())
    }

    /// Fire-and-forget delivery. The returned handle may be dropped.
    pub fn dispatch(self: &Arc<Self>, email: OutgoingEmail) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let to = safe_email_log(&email.to);
            let subject = email.subject.clone();
            if let Err(e) = service.send(email).await {
                error!(error = %e, to = %to, subject = %subject, "Failed to send email notification");
            }
        })
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message, EmailError> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&self.from_address)?)
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject.clone());

        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(parse_mailbox(reply_to)?);
        }

        let message = builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text_body.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html_body.clone()),
                ),
        )?;

        Ok(message)
    }
}

fn build_smtp_transport(
    settings: &SmtpSettings,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
    let mut builder =
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?.port(settings.port);

    if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }

    Ok(builder.build())
}

/// Links in outgoing mail carry live verification and reset tokens
fn redact_links(text: &str) -> String {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| Regex::new(r"https?://\S+").expect("Invalid link pattern"))
        .replace_all(text, "[link redacted]")
        .into_owned()
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse::<Mailbox>()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))
}
