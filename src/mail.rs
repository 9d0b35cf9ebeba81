//! Outgoing notification mail.
//!
//! [`Mailer`] fills in defaults and validates a message; a [`Transport`]
//! delivers it. Delivery is synchronous and never retried.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MailConfig {
    pub smtp: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub pass: String,
    /// Recipients of audit notices.
    #[serde(default)]
    pub notify: Vec<String>,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, Default)]
pub struct MailMessage {
    /// Falls back to the configured account user.
    pub from: Option<String>,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub body_html: String,
    pub attachment: Option<PathBuf>,
}

/// A fully resolved message, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub body_html: String,
    pub attachment: Option<PathBuf>,
}

pub trait Transport: Send + Sync {
    fn deliver(&self, config: &MailConfig, envelope: &Envelope) -> Result<()>;
}

/// Writes envelopes to the log instead of dialing a server.
#[derive(Debug, Default)]
pub struct LogTransport;

impl Transport for LogTransport {
    fn deliver(&self, config: &MailConfig, envelope: &Envelope) -> Result<()> {
        tracing::info!(
            smtp = %format!("{}:{}", config.smtp, config.port),
            from = %envelope.from,
            to = ?envelope.to,
            cc = ?envelope.cc,
            subject = %envelope.subject,
            "mail queued for delivery"
        );
        Ok(())
    }
}

pub struct Mailer {
    config: MailConfig,
    transport: Arc<dyn Transport>,
}

impl Mailer {
    #[must_use]
    pub fn new(config: MailConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    #[must_use]
    pub fn config(&self) -> &MailConfig {
        &self.config
    }

    pub fn envelope(&self, msg: MailMessage) -> Result<Envelope> {
        if msg.to.iter().all(|addr| addr.trim().is_empty()) {
            return Err(Error::bad_request("mail recipient can not be empty"));
        }
        if let Some(path) = &msg.attachment {
            if !path.is_file() {
                return Err(Error::bad_request(format!(
                    "mail attachment not found: {}",
                    path.display()
                )));
            }
        }

        let from = msg
            .from
            .filter(|from| !from.is_empty())
            .unwrap_or_else(|| self.config.user.clone());

        Ok(Envelope {
            from,
            to: msg.to,
            cc: msg.cc,
            subject: msg.subject,
            body_html: msg.body_html,
            attachment: msg.attachment,
        })
    }

    pub fn send(&self, msg: MailMessage) -> Result<()> {
        let envelope = self.envelope(msg)?;
        self.transport.deliver(&self.config, &envelope)
    }
}
