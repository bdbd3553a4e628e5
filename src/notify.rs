//! # Notifier
//!
//! Sends one alert email per feedback submission over SMTP. Built at
//! startup from the SMTP_* environment; when host, user, or password is
//! missing the notifier stays unconfigured and submissions skip mail with
//! a warning instead of failing.
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use tracing::info;

use crate::{config::Config, store::FeedbackEntry};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

pub struct Notifier {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
    to: String,
}

impl Notifier {
    /// Builds the SMTP transport when credentials are complete. Port 465
    /// means implicit TLS, anything else uses STARTTLS.
    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let transport = match (&config.smtp_host, &config.smtp_user, &config.smtp_pass) {
            (Some(host), Some(user), Some(pass)) => {
                let builder = if config.smtp_port == 465 {
                    AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
                };

                Some(
                    builder
                        .port(config.smtp_port)
                        .credentials(Credentials::new(user.clone(), pass.clone()))
                        .build(),
                )
            }
            _ => None,
        };

        Ok(Self {
            transport,
            from: config.smtp_user.clone().unwrap_or_default(),
            to: config.alert_to.clone(),
        })
    }

    pub fn configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Sends the alert for one entry and returns the SMTP server response
    /// as a string. Callers persist the entry before calling this; a send
    /// failure never rolls the entry back.
    pub async fn send(&self, entry: &FeedbackEntry) -> Result<String, NotifyError> {
        let transport = self
            .transport
            .as_ref()
            .expect("send called on unconfigured notifier");

        let mut builder = Message::builder()
            .from(self.from.parse::<Mailbox>()?)
            .to(self.to.parse::<Mailbox>()?)
            .subject(format!("New feedback from {}", entry.name));

        if !entry.email.is_empty() {
            builder = builder.reply_to(entry.email.parse::<Mailbox>()?);
        }

        let message = builder.multipart(MultiPart::alternative_plain_html(
            plain_body(entry),
            html_body(entry),
        ))?;

        let response = transport.send(message).await?;
        info!("Alert mail sent for feedback {}", entry.id);

        Ok(format!(
            "{} {}",
            response.code(),
            response.message().collect::<Vec<_>>().join(" ")
        ))
    }
}

fn plain_body(entry: &FeedbackEntry) -> String {
    if entry.email.is_empty() {
        format!("{}\n\n{}", entry.name, entry.feedback)
    } else {
        format!("{} ({})\n\n{}", entry.name, entry.email, entry.feedback)
    }
}

fn html_body(entry: &FeedbackEntry) -> String {
    let email_line = if entry.email.is_empty() {
        String::new()
    } else {
        format!(
            "<p><strong>Email:</strong> {}</p>\n    ",
            escape_html(&entry.email)
        )
    };

    format!(
        "<p><strong>Name:</strong> {}</p>\n    {}<p><strong>Feedback:</strong></p>\n    <p>{}</p>",
        escape_html(&entry.name),
        email_line,
        escape_html(&entry.feedback)
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}
