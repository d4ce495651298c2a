//! Notification composition and delivery.

pub mod compose;
pub mod postmark;

use serde::Serialize;

use crate::config::EmailConfig;
use crate::{BoxFuture, Result};

pub use compose::{compose, ComposedMessage};

/// A fully-addressed email ready for the transport.
///
/// Serializes to the provider's field names.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct OutboundEmail {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Heading plus linked posting list.
    pub html_body: String,
    /// Heading plus one line per posting.
    pub text_body: String,
    /// Provider stream the message is sent on.
    pub message_stream: String,
}

impl OutboundEmail {
    /// Wrap a composed posting list in the configured envelope and heading.
    #[must_use]
    pub fn build(config: &EmailConfig, message: &ComposedMessage) -> Self {
        let heading = if config.escape_markup {
            compose::escape_html(&config.heading)
        } else {
            config.heading.clone()
        };

        Self {
            from: config.from.clone(),
            to: config.to.clone(),
            subject: config.subject.clone(),
            html_body: format!("<h1>{heading}</h1>\n{}", message.html),
            text_body: format!("{} \n{}", config.heading, message.text),
            message_stream: config.message_stream.clone(),
        }
    }
}

/// Provider verdict for one send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Zero on success; any other value is a delivery failure.
    pub error_code: i64,
    /// Provider message.
    pub message: String,
    /// Provider message identifier, when accepted.
    pub message_id: Option<String>,
}

impl SendReceipt {
    /// Whether the provider accepted the message.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.error_code == 0
    }
}

/// Notification transport boundary.
pub trait Transport: Send + Sync {
    /// Hand `email` to the provider.
    ///
    /// A provider rejection is reported through [`SendReceipt::error_code`],
    /// not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) if the provider
    /// cannot be reached or its reply cannot be read.
    fn send<'a>(&'a self, email: &'a OutboundEmail) -> BoxFuture<'a, Result<SendReceipt>>;
}
