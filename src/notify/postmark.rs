//! Postmark HTTP transport.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{OutboundEmail, SendReceipt, Transport};
use crate::config::EmailConfig;
use crate::{AppError, BoxFuture, Result};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const TOKEN_HEADER: &str = "X-Postmark-Server-Token";

/// Send-email response body, returned for accepted and rejected messages.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkReply {
    error_code: i64,
    #[serde(default)]
    message: String,
    #[serde(rename = "MessageID", default)]
    message_id: Option<String>,
}

impl From<PostmarkReply> for SendReceipt {
    fn from(reply: PostmarkReply) -> Self {
        Self {
            error_code: reply.error_code,
            message: reply.message,
            message_id: reply.message_id,
        }
    }
}

/// Sends email through the Postmark single-message API.
pub struct PostmarkTransport {
    http: Client,
    api_url: String,
    server_token: String,
}

impl PostmarkTransport {
    /// Build a transport from the email settings and loaded server token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the HTTP client cannot be created.
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| AppError::Transport(format!("failed to init http client: {err}")))?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            server_token: config.transport_key.clone(),
        })
    }
}

impl Transport for PostmarkTransport {
    fn send<'a>(&'a self, email: &'a OutboundEmail) -> BoxFuture<'a, Result<SendReceipt>> {
        Box::pin(async move {
            debug!(to = %email.to, subject = %email.subject, "sending email");
            let response = self
                .http
                .post(&self.api_url)
                .header(reqwest::header::ACCEPT, "application/json")
                .header(TOKEN_HEADER, &self.server_token)
                .json(email)
                .send()
                .await
                .map_err(|err| AppError::Transport(format!("postmark request failed: {err}")))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|err| AppError::Transport(format!("failed to read reply: {err}")))?;

            let receipt = parse_reply(&body).map_err(|err| {
                AppError::Transport(format!("postmark returned http {status}: {err}"))
            })?;

            if receipt.is_delivered() && !status.is_success() {
                return Err(AppError::Transport(format!(
                    "postmark returned http {status} without an error code"
                )));
            }

            if receipt.is_delivered() {
                info!(message_id = ?receipt.message_id, "email accepted");
            }
            Ok(receipt)
        })
    }
}

/// Decode a Postmark reply body.
fn parse_reply(body: &str) -> std::result::Result<SendReceipt, serde_json::Error> {
    serde_json::from_str::<PostmarkReply>(body).map(SendReceipt::from)
}
