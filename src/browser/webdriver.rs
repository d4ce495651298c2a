//! W3C WebDriver client backing [`BrowserPage`].
//!
//! Speaks the JSON wire protocol of any WebDriver server (chromedriver,
//! geckodriver, Selenium) over plain HTTP.

use std::time::Duration;

use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::{BrowserLauncher, BrowserPage, ElementHandle, Locator};
use crate::config::BrowserConfig;
use crate::{AppError, BoxFuture, Result};

/// Key under which WebDriver returns element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Envelope wrapping every WebDriver response.
#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    value: Value,
}

/// Error payload carried in `value` on failure.
#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

/// Launches one WebDriver session per run.
pub struct WebDriverLauncher {
    http: Client,
    config: BrowserConfig,
}

impl WebDriverLauncher {
    /// Build a launcher for the configured WebDriver server.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Navigation` if the HTTP client cannot be created.
    pub fn new(config: &BrowserConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| AppError::Navigation(format!("failed to init http client: {err}")))?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    fn capabilities(&self) -> Value {
        let mut always_match = json!({ "browserName": self.config.browser_name });
        if self.config.headless {
            match self.config.browser_name.as_str() {
                "firefox" => {
                    always_match["moz:firefoxOptions"] = json!({ "args": ["-headless"] });
                }
                "chrome" | "chromium" => {
                    always_match["goog:chromeOptions"] =
                        json!({ "args": ["--headless=new", "--no-sandbox", "--disable-gpu"] });
                }
                other => {
                    warn!(browser = other, "headless requested for unknown browser; ignoring");
                }
            }
        }
        json!({ "capabilities": { "alwaysMatch": always_match } })
    }
}

impl BrowserLauncher for WebDriverLauncher {
    fn launch(&self) -> BoxFuture<'_, Result<Box<dyn BrowserPage>>> {
        Box::pin(async move {
            let base = self.config.webdriver_url.trim_end_matches('/').to_owned();
            let value = send(
                &self.http,
                Method::POST,
                &format!("{base}/session"),
                Some(self.capabilities()),
            )
            .await?;

            let session_id = value
                .get("sessionId")
                .and_then(Value::as_str)
                .ok_or_else(|| AppError::Navigation("session response missing sessionId".into()))?
                .to_owned();

            info!(%session_id, "webdriver session started");

            let page: Box<dyn BrowserPage> = Box::new(WebDriverPage {
                http: self.http.clone(),
                session_url: format!("{base}/session/{session_id}"),
                poll_interval: self.config.poll_interval(),
                closed: false,
            });
            Ok(page)
        })
    }
}

/// A page bound to one WebDriver session.
pub struct WebDriverPage {
    http: Client,
    session_url: String,
    poll_interval: Duration,
    closed: bool,
}

impl WebDriverPage {
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        if self.closed {
            return Err(AppError::Navigation("browser session already closed".into()));
        }
        send(
            &self.http,
            method,
            &format!("{}{path}", self.session_url),
            body,
        )
        .await
    }

    async fn find(&self, locator: &Locator) -> Result<Option<ElementHandle>> {
        let (using, value) = wire_locator(locator);
        let body = json!({ "using": using, "value": value });
        match self.command(Method::POST, "/element", Some(body)).await {
            Ok(found) => found
                .get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(|id| Some(ElementHandle(id.to_owned())))
                .ok_or_else(|| AppError::Navigation("element reference missing".into())),
            Err(AppError::Navigation(msg)) if msg.starts_with("no such element") => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl BrowserPage for WebDriverPage {
    fn navigate<'a>(&'a mut self, url: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            debug!(%url, "navigating");
            self.command(Method::POST, "/url", Some(json!({ "url": url })))
                .await?;
            Ok(())
        })
    }

    fn wait_for_selector<'a>(
        &'a mut self,
        locator: &'a Locator,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<Option<ElementHandle>>> {
        Box::pin(async move {
            let deadline = Instant::now() + timeout;
            loop {
                if let Some(handle) = self.find(locator).await? {
                    return Ok(Some(handle));
                }
                if Instant::now() >= deadline {
                    debug!(%locator, "element did not appear before timeout");
                    return Ok(None);
                }
                sleep(self.poll_interval).await;
            }
        })
    }

    fn query<'a>(
        &'a mut self,
        locator: &'a Locator,
    ) -> BoxFuture<'a, Result<Option<ElementHandle>>> {
        Box::pin(async move { self.find(locator).await })
    }

    fn click<'a>(&'a mut self, element: &'a ElementHandle) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.command(
                Method::POST,
                &format!("/element/{}/click", element.0),
                Some(json!({})),
            )
            .await?;
            Ok(())
        })
    }

    fn evaluate<'a>(
        &'a mut self,
        script: &'a str,
        args: Vec<Value>,
    ) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            self.command(
                Method::POST,
                "/execute/sync",
                Some(json!({ "script": script, "args": args })),
            )
            .await
        })
    }

    fn close(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if self.closed {
                return Ok(());
            }
            let result = self.command(Method::DELETE, "", None).await;
            self.closed = true;
            result?;
            info!("webdriver session closed");
            Ok(())
        })
    }
}

/// Issue one WebDriver command and unwrap the `value` envelope.
async fn send(http: &Client, method: Method, url: &str, body: Option<Value>) -> Result<Value> {
    let mut request = http.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request
        .send()
        .await
        .map_err(|err| AppError::Navigation(format!("webdriver request failed: {err}")))?;
    let status = response.status();
    let payload: WireResponse = response
        .json()
        .await
        .map_err(|err| AppError::Navigation(format!("invalid webdriver response: {err}")))?;

    if status.is_success() {
        return Ok(payload.value);
    }

    match serde_json::from_value::<WireError>(payload.value) {
        Ok(wire) => Err(AppError::Navigation(format!("{}: {}", wire.error, wire.message))),
        Err(_) => Err(AppError::Navigation(format!("webdriver returned http {status}"))),
    }
}

/// Translate a locator into a WebDriver `(using, value)` pair.
///
/// Text locators compare the whole normalized text content, including
/// nested inline elements, and pick the innermost element that matches.
fn wire_locator(locator: &Locator) -> (&'static str, String) {
    match locator {
        Locator::Css(selector) => ("css selector", selector.clone()),
        Locator::Text(text) => {
            let literal = xpath_literal(text);
            (
                "xpath",
                format!(
                    "//*[normalize-space(.)={literal} and not(.//*[normalize-space(.)={literal}])]"
                ),
            )
        }
    }
}

/// Quote `text` as an XPath 1.0 string literal.
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    if !text.contains('"') {
        return format!("\"{text}\"");
    }
    let parts: Vec<String> = text.split('\'').map(|part| format!("'{part}'")).collect();
    format!("concat({})", parts.join(", \"'\", "))
}
