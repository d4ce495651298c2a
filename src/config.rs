//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Placeholder substituted with the access token in the entry URL.
pub const ACCESS_TOKEN_PLACEHOLDER: &str = "{access_token}";

/// Keychain service name holding runtime secrets.
const KEYRING_SERVICE: &str = "posting-watch";

/// Listing source and extraction settings.
///
/// The access token is loaded at runtime via OS keychain or environment
/// variable, not from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ListingConfig {
    /// Entry URL containing the `{access_token}` placeholder.
    #[serde(default = "default_entry_url_template")]
    pub entry_url_template: String,
    /// Visible text of the "active postings" filter control.
    #[serde(default = "default_filter_control_text")]
    pub filter_control_text: String,
    /// CSS selector matching one listing entry.
    #[serde(default = "default_list_selector")]
    pub list_selector: String,
    /// CSS selector of the "next page" control.
    #[serde(default = "default_next_page_selector")]
    pub next_page_selector: String,
    /// Exact caption of the anchor linking to the posting details.
    #[serde(default = "default_details_caption")]
    pub details_caption: String,
    /// Case-insensitive keywords; an entry must contain at least one.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// Optional cap on pages walked in one run; unset means unbounded.
    #[serde(default)]
    pub max_pages: Option<u32>,
    /// Access token substituted into the entry URL (populated at runtime).
    #[serde(skip)]
    pub access_token: String,
}

fn default_entry_url_template() -> String {
    "https://servizi.comune.siena.it/openweb/pratiche/registri.php?sezione=concorsi&CSRF={access_token}"
        .into()
}

fn default_filter_control_text() -> String {
    "Bandi Attivi".into()
}

fn default_list_selector() -> String {
    "#table_delibere > li:not(.table-header)".into()
}

fn default_next_page_selector() -> String {
    "button[title='Successiva']".into()
}

fn default_details_caption() -> String {
    "Dettagli bando".into()
}

fn default_keywords() -> Vec<String> {
    ["infanzia", "asilo", "nido", "educatrice", "educatore"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            entry_url_template: default_entry_url_template(),
            filter_control_text: default_filter_control_text(),
            list_selector: default_list_selector(),
            next_page_selector: default_next_page_selector(),
            details_caption: default_details_caption(),
            keywords: default_keywords(),
            max_pages: None,
            access_token: String::new(),
        }
    }
}

impl ListingConfig {
    /// Entry URL with the access token substituted verbatim.
    #[must_use]
    pub fn entry_url(&self) -> String {
        self.entry_url_template
            .replace(ACCESS_TOKEN_PLACEHOLDER, &self.access_token)
    }
}

/// WebDriver endpoint and wait tuning.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BrowserConfig {
    /// Base URL of the WebDriver server.
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    /// Browser requested in the session capabilities.
    #[serde(default = "default_browser_name")]
    pub browser_name: String,
    /// Run the browser without a visible window.
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Wait for the listing container.
    #[serde(default = "default_wait_timeout_seconds")]
    pub wait_timeout_seconds: u64,
    /// Wait for the filter control before continuing without it.
    #[serde(default = "default_filter_wait_seconds")]
    pub filter_wait_seconds: u64,
    /// Delay between element lookups while waiting.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Pause after activating a control so the page can re-render.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".into()
}

fn default_browser_name() -> String {
    "chrome".into()
}

fn default_true() -> bool {
    true
}

fn default_wait_timeout_seconds() -> u64 {
    30
}

fn default_filter_wait_seconds() -> u64 {
    5
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_settle_ms() -> u64 {
    500
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            browser_name: default_browser_name(),
            headless: true,
            wait_timeout_seconds: default_wait_timeout_seconds(),
            filter_wait_seconds: default_filter_wait_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl BrowserConfig {
    /// Listing container wait as a [`Duration`].
    #[must_use]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_seconds)
    }

    /// Filter control wait as a [`Duration`].
    #[must_use]
    pub fn filter_wait(&self) -> Duration {
        Duration::from_secs(self.filter_wait_seconds)
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Settle pause as a [`Duration`].
    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Location of the seen-posting store.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct StoreConfig {
    /// Directory holding the database file, or `:memory:`.
    pub endpoint: String,
    /// Database file stem.
    pub database: String,
    /// Logical collection the seen entries belong to.
    pub collection: String,
}

/// Notification envelope and provider settings.
///
/// The provider key is loaded at runtime, never from the TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct EmailConfig {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    #[serde(default = "default_subject")]
    pub subject: String,
    /// Heading placed above the posting list.
    #[serde(default = "default_heading")]
    pub heading: String,
    /// Provider message stream.
    #[serde(default = "default_message_stream")]
    pub message_stream: String,
    /// Provider send endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Escape titles and links in the HTML body.
    #[serde(default = "default_true")]
    pub escape_markup: bool,
    /// Provider server token (populated at runtime).
    #[serde(skip)]
    pub transport_key: String,
}

fn default_subject() -> String {
    "Nuovi bandi di concorso".into()
}

fn default_heading() -> String {
    "Ecco i nuovi bandi di concorso".into()
}

fn default_message_stream() -> String {
    "outbound".into()
}

fn default_api_url() -> String {
    "https://api.postmarkapp.com/email".into()
}

fn default_run_deadline_seconds() -> u64 {
    600
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Listing source settings.
    #[serde(default)]
    pub listing: ListingConfig,
    /// WebDriver settings.
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Seen store location.
    pub store: StoreConfig,
    /// Notification settings.
    pub email: EmailConfig,
    /// Hard deadline for one whole run.
    #[serde(default = "default_run_deadline_seconds")]
    pub run_deadline_seconds: u64,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load runtime secrets from OS keychain with env-var fallback.
    ///
    /// Tries the `posting-watch` keyring service first, then falls back to
    /// `LISTING_ACCESS_TOKEN` / `POSTMARK_SERVER_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env vars provide
    /// the required secrets.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.listing.access_token = load_credential("access_token", "LISTING_ACCESS_TOKEN").await?;
        self.email.transport_key =
            load_credential("transport_key", "POSTMARK_SERVER_TOKEN").await?;
        Ok(())
    }

    /// Per-run deadline as a [`Duration`].
    #[must_use]
    pub fn run_deadline(&self) -> Duration {
        Duration::from_secs(self.run_deadline_seconds)
    }

    fn validate(&self) -> Result<()> {
        if !self
            .listing
            .entry_url_template
            .contains(ACCESS_TOKEN_PLACEHOLDER)
        {
            return Err(AppError::Config(format!(
                "listing.entry_url_template must contain {ACCESS_TOKEN_PLACEHOLDER}"
            )));
        }

        if self.listing.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(AppError::Config("listing.keywords must not be empty".into()));
        }

        if self.listing.max_pages == Some(0) {
            return Err(AppError::Config(
                "listing.max_pages must be greater than zero".into(),
            ));
        }

        if self.store.endpoint.trim().is_empty() || self.store.database.trim().is_empty() {
            return Err(AppError::Config(
                "store.endpoint and store.database must not be empty".into(),
            ));
        }

        if self.store.collection.trim().is_empty() {
            return Err(AppError::Config("store.collection must not be empty".into()));
        }

        if self.email.from.trim().is_empty() || self.email.to.trim().is_empty() {
            return Err(AppError::Config(
                "email.from and email.to must not be empty".into(),
            ));
        }

        if self.run_deadline_seconds == 0 {
            return Err(AppError::Config(
                "run_deadline_seconds must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    match env::var(env_key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))),
    }
}
