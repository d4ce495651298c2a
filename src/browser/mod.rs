//! Browser automation boundary.
//!
//! The listing walker only needs a handful of primitives from a live
//! page: navigate, wait for an element, look one up, click it, and run a
//! script in the page. [`BrowserPage`] captures exactly those so the
//! walker can be driven by a real WebDriver session or by a scripted fake.

pub mod webdriver;

use std::time::Duration;

use serde_json::Value;

use crate::{BoxFuture, Result};

/// How an element is located on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// CSS selector.
    Css(String),
    /// Innermost element whose whitespace-normalized text content equals
    /// the given string.
    Text(String),
}

impl Locator {
    /// Build a CSS locator.
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Build an exact-text locator.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(selector) => write!(f, "css:{selector}"),
            Self::Text(text) => write!(f, "text:{text}"),
        }
    }
}

/// Opaque reference to an element on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle(pub String);

/// A single browser page whose state advances with every interaction.
///
/// Implementations are stateful: clicking a control mutates the only view
/// of the data, so a page is owned by exactly one caller at a time.
pub trait BrowserPage: Send {
    /// Load `url` in the page.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Navigation`](crate::AppError::Navigation) if the page cannot be loaded.
    fn navigate<'a>(&'a mut self, url: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Wait up to `timeout` for an element to appear.
    ///
    /// Returns `Ok(None)` when the element is still absent at the deadline.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Navigation`](crate::AppError::Navigation) if the session fails.
    fn wait_for_selector<'a>(
        &'a mut self,
        locator: &'a Locator,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<Option<ElementHandle>>>;

    /// Look up an element without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Navigation`](crate::AppError::Navigation) if the session fails.
    fn query<'a>(&'a mut self, locator: &'a Locator)
        -> BoxFuture<'a, Result<Option<ElementHandle>>>;

    /// Activate an element.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Navigation`](crate::AppError::Navigation) if the click is rejected.
    fn click<'a>(&'a mut self, element: &'a ElementHandle) -> BoxFuture<'a, Result<()>>;

    /// Run `script` in the page with positional `args` and return its result.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Navigation`](crate::AppError::Navigation) if the script throws
    /// or the session fails.
    fn evaluate<'a>(&'a mut self, script: &'a str, args: Vec<Value>)
        -> BoxFuture<'a, Result<Value>>;

    /// Release the page and its browser session. Calling twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Navigation`](crate::AppError::Navigation) if teardown fails.
    fn close(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Opens a fresh browser page for one run.
pub trait BrowserLauncher: Send + Sync {
    /// Start a browser session and return its page.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Navigation`](crate::AppError::Navigation) if no session can be created.
    fn launch(&self) -> BoxFuture<'_, Result<Box<dyn BrowserPage>>>;
}
