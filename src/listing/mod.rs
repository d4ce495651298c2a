//! Paginated listing walker.
//!
//! A [`ListingCursor`] owns the browser page for the duration of a run and
//! yields one [`PageBatch`] per listing page. Advancing the cursor clicks
//! the page's "next" control, so batches come out strictly in order, the
//! cursor cannot be restarted, and the page cannot be shared.
//!
//! The walk ends when a page has no "next" control. Without a configured
//! `max_pages` there is no other bound.

pub mod extract;
pub mod keywords;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::{BrowserPage, Locator};
use crate::config::{BrowserConfig, ListingConfig};
use crate::models::RawRecord;
use crate::{AppError, Result};

pub use extract::{PageBatch, EXTRACT_SCRIPT};
pub use keywords::KeywordFilter;

/// Where the cursor stands in the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    /// Entry URL not loaded yet.
    Unopened,
    /// A page is displayed and has not been read.
    Ready,
    /// The displayed page has been read; the next step looks for "next".
    Read,
    /// No further pages, or the walk failed.
    Exhausted,
}

/// Lazy, finite, non-restartable sequence of listing pages.
pub struct ListingCursor {
    page: Box<dyn BrowserPage>,
    listing: ListingConfig,
    browser: BrowserConfig,
    filter: KeywordFilter,
    list_locator: Locator,
    next_locator: Locator,
    state: CursorState,
    pages_read: u32,
}

impl ListingCursor {
    /// Wrap `page`; nothing is loaded until the first [`next_batch`](Self::next_batch).
    #[must_use]
    pub fn new(
        page: Box<dyn BrowserPage>,
        listing: &ListingConfig,
        browser: &BrowserConfig,
        filter: KeywordFilter,
    ) -> Self {
        Self {
            page,
            list_locator: Locator::css(listing.list_selector.clone()),
            next_locator: Locator::css(listing.next_page_selector.clone()),
            listing: listing.clone(),
            browser: browser.clone(),
            filter,
            state: CursorState::Unopened,
            pages_read: 0,
        }
    }

    /// Number of pages extracted so far.
    #[must_use]
    pub fn pages_read(&self) -> u32 {
        self.pages_read
    }

    /// Read the next page, or `None` once the listing is exhausted.
    ///
    /// After an error the cursor is exhausted and yields nothing more.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Navigation` if loading, waiting, clicking, or
    /// evaluating fails, or if `max_pages` is reached while more pages
    /// remain. Returns `AppError::Extraction` if a page payload is
    /// unreadable.
    pub async fn next_batch(&mut self) -> Result<Option<PageBatch>> {
        let result = self.advance().await;
        if result.is_err() {
            self.state = CursorState::Exhausted;
        }
        result
    }

    /// Drain the cursor, concatenating every page's records.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`next_batch`](Self::next_batch);
    /// records read before the failure are discarded.
    pub async fn collect_all(&mut self) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            info!(
                page = batch.page,
                records = batch.records.len(),
                dropped = batch.dropped,
                "listing page read"
            );
            records.extend(batch.records);
        }
        Ok(records)
    }

    /// Release the browser page.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Navigation` if the session teardown fails.
    pub async fn close(mut self) -> Result<()> {
        self.state = CursorState::Exhausted;
        self.page.close().await
    }

    async fn advance(&mut self) -> Result<Option<PageBatch>> {
        loop {
            match self.state {
                CursorState::Exhausted => return Ok(None),
                CursorState::Unopened => {
                    self.open().await?;
                    self.state = CursorState::Ready;
                }
                CursorState::Read => {
                    if !self.turn_page().await? {
                        debug!(pages = self.pages_read, "no next page control; walk complete");
                        self.state = CursorState::Exhausted;
                        return Ok(None);
                    }
                    self.state = CursorState::Ready;
                }
                CursorState::Ready => {
                    let batch = self.read_page().await?;
                    self.state = CursorState::Read;
                    return Ok(Some(batch));
                }
            }
        }
    }

    /// Load the entry URL and apply the "active postings" filter if present.
    async fn open(&mut self) -> Result<()> {
        let url = self.listing.entry_url();
        self.page.navigate(&url).await?;

        let filter_control = Locator::text(self.listing.filter_control_text.clone());
        match self
            .page
            .wait_for_selector(&filter_control, self.browser.filter_wait())
            .await?
        {
            Some(control) => {
                self.page.click(&control).await?;
                self.settle().await;
                debug!("active postings filter applied");
            }
            None => {
                warn!(
                    control = %self.listing.filter_control_text,
                    "filter control not found; reading unfiltered listing"
                );
            }
        }
        Ok(())
    }

    /// Click "next" if present. Returns `false` when there is no next page.
    async fn turn_page(&mut self) -> Result<bool> {
        let Some(next) = self.page.query(&self.next_locator).await? else {
            return Ok(false);
        };

        if let Some(max) = self.listing.max_pages {
            if self.pages_read >= max {
                return Err(AppError::Navigation(format!(
                    "listing still has pages after max_pages={max}"
                )));
            }
        }

        self.page.click(&next).await?;
        self.settle().await;
        Ok(true)
    }

    async fn read_page(&mut self) -> Result<PageBatch> {
        let page_number = self.pages_read + 1;

        if self
            .page
            .wait_for_selector(&self.list_locator, self.browser.wait_timeout())
            .await?
            .is_none()
        {
            return Err(AppError::Navigation(format!(
                "listing container {} missing on page {page_number}",
                self.list_locator
            )));
        }

        let args = vec![
            Value::String(self.listing.list_selector.clone()),
            Value::String(self.filter.pattern().to_owned()),
            Value::String(self.listing.details_caption.clone()),
        ];
        let payload = self.page.evaluate(EXTRACT_SCRIPT, args).await?;
        let batch = extract::decode_page(payload, page_number, &self.filter)?;

        self.pages_read = page_number;
        Ok(batch)
    }

    async fn settle(&self) {
        let pause = self.browser.settle();
        if !pause.is_zero() {
            sleep(pause).await;
        }
    }
}
