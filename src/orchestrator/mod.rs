//! End-to-end run orchestration.
//!
//! One run walks through
//! `Scraping → Diffing → (NotifyingNew | NotifyingAllFallback) → Persisting → Done`.
//! A scraping failure is fatal and nothing is sent. A store failure while
//! diffing switches to notify-all and skips persisting. A failed send never
//! persists. A persisting failure is logged; the next run re-notifies.

pub mod diff;

use std::fmt;
use std::sync::Arc;

use tokio::time::{timeout_at, Instant};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::browser::BrowserLauncher;
use crate::listing::{KeywordFilter, ListingCursor};
use crate::models::IdentifiedRecord;
use crate::notify::{compose, OutboundEmail, Transport};
use crate::persistence::{SeenStore, StoreConnector};
use crate::{AppError, GlobalConfig, Result};

pub use diff::{diff_against_store, identify_all, new_postings, DiffOutcome};

/// Stage of a run, used for logging transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Walking the listing.
    Scraping,
    /// Loading the seen set and computing new postings.
    Diffing,
    /// Sending the new postings.
    NotifyingNew,
    /// Sending every scraped posting because the seen set was unavailable.
    NotifyingAllFallback,
    /// Recording the sent postings.
    Persisting,
    /// Run finished.
    Done,
    /// Run aborted.
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scraping => "scraping",
            Self::Diffing => "diffing",
            Self::NotifyingNew => "notifying_new",
            Self::NotifyingAllFallback => "notifying_all_fallback",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How a completed run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing to send; no email, no persistence.
    NothingNew,
    /// New postings sent; `persisted` is false when recording them failed.
    Notified { sent: usize, persisted: bool },
    /// Seen set unavailable; every scraped posting sent, nothing persisted.
    FallbackNotified { sent: usize },
    /// The provider did not confirm the send; nothing persisted.
    DeliveryFailed { attempted: usize, reason: String },
    /// Dry run; this many postings would have been sent.
    DryRun { would_send: usize },
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Identifier attached to every log line of the run.
    pub run_id: String,
    /// Listing pages read.
    pub pages: u32,
    /// Matching postings after in-run deduplication.
    pub scraped: usize,
    /// How the run ended.
    pub outcome: RunOutcome,
}

/// Scraped postings and how many pages produced them.
struct Scrape {
    pages: u32,
    records: Vec<IdentifiedRecord>,
}

/// Sequences scraping, diffing, notification, and persistence for one run.
pub struct Orchestrator {
    config: Arc<GlobalConfig>,
    browser: Arc<dyn BrowserLauncher>,
    store: Arc<dyn StoreConnector>,
    transport: Arc<dyn Transport>,
    dry_run: bool,
}

impl Orchestrator {
    /// Assemble an orchestrator from its configuration and collaborators.
    #[must_use]
    pub fn new(
        config: Arc<GlobalConfig>,
        browser: Arc<dyn BrowserLauncher>,
        store: Arc<dyn StoreConnector>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            browser,
            store,
            transport,
            dry_run: false,
        }
    }

    /// Skip sending and persisting; report what would be sent.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Execute one run under the configured deadline.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Navigation` or `AppError::Extraction` when
    /// scraping fails, `AppError::Config` for an unusable keyword list, and
    /// `AppError::Timeout` when the deadline elapses. Store and transport
    /// failures are absorbed into the [`RunOutcome`].
    pub async fn run(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("run", %run_id);
        self.run_inner(run_id.clone()).instrument(span).await
    }

    async fn run_inner(&self, run_id: String) -> Result<RunReport> {
        let deadline = Instant::now() + self.config.run_deadline();

        let scrape = match self.scrape(deadline).await {
            Ok(scrape) => scrape,
            Err(err) => {
                error!(phase = %RunPhase::Failed, %err, "scrape failed; nothing sent");
                return Err(err);
            }
        };
        let scraped = scrape.records.len();

        info!(phase = %RunPhase::Diffing, scraped, "entering phase");
        let store = match timeout_at(deadline, self.store.connect()).await {
            Ok(Ok(store)) => Some(store),
            Ok(Err(err)) => {
                warn!(%err, "seen store unreachable; falling back to notify-all");
                None
            }
            Err(_) => {
                error!(phase = %RunPhase::Failed, "run deadline elapsed connecting to seen store");
                return Err(AppError::Timeout("run deadline elapsed connecting to seen store".into()));
            }
        };

        let delivered = timeout_at(deadline, self.deliver(store.as_deref(), scrape.records)).await;

        if let Some(store) = store {
            store.close().await;
        }

        let Ok(outcome) = delivered else {
            error!(phase = %RunPhase::Failed, "run deadline elapsed during delivery");
            return Err(AppError::Timeout("run deadline elapsed during delivery".into()));
        };

        info!(phase = %RunPhase::Done, pages = scrape.pages, scraped, ?outcome, "run complete");
        Ok(RunReport {
            run_id,
            pages: scrape.pages,
            scraped,
            outcome,
        })
    }

    /// Walk the listing to completion. The browser is closed on every path.
    async fn scrape(&self, deadline: Instant) -> Result<Scrape> {
        info!(phase = %RunPhase::Scraping, "entering phase");
        let filter = KeywordFilter::new(&self.config.listing.keywords)?;

        let page = timeout_at(deadline, self.browser.launch())
            .await
            .map_err(|_| AppError::Timeout("run deadline elapsed launching browser".into()))??;

        let mut cursor = ListingCursor::new(
            page,
            &self.config.listing,
            &self.config.browser,
            filter,
        );
        let walked = timeout_at(deadline, cursor.collect_all()).await;
        let pages = cursor.pages_read();

        if let Err(err) = cursor.close().await {
            warn!(%err, "failed to close browser session");
        }

        let raw = walked
            .map_err(|_| AppError::Timeout(format!("run deadline elapsed after {pages} page(s)")))??;

        let records = identify_all(raw);
        info!(pages, records = records.len(), "listing scraped");
        Ok(Scrape { pages, records })
    }

    /// Diff, notify, and persist. Without a store every posting is sent.
    async fn deliver(&self, store: Option<&dyn SeenStore>, records: Vec<IdentifiedRecord>) -> RunOutcome {
        let diff = match store {
            Some(store) => diff_against_store(store, records).await,
            None => DiffOutcome::DegradedAll(records),
        };

        match diff {
            DiffOutcome::Fresh(new) => self.notify_new(store, new).await,
            DiffOutcome::DegradedAll(all) => self.notify_all(all).await,
        }
    }

    async fn notify_new(&self, store: Option<&dyn SeenStore>, new: Vec<IdentifiedRecord>) -> RunOutcome {
        if new.is_empty() {
            info!("no new postings");
            return RunOutcome::NothingNew;
        }

        info!(phase = %RunPhase::NotifyingNew, new = new.len(), "entering phase");
        if self.dry_run {
            return self.dry_run_outcome(&new);
        }

        if let Err(reason) = self.send(&new).await {
            error!(%reason, "notification not confirmed; skipping persistence");
            return RunOutcome::DeliveryFailed {
                attempted: new.len(),
                reason: reason.to_string(),
            };
        }

        info!(phase = %RunPhase::Persisting, "entering phase");
        let persisted = match store {
            Some(store) => match store.persist(&new).await {
                Ok(()) => true,
                Err(err) => {
                    warn!(%err, "failed to persist notified postings; they will be sent again");
                    false
                }
            },
            None => false,
        };

        RunOutcome::Notified {
            sent: new.len(),
            persisted,
        }
    }

    async fn notify_all(&self, all: Vec<IdentifiedRecord>) -> RunOutcome {
        if all.is_empty() {
            info!("nothing scraped; no fallback notification");
            return RunOutcome::NothingNew;
        }

        warn!(phase = %RunPhase::NotifyingAllFallback, postings = all.len(), "entering phase");
        if self.dry_run {
            return self.dry_run_outcome(&all);
        }

        match self.send(&all).await {
            Ok(()) => RunOutcome::FallbackNotified { sent: all.len() },
            Err(reason) => {
                error!(%reason, "fallback notification not confirmed");
                RunOutcome::DeliveryFailed {
                    attempted: all.len(),
                    reason: reason.to_string(),
                }
            }
        }
    }

    /// Compose and send; `Ok` only when the provider confirmed delivery.
    async fn send(&self, records: &[IdentifiedRecord]) -> Result<()> {
        let message = compose(records, self.config.email.escape_markup);
        let email = OutboundEmail::build(&self.config.email, &message);

        let receipt = self.transport.send(&email).await?;
        if receipt.is_delivered() {
            info!(sent = records.len(), "notification sent");
            Ok(())
        } else {
            Err(AppError::Transport(format!(
                "provider error {}: {}",
                receipt.error_code, receipt.message
            )))
        }
    }

    fn dry_run_outcome(&self, records: &[IdentifiedRecord]) -> RunOutcome {
        let message = compose(records, self.config.email.escape_markup);
        info!(body = %message.text, "dry run; not sending");
        RunOutcome::DryRun {
            would_send: records.len(),
        }
    }
}
