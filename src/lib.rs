#![forbid(unsafe_code)]

//! Municipal job-postings watcher.
//!
//! Walks a paginated registry listing through a browser session, keeps the
//! postings matching a keyword set, diffs them against the identifiers
//! already notified, and emails only the new ones.

use std::future::Future;
use std::pin::Pin;

pub mod browser;
pub mod config;
pub mod errors;
pub mod identity;
pub mod listing;
pub mod models;
pub mod notify;
pub mod orchestrator;
pub mod persistence;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};

/// Boxed future returned by the collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
