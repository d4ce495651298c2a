//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all pipeline failure modes.
///
/// Per-record extraction problems are not represented here: a malformed
/// listing entry is dropped with a warning and never fails the page.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing, validation, or credential failure.
    Config(String),
    /// Browser session, navigation, or in-page evaluation failure.
    Navigation(String),
    /// In-page extraction payload could not be decoded.
    Extraction(String),
    /// Persistence failure when interacting with the seen store.
    Store(String),
    /// Notification provider unreachable or message rejected.
    Transport(String),
    /// The per-run deadline elapsed.
    Timeout(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Navigation(msg) => write!(f, "navigation: {msg}"),
            Self::Extraction(msg) => write!(f, "extraction: {msg}"),
            Self::Store(msg) => write!(f, "store: {msg}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err.to_string())
    }
}
