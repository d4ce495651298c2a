//! Domain model module declarations.

pub mod posting;

pub use posting::{IdentifiedRecord, RawRecord, SeenEntry};
