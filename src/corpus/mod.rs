//! Topic corpus the predicates run against.
//!
//! The corpus is loaded once from JSON and kept in memory. Besides the raw
//! tables it carries id lookup maps, per-topic message lists ordered by time,
//! and a token index over titles and message bodies.

pub mod stats;
pub mod store;
pub mod types;

pub use stats::{CorpusStats, show_stats};
pub use store::Corpus;
pub use types::*;
