//! # topic-search - Search query engine for mailing-list topics
//!
//! Compiles a free-text search string into a filter over a corpus of
//! discussion threads ("topics") and their messages, and evaluates it.
//!
//! ## Architecture
//!
//! - [`query`] - Parsing, validation, predicate building and execution
//! - [`corpus`] - In-memory topic store with token index
//! - [`config`] - User configuration in the app data directory
//! - [`output`] - Terminal and JSON rendering
//! - [`utils`] - Date, count and token helpers
//!
//! ## Quick Start
//!
//! ```
//! use chrono::Utc;
//! use topic_search::corpus::Corpus;
//! use topic_search::query::{compile, QueryExecutor};
//!
//! let corpus = Corpus::from_json(r#"{"topics": [{
//!     "id": 1, "title": "PostgreSQL Performance Guide",
//!     "created_at": "2024-01-01T00:00:00Z", "last_message_at": "2024-01-02T00:00:00Z"
//! }]}"#).unwrap();
//!
//! let built = compile("performance -mysql", Utc::now(), None).unwrap();
//! let hits = QueryExecutor::new(&corpus).search(&built, 10);
//! assert_eq!(hits[0].id, 1);
//! ```
//!
//! ## Pipeline
//!
//! 1. **Parse** - string to AST; unbalanced parentheses are the only error
//! 2. **Validate** - prune selectors with bad values, collect warnings
//! 3. **Build** - AST to [`query::Predicate`], resolving `me` against the requester
//! 4. **Execute** - predicate to a roaring bitmap of topic ids

pub mod config;
pub mod corpus;
pub mod error;
pub mod output;
pub mod query;
pub mod utils;

pub use error::{Result, SearchError};
