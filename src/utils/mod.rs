//! Leaf utilities shared by the query pipeline and the corpus.
//!
//! ## Modules
//!
//! - [`date`] - Relative and absolute date values (`7d`, `2024-01`, ...)
//! - [`count`] - Comparator + integer values (`>=10`)
//! - [`tokenizer`] - Word tokenization for text matching
//!
//! ## Key Functions
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use topic_search::utils::{parse_count, parse_date, tokenize};
//!
//! let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
//! assert!(parse_date("2w", now).is_some());
//! assert_eq!(parse_count(">=10").unwrap().value, 10);
//! assert_eq!(tokenize("MySQL vs PostgreSQL"), vec!["mysql", "vs", "postgresql"]);
//! ```

pub mod count;
pub mod date;
pub mod tokenizer;

pub use count::*;
pub use date::*;
pub use tokenizer::*;
