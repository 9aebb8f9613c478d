//! Search query pipeline: parse, validate, build, execute.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use topic_search::query::{compile, Predicate};
//!
//! let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
//! let built = compile("vacuum from: -has:patch", now, None).unwrap();
//! assert_eq!(built.warnings[0].to_string(), "empty value for from");
//! assert!(matches!(built.predicate, Predicate::And { .. }));
//! ```

pub mod ast;
pub mod builder;
pub mod executor;
pub mod parser;
pub mod predicate;
pub mod validator;
pub mod warning;

pub use ast::{Condition, Key, KeyCategory, Node, Selector, SelectorKey};
pub use builder::{BuiltQuery, Identity, QueryBuilder, build};
pub use executor::{QueryExecutor, TopicHit};
pub use parser::{is_valid, parse};
pub use predicate::{Predicate, TextFields};
pub use validator::{QueryValidator, ValidatedQuery, validate};
pub use warning::{Warning, WarningKind};

use crate::error::Result;
use chrono::{DateTime, Utc};

/// Run the whole pipeline for `input`. Validator warnings come first,
/// followed by any the builder adds.
pub fn compile(input: &str, now: DateTime<Utc>, requester: Option<Identity>) -> Result<BuiltQuery> {
    compile_with(input, now, QueryBuilder::new(requester))
}

/// [`compile`] with a preconfigured builder.
pub fn compile_with(input: &str, now: DateTime<Utc>, builder: QueryBuilder) -> Result<BuiltQuery> {
    let ast = parse(input)?;
    let validated = validate(ast.as_ref(), now);
    let mut built = builder.build(validated.ast.as_ref());

    let mut warnings = validated.warnings;
    warnings.append(&mut built.warnings);
    built.warnings = warnings;
    Ok(built)
}
