//! Executable filter description produced by the builder.
//!
//! A [`Predicate`] says *what* to select; [`QueryExecutor`](super::QueryExecutor)
//! decides how. Boolean nodes map to set algebra over topic ids: `And`
//! intersects, `Or` unions, `Not` complements against the whole corpus.

use crate::corpus::{PersonId, UserId};
use crate::query::ast::Artifact;
use crate::utils::{CountFilter, extract_tokens, normalize_phrase, tokenize};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fields searched by a plain text term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFields {
    Title,
    Body,
    #[default]
    Both,
}

impl TextFields {
    pub fn as_str(self) -> &'static str {
        match self {
            TextFields::Title => "title",
            TextFields::Body => "body",
            TextFields::Both => "both",
        }
    }
}

/// A term or an exact phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextMatch {
    pub term: String,
    pub phrase: bool,
}

impl TextMatch {
    pub fn new(term: impl Into<String>, phrase: bool) -> Self {
        Self {
            term: term.into(),
            phrase,
        }
    }

    /// Lowercase tokens of a non-phrase term. Empty for phrases and for
    /// terms without any word characters.
    pub fn tokens(&self) -> Vec<String> {
        if self.phrase { Vec::new() } else { tokenize(&self.term) }
    }

    /// Whether the term occurs in `text`: every token for a term, a
    /// case-insensitive substring for a phrase (or a term with no tokens).
    pub fn matches(&self, text: &str) -> bool {
        let tokens = self.tokens();
        if tokens.is_empty() {
            let needle = normalize_phrase(&self.term);
            if needle.is_empty() {
                return true;
            }
            let haystack = normalize_phrase(text);
            return memchr::memmem::find(haystack.as_bytes(), needle.as_bytes()).is_some();
        }
        let words = extract_tokens(text);
        tokens.iter().all(|token| words.contains(token))
    }
}

/// Half-open instant range: `after <= t < before`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn after(instant: DateTime<Utc>) -> Self {
        Self {
            after: Some(instant),
            before: None,
        }
    }

    pub fn before(instant: DateTime<Utc>) -> Self {
        Self {
            after: None,
            before: Some(instant),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.after.is_none() && self.before.is_none()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.after.is_none_or(|after| instant >= after)
            && self.before.is_none_or(|before| instant < before)
    }
}

/// Which people a selector refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorMatch {
    /// Lowercase substring of alias name or email (username for users)
    Name(String),
    Person(PersonId),
    User(UserId),
    /// No author restriction
    Any,
}

/// Constraints on an author's messages within one topic.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MessageScope {
    /// Only messages sent inside this window are considered
    pub window: DateRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<TextMatch>,
    /// Number of considered messages. Defaults to at least one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<CountFilter>,
    pub first: DateRange,
    pub last: DateRange,
}

/// Constraints on the artifacts counted by `has:`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactScope {
    pub author: AuthorMatch,
    pub window: DateRange,
    pub count: CountFilter,
}

impl Default for ArtifactScope {
    fn default() -> Self {
        Self {
            author: AuthorMatch::Any,
            window: DateRange::default(),
            count: CountFilter::any(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TagScope {
    /// Tagging user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_by: Option<AuthorMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_before: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CommitfestScope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Topic timestamp a date selector compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    /// Topic creation (first message)
    First,
    /// Latest message
    Last,
    /// Any message in the topic
    AnyMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountField {
    Messages,
    Participants,
    Contributors,
}

/// Per-user topic state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Starred,
    Notes,
    Read,
    Reading,
    Unread,
    New,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Every topic
    All,
    /// No topic
    Nothing,
    Text {
        text: TextMatch,
        fields: TextFields,
    },
    Author {
        author: AuthorMatch,
        scope: MessageScope,
    },
    Date {
        field: DateField,
        range: DateRange,
    },
    Count {
        field: CountField,
        filter: CountFilter,
    },
    Has {
        artifact: Artifact,
        scope: ArtifactScope,
    },
    /// Note tag, by lowercase name prefix (`None` = any tag)
    Tag {
        name: Option<String>,
        scope: TagScope,
    },
    /// Commitfest membership, by lowercase name prefix (`None` = any)
    Commitfest {
        name: Option<String>,
        scope: CommitfestScope,
    },
    /// Patch status in any commitfest, by lowercase prefix
    Status {
        status: String,
    },
    State {
        state: StateKind,
        user_id: UserId,
    },
    Not {
        inner: Box<Predicate>,
    },
    And {
        children: Vec<Predicate>,
    },
    Or {
        children: Vec<Predicate>,
    },
}

impl Predicate {
    pub fn not(inner: Predicate) -> Predicate {
        Predicate::Not {
            inner: Box::new(inner),
        }
    }

    pub fn and(children: Vec<Predicate>) -> Predicate {
        Predicate::And { children }
    }

    pub fn or(children: Vec<Predicate>) -> Predicate {
        Predicate::Or { children }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Predicate::Nothing)
    }
}

fn write_range(f: &mut fmt::Formatter<'_>, range: &DateRange) -> fmt::Result {
    match (range.after, range.before) {
        (Some(after), Some(before)) => write!(f, "[{}, {})", after.to_rfc3339(), before.to_rfc3339()),
        (Some(after), None) => write!(f, ">= {}", after.to_rfc3339()),
        (None, Some(before)) => write!(f, "< {}", before.to_rfc3339()),
        (None, None) => f.write_str("any time"),
    }
}

impl fmt::Display for AuthorMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorMatch::Name(name) => write!(f, "{:?}", name),
            AuthorMatch::Person(id) => write!(f, "person #{}", id),
            AuthorMatch::User(id) => write!(f, "user #{}", id),
            AuthorMatch::Any => f.write_str("anyone"),
        }
    }
}

/// Compact one-line rendering used by `explain`.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::All => f.write_str("all"),
            Predicate::Nothing => f.write_str("nothing"),
            Predicate::Text { text, fields } => {
                let kind = if text.phrase { "phrase" } else { "text" };
                write!(f, "{}({:?} in {})", kind, text.term, fields.as_str())
            }
            Predicate::Author { author, scope } => {
                write!(f, "from({}", author)?;
                if let Some(count) = &scope.count {
                    write!(f, ", messages {}", count)?;
                }
                if let Some(body) = &scope.body {
                    write!(f, ", body {:?}", body.term)?;
                }
                for (label, range) in [("sent", &scope.window), ("first", &scope.first), ("last", &scope.last)] {
                    if !range.is_unbounded() {
                        write!(f, ", {} ", label)?;
                        write_range(f, range)?;
                    }
                }
                f.write_str(")")
            }
            Predicate::Date { field, range } => {
                let label = match field {
                    DateField::First => "first",
                    DateField::Last => "last",
                    DateField::AnyMessage => "message",
                };
                write!(f, "{} ", label)?;
                write_range(f, range)
            }
            Predicate::Count { field, filter } => {
                let label = match field {
                    CountField::Messages => "messages",
                    CountField::Participants => "participants",
                    CountField::Contributors => "contributors",
                };
                write!(f, "{} {}", label, filter)
            }
            Predicate::Has { artifact, scope } => {
                write!(f, "has({:?} {}", artifact, scope.count)?;
                if scope.author != AuthorMatch::Any {
                    write!(f, ", from {}", scope.author)?;
                }
                if !scope.window.is_unbounded() {
                    f.write_str(", sent ")?;
                    write_range(f, &scope.window)?;
                }
                f.write_str(")")
            }
            Predicate::Tag { name, scope } => {
                write!(f, "tag({}", name.as_deref().unwrap_or("*"))?;
                if let Some(by) = &scope.added_by {
                    write!(f, ", by {}", by)?;
                }
                if let Some(before) = scope.added_before {
                    write!(f, ", added < {}", before.to_rfc3339())?;
                }
                f.write_str(")")
            }
            Predicate::Commitfest { name, scope } => {
                write!(f, "commitfest({}", name.as_deref().unwrap_or("*"))?;
                if let Some(status) = &scope.status {
                    write!(f, ", status {}", status)?;
                }
                if let Some(tag) = &scope.tag {
                    write!(f, ", tag {}", tag)?;
                }
                f.write_str(")")
            }
            Predicate::Status { status } => write!(f, "status({})", status),
            Predicate::State { state, user_id } => write!(f, "{:?}(user #{})", state, user_id),
            Predicate::Not { inner } => write!(f, "not({})", inner),
            Predicate::And { children } | Predicate::Or { children } => {
                let name = if matches!(self, Predicate::And { .. }) { "and" } else { "or" };
                write!(f, "{}(", name)?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_text_match_tokens() {
        let text = TextMatch::new("PostgreSQL performance", false);
        assert!(text.matches("Tips on performance for postgresql users"));
        assert!(!text.matches("PostgreSQL internals"));
    }

    #[test]
    fn test_text_match_phrase() {
        let phrase = TextMatch::new("optimizing  postgresql", true);
        assert!(phrase.matches("Notes on Optimizing PostgreSQL queries"));
        assert!(!phrase.matches("postgresql optimizing"));
    }

    #[test]
    fn test_text_match_symbols_fall_back_to_substring() {
        let text = TextMatch::new("++", false);
        assert!(text.matches("c++ bindings"));
        assert!(!text.matches("c bindings"));
    }

    #[test]
    fn test_date_range_half_open() {
        let t = |d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();
        let range = DateRange {
            after: Some(t(10)),
            before: Some(t(20)),
        };
        assert!(range.contains(t(10)));
        assert!(range.contains(t(19)));
        assert!(!range.contains(t(20)));
        assert!(!range.contains(t(9)));
        assert!(DateRange::default().contains(t(1)));
    }

    #[test]
    fn test_display() {
        let predicate = Predicate::and(vec![
            Predicate::Text {
                text: TextMatch::new("vacuum", false),
                fields: TextFields::Both,
            },
            Predicate::not(Predicate::Status {
                status: "committed".to_string(),
            }),
        ]);
        assert_eq!(
            predicate.to_string(),
            "and(text(\"vacuum\" in both), not(status(committed)))"
        );
    }
}
