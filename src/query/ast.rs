//! Query AST: text terms, `key:value` selectors and boolean groups.

use crate::utils::CountFilter;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Validation/build category of a selector key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyCategory {
    /// Free string: author, substring, tag/commitfest/status name
    TextMatch,
    /// Must be `me`
    IdentityState,
    /// Relative or absolute date
    Date,
    /// Optional comparator + integer
    Count,
    /// Artifact kind for `has:`
    Presence,
}

/// A recognized selector key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    From,
    Title,
    Body,
    Tag,
    Commitfest,
    Status,
    Unread,
    Read,
    Reading,
    New,
    Starred,
    Notes,
    FirstAfter,
    FirstBefore,
    LastAfter,
    LastBefore,
    MessagesAfter,
    MessagesBefore,
    AddedBefore,
    Messages,
    Participants,
    Contributors,
    Count,
    Has,
}

/// One row of the key table.
#[derive(Debug)]
pub struct KeySpec {
    pub key: Key,
    pub name: &'static str,
    pub category: KeyCategory,
    /// Keys allowed inside `[...]` after this selector
    pub conditions: &'static [Key],
    /// Whether `key:[cond]` with an empty value is meaningful
    pub scoped_without_value: bool,
}

const AUTHOR_CONDITIONS: &[Key] = &[
    Key::Messages,
    Key::Count,
    Key::Body,
    Key::FirstAfter,
    Key::FirstBefore,
    Key::LastAfter,
    Key::LastBefore,
    Key::MessagesAfter,
    Key::MessagesBefore,
];
const ARTIFACT_CONDITIONS: &[Key] = &[Key::From, Key::Count, Key::MessagesAfter, Key::MessagesBefore];
const TAG_CONDITIONS: &[Key] = &[Key::From, Key::AddedBefore];
const COMMITFEST_CONDITIONS: &[Key] = &[Key::Status, Key::Tag];

const fn entry(key: Key, name: &'static str, category: KeyCategory) -> KeySpec {
    KeySpec {
        key,
        name,
        category,
        conditions: &[],
        scoped_without_value: false,
    }
}

const fn scoped(
    key: Key,
    name: &'static str,
    category: KeyCategory,
    conditions: &'static [Key],
    scoped_without_value: bool,
) -> KeySpec {
    KeySpec {
        key,
        name,
        category,
        conditions,
        scoped_without_value,
    }
}

/// Every recognized key with its category and allowed conditions.
pub static KEY_TABLE: &[KeySpec] = &[
    scoped(Key::From, "from", KeyCategory::TextMatch, AUTHOR_CONDITIONS, true),
    entry(Key::Title, "title", KeyCategory::TextMatch),
    entry(Key::Body, "body", KeyCategory::TextMatch),
    scoped(Key::Tag, "tag", KeyCategory::TextMatch, TAG_CONDITIONS, true),
    scoped(Key::Commitfest, "commitfest", KeyCategory::TextMatch, COMMITFEST_CONDITIONS, true),
    entry(Key::Status, "status", KeyCategory::TextMatch),
    entry(Key::Unread, "unread", KeyCategory::IdentityState),
    entry(Key::Read, "read", KeyCategory::IdentityState),
    entry(Key::Reading, "reading", KeyCategory::IdentityState),
    entry(Key::New, "new", KeyCategory::IdentityState),
    entry(Key::Starred, "starred", KeyCategory::IdentityState),
    entry(Key::Notes, "notes", KeyCategory::IdentityState),
    entry(Key::FirstAfter, "first_after", KeyCategory::Date),
    entry(Key::FirstBefore, "first_before", KeyCategory::Date),
    entry(Key::LastAfter, "last_after", KeyCategory::Date),
    entry(Key::LastBefore, "last_before", KeyCategory::Date),
    entry(Key::MessagesAfter, "messages_after", KeyCategory::Date),
    entry(Key::MessagesBefore, "messages_before", KeyCategory::Date),
    entry(Key::AddedBefore, "added_before", KeyCategory::Date),
    entry(Key::Messages, "messages", KeyCategory::Count),
    entry(Key::Participants, "participants", KeyCategory::Count),
    entry(Key::Contributors, "contributors", KeyCategory::Count),
    entry(Key::Count, "count", KeyCategory::Count),
    scoped(Key::Has, "has", KeyCategory::Presence, ARTIFACT_CONDITIONS, false),
];

impl Key {
    /// Look up a key by name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Key> {
        KEY_TABLE
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(name))
            .map(|spec| spec.key)
    }

    pub fn spec(self) -> &'static KeySpec {
        // The table lists every variant exactly once, in declaration order.
        &KEY_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn category(self) -> KeyCategory {
        self.spec().category
    }

    pub fn accepts_condition(self, condition: Key) -> bool {
        self.spec().conditions.contains(&condition)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Selector key as written: recognized, or captured verbatim for the validator to reject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectorKey {
    Known(Key),
    Unknown(String),
}

impl SelectorKey {
    pub fn parse(name: &str) -> Self {
        match Key::from_name(name) {
            Some(key) => SelectorKey::Known(key),
            None => SelectorKey::Unknown(name.to_string()),
        }
    }

    pub fn known(&self) -> Option<Key> {
        match self {
            SelectorKey::Known(key) => Some(*key),
            SelectorKey::Unknown(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SelectorKey::Known(key) => key.name(),
            SelectorKey::Unknown(name) => name,
        }
    }
}

impl From<Key> for SelectorKey {
    fn from(key: Key) -> Self {
        SelectorKey::Known(key)
    }
}

impl PartialEq<Key> for SelectorKey {
    fn eq(&self, other: &Key) -> bool {
        self.known() == Some(*other)
    }
}

impl fmt::Display for SelectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SelectorKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Sub-resource kinds for `has:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    Attachment,
    Patch,
    Contributor,
    Committer,
    CoreTeam,
}

impl Artifact {
    pub fn from_name(name: &str) -> Option<Artifact> {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "attachment" | "attachments" => Some(Artifact::Attachment),
            "patch" | "patches" => Some(Artifact::Patch),
            "contributor" | "contributors" | "contributor_reply" => Some(Artifact::Contributor),
            "committer" | "committers" => Some(Artifact::Committer),
            "core_team" | "core" => Some(Artifact::CoreTeam),
            _ => None,
        }
    }
}

/// Value resolved by the validator. The textual value stays on the node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolved {
    Instant(DateTime<Utc>),
    Count(CountFilter),
    Presence(Artifact),
    /// `me`
    Requester,
}

/// Bracket-scoped constraint on a selector. Never nests, never negated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub key: SelectorKey,
    pub value: String,
    pub quoted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Resolved>,
}

impl Condition {
    pub fn new(key: impl Into<SelectorKey>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            quoted: false,
            resolved: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub value: String,
    pub quoted: bool,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selector {
    pub key: SelectorKey,
    pub value: String,
    pub quoted: bool,
    pub negated: bool,
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Resolved>,
}

impl Selector {
    pub fn new(key: impl Into<SelectorKey>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            quoted: false,
            negated: false,
            conditions: Vec::new(),
            resolved: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub children: Vec<Node>,
    pub negated: bool,
}

/// Query AST node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Text(Text),
    Selector(Selector),
    And(Group),
    Or(Group),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Node {
        Node::Text(Text {
            value: value.into(),
            quoted: false,
            negated: false,
        })
    }

    pub fn and(children: Vec<Node>) -> Node {
        Node::And(Group {
            children,
            negated: false,
        })
    }

    pub fn or(children: Vec<Node>) -> Node {
        Node::Or(Group {
            children,
            negated: false,
        })
    }

    pub fn is_negated(&self) -> bool {
        match self {
            Node::Text(text) => text.negated,
            Node::Selector(selector) => selector.negated,
            Node::And(group) | Node::Or(group) => group.negated,
        }
    }

    /// Flip negation on the node itself.
    pub fn negate(mut self) -> Node {
        match &mut self {
            Node::Text(text) => text.negated = !text.negated,
            Node::Selector(selector) => selector.negated = !selector.negated,
            Node::And(group) | Node::Or(group) => group.negated = !group.negated,
        }
        self
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::And(group) | Node::Or(group) => &group.children,
            _ => &[],
        }
    }

    pub fn as_selector(&self) -> Option<&Selector> {
        match self {
            Node::Selector(selector) => Some(selector),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &str, quoted: bool) -> fmt::Result {
    if quoted {
        write!(f, "\"{}\"", value)
    } else {
        f.write_str(value)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.key)?;
        write_value(f, &self.value, self.quoted)
    }
}

/// Renders back to query syntax.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negated() {
            f.write_str("-")?;
        }
        match self {
            Node::Text(text) => write_value(f, &text.value, text.quoted),
            Node::Selector(selector) => {
                write!(f, "{}:", selector.key)?;
                write_value(f, &selector.value, selector.quoted)?;
                if !selector.conditions.is_empty() {
                    f.write_str("[")?;
                    for (i, condition) in selector.conditions.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", condition)?;
                    }
                    f.write_str("]")?;
                }
                Ok(())
            }
            Node::And(group) | Node::Or(group) => {
                let separator = if matches!(self, Node::And(_)) { " " } else { " OR " };
                f.write_str("(")?;
                for (i, child) in group.children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(separator)?;
                    }
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
        }
    }
}
