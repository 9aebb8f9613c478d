//! Compiles a validated AST into a [`Predicate`].
//!
//! The builder never fails. Selectors it cannot honour (an identity selector
//! without a signed-in requester, a value the validator did not resolve)
//! become [`Predicate::Nothing`] plus a warning, and the rest of the query
//! still runs.

use crate::corpus::{PersonId, UserId};
use crate::query::ast::{Condition, Key, KeyCategory, Node, Resolved, Selector, SelectorKey, Text};
use crate::query::predicate::*;
use crate::query::warning::{Warning, WarningKind};
use crate::utils::CountFilter;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

/// The user a search runs on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: UserId,
    /// Person linked to the account, used by `from:me`
    pub person_id: Option<PersonId>,
}

impl Identity {
    pub fn new(user_id: UserId, person_id: Option<PersonId>) -> Self {
        Self { user_id, person_id }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltQuery {
    pub predicate: Predicate,
    pub warnings: Vec<Warning>,
}

/// Build `ast` for `requester` with the default text fields.
pub fn build(ast: Option<&Node>, requester: Option<Identity>) -> BuiltQuery {
    QueryBuilder::new(requester).build(ast)
}

type SelectorBuilder = fn(&mut QueryBuilder, Key, &Selector) -> Predicate;

/// Predicate construction for each key category.
fn builder_for(category: KeyCategory) -> SelectorBuilder {
    match category {
        KeyCategory::TextMatch => QueryBuilder::build_text_match,
        KeyCategory::IdentityState => QueryBuilder::build_identity_state,
        KeyCategory::Date => QueryBuilder::build_date,
        KeyCategory::Count => QueryBuilder::build_count,
        KeyCategory::Presence => QueryBuilder::build_presence,
    }
}

/// A condition that could not be applied; the whole selector matches nothing.
struct Rejected(Warning);

type Applied = std::result::Result<(), Rejected>;

pub struct QueryBuilder {
    requester: Option<Identity>,
    text_fields: TextFields,
    warnings: Vec<Warning>,
    /// Set when the selector being built fell back to `Nothing`
    degraded: bool,
}

impl QueryBuilder {
    pub fn new(requester: Option<Identity>) -> Self {
        Self {
            requester,
            text_fields: TextFields::default(),
            warnings: Vec::new(),
            degraded: false,
        }
    }

    /// Fields a plain text term searches.
    pub fn with_text_fields(mut self, fields: TextFields) -> Self {
        self.text_fields = fields;
        self
    }

    pub fn build(mut self, ast: Option<&Node>) -> BuiltQuery {
        let predicate = match ast {
            Some(node) => self.build_node(node),
            None => Predicate::All,
        };
        BuiltQuery {
            predicate,
            warnings: self.warnings,
        }
    }

    fn build_node(&mut self, node: &Node) -> Predicate {
        let predicate = match node {
            Node::Text(text) => self.build_text(text),
            Node::Selector(selector) => {
                self.degraded = false;
                let predicate = self.build_selector(selector);
                if std::mem::take(&mut self.degraded) {
                    // A degraded selector is always false, negated or not
                    return predicate;
                }
                predicate
            }
            Node::And(group) => {
                Predicate::and(group.children.iter().map(|child| self.build_node(child)).collect())
            }
            Node::Or(group) => {
                Predicate::or(group.children.iter().map(|child| self.build_node(child)).collect())
            }
        };

        if node.is_negated() {
            Predicate::not(predicate)
        } else {
            predicate
        }
    }

    fn build_text(&mut self, text: &Text) -> Predicate {
        Predicate::Text {
            text: TextMatch::new(text.value.as_str(), text.quoted),
            fields: self.text_fields,
        }
    }

    fn build_selector(&mut self, selector: &Selector) -> Predicate {
        match &selector.key {
            SelectorKey::Known(key) => builder_for(key.category())(self, *key, selector),
            SelectorKey::Unknown(name) => {
                self.degrade(Warning::new(WarningKind::UnknownSelector, name.as_str(), &selector.value))
            }
        }
    }

    fn build_text_match(&mut self, key: Key, selector: &Selector) -> Predicate {
        let result = match key {
            Key::From => self.author_predicate(selector),
            Key::Title | Key::Body => Ok(Predicate::Text {
                text: TextMatch::new(selector.value.as_str(), selector.quoted),
                fields: if key == Key::Title { TextFields::Title } else { TextFields::Body },
            }),
            Key::Tag => self.tag_predicate(selector),
            Key::Commitfest => self.commitfest_predicate(selector),
            _ => Ok(Predicate::Status {
                status: selector.value.to_lowercase(),
            }),
        };
        self.finish(result)
    }

    fn build_identity_state(&mut self, key: Key, selector: &Selector) -> Predicate {
        let Some(requester) = self.requester else {
            return self.degrade(Warning::new(WarningKind::RequiresSignIn, key.name(), &selector.value));
        };
        if selector.resolved != Some(Resolved::Requester) {
            return self.degrade(Warning::new(WarningKind::Unresolved, key.name(), &selector.value));
        }

        let state = match key {
            Key::Starred => StateKind::Starred,
            Key::Notes => StateKind::Notes,
            Key::Read => StateKind::Read,
            Key::Reading => StateKind::Reading,
            Key::New => StateKind::New,
            _ => StateKind::Unread,
        };
        Predicate::State {
            state,
            user_id: requester.user_id,
        }
    }

    fn build_date(&mut self, key: Key, selector: &Selector) -> Predicate {
        let Some(Resolved::Instant(instant)) = selector.resolved else {
            return self.degrade(Warning::new(WarningKind::Unresolved, key.name(), &selector.value));
        };

        let (field, range) = match key {
            Key::FirstAfter => (DateField::First, DateRange::after(instant)),
            Key::FirstBefore => (DateField::First, DateRange::before(instant)),
            Key::LastAfter => (DateField::Last, DateRange::after(instant)),
            Key::LastBefore => (DateField::Last, DateRange::before(instant)),
            Key::MessagesAfter => (DateField::AnyMessage, DateRange::after(instant)),
            Key::MessagesBefore => (DateField::AnyMessage, DateRange::before(instant)),
            _ => {
                // added_before on its own: any note tag added before the instant
                return Predicate::Tag {
                    name: None,
                    scope: TagScope {
                        added_by: None,
                        added_before: Some(instant),
                    },
                };
            }
        };
        Predicate::Date { field, range }
    }

    fn build_count(&mut self, key: Key, selector: &Selector) -> Predicate {
        let Some(Resolved::Count(filter)) = selector.resolved else {
            return self.degrade(Warning::new(WarningKind::Unresolved, key.name(), &selector.value));
        };

        let field = match key {
            Key::Participants => CountField::Participants,
            Key::Contributors => CountField::Contributors,
            _ => CountField::Messages,
        };
        Predicate::Count { field, filter }
    }

    fn build_presence(&mut self, key: Key, selector: &Selector) -> Predicate {
        let Some(Resolved::Presence(artifact)) = selector.resolved else {
            return self.degrade(Warning::new(WarningKind::Unresolved, key.name(), &selector.value));
        };

        let mut scope = ArtifactScope::default();
        let applied = self.apply_conditions(key, &selector.conditions, |builder, condition_key, condition| {
            match condition_key {
                Key::From => scope.author = builder.message_author(condition)?,
                Key::Count => scope.count = condition_count(condition_key, condition)?,
                Key::MessagesAfter => scope.window.after = Some(condition_instant(condition_key, condition)?),
                _ => scope.window.before = Some(condition_instant(condition_key, condition)?),
            }
            Ok(())
        });

        self.finish(applied.map(|()| Predicate::Has { artifact, scope }))
    }

    /// `from:` with optional per-author conditions.
    fn author_predicate(&mut self, selector: &Selector) -> std::result::Result<Predicate, Rejected> {
        let author = if selector.value.is_empty() {
            AuthorMatch::Any
        } else {
            self.message_author(&Condition {
                key: SelectorKey::Known(Key::From),
                value: selector.value.clone(),
                quoted: selector.quoted,
                resolved: selector.resolved.clone(),
            })?
        };

        let mut scope = MessageScope::default();
        self.apply_conditions(Key::From, &selector.conditions, |_, key, condition| {
            match key {
                Key::Messages | Key::Count => scope.count = Some(condition_count(key, condition)?),
                Key::Body => scope.body = Some(TextMatch::new(condition.value.as_str(), condition.quoted)),
                Key::FirstAfter => scope.first.after = Some(condition_instant(key, condition)?),
                Key::FirstBefore => scope.first.before = Some(condition_instant(key, condition)?),
                Key::LastAfter => scope.last.after = Some(condition_instant(key, condition)?),
                Key::LastBefore => scope.last.before = Some(condition_instant(key, condition)?),
                Key::MessagesAfter => scope.window.after = Some(condition_instant(key, condition)?),
                _ => scope.window.before = Some(condition_instant(key, condition)?),
            }
            Ok(())
        })?;

        Ok(Predicate::Author { author, scope })
    }

    fn tag_predicate(&mut self, selector: &Selector) -> std::result::Result<Predicate, Rejected> {
        let mut scope = TagScope::default();
        self.apply_conditions(Key::Tag, &selector.conditions, |builder, key, condition| {
            match key {
                Key::From => scope.added_by = Some(builder.tagging_user(condition)?),
                _ => scope.added_before = Some(condition_instant(key, condition)?),
            }
            Ok(())
        })?;

        Ok(Predicate::Tag {
            name: non_empty_lowercase(&selector.value),
            scope,
        })
    }

    fn commitfest_predicate(&mut self, selector: &Selector) -> std::result::Result<Predicate, Rejected> {
        let mut scope = CommitfestScope::default();
        self.apply_conditions(Key::Commitfest, &selector.conditions, |_, key, condition| {
            match key {
                Key::Status => scope.status = non_empty_lowercase(&condition.value),
                _ => scope.tag = non_empty_lowercase(&condition.value),
            }
            Ok(())
        })?;

        Ok(Predicate::Commitfest {
            name: non_empty_lowercase(&selector.value),
            scope,
        })
    }

    /// Feed every applicable condition of `parent` to `apply`, stopping at the
    /// first one that cannot be honoured.
    fn apply_conditions(
        &mut self,
        parent: Key,
        conditions: &[Condition],
        mut apply: impl FnMut(&mut QueryBuilder, Key, &Condition) -> Applied,
    ) -> Applied {
        for condition in conditions {
            let key = match &condition.key {
                SelectorKey::Known(key) if parent.accepts_condition(*key) => *key,
                SelectorKey::Known(key) => {
                    // Not applicable here: ignored, as the validator would have dropped it
                    self.warnings.push(Warning::unsupported_condition(
                        parent.name(),
                        key.name(),
                        &condition.value,
                    ));
                    continue;
                }
                SelectorKey::Unknown(name) => {
                    self.warnings.push(Warning::new(
                        WarningKind::UnknownSelector,
                        name.as_str(),
                        &condition.value,
                    ));
                    continue;
                }
            };
            apply(self, key, condition)?;
        }
        Ok(())
    }

    /// Message sender for a `from` value or condition.
    fn message_author(&self, condition: &Condition) -> std::result::Result<AuthorMatch, Rejected> {
        if condition.resolved != Some(Resolved::Requester) {
            return Ok(AuthorMatch::Name(condition.value.to_lowercase()));
        }
        let requester = self.require_requester(condition)?;
        requester
            .person_id
            .map(AuthorMatch::Person)
            .ok_or_else(|| Rejected(Warning::new(WarningKind::Unresolved, "from", &condition.value)))
    }

    /// Tagging user for `tag:[from:...]`.
    fn tagging_user(&self, condition: &Condition) -> std::result::Result<AuthorMatch, Rejected> {
        if condition.resolved != Some(Resolved::Requester) {
            return Ok(AuthorMatch::Name(condition.value.to_lowercase()));
        }
        let requester = self.require_requester(condition)?;
        Ok(AuthorMatch::User(requester.user_id))
    }

    fn require_requester(&self, condition: &Condition) -> std::result::Result<Identity, Rejected> {
        self.requester.ok_or_else(|| {
            Rejected(Warning::new(WarningKind::RequiresSignIn, condition.key.as_str(), &condition.value))
        })
    }

    fn finish(&mut self, result: std::result::Result<Predicate, Rejected>) -> Predicate {
        match result {
            Ok(predicate) => predicate,
            Err(Rejected(warning)) => self.degrade(warning),
        }
    }

    fn degrade(&mut self, warning: Warning) -> Predicate {
        debug!("builder: {} (matches nothing)", warning);
        self.warnings.push(warning);
        self.degraded = true;
        Predicate::Nothing
    }
}

fn condition_count(key: Key, condition: &Condition) -> std::result::Result<CountFilter, Rejected> {
    match condition.resolved {
        Some(Resolved::Count(filter)) => Ok(filter),
        _ => Err(Rejected(Warning::new(WarningKind::Unresolved, key.name(), &condition.value))),
    }
}

fn condition_instant(key: Key, condition: &Condition) -> std::result::Result<DateTime<Utc>, Rejected> {
    match condition.resolved {
        Some(Resolved::Instant(instant)) => Ok(instant),
        _ => Err(Rejected(Warning::new(WarningKind::Unresolved, key.name(), &condition.value))),
    }
}

fn non_empty_lowercase(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_lowercase())
}
