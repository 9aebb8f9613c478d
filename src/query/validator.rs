//! Semantic validation of a parsed query.
//!
//! Selectors are checked against their key category; anything that cannot be
//! satisfied is pruned and reported as a [`Warning`], in pre-order,
//! left-to-right. The input tree is never modified.

use crate::query::ast::{
    Artifact, Condition, Group, Key, KeyCategory, Node, Resolved, Selector, SelectorKey,
};
use crate::query::warning::{Warning, WarningKind};
use crate::utils::{parse_count, parse_date};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

/// Validator output. `ast` is `None` when nothing survived (or the input was blank).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedQuery {
    pub ast: Option<Node>,
    pub warnings: Vec<Warning>,
}

impl ValidatedQuery {
    /// True when the original query was blank: no tree and nothing to report.
    pub fn is_blank(&self) -> bool {
        self.ast.is_none() && self.warnings.is_empty()
    }

    pub fn has_kind(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

/// Validate `ast`, resolving relative dates against `now`.
pub fn validate(ast: Option<&Node>, now: DateTime<Utc>) -> ValidatedQuery {
    QueryValidator::new(now).validate(ast)
}

type Resolution = std::result::Result<Option<Resolved>, WarningKind>;
type Resolver = fn(&QueryValidator, Key, &str) -> Resolution;

/// Value check for each key category.
fn resolver_for(category: KeyCategory) -> Resolver {
    match category {
        KeyCategory::TextMatch => QueryValidator::resolve_text,
        KeyCategory::IdentityState => QueryValidator::resolve_identity,
        KeyCategory::Date => QueryValidator::resolve_date,
        KeyCategory::Count => QueryValidator::resolve_count,
        KeyCategory::Presence => QueryValidator::resolve_presence,
    }
}

pub struct QueryValidator {
    now: DateTime<Utc>,
    warnings: Vec<Warning>,
}

impl QueryValidator {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            warnings: Vec::new(),
        }
    }

    pub fn validate(mut self, ast: Option<&Node>) -> ValidatedQuery {
        let ast = ast.and_then(|node| self.validate_node(node));
        ValidatedQuery {
            ast,
            warnings: self.warnings,
        }
    }

    fn validate_node(&mut self, node: &Node) -> Option<Node> {
        match node {
            Node::Text(_) => Some(node.clone()),
            Node::Selector(selector) => self.validate_selector(selector).map(Node::Selector),
            Node::And(group) => self.validate_group(group, Node::And),
            Node::Or(group) => self.validate_group(group, Node::Or),
        }
    }

    fn validate_group(&mut self, group: &Group, wrap: fn(Group) -> Node) -> Option<Node> {
        let mut children: Vec<Node> = group
            .children
            .iter()
            .filter_map(|child| self.validate_node(child))
            .collect();

        match children.len() {
            0 => None,
            1 => {
                let child = children.pop()?;
                // A negated group of one is that one term negated
                Some(if group.negated { child.negate() } else { child })
            }
            _ => Some(wrap(Group {
                children,
                negated: group.negated,
            })),
        }
    }

    fn validate_selector(&mut self, selector: &Selector) -> Option<Selector> {
        let key = match &selector.key {
            SelectorKey::Known(key) => *key,
            SelectorKey::Unknown(name) => {
                self.warn(Warning::new(WarningKind::UnknownSelector, name.as_str(), &selector.value));
                return None;
            }
        };

        let resolved = if selector.value.is_empty() {
            if !(key.spec().scoped_without_value && !selector.conditions.is_empty()) {
                self.warn(Warning::new(WarningKind::EmptyValue, key.name(), ""));
                return None;
            }
            None
        } else {
            match resolver_for(key.category())(self, key, &selector.value) {
                Ok(resolved) => resolved,
                Err(kind) => {
                    self.warn(Warning::new(kind, key.name(), &selector.value));
                    return None;
                }
            }
        };

        let conditions: Vec<Condition> = selector
            .conditions
            .iter()
            .filter_map(|condition| self.validate_condition(key, condition))
            .collect();

        if selector.value.is_empty() && conditions.is_empty() {
            self.warn(Warning::new(WarningKind::EmptyValue, key.name(), ""));
            return None;
        }

        Some(Selector {
            key: selector.key.clone(),
            value: selector.value.clone(),
            quoted: selector.quoted,
            negated: selector.negated,
            conditions,
            resolved,
        })
    }

    fn validate_condition(&mut self, parent: Key, condition: &Condition) -> Option<Condition> {
        let key = match &condition.key {
            SelectorKey::Known(key) => *key,
            SelectorKey::Unknown(name) => {
                self.warn(Warning::new(WarningKind::UnknownSelector, name.as_str(), &condition.value));
                return None;
            }
        };

        if !parent.accepts_condition(key) {
            self.warn(Warning::unsupported_condition(parent.name(), key.name(), &condition.value));
            return None;
        }

        if condition.value.is_empty() {
            self.warn(Warning::new(WarningKind::EmptyValue, key.name(), ""));
            return None;
        }

        match resolver_for(key.category())(self, key, &condition.value) {
            Ok(resolved) => Some(Condition {
                key: condition.key.clone(),
                value: condition.value.clone(),
                quoted: condition.quoted,
                resolved,
            }),
            Err(kind) => {
                self.warn(Warning::new(kind, key.name(), &condition.value));
                None
            }
        }
    }

    fn resolve_text(&self, key: Key, value: &str) -> Resolution {
        if key == Key::From && is_self_reference(value) {
            Ok(Some(Resolved::Requester))
        } else {
            Ok(None)
        }
    }

    fn resolve_identity(&self, _key: Key, value: &str) -> Resolution {
        if is_self_reference(value) {
            Ok(Some(Resolved::Requester))
        } else {
            Err(WarningKind::UnsupportedValue)
        }
    }

    fn resolve_date(&self, _key: Key, value: &str) -> Resolution {
        parse_date(value, self.now)
            .map(|instant| Some(Resolved::Instant(instant)))
            .ok_or(WarningKind::InvalidDate)
    }

    fn resolve_count(&self, _key: Key, value: &str) -> Resolution {
        parse_count(value)
            .map(|filter| Some(Resolved::Count(filter)))
            .ok_or(WarningKind::InvalidCount)
    }

    fn resolve_presence(&self, _key: Key, value: &str) -> Resolution {
        Artifact::from_name(value)
            .map(|artifact| Some(Resolved::Presence(artifact)))
            .ok_or(WarningKind::UnsupportedValue)
    }

    fn warn(&mut self, warning: Warning) {
        debug!("validator: {}", warning);
        self.warnings.push(warning);
    }
}

fn is_self_reference(value: &str) -> bool {
    value.eq_ignore_ascii_case("me")
}
