use serde::Serialize;
use std::fmt;

/// Category of a non-fatal diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UnknownSelector,
    EmptyValue,
    UnsupportedValue,
    InvalidDate,
    InvalidCount,
    UnsupportedCondition,
    RequiresSignIn,
    Unresolved,
}

/// A diagnostic attached to a search. The offending part was dropped (or
/// matches nothing) and the rest of the query still runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub key: String,
    pub value: String,
    /// For `UnsupportedCondition`: the parent selector key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Warning {
    pub fn new(kind: WarningKind, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
            value: value.into(),
            parent: None,
        }
    }

    pub fn unsupported_condition(
        parent: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            parent: Some(parent.into()),
            ..Self::new(WarningKind::UnsupportedCondition, key, value)
        }
    }
}

/// The user-facing banner text.
impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            WarningKind::UnknownSelector => write!(f, "unknown selector: {}", self.key),
            WarningKind::EmptyValue => write!(f, "empty value for {}", self.key),
            WarningKind::UnsupportedValue => write!(f, "unsupported value for {}", self.key),
            WarningKind::InvalidDate => write!(f, "invalid date: {}", self.value),
            WarningKind::InvalidCount => write!(f, "invalid count: {}", self.value),
            WarningKind::UnsupportedCondition => write!(
                f,
                "{} does not support condition {}",
                self.parent.as_deref().unwrap_or("selector"),
                self.key
            ),
            WarningKind::RequiresSignIn => write!(f, "{}:me requires sign-in", self.key),
            WarningKind::Unresolved => write!(f, "could not resolve {}:{}", self.key, self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering() {
        assert_eq!(
            Warning::new(WarningKind::UnknownSelector, "color", "blue").to_string(),
            "unknown selector: color"
        );
        assert_eq!(
            Warning::new(WarningKind::EmptyValue, "from", "").to_string(),
            "empty value for from"
        );
        assert_eq!(
            Warning::new(WarningKind::InvalidDate, "first_after", "notadate").to_string(),
            "invalid date: notadate"
        );
        assert_eq!(
            Warning::new(WarningKind::InvalidCount, "messages", "abc").to_string(),
            "invalid count: abc"
        );
        assert_eq!(
            Warning::new(WarningKind::RequiresSignIn, "starred", "me").to_string(),
            "starred:me requires sign-in"
        );
        assert_eq!(
            Warning::unsupported_condition("title", "from", "me").to_string(),
            "title does not support condition from"
        );
    }
}
