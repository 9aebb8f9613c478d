//! Count values such as `>10`, `<=3` or `25`.

use serde::Serialize;
use std::fmt;

/// Comparison applied to a count field. A bare number means `Eq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
}

impl Comparator {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::Eq => "=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed count constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountFilter {
    pub op: Comparator,
    pub value: u64,
}

impl CountFilter {
    pub fn new(op: Comparator, value: u64) -> Self {
        Self { op, value }
    }

    /// At least one.
    pub fn any() -> Self {
        Self::new(Comparator::Gte, 1)
    }

    pub fn matches(&self, actual: u64) -> bool {
        match self.op {
            Comparator::Gt => actual > self.value,
            Comparator::Gte => actual >= self.value,
            Comparator::Lt => actual < self.value,
            Comparator::Lte => actual <= self.value,
            Comparator::Eq => actual == self.value,
        }
    }
}

impl fmt::Display for CountFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.value)
    }
}

/// Parse an optional comparator followed by a non-negative integer.
pub fn parse_count(text: &str) -> Option<CountFilter> {
    let value = text.trim();

    // Two-character operators must be tried before their one-character prefixes
    let (op, rest) = if let Some(rest) = value.strip_prefix(">=") {
        (Comparator::Gte, rest)
    } else if let Some(rest) = value.strip_prefix("<=") {
        (Comparator::Lte, rest)
    } else if let Some(rest) = value.strip_prefix('>') {
        (Comparator::Gt, rest)
    } else if let Some(rest) = value.strip_prefix('<') {
        (Comparator::Lt, rest)
    } else if let Some(rest) = value.strip_prefix('=') {
        (Comparator::Eq, rest)
    } else {
        (Comparator::Eq, value)
    };

    let rest = rest.trim_start();
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse::<u64>().ok().map(|n| CountFilter::new(op, n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_number_is_eq() {
        assert_eq!(parse_count("25"), Some(CountFilter::new(Comparator::Eq, 25)));
    }

    #[test]
    fn test_comparators() {
        assert_eq!(parse_count(">10"), Some(CountFilter::new(Comparator::Gt, 10)));
        assert_eq!(parse_count(">=10"), Some(CountFilter::new(Comparator::Gte, 10)));
        assert_eq!(parse_count("<3"), Some(CountFilter::new(Comparator::Lt, 3)));
        assert_eq!(parse_count("<=3"), Some(CountFilter::new(Comparator::Lte, 3)));
        assert_eq!(parse_count("=0"), Some(CountFilter::new(Comparator::Eq, 0)));
    }

    #[test]
    fn test_rejects_non_integers() {
        assert_eq!(parse_count("abc"), None);
        assert_eq!(parse_count(">"), None);
        assert_eq!(parse_count("-5"), None);
        assert_eq!(parse_count(">-5"), None);
        assert_eq!(parse_count("1.5"), None);
        assert_eq!(parse_count("+5"), None);
        assert_eq!(parse_count(""), None);
    }

    #[test]
    fn test_matches() {
        let filter = parse_count(">10").unwrap();
        assert!(filter.matches(25));
        assert!(!filter.matches(10));
        assert!(CountFilter::any().matches(1));
        assert!(!CountFilter::any().matches(0));
    }

    #[test]
    fn test_display_round_trips_shape() {
        assert_eq!(parse_count(">=3").unwrap().to_string(), ">=3");
        assert_eq!(parse_count("7").unwrap().to_string(), "=7");
    }
}
