use crate::error::{Result, SearchError};
use crate::query::ast::{Condition, Node, Selector, SelectorKey, Text};
use log::trace;

/// Groups nested deeper than this are rejected as malformed input.
const MAX_DEPTH: usize = 128;

/// Parse a query string into an AST.
///
/// Returns `Ok(None)` for blank input. Unbalanced parentheses are the only
/// error; every other input parses to some tree and semantic problems are
/// left to the validator.
pub fn parse(input: &str) -> Result<Option<Node>> {
    let mut parser = QueryParser::new(input);
    let node = parser.parse()?;
    trace!(
        "parsed {:?} into {}",
        input,
        node.as_ref().map(|n| n.to_string()).unwrap_or_default()
    );
    Ok(node)
}

/// Whether `input` parses without a structural error.
pub fn is_valid(input: &str) -> bool {
    parse(input).is_ok()
}

/// Query parser
struct QueryParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> QueryParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn parse(&mut self) -> Result<Option<Node>> {
        let node = self.parse_or()?;
        self.skip_whitespace();
        if !self.is_eof() {
            // parse_or only stops early on a ')' it cannot match
            return Err(SearchError::syntax("unmatched ')'", self.pos));
        }
        Ok(node)
    }

    fn parse_or(&mut self) -> Result<Option<Node>> {
        let mut nodes = Vec::new();
        nodes.extend(self.parse_and()?);

        loop {
            self.skip_whitespace();
            if !self.at_operator("or") {
                break;
            }
            self.skip_word();
            nodes.extend(self.parse_and()?);
        }

        Ok(collapse(nodes, Node::or))
    }

    fn parse_and(&mut self) -> Result<Option<Node>> {
        let mut nodes = Vec::new();
        let mut first = true;

        loop {
            self.skip_whitespace();
            if self.is_eof() || self.peek_char() == Some(')') {
                break;
            }

            // A keyword in operand position is plain text, so operators are
            // only looked for between operands.
            if !first {
                if self.at_operator("or") {
                    break;
                }
                if self.at_operator("and") {
                    self.skip_word();
                    self.skip_whitespace();
                }
            }
            first = false;

            nodes.extend(self.parse_unary()?);
        }

        Ok(collapse(nodes, Node::and))
    }

    fn parse_unary(&mut self) -> Result<Option<Node>> {
        if self.peek_char() == Some('-') {
            let next = self.input[self.pos + 1..].chars().next();
            if next.is_some_and(|c| !c.is_whitespace() && c != ')') {
                self.advance();
                return Ok(self.parse_primary()?.map(Node::negate));
            }
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Option<Node>> {
        match self.peek_char() {
            Some('(') => self.parse_group(),
            Some('"') => {
                let value = self.parse_quoted();
                Ok(Some(Node::Text(Text {
                    value,
                    quoted: true,
                    negated: false,
                })))
            }
            Some(')') => Err(SearchError::syntax("unmatched ')'", self.pos)),
            _ => Ok(self.parse_term()),
        }
    }

    fn parse_group(&mut self) -> Result<Option<Node>> {
        let open = self.pos;
        self.advance();

        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(SearchError::syntax("query nested too deeply", open));
        }

        let node = self.parse_or()?;
        self.skip_whitespace();
        if !self.consume_char(')') {
            return Err(SearchError::syntax("unmatched '('", open));
        }
        self.depth -= 1;

        Ok(node)
    }

    /// Consume a `"`-delimited string. A missing closing quote runs to the end.
    fn parse_quoted(&mut self) -> String {
        self.consume_char('"');
        let start = self.pos;
        while !self.is_eof() && self.peek_char() != Some('"') {
            self.advance();
        }
        let value = self.input[start..self.pos].to_string();
        self.consume_char('"');
        value
    }

    fn parse_term(&mut self) -> Option<Node> {
        let start = self.pos;

        if self.peek_char().is_some_and(|c| c.is_ascii_alphabetic()) {
            let key = self.read_while(|c| c.is_ascii_alphanumeric() || c == '_');
            if self.consume_char(':') {
                return Some(Node::Selector(self.parse_selector(key)));
            }
            self.pos = start;
        }

        let word = self.read_while(|c| !is_boundary(c));
        if word.is_empty() {
            // Only reachable on a character no rule accepts; skip it
            self.advance();
            return None;
        }
        Some(Node::text(word))
    }

    fn parse_selector(&mut self, key: &str) -> Selector {
        let mut selector = Selector::new(SelectorKey::parse(key), "");

        if self.peek_char() == Some('"') {
            selector.value = self.parse_quoted();
            selector.quoted = true;
        } else {
            selector.value = self
                .read_while(|c| !is_boundary(c) && c != '[')
                .to_string();
        }

        if self.peek_char() == Some('[') {
            let bracket = self.pos;
            match self.parse_conditions() {
                Some(conditions) => selector.conditions = conditions,
                None => {
                    // Not a condition list: the bracket text is part of the value
                    self.pos = bracket;
                    let rest = self.read_while(|c| !is_boundary(c));
                    selector.value.push_str(rest);
                }
            }
        }

        selector
    }

    /// `[key:value, key:value]`. Returns `None` (caller rewinds) if malformed.
    fn parse_conditions(&mut self) -> Option<Vec<Condition>> {
        self.consume_char('[');
        let mut conditions = Vec::new();

        loop {
            self.skip_whitespace();
            if !self.peek_char().is_some_and(|c| c.is_ascii_alphabetic()) {
                return None;
            }
            let key = self.read_while(|c| c.is_ascii_alphanumeric() || c == '_');
            if !self.consume_char(':') {
                return None;
            }

            let mut condition = Condition::new(SelectorKey::parse(key), "");
            if self.peek_char() == Some('"') {
                condition.value = self.parse_quoted();
                condition.quoted = true;
            } else {
                condition.value = self
                    .read_while(|c| !is_boundary(c) && c != ',' && c != ']')
                    .to_string();
            }
            conditions.push(condition);

            self.skip_whitespace();
            if self.consume_char(',') {
                continue;
            }
            if self.consume_char(']') {
                return Some(conditions);
            }
            return None;
        }
    }

    /// Whether the next word is the operator `keyword` with an operand after it.
    fn at_operator(&self, keyword: &str) -> bool {
        let word = self.peek_word();
        if !word.eq_ignore_ascii_case(keyword) {
            return false;
        }
        let after = self.input[self.pos + word.len()..].trim_start();
        after.chars().next().is_some_and(|c| c != ')')
    }

    fn peek_word(&self) -> &'a str {
        let input = self.input;
        let rest = &input[self.pos..];
        let end = rest.find(is_boundary).unwrap_or(rest.len());
        &rest[..end]
    }

    fn skip_word(&mut self) {
        self.pos += self.peek_word().len();
    }

    fn read_while(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if !accept(ch) {
                break;
            }
            self.advance();
        }
        let input = self.input;
        &input[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }
}

fn is_boundary(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')'
}

fn collapse(mut nodes: Vec<Node>, group: fn(Vec<Node>) -> Node) -> Option<Node> {
    match nodes.len() {
        0 => None,
        1 => nodes.pop(),
        _ => Some(group(nodes)),
    }
}
