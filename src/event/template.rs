//! Message templates.
//!
//! # Responsibilities
//! - Parse `{Name}` holes out of a template string
//! - Bind positional arguments to hole names
//! - Render the template against an event's properties
//!
//! # Design Decisions
//! - `{{` and `}}` escape literal braces
//! - A format suffix (`{Name:0.00}`) is accepted and ignored for binding
//! - Malformed holes are kept as literal text rather than rejected

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::event::value::PropertyValue;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Hole(String),
}

/// A parsed message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    text: Cow<'static, str>,
    tokens: Vec<Token>,
}

impl MessageTemplate {
    /// Parse a template.
    pub fn parse(text: impl Into<Cow<'static, str>>) -> Self {
        let text = text.into();
        let tokens = tokenize(&text);
        Self { text, tokens }
    }

    /// The raw template text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Hole names in order of first appearance.
    pub fn hole_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for token in &self.tokens {
            if let Token::Hole(name) = token {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Pair positional arguments with hole names.
    ///
    /// Surplus arguments are dropped; surplus holes stay unbound.
    pub fn bind(&self, args: Vec<PropertyValue>) -> Vec<(String, PropertyValue)> {
        self.hole_names()
            .into_iter()
            .zip(args)
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    /// Render against a property set. Unbound holes are written verbatim.
    pub fn render(&self, properties: &BTreeMap<String, PropertyValue>) -> String {
        let mut out = String::with_capacity(self.text.len());
        for token in &self.tokens {
            match token {
                Token::Text(s) => out.push_str(s),
                Token::Hole(name) => match properties.get(name) {
                    Some(value) => out.push_str(&value.to_string()),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

impl From<&'static str> for MessageTemplate {
    fn from(text: &'static str) -> Self {
        MessageTemplate::parse(text)
    }
}

impl From<String> for MessageTemplate {
    fn from(text: String) -> Self {
        MessageTemplate::parse(text)
    }
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let rest = &text[i + 1..];
                match rest.find('}') {
                    Some(end) => {
                        let inner = &rest[..end];
                        let name = inner.split([':', ',']).next().unwrap_or_default();
                        if is_valid_name(name) {
                            if !literal.is_empty() {
                                tokens.push(Token::Text(std::mem::take(&mut literal)));
                            }
                            tokens.push(Token::Hole(name.to_string()));
                        } else {
                            literal.push('{');
                            literal.push_str(inner);
                            literal.push('}');
                        }
                        // Skip past the closing brace
                        for _ in 0..inner.chars().count() + 1 {
                            chars.next();
                        }
                    }
                    None => literal.push('{'),
                }
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Text(literal));
    }
    tokens
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}
