//! Code fence meta strings.
//!
//! The meta is the part of the info string after the language:
//! ```` ```js title="app.js" showLineNumbers mark={3} ````.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Value of a `{…}` meta property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExpressionValue {
    /// `{true}` / `{false}`
    Bool(bool),
    /// `{42}`, `{1.5}`
    Number(f64),
    /// Anything else, braces stripped.
    String(String),
}

/// One meta property.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// Bare token, read as `true`.
    Flag,
    /// `key="value"` or `key='value'`.
    Quoted {
        /// Unquoted value.
        value: String,
        /// Quote character used in the source.
        quote: char,
    },
    /// `key={…}`.
    Expression {
        /// Source between the braces.
        raw: String,
        /// Interpreted value.
        value: ExpressionValue,
    },
    /// A token that is none of the above, kept verbatim.
    Raw(String),
}

/// Parsed meta, ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeMeta {
    entries: BTreeMap<String, MetaValue>,
}

impl CodeMeta {
    /// Parses a meta string.
    ///
    /// Returns the parsed meta and the tokens that could not be read as a
    /// property. Those tokens stay in the meta as [`MetaValue::Raw`].
    ///
    /// ```
    /// use mdxtext_extract::CodeMeta;
    ///
    /// let (meta, malformed) = CodeMeta::parse(r#"showLineNumbers foo="bar""#);
    /// assert!(malformed.is_empty());
    /// assert_eq!(meta.to_string(), r#"foo="bar" showLineNumbers"#);
    /// ```
    pub fn parse(meta: &str) -> (Self, Vec<String>) {
        let mut entries = BTreeMap::new();
        let mut malformed = Vec::new();
        for token in tokenize(meta) {
            match parse_token(token) {
                Some((key, value)) => {
                    entries.insert(key.to_string(), value);
                }
                None => {
                    malformed.push(token.to_string());
                    entries.insert(token.to_string(), MetaValue::Raw(token.to_string()));
                }
            }
        }
        (Self { entries }, malformed)
    }

    /// Looks up a property.
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.get(key)
    }

    /// Whether there are no properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl fmt::Display for CodeMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            match value {
                MetaValue::Flag => f.write_str(key)?,
                MetaValue::Quoted { value, quote } => write!(f, "{key}={quote}{value}{quote}")?,
                MetaValue::Expression { raw, .. } => write!(f, "{key}={{{raw}}}")?,
                MetaValue::Raw(token) => f.write_str(token)?,
            }
        }
        Ok(())
    }
}

/// Splits on whitespace outside quotes and braces.
fn tokenize(meta: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    let mut quote = None;
    let mut depth = 0usize;

    for (index, ch) in meta.char_indices() {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                start.get_or_insert(index);
            }
            '{' => {
                depth += 1;
                start.get_or_insert(index);
            }
            '}' => depth = depth.saturating_sub(1),
            ch if ch.is_whitespace() && depth == 0 => {
                if let Some(begin) = start.take() {
                    tokens.push(&meta[begin..index]);
                }
            }
            _ => {
                start.get_or_insert(index);
            }
        }
    }
    if let Some(begin) = start {
        tokens.push(&meta[begin..]);
    }
    tokens
}

fn is_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '-' | ':' | '.'))
}

fn parse_token(token: &str) -> Option<(&str, MetaValue)> {
    let Some((key, value)) = token.split_once('=') else {
        return is_key(token).then_some((token, MetaValue::Flag));
    };
    if !is_key(key) {
        return None;
    }

    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
            && !inner.contains(quote)
        {
            let value = MetaValue::Quoted {
                value: inner.to_string(),
                quote,
            };
            return Some((key, value));
        }
    }

    let inner = value.strip_prefix('{')?.strip_suffix('}')?;
    let value = MetaValue::Expression {
        raw: inner.to_string(),
        value: expression_value(inner.trim()),
    };
    Some((key, value))
}

fn expression_value(source: &str) -> ExpressionValue {
    match source {
        "true" => ExpressionValue::Bool(true),
        "false" => ExpressionValue::Bool(false),
        _ => match source.parse::<f64>() {
            Ok(number) if number.is_finite() => ExpressionValue::Number(number),
            _ => ExpressionValue::String(source.to_string()),
        },
    }
}
