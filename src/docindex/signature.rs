//! docindex::signature
//!
//! Fallback parameter-list parsing.
//!
//! # Overview
//!
//! When no documentation is available for a function, its parameters can
//! still be derived from the raw parameter-list text, e.g.
//! `"a, b = 5, opts = { timeout: 30 }"`. This module parses that text into
//! the same [`DocParam`] shape a documentation scanner would produce.
//!
//! # Design
//!
//! The input is never evaluated. A bracket-aware scanner splits the list
//! on top-level commas, and a small recursive-descent reader decodes
//! default values (bare words, quoted strings, numbers, object and array
//! literals with unquoted keys). Unbalanced brackets are fatal for the
//! parsing attempt.

use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::{type_tag, DocParam};

/// Errors from parsing a parameter-list string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("unbalanced brackets in parameter list: {0}")]
    Unbalanced(String),

    #[error("unterminated string literal in parameter list")]
    UnterminatedString,

    #[error("malformed parameter entry: '{0}'")]
    MalformedEntry(String),
}

/// Parse a raw parameter-list string into parameter specs.
///
/// Names may be dotted; defaults may be bare words, quoted strings,
/// numbers, booleans, or object/array literals. Type tags are inferred
/// from the default's decoded kind; parameters without a default get the
/// wildcard tag `*`.
///
/// # Errors
///
/// Returns [`SignatureError::Unbalanced`] when open and close brackets do
/// not pair up, [`SignatureError::UnterminatedString`] for an unclosed
/// quote, and [`SignatureError::MalformedEntry`] for an entry with an
/// empty name or dangling `=`.
///
/// # Example
///
/// ```
/// use docket::docindex::parse_signature;
/// use serde_json::json;
///
/// let params = parse_signature("a, b = 5, opts = { timeout: 30 }").unwrap();
/// assert_eq!(params[0].name, "a");
/// assert_eq!(params[0].types, vec!["*"]);
/// assert_eq!(params[1].default, Some(json!(5)));
/// assert_eq!(params[2].default, Some(json!({ "timeout": 30 })));
///
/// assert!(parse_signature("a, b = [1, 2").is_err());
/// ```
pub fn parse_signature(input: &str) -> Result<Vec<DocParam>, SignatureError> {
    let pieces = split_top_level(input)?;
    let mut params = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        params.push(parse_entry(piece)?);
    }
    Ok(params)
}

/// Split on commas at bracket depth zero, respecting string literals.
fn split_top_level(input: &str) -> Result<Vec<&str>, SignatureError> {
    let mut pieces = Vec::new();
    let mut stack: Vec<char> = Vec::new();
    let mut start = 0;
    let mut chars = input.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '\'' | '"' => skip_string(&mut chars, c)?,
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return Err(SignatureError::Unbalanced(format!(
                        "unexpected '{}'",
                        c
                    )));
                }
            }
            ',' if stack.is_empty() => {
                pieces.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(SignatureError::Unbalanced(format!("unclosed '{}'", open)));
    }
    pieces.push(&input[start..]);
    Ok(pieces)
}

/// Consume characters up to the closing quote.
fn skip_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
) -> Result<(), SignatureError> {
    while let Some((_, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return Ok(());
        }
    }
    Err(SignatureError::UnterminatedString)
}

/// Parse one `name` or `name = default` entry.
fn parse_entry(piece: &str) -> Result<DocParam, SignatureError> {
    let (name, default_text) = match piece.split_once('=') {
        Some((name, rest)) => (name.trim(), Some(rest.trim())),
        None => (piece, None),
    };
    if name.is_empty() || !is_identifier(name) {
        return Err(SignatureError::MalformedEntry(piece.to_string()));
    }

    match default_text {
        None => Ok(DocParam {
            name: name.to_string(),
            types: vec!["*".to_string()],
            default: None,
        }),
        Some("") => Err(SignatureError::MalformedEntry(piece.to_string())),
        Some(text) => {
            let default = read_value(&mut Cursor::new(text))?;
            Ok(DocParam {
                name: name.to_string(),
                types: vec![type_tag(&default).to_string()],
                default: Some(default),
            })
        }
    }
}

/// Dotted identifier check: `a`, `opts.timeout`.
fn is_identifier(name: &str) -> bool {
    name.split('.').all(|part| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    })
}

/// Character cursor over default-value text.
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }
}

/// Read one value: object, array, quoted string, or bare word.
fn read_value(cur: &mut Cursor<'_>) -> Result<Value, SignatureError> {
    cur.skip_ws();
    match cur.peek() {
        Some('{') => read_object(cur),
        Some('[') => read_array(cur),
        Some(q @ ('\'' | '"')) => read_quoted(cur, q).map(Value::String),
        Some(_) => Ok(read_word(cur)),
        None => Err(SignatureError::MalformedEntry(cur.text.to_string())),
    }
}

fn read_object(cur: &mut Cursor<'_>) -> Result<Value, SignatureError> {
    cur.bump(); // '{'
    let mut map = Map::new();
    loop {
        cur.skip_ws();
        if cur.eat('}') {
            return Ok(Value::Object(map));
        }
        let key = match cur.peek() {
            Some(q @ ('\'' | '"')) => read_quoted(cur, q)?,
            Some(_) => read_key(cur),
            None => return Err(SignatureError::Unbalanced("unclosed '{'".into())),
        };
        cur.skip_ws();
        if !cur.eat(':') {
            return Err(SignatureError::MalformedEntry(cur.text.to_string()));
        }
        let value = read_value(cur)?;
        map.insert(key, value);
        cur.skip_ws();
        if cur.eat(',') {
            continue;
        }
        if cur.eat('}') {
            return Ok(Value::Object(map));
        }
        return Err(SignatureError::Unbalanced("unclosed '{'".into()));
    }
}

fn read_array(cur: &mut Cursor<'_>) -> Result<Value, SignatureError> {
    cur.bump(); // '['
    let mut items = Vec::new();
    loop {
        cur.skip_ws();
        if cur.eat(']') {
            return Ok(Value::Array(items));
        }
        items.push(read_value(cur)?);
        cur.skip_ws();
        if cur.eat(',') {
            continue;
        }
        if cur.eat(']') {
            return Ok(Value::Array(items));
        }
        return Err(SignatureError::Unbalanced("unclosed '['".into()));
    }
}

fn read_quoted(cur: &mut Cursor<'_>, quote: char) -> Result<String, SignatureError> {
    cur.bump(); // opening quote
    let mut out = String::new();
    while let Some(c) = cur.bump() {
        if c == '\\' {
            match cur.bump() {
                Some(esc) => out.push(esc),
                None => return Err(SignatureError::UnterminatedString),
            }
        } else if c == quote {
            return Ok(out);
        } else {
            out.push(c);
        }
    }
    Err(SignatureError::UnterminatedString)
}

/// Bare object key: consume up to `:`, `,`, or `}`.
fn read_key(cur: &mut Cursor<'_>) -> String {
    let mut out = String::new();
    while let Some(c) = cur.peek() {
        if c == ':' || c == ',' || c == '}' || c.is_whitespace() {
            break;
        }
        out.push(c);
        cur.bump();
    }
    out
}

/// Bare word: number, boolean, null, or a plain string token.
fn read_word(cur: &mut Cursor<'_>) -> Value {
    let rest = cur.rest();
    let end = rest
        .find(|c: char| c == ',' || c == ']' || c == '}')
        .unwrap_or(rest.len());
    let word = rest[..end].trim();
    cur.pos += end;

    match word {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" | "undefined" => Value::Null,
        _ => {
            if let Ok(n) = word.parse::<i64>() {
                Value::Number(n.into())
            } else if let Some(n) = word.parse::<f64>().ok().and_then(Number::from_f64) {
                Value::Number(n)
            } else {
                Value::String(word.to_string())
            }
        }
    }
}
