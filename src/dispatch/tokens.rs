//! dispatch::tokens
//!
//! Raw CLI token scanning.
//!
//! # Grammar
//!
//! Tokens after the program name:
//!
//! ```text
//! [GROUP] COMMAND [ARGS...] [--name=value ...] [-h|--help] [-v|--version]
//!                           [-j|--json [jsonOrPath]] [-d|--data <jsonOrPath>]
//! ```
//!
//! Reserved flags are split out; every other `--name=value` / `--name value`
//! token becomes a named-option candidate for the merge engine, and bare
//! tokens stay positional. Values are kept as strings - coercion is the
//! callable's business, and string-typed values keep positional and
//! import sources convergent.

use serde_json::Value;

use super::DispatchError;

/// Scanned CLI tokens, ready for resolution and merging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenSet {
    /// Bare tokens in order; the leading one or two select the command.
    pub positionals: Vec<String>,
    /// Named-option candidates in appearance order.
    pub named: Vec<(String, Value)>,
    /// `-h`/`--help` seen.
    pub help: bool,
    /// `-v`/`--version` seen.
    pub version: bool,
    /// Bare `-j`/`--json` seen: serialize results to a JSON string.
    pub json_output: bool,
    /// Import payload source: inline JSON text or a `.json` path.
    pub import_source: Option<String>,
}

/// Whether a token can serve as an import source.
fn looks_like_import(token: &str) -> bool {
    let trimmed = token.trim_start();
    token.ends_with(".json") || trimmed.starts_with('{') || trimmed.starts_with('[')
}

/// Scan raw argv tokens (program name already stripped).
///
/// # Errors
///
/// `-d`/`--data` without a following value is
/// [`DispatchError::MissingValue`]; `-j`/`--json` tolerates absence (it
/// then switches the outcome to JSON serialization).
pub fn scan(argv: &[String]) -> Result<TokenSet, DispatchError> {
    let mut tokens = TokenSet::default();
    let mut iter = argv.iter().peekable();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => tokens.help = true,
            "-v" | "--version" => tokens.version = true,
            "-j" | "--json" => match iter.peek() {
                Some(next) if looks_like_import(next) => {
                    tokens.import_source = Some(iter.next().map(String::clone).unwrap_or_default());
                }
                _ => tokens.json_output = true,
            },
            "-d" | "--data" => match iter.next() {
                Some(next) => tokens.import_source = Some(next.clone()),
                None => return Err(DispatchError::MissingValue("--data")),
            },
            _ => {
                if let Some(body) = arg.strip_prefix("--") {
                    scan_named(body, &mut iter, &mut tokens);
                } else {
                    tokens.positionals.push(arg.clone());
                }
            }
        }
    }

    Ok(tokens)
}

/// One `--name[=value]` token, possibly taking the next token as value.
fn scan_named(
    body: &str,
    iter: &mut std::iter::Peekable<std::slice::Iter<'_, String>>,
    tokens: &mut TokenSet,
) {
    match body.split_once('=') {
        Some(("json", value)) | Some(("data", value)) => {
            tokens.import_source = Some(value.to_string());
        }
        Some((name, value)) => {
            tokens
                .named
                .push((name.to_string(), Value::String(value.to_string())));
        }
        None => {
            // `--name value` form: a following non-flag token is the value.
            match iter.peek() {
                Some(next) if !next.starts_with('-') => {
                    let value = iter.next().map(String::clone).unwrap_or_default();
                    tokens.named.push((body.to_string(), Value::String(value)));
                }
                _ => tokens.named.push((body.to_string(), Value::Bool(true))),
            }
        }
    }
}
