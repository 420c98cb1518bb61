//! dispatch::import
//!
//! Import payload decoding.
//!
//! # Overview
//!
//! `--json`/`--data` accept either a literal JSON string or a filesystem
//! path ending in `.json`. The decoded value must be an object (one
//! invocation) or an array of objects (a batch of N independent
//! invocations); anything else is fatal for the invocation - no partial
//! recovery.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from decoding an import payload.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read import file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: io::Error,
    },

    #[error("malformed import JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("import payload must be an object or an array of objects, got {0}")]
    InvalidShape(String),
}

/// A decoded import payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportPayload {
    /// One object: a single invocation's argument values.
    Single(Map<String, Value>),
    /// An array of objects: one invocation per element.
    Batch(Vec<Map<String, Value>>),
}

impl ImportPayload {
    /// Number of invocations the payload drives.
    pub fn len(&self) -> usize {
        match self {
            ImportPayload::Single(_) => 1,
            ImportPayload::Batch(items) => items.len(),
        }
    }

    /// Whether the payload drives no invocations (empty batch).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Load a payload from an inline JSON string or a `.json` file path.
///
/// # Example
///
/// ```
/// use docket::dispatch::import::{load, ImportPayload};
///
/// let payload = load(r#"{"a": 1}"#).unwrap();
/// assert!(matches!(payload, ImportPayload::Single(_)));
///
/// let batch = load(r#"[{"a": 1}, {"a": 2}]"#).unwrap();
/// assert_eq!(batch.len(), 2);
///
/// assert!(load("42").is_err());
/// ```
pub fn load(source: &str) -> Result<ImportPayload, ImportError> {
    let raw = if source.ends_with(".json") {
        let path = PathBuf::from(source);
        fs::read_to_string(&path).map_err(|source| ImportError::Read { path, source })?
    } else {
        source.to_string()
    };

    let value: Value = serde_json::from_str(&raw)?;
    match value {
        Value::Object(map) => Ok(ImportPayload::Single(map)),
        Value::Array(items) => {
            let mut batch = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Object(map) => batch.push(map),
                    other => {
                        return Err(ImportError::InvalidShape(format!(
                            "array element {}",
                            kind_of(&other)
                        )))
                    }
                }
            }
            Ok(ImportPayload::Batch(batch))
        }
        other => Err(ImportError::InvalidShape(kind_of(&other).to_string())),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
