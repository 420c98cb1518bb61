//! docindex
//!
//! Documentation Index collaborator.
//!
//! # Overview
//!
//! The registry is built from structured documentation metadata: for each
//! exported function, its name, parameter list (name, type tags, optional
//! default), and free-text description. Producing that metadata is the job
//! of an external documentation scanner; this module defines the seam -
//! the [`DocIndex`] trait and the entry types it yields - plus an
//! in-memory [`StaticIndex`] for embedding callers and tests.
//!
//! # Modules
//!
//! - [`signature`] - fallback parser deriving parameters from a raw
//!   parameter-list string when documentation is unavailable
//!
//! # Design
//!
//! Doc-comment parsing itself is out of scope. Any scanner that can
//! produce [`DocEntry`] values plugs in behind [`DocIndex`]; the registry
//! only consumes the structured shape.

pub mod signature;

pub use signature::{parse_signature, SignatureError};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

/// Errors from scanning a documentation index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to scan '{path}': {message}")]
    ScanFailed { path: PathBuf, message: String },
}

/// Kind of documented entry.
///
/// Only [`EntryKind::Function`] entries become commands; everything else
/// (constants, classes, modules) is filtered out during registry build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// A callable function.
    Function,
    /// Any other documented entity, tagged with the scanner's kind string.
    Other(String),
}

/// One documented parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct DocParam {
    /// Parameter name. May contain a dot to denote a nested option field,
    /// e.g. `options.timeout`.
    pub name: String,
    /// Type tags, e.g. `["number"]` or `["string", "number"]`. The
    /// wildcard `*` means any type.
    pub types: Vec<String>,
    /// Declared default value, if the documentation carries one.
    pub default: Option<Value>,
}

impl DocParam {
    /// Parameter with a single type tag and no default.
    pub fn typed(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: vec![ty.into()],
            default: None,
        }
    }

    /// Parameter with a default value; the type tag is inferred from the
    /// default's JSON kind.
    pub fn with_default(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            types: vec![type_tag(&default).to_string()],
            default: Some(default),
        }
    }
}

/// Type tag for a JSON value kind.
pub(crate) fn type_tag(value: &Value) -> &'static str {
    match value {
        Value::Null => "*",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One documented, exported entity from a source file.
#[derive(Debug, Clone, PartialEq)]
pub struct DocEntry {
    /// Exported name.
    pub name: String,
    /// Entity kind; only functions become commands.
    pub kind: EntryKind,
    /// Ordered parameter list.
    pub params: Vec<DocParam>,
    /// Free-text description (may span multiple lines).
    pub description: String,
    /// Source file the entry was scanned from.
    pub source: PathBuf,
}

impl DocEntry {
    /// A function entry.
    pub fn function(
        name: impl Into<String>,
        params: Vec<DocParam>,
        description: impl Into<String>,
        source: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Function,
            params,
            description: description.into(),
            source: source.into(),
        }
    }
}

/// A source of documentation metadata.
///
/// Implementations scan the given paths and return one [`DocEntry`] per
/// documented, exported entity. Paths with no entries simply contribute
/// nothing; they are not an error.
pub trait DocIndex {
    /// Scan source paths for documented entries.
    fn scan(&self, paths: &[PathBuf]) -> Result<Vec<DocEntry>, IndexError>;
}

/// In-memory documentation index.
///
/// Maps source paths to pre-built entries. This is both the test double
/// and the integration point for callers that run their own scanner up
/// front.
///
/// # Example
///
/// ```
/// use docket::docindex::{DocEntry, DocIndex, DocParam, StaticIndex};
/// use std::path::PathBuf;
///
/// let mut index = StaticIndex::new();
/// index.insert(
///     "math.rs",
///     vec![DocEntry::function(
///         "add",
///         vec![DocParam::typed("a", "number"), DocParam::typed("b", "number")],
///         "Add two numbers",
///         "math.rs",
///     )],
/// );
///
/// let entries = index.scan(&[PathBuf::from("math.rs")]).unwrap();
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].name, "add");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticIndex {
    entries: BTreeMap<PathBuf, Vec<DocEntry>>,
}

impl StaticIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register entries for a source path, replacing any previous set.
    pub fn insert(&mut self, path: impl Into<PathBuf>, entries: Vec<DocEntry>) {
        self.entries.insert(path.into(), entries);
    }

    /// Entries registered for a path, if any.
    pub fn get(&self, path: &Path) -> Option<&[DocEntry]> {
        self.entries.get(path).map(Vec::as_slice)
    }
}

impl DocIndex for StaticIndex {
    fn scan(&self, paths: &[PathBuf]) -> Result<Vec<DocEntry>, IndexError> {
        let mut out = Vec::new();
        for path in paths {
            if let Some(entries) = self.entries.get(path) {
                out.extend(entries.iter().cloned());
            }
        }
        Ok(out)
    }
}
