//! registry
//!
//! Command registry construction.
//!
//! # Overview
//!
//! The registry cross-references a documentation index against the
//! actually-exported callables: every documented function with a backing
//! callable becomes a [`CommandDescriptor`]; documented entries with no
//! callable, and callables with no documentation, are silently excluded.
//! That filter is deliberate - undocumented exports are not commands.
//!
//! # Grouping
//!
//! A single source-path set yields one implicit, unnamed group and
//! dispatch takes no group token. A mapping of group name to source-path
//! set yields one sub-map per group, and dispatch requires a leading
//! group token.
//!
//! # Invariants
//!
//! - The registry is built once and read-only thereafter
//! - Groups and commands are stored in alphabetical order, which is also
//!   the display order and the fuzzy-suggestion tie-break order

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::docindex::{DocIndex, DocParam, EntryKind, IndexError};

/// Group key used when the registry is built from a single source set.
pub const IMPLICIT_GROUP: &str = "";

/// Display length a command description is truncated to.
const DESCRIPTION_MAX: usize = 120;

/// An invokable command body.
///
/// Takes the resolved positional argument vector and yields a JSON value.
pub type Callable =
    Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// One declared parameter of a command.
///
/// A dotted name such as `options.timeout` denotes a field of a nested
/// option object.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    /// Parameter name, possibly dotted.
    pub name: String,
    /// Type tags; `*` is the wildcard.
    pub types: Vec<String>,
    /// Declared default, used for help display only. Resolution starts
    /// from the unset sentinel regardless of a declared default.
    pub default: Option<Value>,
}

impl From<DocParam> for ParameterSpec {
    fn from(p: DocParam) -> Self {
        Self {
            name: p.name,
            types: p.types,
            default: p.default,
        }
    }
}

impl ParameterSpec {
    /// Name with any `opts.`/`options.` container prefix removed.
    pub fn stripped_name(&self) -> &str {
        self.name
            .strip_prefix("opts.")
            .or_else(|| self.name.strip_prefix("options."))
            .unwrap_or(&self.name)
    }

    /// Whether the parameter lives inside an option container.
    pub fn is_option(&self) -> bool {
        self.stripped_name() != self.name
    }
}

/// A documented, exported callable exposed on the CLI.
#[derive(Clone)]
pub struct CommandDescriptor {
    /// Command name.
    pub name: String,
    /// The function to invoke.
    pub callable: Callable,
    /// Declared parameters, in declaration order.
    pub params: Vec<ParameterSpec>,
    /// Display description: newlines flattened, truncated past 120 chars.
    pub description: String,
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// The exported callables a registry build cross-references against.
///
/// # Example
///
/// ```
/// use docket::registry::CallableTable;
/// use serde_json::json;
///
/// let mut table = CallableTable::new();
/// table.register("add", |args| {
///     let a = args[0].as_i64().unwrap_or(0);
///     let b = args[1].as_i64().unwrap_or(0);
///     Ok(json!(a + b))
/// });
/// assert!(table.get("add").is_some());
/// assert!(table.get("missing").is_none());
/// ```
#[derive(Clone, Default)]
pub struct CallableTable {
    entries: BTreeMap<String, Callable>,
}

impl CallableTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synchronous callable.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        let callable: Callable =
            Arc::new(move |args| futures::future::ready(f(args)).boxed());
        self.entries.insert(name.into(), callable);
    }

    /// Register an asynchronous callable.
    pub fn register_async<F, Fut>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Value>> + Send + 'static,
    {
        let callable: Callable = Arc::new(move |args| f(args).boxed());
        self.entries.insert(name.into(), callable);
    }

    /// Look up a callable by exported name.
    pub fn get(&self, name: &str) -> Option<Callable> {
        self.entries.get(name).cloned()
    }
}

impl fmt::Debug for CallableTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableTable")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Source paths the registry scans, optionally split into named groups.
#[derive(Debug, Clone)]
pub enum Sources {
    /// One path set; all commands land in the implicit unnamed group.
    Single(Vec<PathBuf>),
    /// Named groups, each with its own path set.
    Grouped(BTreeMap<String, Vec<PathBuf>>),
}

impl Sources {
    /// Single path set from anything path-like.
    pub fn single<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Sources::Single(paths.into_iter().map(Into::into).collect())
    }

    /// Named groups from (name, paths) pairs.
    pub fn grouped<I, N, P>(groups: I) -> Self
    where
        I: IntoIterator<Item = (N, Vec<P>)>,
        N: Into<String>,
        P: Into<PathBuf>,
    {
        Sources::Grouped(
            groups
                .into_iter()
                .map(|(name, paths)| {
                    (name.into(), paths.into_iter().map(Into::into).collect())
                })
                .collect(),
        )
    }
}

/// Mapping from group name to command name to descriptor.
///
/// Built once at startup and immutable for the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    groups: BTreeMap<String, BTreeMap<String, CommandDescriptor>>,
    grouped: bool,
}

impl Registry {
    /// Build a registry by scanning sources and cross-referencing the
    /// callable table.
    ///
    /// Non-function entries, and documented functions with no backing
    /// callable, are discarded without error.
    pub fn build(
        index: &dyn DocIndex,
        sources: &Sources,
        callables: &CallableTable,
    ) -> Result<Self, IndexError> {
        let mut registry = Registry {
            groups: BTreeMap::new(),
            grouped: matches!(sources, Sources::Grouped(_)),
        };

        match sources {
            Sources::Single(paths) => {
                let commands = build_group(index, paths, callables)?;
                registry.groups.insert(IMPLICIT_GROUP.to_string(), commands);
            }
            Sources::Grouped(groups) => {
                for (name, paths) in groups {
                    let commands = build_group(index, paths, callables)?;
                    registry.groups.insert(name.clone(), commands);
                }
            }
        }

        Ok(registry)
    }

    /// Whether dispatch requires a leading group token.
    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    /// Commands of one group.
    pub fn group(&self, name: &str) -> Option<&BTreeMap<String, CommandDescriptor>> {
        self.groups.get(name)
    }

    /// All groups, alphabetically.
    pub fn groups(
        &self,
    ) -> impl Iterator<Item = (&str, &BTreeMap<String, CommandDescriptor>)> {
        self.groups.iter().map(|(name, cmds)| (name.as_str(), cmds))
    }

    /// Every (group, command) pair, alphabetically by group then command.
    pub fn commands(&self) -> impl Iterator<Item = (&str, &CommandDescriptor)> {
        self.groups
            .iter()
            .flat_map(|(group, cmds)| cmds.values().map(move |c| (group.as_str(), c)))
    }

    /// Total number of commands across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    /// Whether the registry holds no commands at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scan one path set into a command map.
fn build_group(
    index: &dyn DocIndex,
    paths: &[PathBuf],
    callables: &CallableTable,
) -> Result<BTreeMap<String, CommandDescriptor>, IndexError> {
    let mut commands = BTreeMap::new();
    for entry in index.scan(paths)? {
        if entry.kind != EntryKind::Function {
            continue;
        }
        // Documented but not exported: not a command.
        let Some(callable) = callables.get(&entry.name) else {
            continue;
        };
        let descriptor = CommandDescriptor {
            name: entry.name.clone(),
            callable,
            params: entry.params.into_iter().map(Into::into).collect(),
            description: display_description(&entry.description),
        };
        commands.insert(entry.name, descriptor);
    }
    Ok(commands)
}

/// Flatten newlines and truncate past the display bound.
fn display_description(raw: &str) -> String {
    let flat = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if flat.chars().count() > DESCRIPTION_MAX {
        let truncated: String = flat.chars().take(DESCRIPTION_MAX).collect();
        format!("{}...", truncated)
    } else {
        flat
    }
}
