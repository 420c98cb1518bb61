//! dispatch
//!
//! Invocation dispatch.
//!
//! # Responsibilities
//!
//! - Scan raw CLI tokens and decide between version, help, and execute
//! - Expand a JSON-array import payload into a batch of invocations
//! - Run the merge engine once per invocation and invoke the callable,
//!   sequentially or in parallel
//! - Collect results in input order, optionally serialized to JSON
//!
//! # Architecture
//!
//! The dispatcher is thin. Resolution lives in [`crate::resolve`], the
//! merge algorithm in [`crate::merge`]; this layer wires them together
//! and owns the execution mode. Command-not-found is a fallthrough into
//! help rendering, not an error.

pub mod import;
pub mod tokens;

pub use import::{ImportError, ImportPayload};
pub use tokens::TokenSet;

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::merge::merge;
use crate::meta::CliMetadata;
use crate::registry::{CommandDescriptor, Registry, IMPLICIT_GROUP};
use crate::resolve::{render_detail, render_not_found, resolve};
use crate::ui::output::{self, Verbosity};

/// Errors from a dispatch attempt.
///
/// Command-not-found is deliberately absent: it renders help instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("missing value for {0}")]
    MissingValue(&'static str),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invocation {index} failed: {reason}")]
    Invoke {
        index: usize,
        reason: anyhow::Error,
    },

    #[error("{} of {total} batch invocation(s) failed", .failures.len())]
    Batch {
        total: usize,
        /// (input index, failure message) pairs, in input order.
        failures: Vec<(usize, String)>,
    },
}

/// Batch execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Start every invocation concurrently and await them jointly. A
    /// failure does not cancel siblings already started.
    Parallel,
    /// Await each invocation before starting the next. A failure aborts
    /// the remaining items.
    Sequential,
}

impl Default for ExecMode {
    fn default() -> Self {
        ExecMode::Parallel
    }
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Banner metadata for help and version output.
    pub metadata: CliMetadata,
    /// Internal args: caller-controlled values hidden from the CLI
    /// surface and from help. Matched against root-level parameter names.
    pub internal: BTreeMap<String, Value>,
    /// Batch execution mode.
    pub mode: ExecMode,
    /// Output verbosity for diagnostics.
    pub verbosity: Verbosity,
}

/// What a dispatch produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// `--version`: the version line, nothing else happens.
    Version(String),
    /// Help text: full listing, not-found listing, or command detail.
    Help(String),
    /// Per-invocation results, in input order.
    Results(Vec<Value>),
    /// Results serialized to a single JSON string (bare `--json`).
    Json(String),
}

/// Parses raw CLI tokens, resolves a command, merges arguments, and
/// invokes.
///
/// # Example
///
/// ```
/// use docket::dispatch::{Dispatcher, DispatcherConfig, Outcome};
/// use docket::docindex::{DocEntry, DocParam, StaticIndex};
/// use docket::registry::{CallableTable, Registry, Sources};
/// use serde_json::json;
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
/// let mut table = CallableTable::new();
/// table.register("add", |args| {
///     let a: i64 = args[0].as_str().unwrap_or("0").parse()?;
///     let b: i64 = args[1].as_str().unwrap_or("0").parse()?;
///     Ok(json!(a + b))
/// });
/// let registry = Registry::build(&index, &Sources::single(["math.rs"]), &table).unwrap();
/// let dispatcher = Dispatcher::new(registry, DispatcherConfig::default());
///
/// let argv: Vec<String> = ["add", "2", "3"].iter().map(|s| s.to_string()).collect();
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let outcome = rt.block_on(dispatcher.dispatch(&argv)).unwrap();
/// assert_eq!(outcome, Outcome::Results(vec![json!(5)]));
/// ```
#[derive(Debug)]
pub struct Dispatcher {
    registry: Registry,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Create a dispatcher over a built registry.
    pub fn new(registry: Registry, config: DispatcherConfig) -> Self {
        Self { registry, config }
    }

    /// The registry this dispatcher serves.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Dispatch one raw argv (program name already stripped).
    pub async fn dispatch(&self, argv: &[String]) -> Result<Outcome, DispatchError> {
        let tokens = tokens::scan(argv)?;

        if tokens.version {
            return Ok(Outcome::Version(self.version_line()));
        }

        // Leading positionals select the command: [GROUP] COMMAND.
        let grouped = self.registry.is_grouped();
        let group = if grouped {
            tokens.positionals.first().cloned().unwrap_or_default()
        } else {
            IMPLICIT_GROUP.to_string()
        };
        let command_idx = usize::from(grouped);
        let command_name = tokens.positionals.get(command_idx).cloned();
        let call_args: Vec<Value> = tokens
            .positionals
            .iter()
            .skip(command_idx + 1)
            .map(|s| Value::String(s.clone()))
            .collect();

        let resolved = command_name
            .as_deref()
            .and_then(|name| resolve(&self.registry, &group, name));

        if tokens.help {
            let text = match resolved {
                Some(descriptor) => render_detail(
                    &group,
                    descriptor,
                    &self.config.metadata,
                    &self.ignore_set(),
                ),
                None => render_not_found(
                    &self.registry,
                    &self.config.metadata,
                    &self.search_token(&group, command_name.as_deref()),
                ),
            };
            return Ok(Outcome::Help(text));
        }

        let Some(descriptor) = resolved else {
            return Ok(Outcome::Help(render_not_found(
                &self.registry,
                &self.config.metadata,
                &self.search_token(&group, command_name.as_deref()),
            )));
        };

        let payload = tokens
            .import_source
            .as_deref()
            .map(import::load)
            .transpose()?;
        let imports: Vec<Option<Map<String, Value>>> = match payload {
            None => vec![None],
            Some(ImportPayload::Single(map)) => vec![Some(map)],
            Some(ImportPayload::Batch(items)) => items.into_iter().map(Some).collect(),
        };

        // One fresh bag per invocation; nothing is shared between them.
        let mut calls = Vec::with_capacity(imports.len());
        for item in &imports {
            let outcome = merge(
                &descriptor.params,
                &call_args,
                &tokens.named,
                item.as_ref(),
                &self.config.internal,
            );
            output::skipped("import keys", &outcome.skipped, self.config.verbosity);
            output::skipped("options", &outcome.dropped, self.config.verbosity);
            calls.push(outcome.bag.to_positional());
        }

        let results = match self.config.mode {
            ExecMode::Sequential => invoke_sequential(descriptor, calls).await?,
            ExecMode::Parallel => invoke_parallel(descriptor, calls).await?,
        };

        if tokens.json_output {
            Ok(Outcome::Json(serde_json::to_string(&results)?))
        } else {
            Ok(Outcome::Results(results))
        }
    }

    /// Dispatch and print the outcome.
    pub async fn run(&self, argv: &[String]) -> anyhow::Result<()> {
        let verbosity = self.config.verbosity;
        match self.dispatch(argv).await? {
            Outcome::Version(line) => output::print(line, verbosity),
            Outcome::Help(text) => output::print(text, verbosity),
            // Machine-readable output ignores the quiet flag.
            Outcome::Json(text) => println!("{}", text),
            Outcome::Results(values) => {
                for value in values {
                    output::print(&value, verbosity);
                }
            }
        }
        Ok(())
    }

    /// Synchronous wrapper that runs [`Dispatcher::run`] on a fresh
    /// tokio runtime.
    pub fn run_blocking(&self, argv: &[String]) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run(argv))
    }

    /// Version line for `--version`.
    fn version_line(&self) -> String {
        let name = self.config.metadata.display_name();
        match &self.config.metadata.version {
            Some(version) => format!("{} {}", name, version),
            None => format!("{} (version unknown)", name),
        }
    }

    /// Parameter names hidden from single-command help: internal-arg
    /// names plus the literal container names.
    fn ignore_set(&self) -> BTreeSet<String> {
        let mut ignore: BTreeSet<String> =
            self.config.internal.keys().cloned().collect();
        ignore.insert("opts".to_string());
        ignore.insert("options".to_string());
        ignore
    }

    /// Token the fuzzy suggestion ranks against: the attempted command,
    /// or the attempted group when the group itself is unknown.
    fn search_token(&self, group: &str, command: Option<&str>) -> String {
        if self.registry.is_grouped() && !group.is_empty() && self.registry.group(group).is_none()
        {
            return group.to_string();
        }
        command.unwrap_or_default().to_string()
    }
}

/// Run invocations one at a time; a failure aborts the rest.
async fn invoke_sequential(
    descriptor: &CommandDescriptor,
    calls: Vec<Vec<Value>>,
) -> Result<Vec<Value>, DispatchError> {
    let mut results = Vec::with_capacity(calls.len());
    for (index, args) in calls.into_iter().enumerate() {
        match (descriptor.callable)(args).await {
            Ok(value) => results.push(value),
            Err(reason) => return Err(DispatchError::Invoke { index, reason }),
        }
    }
    Ok(results)
}

/// Start all invocations concurrently and await them jointly. Started
/// siblings keep running when one fails; failures aggregate after the
/// joint wait.
async fn invoke_parallel(
    descriptor: &CommandDescriptor,
    calls: Vec<Vec<Value>>,
) -> Result<Vec<Value>, DispatchError> {
    let handles: Vec<_> = calls
        .into_iter()
        .map(|args| tokio::spawn((descriptor.callable)(args)))
        .collect();
    let total = handles.len();

    let mut results = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for (index, joined) in futures::future::join_all(handles).await.into_iter().enumerate() {
        match joined {
            Ok(Ok(value)) => results.push(value),
            Ok(Err(reason)) => failures.push((index, reason.to_string())),
            Err(join_error) => failures.push((index, join_error.to_string())),
        }
    }

    if failures.is_empty() {
        Ok(results)
    } else {
        Err(DispatchError::Batch { total, failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docindex::{DocEntry, DocParam, StaticIndex};
    use crate::registry::{CallableTable, Sources};
    use serde_json::json;

    fn math_dispatcher(config: DispatcherConfig) -> Dispatcher {
        let mut index = StaticIndex::new();
        index.insert(
            "math.rs",
            vec![DocEntry::function(
                "add",
                vec![
                    DocParam::typed("a", "number"),
                    DocParam::typed("b", "number"),
                ],
                "Add two numbers",
                "math.rs",
            )],
        );
        let mut table = CallableTable::new();
        table.register("add", |args| {
            let a = num(&args[0])?;
            let b = num(&args[1])?;
            Ok(json!(a + b))
        });
        let registry =
            Registry::build(&index, &Sources::single(["math.rs"]), &table).unwrap();
        Dispatcher::new(registry, config)
    }

    fn num(value: &Value) -> anyhow::Result<i64> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| anyhow::anyhow!("not an integer: {}", n)),
            Value::String(s) => Ok(s.parse()?),
            other => anyhow::bail!("not a number: {}", other),
        }
    }

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn version_short_circuits() {
        let dispatcher = math_dispatcher(DispatcherConfig {
            metadata: CliMetadata::new("mathcli", "math things", "1.0.0"),
            ..DispatcherConfig::default()
        });
        let outcome = dispatcher.dispatch(&argv(&["-v", "add", "2", "3"])).await.unwrap();
        assert_eq!(outcome, Outcome::Version("mathcli 1.0.0".into()));
    }

    #[tokio::test]
    async fn positional_invocation() {
        let dispatcher = math_dispatcher(DispatcherConfig::default());
        let outcome = dispatcher.dispatch(&argv(&["add", "2", "3"])).await.unwrap();
        assert_eq!(outcome, Outcome::Results(vec![json!(5)]));
    }

    #[tokio::test]
    async fn unknown_command_falls_through_to_help() {
        let dispatcher = math_dispatcher(DispatcherConfig::default());
        let outcome = dispatcher.dispatch(&argv(&["adde", "2", "3"])).await.unwrap();
        let Outcome::Help(text) = outcome else {
            panic!("expected help outcome");
        };
        assert!(text.contains("did you mean 'add'?"));
    }

    #[tokio::test]
    async fn batch_parallel_keeps_input_order() {
        let dispatcher = math_dispatcher(DispatcherConfig::default());
        let outcome = dispatcher
            .dispatch(&argv(&["add", "-j", r#"[{"a":1,"b":2},{"a":3,"b":4}]"#]))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Results(vec![json!(3), json!(7)]));
    }

    #[tokio::test]
    async fn sequential_failure_aborts_remaining() {
        let mut index = StaticIndex::new();
        index.insert(
            "t.rs",
            vec![DocEntry::function(
                "must",
                vec![DocParam::typed("x", "number")],
                "fails on zero",
                "t.rs",
            )],
        );
        let mut table = CallableTable::new();
        table.register("must", |args| {
            let x = num(&args[0])?;
            anyhow::ensure!(x != 0, "zero is not allowed");
            Ok(json!(x))
        });
        let registry = Registry::build(&index, &Sources::single(["t.rs"]), &table).unwrap();
        let dispatcher = Dispatcher::new(
            registry,
            DispatcherConfig {
                mode: ExecMode::Sequential,
                ..DispatcherConfig::default()
            },
        );

        let err = dispatcher
            .dispatch(&argv(&["must", "-j", r#"[{"x":1},{"x":0},{"x":2}]"#]))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Invoke { index: 1, .. }));
    }

    #[tokio::test]
    async fn bare_json_flag_serializes_results() {
        let dispatcher = math_dispatcher(DispatcherConfig::default());
        let outcome = dispatcher
            .dispatch(&argv(&["add", "2", "3", "--json"]))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Json("[5]".into()));
    }

    #[tokio::test]
    async fn internal_args_fill_hidden_parameters() {
        let mut index = StaticIndex::new();
        index.insert(
            "g.rs",
            vec![DocEntry::function(
                "greet",
                vec![
                    DocParam::typed("name", "string"),
                    DocParam::typed("token", "string"),
                ],
                "Greet with a token",
                "g.rs",
            )],
        );
        let mut table = CallableTable::new();
        table.register("greet", |args| {
            Ok(json!(format!(
                "{}:{}",
                args[0].as_str().unwrap_or(""),
                args[1].as_str().unwrap_or("")
            )))
        });
        let registry = Registry::build(&index, &Sources::single(["g.rs"]), &table).unwrap();
        let dispatcher = Dispatcher::new(
            registry,
            DispatcherConfig {
                internal: BTreeMap::from([("token".to_string(), json!("secret"))]),
                ..DispatcherConfig::default()
            },
        );

        // The single positional fills `name`; `token` came internally and
        // consumed no positional slot.
        let outcome = dispatcher.dispatch(&argv(&["greet", "ada"])).await.unwrap();
        assert_eq!(outcome, Outcome::Results(vec![json!("ada:secret")]));
    }
}
