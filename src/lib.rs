//! Docket - auto-generate a dispatchable CLI from documented functions
//!
//! Docket turns a set of documented, exported functions into a command-line
//! interface: a documentation index describes each function's name,
//! parameters, and description; a callable table supplies the functions
//! themselves; and the dispatcher resolves an invocation, merges its
//! argument sources, and invokes - once, or in a batch driven by a JSON
//! array.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`docindex`] - Documentation Index seam (entry types, scanner trait,
//!   signature-fallback parsing)
//! - [`registry`] - Builds the group -> command -> descriptor mapping by
//!   cross-referencing documentation against exported callables
//! - [`merge`] - Argument Merge Engine: resolves one invocation's ordered
//!   argument vector from import, internal, positional, and named sources
//! - [`resolve`] - Command resolution, fuzzy "did you mean" suggestions,
//!   and help rendering
//! - [`dispatch`] - Parses raw tokens, picks the version/help/execute
//!   path, expands batches, and invokes
//! - [`meta`] - CLI banner metadata
//! - [`ui`] - Output formatting and diagnostics
//!
//! # Correctness Invariants
//!
//! 1. A registry is built once and never mutated afterwards
//! 2. Every invocation resolves against a freshly constructed argument
//!    bag; nothing is shared between batch items
//! 3. Argument sources apply in fixed precedence: import, then internal,
//!    then positional, then named options
//! 4. The bag's declared shape is never widened by import data
//!
//! # Example
//!
//! ```
//! use docket::dispatch::{Dispatcher, DispatcherConfig, Outcome};
//! use docket::docindex::{DocEntry, DocParam, StaticIndex};
//! use docket::registry::{CallableTable, Registry, Sources};
//! use serde_json::json;
//!
//! let mut index = StaticIndex::new();
//! index.insert(
//!     "math.rs",
//!     vec![DocEntry::function(
//!         "add",
//!         vec![DocParam::typed("a", "number"), DocParam::typed("b", "number")],
//!         "Add two numbers",
//!         "math.rs",
//!     )],
//! );
//!
//! let mut table = CallableTable::new();
//! table.register("add", |args| {
//!     let a: i64 = args[0].as_str().unwrap_or("0").parse()?;
//!     let b: i64 = args[1].as_str().unwrap_or("0").parse()?;
//!     Ok(json!(a + b))
//! });
//!
//! let registry = Registry::build(&index, &Sources::single(["math.rs"]), &table).unwrap();
//! let dispatcher = Dispatcher::new(registry, DispatcherConfig::default());
//!
//! let argv: Vec<String> = ["add", "2", "3"].iter().map(|s| s.to_string()).collect();
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! match rt.block_on(dispatcher.dispatch(&argv)).unwrap() {
//!     Outcome::Results(values) => assert_eq!(values, vec![json!(5)]),
//!     other => panic!("unexpected outcome: {:?}", other),
//! }
//! ```

pub mod dispatch;
pub mod docindex;
pub mod merge;
pub mod meta;
pub mod registry;
pub mod resolve;
pub mod ui;
