//! Integration tests for end-to-end dispatch.
//!
//! These tests build registries over a StaticIndex and drive the
//! dispatcher the way an embedding CLI would: raw argv in, outcome out.

use std::collections::BTreeMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use docket::dispatch::{DispatchError, Dispatcher, DispatcherConfig, ExecMode, Outcome};
use docket::docindex::{DocEntry, DocParam, StaticIndex};
use docket::meta::CliMetadata;
use docket::registry::{CallableTable, Registry, Sources};

fn argv(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
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

/// Registry with one `add(a, b)` command under the implicit group.
fn math_registry() -> Registry {
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
    table.register("add", |args| Ok(json!(num(&args[0])? + num(&args[1])?)));
    Registry::build(&index, &Sources::single(["math.rs"]), &table).unwrap()
}

#[tokio::test]
async fn single_invocation_with_positionals() {
    let dispatcher = Dispatcher::new(math_registry(), DispatcherConfig::default());
    let outcome = dispatcher.dispatch(&argv(&["add", "2", "3"])).await.unwrap();
    assert_eq!(outcome, Outcome::Results(vec![json!(5)]));
}

#[tokio::test]
async fn positional_and_import_produce_the_same_result() {
    let dispatcher = Dispatcher::new(math_registry(), DispatcherConfig::default());

    let by_position = dispatcher.dispatch(&argv(&["add", "2", "3"])).await.unwrap();
    let by_import = dispatcher
        .dispatch(&argv(&["add", "-j", r#"{"a":"2","b":"3"}"#]))
        .await
        .unwrap();

    assert_eq!(by_position, by_import);
    assert_eq!(by_position, Outcome::Results(vec![json!(5)]));
}

#[tokio::test]
async fn batch_import_runs_once_per_element() {
    let dispatcher = Dispatcher::new(math_registry(), DispatcherConfig::default());
    let outcome = dispatcher
        .dispatch(&argv(&["add", "--json", r#"[{"a":1,"b":2},{"a":3,"b":4}]"#]))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Results(vec![json!(3), json!(7)]));
}

#[tokio::test]
async fn batch_parallel_collects_in_input_order() {
    // Later batch items finish first: each invocation yields to the
    // scheduler more often the earlier it appears.
    let mut index = StaticIndex::new();
    index.insert(
        "y.rs",
        vec![DocEntry::function(
            "echo",
            vec![DocParam::typed("x", "number"), DocParam::typed("spins", "number")],
            "Echo x after spinning",
            "y.rs",
        )],
    );
    let mut table = CallableTable::new();
    table.register_async("echo", |args| async move {
        let x = num(&args[0])?;
        let spins = num(&args[1])?;
        for _ in 0..spins {
            tokio::task::yield_now().await;
        }
        Ok(json!(x))
    });
    let registry = Registry::build(&index, &Sources::single(["y.rs"]), &table).unwrap();
    let dispatcher = Dispatcher::new(registry, DispatcherConfig::default());

    let outcome = dispatcher
        .dispatch(&argv(&[
            "echo",
            "-j",
            r#"[{"x":1,"spins":50},{"x":2,"spins":10},{"x":3,"spins":0}]"#,
        ]))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Results(vec![json!(1), json!(2), json!(3)]));
}

#[tokio::test]
async fn batch_import_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batch.json");
    fs::write(&path, r#"[{"a":10,"b":20},{"a":30,"b":40}]"#).unwrap();

    let dispatcher = Dispatcher::new(math_registry(), DispatcherConfig::default());
    let outcome = dispatcher
        .dispatch(&argv(&["add", "--data", path.to_str().unwrap()]))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Results(vec![json!(30), json!(70)]));
}

#[tokio::test]
async fn invalid_payload_shape_is_fatal() {
    let dispatcher = Dispatcher::new(math_registry(), DispatcherConfig::default());
    let err = dispatcher
        .dispatch(&argv(&["add", "-j", "[1, 2]"]))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Import(_)));
}

/// Registry whose command fails for x == 0 and counts its starts.
fn counting_registry(started: Arc<AtomicUsize>) -> Registry {
    let mut index = StaticIndex::new();
    index.insert(
        "c.rs",
        vec![DocEntry::function(
            "check",
            vec![DocParam::typed("x", "number")],
            "Fail on zero",
            "c.rs",
        )],
    );
    let mut table = CallableTable::new();
    table.register_async("check", move |args| {
        let started = started.clone();
        async move {
            started.fetch_add(1, Ordering::SeqCst);
            let x = num(&args[0])?;
            anyhow::ensure!(x != 0, "zero is not allowed");
            Ok(json!(x))
        }
    });
    Registry::build(&index, &Sources::single(["c.rs"]), &table).unwrap()
}

#[tokio::test]
async fn sequential_failure_never_starts_the_rest() {
    let started = Arc::new(AtomicUsize::new(0));
    let dispatcher = Dispatcher::new(
        counting_registry(started.clone()),
        DispatcherConfig {
            mode: ExecMode::Sequential,
            ..DispatcherConfig::default()
        },
    );

    let err = dispatcher
        .dispatch(&argv(&["check", "-j", r#"[{"x":1},{"x":0},{"x":2},{"x":3}]"#]))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Invoke { index: 1, .. }));
    assert_eq!(started.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn parallel_failure_still_starts_every_sibling() {
    let started = Arc::new(AtomicUsize::new(0));
    let dispatcher = Dispatcher::new(
        counting_registry(started.clone()),
        DispatcherConfig {
            mode: ExecMode::Parallel,
            ..DispatcherConfig::default()
        },
    );

    let err = dispatcher
        .dispatch(&argv(&["check", "-j", r#"[{"x":1},{"x":0},{"x":2}]"#]))
        .await
        .unwrap_err();

    match err {
        DispatchError::Batch { total, failures } => {
            assert_eq!(total, 3);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].0, 1);
        }
        other => panic!("expected batch error, got {}", other),
    }
    assert_eq!(started.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn grouped_registry_requires_group_token() {
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
    index.insert(
        "text.rs",
        vec![DocEntry::function(
            "upper",
            vec![DocParam::typed("s", "string")],
            "Uppercase a string",
            "text.rs",
        )],
    );
    let mut table = CallableTable::new();
    table.register("add", |args| Ok(json!(num(&args[0])? + num(&args[1])?)));
    table.register("upper", |args| {
        Ok(json!(args[0].as_str().unwrap_or("").to_uppercase()))
    });
    let sources = Sources::grouped([("math", vec!["math.rs"]), ("text", vec!["text.rs"])]);
    let registry = Registry::build(&index, &sources, &table).unwrap();
    let dispatcher = Dispatcher::new(registry, DispatcherConfig::default());

    let outcome = dispatcher
        .dispatch(&argv(&["math", "add", "4", "5"]))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Results(vec![json!(9)]));

    let outcome = dispatcher
        .dispatch(&argv(&["text", "upper", "hi"]))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Results(vec![json!("HI")]));

    // Without the group token the command does not resolve.
    let outcome = dispatcher.dispatch(&argv(&["add", "4", "5"])).await.unwrap();
    assert!(matches!(outcome, Outcome::Help(_)));
}

#[tokio::test]
async fn named_options_override_positionals() {
    let dispatcher = Dispatcher::new(math_registry(), DispatcherConfig::default());
    let outcome = dispatcher
        .dispatch(&argv(&["add", "2", "3", "--b=10"]))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Results(vec![json!(12)]));
}

#[tokio::test]
async fn version_flag_short_circuits_everything() {
    let dispatcher = Dispatcher::new(
        math_registry(),
        DispatcherConfig {
            metadata: CliMetadata::new("mathcli", "math on the command line", "0.2.0"),
            ..DispatcherConfig::default()
        },
    );
    let outcome = dispatcher
        .dispatch(&argv(&["--version", "add", "2", "3"]))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Version("mathcli 0.2.0".into()));
}

#[tokio::test]
async fn bare_json_flag_serializes_the_result_sequence() {
    let dispatcher = Dispatcher::new(math_registry(), DispatcherConfig::default());
    let outcome = dispatcher
        .dispatch(&argv(&["add", "-j", "2", "3"]))
        .await
        .unwrap();
    // "2" is not inline JSON or a .json path, so -j is an output flag
    // and both tokens stay positional.
    assert_eq!(outcome, Outcome::Json("[5]".into()));
}
