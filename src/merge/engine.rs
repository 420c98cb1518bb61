//! merge::engine
//!
//! The argument merge algorithm.
//!
//! # Precedence
//!
//! Sources are applied in this order (later overrides earlier):
//!
//! 1. Initialization - every declared parameter present and unset
//! 2. Import payload - deep-merged, declared keys only
//! 3. Internal args - root-level overwrite, trusted, always beat import
//! 4. Positional args - fill still-unset roots in declaration order
//! 5. Named options - land in an `opts`/`options` container or on an
//!    exact root key; explicit user intent, overwrite anything
//!
//! # Deep merge
//!
//! For a key present in both source and target: two arrays concatenate,
//! two mappings recurse, anything else is overwritten by the source.
//! Import keys with no declared counterpart are recorded as skipped, not
//! errors; the bag's declared shape is never widened by import data.
//!
//! The merge is a pure function over its inputs - the bag is freshly
//! built and nothing is aliased.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::registry::ParameterSpec;

use super::{ArgumentBag, Slot};

/// Result of one merge: the filled bag plus diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    /// The resolved per-invocation argument state.
    pub bag: ArgumentBag,
    /// Import keys that matched no declared parameter (dotted paths).
    pub skipped: Vec<String>,
    /// Named options that found no structural target.
    pub dropped: Vec<String>,
}

/// Resolve one invocation's argument bag from its sources.
///
/// `named` keeps the order options appeared on the command line; later
/// occurrences of the same key overwrite earlier ones.
///
/// # Example
///
/// ```
/// use docket::merge::merge;
/// use docket::registry::ParameterSpec;
/// use serde_json::json;
/// use std::collections::BTreeMap;
///
/// let params = vec![
///     ParameterSpec { name: "a".into(), types: vec!["*".into()], default: None },
///     ParameterSpec { name: "b".into(), types: vec!["*".into()], default: None },
/// ];
/// let outcome = merge(
///     &params,
///     &[json!("2"), json!("3")],
///     &[],
///     None,
///     &BTreeMap::new(),
/// );
/// assert_eq!(outcome.bag.to_positional(), vec![json!("2"), json!("3")]);
/// ```
pub fn merge(
    params: &[ParameterSpec],
    positional: &[Value],
    named: &[(String, Value)],
    import: Option<&Map<String, Value>>,
    internal: &BTreeMap<String, Value>,
) -> MergeOutcome {
    let mut outcome = MergeOutcome {
        bag: ArgumentBag::from_params(params),
        ..MergeOutcome::default()
    };

    // 2. Import payload.
    if let Some(payload) = import {
        merge_import(&mut outcome.bag, payload, "", &mut outcome.skipped);
    }

    // 3. Internal args: root-level names only, always win over import.
    for (key, value) in internal {
        if let Some(slot) = outcome.bag.get_mut(key) {
            *slot = Slot::Value(value.clone());
        }
    }

    // 4. Positional fill: unset roots consume values left to right;
    // resolved entries are skipped and do not consume a slot.
    let mut values = positional.iter();
    for (_, slot) in outcome.bag.entries_mut() {
        if !slot.is_unset() {
            continue;
        }
        match values.next() {
            Some(value) => *slot = Slot::Value(value.clone()),
            None => break,
        }
    }

    // 5. Named options.
    for (key, value) in named {
        if !place_option(&mut outcome.bag, key, value) {
            outcome.dropped.push(key.clone());
        }
    }

    outcome
}

/// Deep-merge an import object into a bag level.
///
/// Only declared keys are consumed; the rest are recorded under their
/// dotted path in `skipped`.
fn merge_import(
    bag: &mut ArgumentBag,
    payload: &Map<String, Value>,
    prefix: &str,
    skipped: &mut Vec<String>,
) {
    for (key, value) in payload {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match bag.get_mut(key) {
            None => skipped.push(path),
            Some(slot) => match (slot, value) {
                // Declared nested bag vs object: recurse, same rules.
                (Slot::Nested(inner), Value::Object(obj)) => {
                    merge_import(inner, obj, &path, skipped);
                }
                // Same-kind containers merge; everything else overwrites.
                (Slot::Value(existing), _) => {
                    merge_value(existing, value);
                }
                (slot, _) => *slot = Slot::Value(value.clone()),
            },
        }
    }
}

/// Value-level deep merge: arrays concatenate, objects recurse,
/// mismatched kinds overwrite.
fn merge_value(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Array(t), Value::Array(s)) => {
            t.extend(s.iter().cloned());
        }
        (Value::Object(t), Value::Object(s)) => {
            for (k, v) in s {
                match t.get_mut(k) {
                    Some(existing) => merge_value(existing, v),
                    None => {
                        t.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (t, s) => *t = s.clone(),
    }
}

/// Place one named option: an `opts` container first, then `options`,
/// then an exact root key. Returns false when nothing matched.
fn place_option(bag: &mut ArgumentBag, key: &str, value: &Value) -> bool {
    for container in ["opts", "options"] {
        if let Some(Slot::Nested(inner)) = bag.get_mut(container) {
            inner.set(key, value.clone());
            return true;
        }
    }
    if let Some(slot) = bag.get_mut(key) {
        *slot = Slot::Value(value.clone());
        return true;
    }
    false
}
