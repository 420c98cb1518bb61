//! merge
//!
//! Argument resolution state.
//!
//! # Overview
//!
//! An [`ArgumentBag`] is the per-invocation resolved parameter state: one
//! entry per declared parameter, in declaration order, with an explicit
//! [`Slot::Unset`] sentinel so presence-vs-value distinctions stay
//! type-checkable. Dotted parameter names (`options.timeout`) build nested
//! bags.
//!
//! # Modules
//!
//! - [`engine`] - the merge algorithm filling a bag from its four sources
//!
//! # Invariants
//!
//! - Every declared top-level parameter name exists in the bag from
//!   initialization, before any source contributes a value
//! - The set of entry names never grows past the declared shape; import
//!   data cannot widen it
//! - Entries keep declaration order; the positional walk and the final
//!   collapse both rely on it

pub mod engine;

pub use engine::{merge, MergeOutcome};

use serde_json::{Map, Value};

use crate::registry::ParameterSpec;

/// Resolution state of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// No source has contributed a value. Translates to "no argument"
    /// (JSON null) at invocation time.
    Unset,
    /// A resolved value.
    Value(Value),
    /// A nested option object declared through dotted parameter names.
    Nested(ArgumentBag),
}

impl Slot {
    /// Whether the slot is still the unset sentinel.
    pub fn is_unset(&self) -> bool {
        matches!(self, Slot::Unset)
    }
}

/// Ordered parameter-name to slot mapping for one invocation.
///
/// Constructed fresh per invocation (per batch item) and discarded after
/// the call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentBag {
    entries: Vec<(String, Slot)>,
}

impl ArgumentBag {
    /// Initialize a bag from a declared parameter list.
    ///
    /// Every parameter is present and unset; dotted names create nested
    /// bags, with fields in first-seen order under a shared root.
    ///
    /// # Example
    ///
    /// ```
    /// use docket::merge::ArgumentBag;
    /// use docket::registry::ParameterSpec;
    ///
    /// let params = vec![
    ///     ParameterSpec { name: "a".into(), types: vec!["*".into()], default: None },
    ///     ParameterSpec { name: "opts.timeout".into(), types: vec!["number".into()], default: None },
    /// ];
    /// let bag = ArgumentBag::from_params(&params);
    /// assert!(bag.get("a").unwrap().is_unset());
    /// assert!(bag.get("opts").is_some());
    /// ```
    pub fn from_params(params: &[ParameterSpec]) -> Self {
        let mut bag = ArgumentBag::default();
        for param in params {
            bag.declare(&param.name.split('.').collect::<Vec<_>>());
        }
        bag
    }

    /// Declare one (possibly nested) parameter path.
    fn declare(&mut self, path: &[&str]) {
        let (head, rest) = match path.split_first() {
            Some(split) => split,
            None => return,
        };
        if rest.is_empty() {
            if self.get(head).is_none() {
                self.entries.push((head.to_string(), Slot::Unset));
            }
            return;
        }
        match self.get_mut(head) {
            Some(Slot::Nested(inner)) => inner.declare(rest),
            Some(_) => {}
            None => {
                let mut inner = ArgumentBag::default();
                inner.declare(rest);
                self.entries.push((head.to_string(), Slot::Nested(inner)));
            }
        }
    }

    /// Slot for a name, if declared.
    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| slot)
    }

    /// Mutable slot for a name, if declared.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Slot> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| slot)
    }

    /// Set a name to a resolved value, adding the entry if absent.
    ///
    /// Widening is reserved for named options landing in an option
    /// container; import merging never calls this on undeclared names.
    pub(crate) fn set(&mut self, name: &str, value: Value) {
        match self.get_mut(name) {
            Some(slot) => *slot = Slot::Value(value),
            None => self.entries.push((name.to_string(), Slot::Value(value))),
        }
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Mutable entries in declaration order.
    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = (&String, &mut Slot)> {
        self.entries.iter_mut().map(|(n, s)| (&*n, s))
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collapse to the positional argument vector, in declaration order.
    ///
    /// Unset roots become JSON null; nested bags collapse to objects with
    /// unset fields omitted.
    pub fn to_positional(&self) -> Vec<Value> {
        self.entries
            .iter()
            .map(|(_, slot)| match slot {
                Slot::Unset => Value::Null,
                Slot::Value(v) => v.clone(),
                Slot::Nested(inner) => inner.to_value(),
            })
            .collect()
    }

    /// Collapse to a JSON object; unset entries are omitted.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (name, slot) in &self.entries {
            match slot {
                Slot::Unset => {}
                Slot::Value(v) => {
                    map.insert(name.clone(), v.clone());
                }
                Slot::Nested(inner) => {
                    map.insert(name.clone(), inner.to_value());
                }
            }
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(name: &str) -> ParameterSpec {
        ParameterSpec {
            name: name.into(),
            types: vec!["*".into()],
            default: None,
        }
    }

    #[test]
    fn init_declares_every_parameter_unset() {
        let bag = ArgumentBag::from_params(&[spec("a"), spec("b")]);
        assert_eq!(bag.len(), 2);
        assert!(bag.get("a").unwrap().is_unset());
        assert!(bag.get("b").unwrap().is_unset());
    }

    #[test]
    fn dotted_names_share_a_nested_root() {
        let bag = ArgumentBag::from_params(&[
            spec("a"),
            spec("opts.timeout"),
            spec("opts.retries"),
        ]);
        assert_eq!(bag.len(), 2);
        let Some(Slot::Nested(opts)) = bag.get("opts") else {
            panic!("opts should be nested");
        };
        assert!(opts.get("timeout").unwrap().is_unset());
        assert!(opts.get("retries").unwrap().is_unset());
    }

    #[test]
    fn positional_collapse_keeps_declaration_order() {
        let mut bag = ArgumentBag::from_params(&[spec("a"), spec("b"), spec("opts.x")]);
        bag.set("b", json!(2));

        assert_eq!(
            bag.to_positional(),
            vec![Value::Null, json!(2), json!({})]
        );
    }

    #[test]
    fn to_value_omits_unset_fields() {
        let mut bag = ArgumentBag::from_params(&[spec("a"), spec("opts.x"), spec("opts.y")]);
        bag.set("a", json!(1));
        if let Some(Slot::Nested(opts)) = bag.get_mut("opts") {
            opts.set("y", json!("z"));
        }

        assert_eq!(bag.to_value(), json!({ "a": 1, "opts": { "y": "z" } }));
    }
}
