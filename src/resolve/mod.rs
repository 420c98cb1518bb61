//! resolve
//!
//! Command resolution and fuzzy suggestions.
//!
//! # Overview
//!
//! Resolution is an exact match on the (group, command) pair. A miss is
//! not an error - it is a designed fallthrough into help rendering, with
//! a best-effort nearest-match suggestion computed by Levenshtein edit
//! distance over every command name in the registry.
//!
//! # Modules
//!
//! - [`help`] - full-listing and single-command help rendering
//!
//! # Tie-breaking
//!
//! The registry enumerates alphabetically by group then command, and the
//! scan keeps the first strictly-smaller distance, so equally-close
//! suggestions resolve deterministically to the alphabetically-first
//! pair.

pub mod help;

pub use help::{render_detail, render_listing, render_not_found};

use crate::registry::{CommandDescriptor, Registry};

/// Nearest-by-edit-distance command recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Group the suggested command lives in.
    pub group: String,
    /// Suggested command name.
    pub name: String,
    /// Levenshtein distance from the search token.
    pub distance: usize,
}

/// Look up a command by group and name.
///
/// Absence of the group or the command is "not found", never an error.
pub fn resolve<'r>(
    registry: &'r Registry,
    group: &str,
    name: &str,
) -> Option<&'r CommandDescriptor> {
    registry.group(group)?.get(name)
}

/// Rank all commands by edit distance to a search token and return the
/// closest.
///
/// An empty token yields no suggestion.
///
/// # Example
///
/// ```
/// use docket::docindex::{DocEntry, StaticIndex};
/// use docket::registry::{CallableTable, Registry, Sources};
/// use docket::resolve::suggest;
/// use serde_json::Value;
///
/// let mut index = StaticIndex::new();
/// index.insert(
///     "m.rs",
///     vec![DocEntry::function("adder", vec![], "adds", "m.rs")],
/// );
/// let mut table = CallableTable::new();
/// table.register("adder", |_| Ok(Value::Null));
/// let registry = Registry::build(&index, &Sources::single(["m.rs"]), &table).unwrap();
///
/// let hit = suggest(&registry, "adde").unwrap();
/// assert_eq!(hit.name, "adder");
/// assert_eq!(hit.distance, 1);
/// ```
pub fn suggest(registry: &Registry, token: &str) -> Option<Suggestion> {
    if token.is_empty() {
        return None;
    }
    let mut best: Option<Suggestion> = None;
    for (group, descriptor) in registry.commands() {
        let distance = strsim::levenshtein(token, &descriptor.name);
        let closer = match &best {
            Some(current) => distance < current.distance,
            None => true,
        };
        if closer {
            best = Some(Suggestion {
                group: group.to_string(),
                name: descriptor.name.clone(),
                distance,
            });
        }
    }
    best
}
