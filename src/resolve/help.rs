//! resolve::help
//!
//! Help rendering.
//!
//! # Forms
//!
//! - **Full listing**: usage line, CLI banner, global options, then every
//!   group (alphabetical) with every command (alphabetical) as a one-line
//!   summary - fixed-width name column, description, no parameters.
//! - **Single-command detail**: the command's usage tokens (positional
//!   placeholders and named flags derived from its parameter list)
//!   followed by its description.
//!
//! Command-not-found rendering is the full listing plus a trailing
//! "did you mean" line when a fuzzy suggestion exists.

use std::collections::BTreeSet;
use std::fmt::Write;

use serde_json::Value;

use crate::meta::CliMetadata;
use crate::registry::{CommandDescriptor, ParameterSpec, Registry};

use super::suggest;

/// Width of the command-name column in the full listing.
const NAME_COLUMN: usize = 24;

/// A fixed global option row.
struct GlobalOption {
    flag: &'static str,
    description: &'static str,
}

const GLOBAL_OPTIONS: &[GlobalOption] = &[
    GlobalOption {
        flag: "-h, --help",
        description: "Show this listing, or detailed help for one command.",
    },
    GlobalOption {
        flag: "-j, --json [json|path]",
        description:
            "Import arguments from inline JSON or a .json file (alias: -d, --data); bare, serialize results to JSON.",
    },
    GlobalOption {
        flag: "-v, --version",
        description: "Print the version and exit.",
    },
];

/// Render the full command listing.
pub fn render_listing(registry: &Registry, meta: &CliMetadata) -> String {
    let mut out = String::new();
    let name = meta.display_name();

    if registry.is_grouped() {
        let _ = writeln!(out, "Usage: {} GROUP COMMAND [ARGS...] [OPTIONS]", name);
    } else {
        let _ = writeln!(out, "Usage: {} COMMAND [ARGS...] [OPTIONS]", name);
    }
    if let Some(description) = &meta.description {
        let _ = writeln!(out, "\n{} - {}", name, description);
    }

    let _ = writeln!(out, "\nOptions:");
    for option in GLOBAL_OPTIONS {
        let _ = writeln!(out, "  {:<NAME_COLUMN$}{}", option.flag, option.description);
    }

    let _ = writeln!(out, "\nCommands:");
    for (group, commands) in registry.groups() {
        if !group.is_empty() {
            let _ = writeln!(out, "\n[{}]", group);
        }
        for command in commands.values() {
            let _ = writeln!(
                out,
                "  {:<NAME_COLUMN$}{}",
                fit_name(&command.name),
                command.description
            );
        }
    }

    out
}

/// Render the listing plus a fuzzy suggestion for an unresolved token.
pub fn render_not_found(registry: &Registry, meta: &CliMetadata, token: &str) -> String {
    let mut out = render_listing(registry, meta);
    if let Some(hit) = suggest(registry, token) {
        let target = if registry.is_grouped() {
            format!("{} {}", hit.group, hit.name)
        } else {
            hit.name
        };
        let _ = writeln!(out, "\ndid you mean '{}'?", target);
    }
    out
}

/// Render detailed help for one command.
///
/// Parameters named in `ignore` (internal-arg names plus the literal
/// container names `opts` and `options`) are omitted from the usage line.
pub fn render_detail(
    group: &str,
    command: &CommandDescriptor,
    meta: &CliMetadata,
    ignore: &BTreeSet<String>,
) -> String {
    let mut out = String::new();
    let mut usage = format!("Usage: {}", meta.display_name());
    if !group.is_empty() {
        usage.push(' ');
        usage.push_str(group);
    }
    usage.push(' ');
    usage.push_str(&command.name);

    for param in &command.params {
        if ignore.contains(&param.name) {
            continue;
        }
        usage.push(' ');
        usage.push_str(&usage_token(param));
    }
    let _ = writeln!(out, "{}", usage);

    if !command.description.is_empty() {
        let _ = writeln!(out, "\n{}", command.description);
    }
    out
}

/// One usage token: `--flag[=suffix]` for option-container parameters,
/// `<name[=suffix]>` for positionals.
fn usage_token(param: &ParameterSpec) -> String {
    let name = param.stripped_name();
    match (param.is_option(), suffix(param)) {
        (true, Some(sfx)) => format!("--{}={}", name, sfx),
        (true, None) => format!("--{}", name),
        (false, Some(sfx)) => format!("<{}={}>", name, sfx),
        (false, None) => format!("<{}>", name),
    }
}

/// Bracketed suffix: the default value if present, else the type tags
/// joined by `|`; suppressed when the sole tag is `string` or `*`.
fn suffix(param: &ParameterSpec) -> Option<String> {
    if let Some(default) = &param.default {
        return Some(render_value(default));
    }
    match param.types.as_slice() {
        [] => None,
        [only] if only == "string" || only == "*" => None,
        tags => Some(tags.join("|")),
    }
}

/// Render a default value without quoting plain strings.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Fit a command name into the listing column.
fn fit_name(name: &str) -> String {
    if name.chars().count() > NAME_COLUMN {
        let kept: String = name.chars().take(NAME_COLUMN - 3).collect();
        format!("{}...", kept)
    } else {
        name.to_string()
    }
}
