//! meta
//!
//! CLI banner metadata.
//!
//! # Overview
//!
//! The dispatcher prints a name, description, and version in its help and
//! version output. Callers either construct a [`CliMetadata`] directly or
//! ask for a best-effort read of the `[package]` table of a `Cargo.toml`.
//!
//! # Design
//!
//! Metadata is an explicit value passed into the dispatcher configuration,
//! never discovered from ambient process state. A missing or unparsable
//! manifest yields empty metadata, not an error.

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Name, description, and version shown in help and version output.
///
/// All fields are optional; rendering falls back to placeholders where a
/// field is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliMetadata {
    /// CLI name, shown in the usage line.
    pub name: Option<String>,
    /// One-line description, shown under the usage line.
    pub description: Option<String>,
    /// Version string, printed by `--version`.
    pub version: Option<String>,
}

/// Subset of a Cargo manifest we care about.
#[derive(Debug, Deserialize)]
struct Manifest {
    package: Option<PackageTable>,
}

#[derive(Debug, Deserialize)]
struct PackageTable {
    name: Option<String>,
    description: Option<String>,
    version: Option<String>,
}

impl CliMetadata {
    /// Create metadata with all three fields set.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            description: Some(description.into()),
            version: Some(version.into()),
        }
    }

    /// Read metadata from `<dir>/Cargo.toml`, best-effort.
    ///
    /// An absent file, unreadable file, or malformed manifest yields
    /// `CliMetadata::default()` - all fields `None`, no error.
    ///
    /// # Example
    ///
    /// ```
    /// use docket::meta::CliMetadata;
    /// use std::path::Path;
    ///
    /// let meta = CliMetadata::from_manifest(Path::new("/nonexistent"));
    /// assert_eq!(meta.name, None);
    /// assert_eq!(meta.version, None);
    /// ```
    pub fn from_manifest(dir: &Path) -> Self {
        let path = dir.join("Cargo.toml");
        let Ok(raw) = fs::read_to_string(&path) else {
            return Self::default();
        };
        let Ok(manifest) = toml::from_str::<Manifest>(&raw) else {
            return Self::default();
        };
        match manifest.package {
            Some(pkg) => Self {
                name: pkg.name,
                description: pkg.description,
                version: pkg.version,
            },
            None => Self::default(),
        }
    }

    /// Name to display, falling back to a placeholder.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("cli")
    }
}
