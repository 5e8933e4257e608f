// Abstractions over versioned dependencies and the manifests that pin them

use std::collections::HashMap;
use std::fmt::Display;
use std::io::{BufRead, Write};

use crate::error::Result;

/// A single dependency whose version can be bumped
///
/// `Display` renders the canonical, fully versioned form.
pub trait Versioned: Display {
    /// Identity of the dependency without any version information
    fn name(&self) -> &str;

    /// Replace the version, leaving the identity untouched
    fn set_version(&mut self, version: &str);
}

/// A manifest (Dockerfile, lock file, ...) of strictly versioned packages
pub trait VersionedPackages {
    type Artifact: Versioned;

    /// Read and index the manifest
    fn load<R: BufRead>(&mut self, reader: R) -> Result<()>;

    /// Emit the manifest, including any applied version changes
    fn write<W: Write>(&self, writer: W) -> Result<()>;

    /// Artifacts found while loading, keyed by name
    fn artifacts(&self) -> &HashMap<String, Self::Artifact>;

    /// Change the version of a named artifact and rewrite the manifest
    fn set_version(&mut self, name: &str, version: &str) -> Result<()>;
}
