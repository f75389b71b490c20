use std::fmt;

use crate::asset::ContributedFile;
use crate::version::PackageVersion;

/// Package identity: name plus version.
///
/// Names compare case-insensitively, as package feeds treat them.
#[derive(Debug, Clone)]
pub struct PackageId {
    pub name: String,
    pub version: PackageVersion,
}

impl PackageId {
    pub fn new(name: impl Into<String>, version: PackageVersion) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Lowercased name, used as the lookup key inside a target graph.
    pub fn key(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl PartialEq for PackageId {
    fn eq(&self, other: &Self) -> bool {
        self.has_name(&other.name) && self.version == other.version
    }
}

impl Eq for PackageId {}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// Whether a graph node is the consuming project or a restored package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Project,
    Package,
}

impl PackageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Package => "package",
        }
    }
}

/// A node in a target's dependency graph together with the files it contributes.
#[derive(Debug, Clone)]
pub struct Package {
    pub id: PackageId,
    pub kind: PackageKind,
    pub dependencies: Vec<String>,
    files: Vec<ContributedFile>,
}

impl Package {
    pub fn new(
        id: PackageId,
        kind: PackageKind,
        dependencies: Vec<String>,
        files: Vec<ContributedFile>,
    ) -> Self {
        Self {
            id,
            kind,
            dependencies,
            files,
        }
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn version(&self) -> &PackageVersion {
        &self.id.version
    }

    pub fn files(&self) -> &[ContributedFile] {
        &self.files
    }

    pub fn is_project(&self) -> bool {
        self.kind == PackageKind::Project
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
