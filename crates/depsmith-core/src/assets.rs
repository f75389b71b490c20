//! The assets file: resolution output produced by the restore step.
//!
//! This is the untyped boundary. It is parsed once here and turned into a
//! typed [`Graph`](crate::graph::Graph) by [`Graph::load`](crate::graph::Graph::load).

use std::path::Path;

use depsmith_util::errors::DepsmithError;
use serde::{Deserialize, Serialize};

use crate::asset::AssetKind;

fn default_format_version() -> u32 {
    1
}

fn default_project_version() -> String {
    "1.0.0".to_string()
}

/// Top-level assets document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsFile {
    #[serde(default = "default_format_version")]
    pub version: u32,
    pub project: ProjectSpec,
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
}

/// The consuming project and what it requested from restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub name: String,
    #[serde(default = "default_project_version")]
    pub version: String,
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub runtimes: Vec<String>,
    /// Packages the project references directly.
    #[serde(default)]
    pub references: Vec<String>,
    /// The project's own build outputs.
    #[serde(default)]
    pub files: Vec<FileSpec>,
}

/// One restored target: a framework and optional runtime identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    pub framework: String,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub packages: Vec<PackageSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub files: Vec<FileSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSpec {
    pub path: String,
    pub kind: AssetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culture: Option<String>,
}

impl AssetsFile {
    /// Load an assets file. `.toml` files are read as TOML, everything else as JSON.
    pub fn from_path(path: &Path) -> Result<Self, DepsmithError> {
        let content = std::fs::read_to_string(path).map_err(|e| DepsmithError::Assets {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::parse_toml(&content)
        } else {
            Self::parse_json(&content)
        }
    }

    pub fn parse_json(content: &str) -> Result<Self, DepsmithError> {
        serde_json::from_str(content).map_err(|e| DepsmithError::Assets {
            message: format!("Failed to parse assets JSON: {e}"),
        })
    }

    pub fn parse_toml(content: &str) -> Result<Self, DepsmithError> {
        toml::from_str(content).map_err(|e| DepsmithError::Assets {
            message: format!("Failed to parse assets TOML: {e}"),
        })
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
