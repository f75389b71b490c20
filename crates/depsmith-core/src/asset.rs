//! Files contributed by packages and the logical keys they conflict on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::framework::FrameworkMoniker;

/// What a contributed file is used for at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    #[serde(alias = "runtime-assembly")]
    Runtime,
    #[serde(alias = "native-asset")]
    Native,
    #[serde(alias = "resource-assembly")]
    Resource,
    Other,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::Native => "native",
            Self::Resource => "resource",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Controls how logical keys are normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyPolicy {
    /// Compare native and other asset paths case-sensitively.
    pub native_case_sensitive: bool,
}

/// The identity two files must share to be in conflict.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetKey {
    pub kind: AssetKind,
    pub key: String,
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.key)
    }
}

/// A single file a package contributes to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributedFile {
    /// Name of the owning package.
    pub package: String,
    pub kind: AssetKind,
    /// Path inside the package, always `/`-separated.
    pub path: String,
    /// The framework folder the file was selected from, if any.
    pub framework: Option<FrameworkMoniker>,
    /// Output-relative location; defaults to `path`.
    pub destination: Option<String>,
    /// Culture of a resource assembly, e.g. `de`.
    pub culture: Option<String>,
}

impl ContributedFile {
    pub fn new(package: impl Into<String>, kind: AssetKind, path: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            kind,
            path: normalize_separators(&path.into()),
            framework: None,
            destination: None,
            culture: None,
        }
    }

    pub fn with_framework(mut self, framework: FrameworkMoniker) -> Self {
        self.framework = Some(framework);
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(normalize_separators(&destination.into()));
        self
    }

    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = Some(culture.into());
        self
    }

    pub fn output_path(&self) -> &str {
        self.destination.as_deref().unwrap_or(&self.path)
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// File name without its final extension: `Foo.resources.dll` → `Foo.resources`.
    pub fn simple_name(&self) -> &str {
        let name = self.file_name();
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => name,
        }
    }

    pub fn logical_key(&self, policy: KeyPolicy) -> AssetKey {
        let key = match self.kind {
            AssetKind::Runtime => self.simple_name().to_lowercase(),
            AssetKind::Resource => {
                let culture = self.culture.as_deref().unwrap_or("");
                format!("{culture}/{}", self.simple_name()).to_lowercase()
            }
            AssetKind::Native | AssetKind::Other => {
                let path = self.output_path();
                if policy.native_case_sensitive {
                    path.to_string()
                } else {
                    path.to_lowercase()
                }
            }
        };
        AssetKey {
            kind: self.kind,
            key,
        }
    }
}

fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}
