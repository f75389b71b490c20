//! Package version parsing and ordering, backed by semver.
//!
//! Package feeds publish versions that are not always strict semver, so
//! parsing is lenient: `1.0` is read as `1.0.0`, and a fourth numeric
//! component (`1.0.0.1`) is kept as a revision that orders after patch.
//! Build metadata never affects ordering.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid package version `{input}`: {reason}")]
pub struct VersionParseError {
    pub input: String,
    pub reason: String,
}

/// A totally ordered package version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageVersion {
    original: String,
    semver: Version,
    revision: u64,
}

impl PackageVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        let semver = Version::new(major, minor, patch);
        Self {
            original: semver.to_string(),
            semver,
            revision: 0,
        }
    }

    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let trimmed = input.trim();
        let err = |reason: &str| VersionParseError {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        if trimmed.is_empty() {
            return Err(err("empty version"));
        }

        let split = trimmed
            .find(|c: char| c == '-' || c == '+')
            .unwrap_or(trimmed.len());
        let (numbers, suffix) = trimmed.split_at(split);

        let mut parts = Vec::with_capacity(4);
        for piece in numbers.split('.') {
            let n: u64 = piece
                .parse()
                .map_err(|_| err("components must be non-negative integers"))?;
            parts.push(n);
        }
        if parts.len() > 4 {
            return Err(err("at most four numeric components are allowed"));
        }
        parts.resize(4, 0);

        let normalized = format!("{}.{}.{}{suffix}", parts[0], parts[1], parts[2]);
        let semver = Version::parse(&normalized).map_err(|e| err(&e.to_string()))?;

        Ok(Self {
            original: trimmed.to_string(),
            semver,
            revision: parts[3],
        })
    }

    pub fn major(&self) -> u64 {
        self.semver.major
    }

    pub fn minor(&self) -> u64 {
        self.semver.minor
    }

    pub fn patch(&self) -> u64 {
        self.semver.patch
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_prerelease(&self) -> bool {
        !self.semver.pre.is_empty()
    }

    /// The version exactly as it was written in the input.
    pub fn as_str(&self) -> &str {
        &self.original
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (
            self.semver.major,
            self.semver.minor,
            self.semver.patch,
            self.revision,
        )
            .cmp(&(
                other.semver.major,
                other.semver.minor,
                other.semver.patch,
                other.revision,
            ))
            .then_with(|| self.semver.pre.cmp(&other.semver.pre))
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

impl Hash for PackageVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.semver.major.hash(state);
        self.semver.minor.hash(state);
        self.semver.patch.hash(state);
        self.revision.hash(state);
        self.semver.pre.as_str().hash(state);
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl FromStr for PackageVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PackageVersion {
    type Error = VersionParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PackageVersion> for String {
    fn from(v: PackageVersion) -> Self {
        v.original
    }
}
