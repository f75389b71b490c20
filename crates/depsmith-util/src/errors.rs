use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all depsmith operations.
#[derive(Debug, Error, Diagnostic)]
pub enum DepsmithError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unreadable `depsmith.toml`.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check depsmith.toml for syntax errors and unknown tie-break rules"))]
    Config { message: String },

    /// The assets file could not be read or parsed.
    #[error("Assets error: {message}")]
    Assets { message: String },

    /// The resolution output is structurally invalid for one target.
    #[error("Malformed graph for target {target}: {message}")]
    #[diagnostic(help("The assets file must be regenerated by the restore step"))]
    MalformedGraph { target: String, message: String },

    /// Candidates from different packages tied on every tie-break rule.
    #[error("Unresolvable conflict for `{key}` in target {target} between {}", packages.join(", "))]
    #[diagnostic(help("Add `package-name` to the tie-break order to make resolution total"))]
    UnresolvableConflict {
        target: String,
        key: String,
        packages: Vec<String>,
    },

    /// The batch was cancelled before this target started.
    #[error("Resolution cancelled before target {target} started")]
    Cancelled { target: String },

    /// The produced manifests violate one or more invariants.
    #[error("Validation failed with {count} violation(s)")]
    Validation { count: usize },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

impl DepsmithError {
    /// The target identity attached to a per-target failure, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::MalformedGraph { target, .. }
            | Self::UnresolvableConflict { target, .. }
            | Self::Cancelled { target } => Some(target),
            _ => None,
        }
    }
}
