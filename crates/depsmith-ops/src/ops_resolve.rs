//! Operation: resolve file conflicts for every target and write the deps file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use depsmith_resolver::resolver::{self, CancelToken};
use depsmith_resolver::validate::Validator;
use depsmith_util::errors::DepsmithError;
use depsmith_util::progress;

use crate::deps_file::{deps_file_name, DepsFile};

/// Options for `depsmith resolve`.
#[derive(Debug, Default)]
pub struct ResolveOptions {
    /// Explicit `depsmith.toml`; discovered next to the assets file otherwise.
    pub config: Option<PathBuf>,
    /// Directory for the deps file. Defaults to the assets file's directory.
    pub output: Option<PathBuf>,
    /// Keep every contributed file, duplicates included.
    pub no_conflict_handling: bool,
}

/// What a successful resolve produced.
#[derive(Debug)]
pub struct ResolveSummary {
    pub deps_file: PathBuf,
    pub targets: usize,
    pub excluded: usize,
}

/// Resolve, validate, and write `<project>.deps.json`.
pub async fn resolve(assets: &Path, opts: &ResolveOptions) -> miette::Result<ResolveSummary> {
    let (graph, mut options) = crate::load_project(assets, opts.config.as_deref())?;
    if opts.no_conflict_handling {
        options.handle_conflicts = false;
    }

    progress::status(
        "Resolving",
        &format!("{} ({} target(s))", graph.project(), graph.len()),
    );

    let graph = Arc::new(graph);
    let options = Arc::new(options);
    let cancel = CancelToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                progress::status_warn("Interrupted", "waiting for running targets");
                cancel.cancel();
            }
        })
    };
    let outcome = resolver::resolve_all(Arc::clone(&graph), Arc::clone(&options), cancel).await;
    interrupt.abort();

    for success in outcome.successes() {
        let report = success.resolution.report();
        if !report.is_empty() {
            print!("{report}");
        }
    }

    let cancelled = outcome.cancelled();
    if !cancelled.is_empty() {
        return Err(DepsmithError::Generic {
            message: format!("resolution cancelled, {} target(s) not resolved", cancelled.len()),
        }
        .into());
    }

    let failures: Vec<_> = outcome.failures().collect();
    if !failures.is_empty() {
        for (target, err) in &failures {
            progress::status_error("error", &format!("{target}: {err}"));
        }
        return Err(DepsmithError::Generic {
            message: format!(
                "{} of {} target(s) failed to resolve",
                failures.len(),
                outcome.results.len()
            ),
        }
        .into());
    }

    let validation = Validator::new(&graph, &options).validate(outcome.manifests());
    for violation in validation.violations() {
        progress::status_warn("Violation", &violation.to_string());
    }

    let out_dir = opts
        .output
        .clone()
        .unwrap_or_else(|| crate::assets_dir(assets));
    let deps_path = out_dir.join(deps_file_name(graph.project()));
    DepsFile::from_manifests(graph.project(), outcome.manifests()).write_to(&deps_path)?;
    tracing::info!(path = %deps_path.display(), "wrote deps file");

    if !validation.is_valid() {
        return Err(DepsmithError::Validation {
            count: validation.len(),
        }
        .into());
    }

    let excluded = outcome
        .successes()
        .map(|s| s.resolution.excluded_count())
        .sum();
    progress::status(
        "Finished",
        &format!("{} ({excluded} file(s) trimmed)", deps_path.display()),
    );

    Ok(ResolveSummary {
        deps_file: deps_path,
        targets: outcome.results.len(),
        excluded,
    })
}
