//! Drives resolution across every target of a graph, sequentially or in parallel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use depsmith_core::config::ResolverOptions;
use depsmith_core::graph::{Graph, TargetGraph};
use depsmith_core::target::Target;
use depsmith_util::errors::DepsmithError;
use tokio::task::JoinSet;

use crate::conflict::{resolve_target, TargetResolution};
use crate::manifest::{build_manifest, Manifest};

/// Shared flag checked before each target starts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A successfully resolved target.
#[derive(Debug, Clone)]
pub struct TargetOutcome {
    pub resolution: TargetResolution,
    pub manifest: Manifest,
}

/// Per-target results of a batch, in target order.
#[derive(Debug, Default)]
pub struct Outcome {
    pub results: Vec<(Target, Result<TargetOutcome, DepsmithError>)>,
}

impl Outcome {
    pub fn successes(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.results.iter().filter_map(|(_, r)| r.as_ref().ok())
    }

    pub fn manifests(&self) -> impl Iterator<Item = &Manifest> {
        self.successes().map(|o| &o.manifest)
    }

    /// Targets that failed for a reason other than cancellation.
    pub fn failures(&self) -> impl Iterator<Item = (&Target, &DepsmithError)> {
        self.results.iter().filter_map(|(t, r)| match r {
            Err(DepsmithError::Cancelled { .. }) | Ok(_) => None,
            Err(e) => Some((t, e)),
        })
    }

    pub fn cancelled(&self) -> Vec<&Target> {
        self.results
            .iter()
            .filter(|(_, r)| matches!(r, Err(DepsmithError::Cancelled { .. })))
            .map(|(t, _)| t)
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(|(_, r)| r.is_ok())
    }

    /// Every manifest, or the first error in target order.
    pub fn into_manifests(self) -> Result<Vec<Manifest>, DepsmithError> {
        self.results
            .into_iter()
            .map(|(_, r)| r.map(|o| o.manifest))
            .collect()
    }
}

/// Resolve a single target and build its manifest.
pub fn resolve_one(
    graph: &TargetGraph,
    options: &ResolverOptions,
) -> Result<TargetOutcome, DepsmithError> {
    let resolution = resolve_target(graph, options)?;
    let manifest = build_manifest(graph, &resolution);
    Ok(TargetOutcome {
        resolution,
        manifest,
    })
}

fn run_target(
    graph: &Graph,
    target: &Target,
    options: &ResolverOptions,
    cancel: &CancelToken,
) -> Result<TargetOutcome, DepsmithError> {
    if cancel.is_cancelled() {
        tracing::debug!(target_id = %target, "skipping cancelled target");
        return Err(DepsmithError::Cancelled {
            target: target.to_string(),
        });
    }
    let result = graph
        .target_graph(target)
        .and_then(|tg| resolve_one(tg, options));
    if let Err(e) = &result {
        tracing::warn!(target_id = %target, error = %e, "target failed");
    }
    result
}

/// Resolve every target on the current thread.
pub fn resolve_graph(graph: &Graph, options: &ResolverOptions, cancel: &CancelToken) -> Outcome {
    let results = graph
        .targets()
        .map(|target| (target.clone(), run_target(graph, target, options, cancel)))
        .collect();
    Outcome { results }
}

/// Resolve every target, one blocking task per target when `options.parallel`
/// is set and a single blocking task otherwise. Targets that already started
/// always run to completion.
pub async fn resolve_all(
    graph: Arc<Graph>,
    options: Arc<ResolverOptions>,
    cancel: CancelToken,
) -> Outcome {
    if !options.parallel {
        let task = {
            let graph = Arc::clone(&graph);
            tokio::task::spawn_blocking(move || resolve_graph(&graph, &options, &cancel))
        };
        return match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "resolution task did not complete");
                Outcome {
                    results: graph.targets().map(|t| (t.clone(), Err(panicked(t)))).collect(),
                }
            }
        };
    }

    let mut join_set = JoinSet::new();
    for target in graph.targets().cloned() {
        let graph = Arc::clone(&graph);
        let options = Arc::clone(&options);
        let cancel = cancel.clone();
        join_set.spawn_blocking(move || {
            let result = run_target(&graph, &target, &options, &cancel);
            (target, result)
        });
    }

    let mut results = Vec::with_capacity(graph.len());
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(pair) => results.push(pair),
            Err(e) => tracing::error!(error = %e, "resolution task did not complete"),
        }
    }

    // A task that panicked leaves no result behind; report it against its target.
    for target in graph.targets() {
        if !results.iter().any(|(t, _)| t == target) {
            results.push((target.clone(), Err(panicked(target))));
        }
    }
    results.sort_by(|(a, _), (b, _)| a.cmp(b));

    Outcome { results }
}

fn panicked(target: &Target) -> DepsmithError {
    DepsmithError::Generic {
        message: format!("resolution of target {target} panicked"),
    }
}
