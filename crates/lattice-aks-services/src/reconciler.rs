//! Generic spec reconciliation
//!
//! Every service follows the same shape: ask the scope for its specs, converge
//! each one independently, and report all failures together. A failing spec
//! never stops the remaining specs from being attempted.

use std::future::Future;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::warn;

use lattice_aks_common::Error;
use lattice_aks_scope::ResourceSpec;

/// Default number of specs converged at once
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Tuning for [`reconcile_specs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Maximum specs in flight; 1 converges them sequentially.
    /// Results are always reported in scope order.
    pub concurrency: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Failures of one reconcile pass, keyed by spec and in scope order
#[derive(Debug, Default, Error)]
#[error("{} spec(s) failed to reconcile: {}", .failures.len(), summarize(.failures))]
pub struct ReconcileErrors {
    failures: Vec<(String, Error)>,
}

fn summarize(failures: &[(String, Error)]) -> String {
    failures
        .iter()
        .map(|(key, err)| format!("{}: {}", key, err))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ReconcileErrors {
    /// Record a failure for `key`
    pub fn push(&mut self, key: impl Into<String>, error: Error) {
        self.failures.push((key.into(), error));
    }

    /// Whether no spec failed
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of failed specs
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Keys of the failed specs
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|(key, _)| key.as_str())
    }

    /// Failed specs with their errors
    pub fn failures(&self) -> &[(String, Error)] {
        &self.failures
    }

    /// A pass is worth requeueing if any failure is transient
    pub fn is_retryable(&self) -> bool {
        self.failures.iter().any(|(_, err)| err.is_retryable())
    }

    /// `Ok` when nothing failed
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// A service converging one kind of cloud resource for a scope
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Ensure every desired resource exists
    async fn reconcile(&self) -> Result<(), ReconcileErrors>;

    /// Remove what this service owns
    async fn delete(&self) -> Result<(), ReconcileErrors>;
}

/// Converge each spec with `converge`, attempting all of them.
///
/// Up to `config.concurrency` specs are in flight at once. Failures are
/// collected under each spec's key in the order the specs were given.
pub async fn reconcile_specs<S, F, Fut>(
    specs: Vec<S>,
    config: &ReconcilerConfig,
    converge: F,
) -> Result<(), ReconcileErrors>
where
    S: ResourceSpec,
    F: Fn(S) -> Fut,
    Fut: Future<Output = Result<(), Error>>,
{
    let pending: Vec<_> = specs
        .into_iter()
        .map(|spec| {
            let key = spec.key();
            let fut = converge(spec);
            async move { (key, fut.await) }
        })
        .collect();

    let results: Vec<(String, Result<(), Error>)> = stream::iter(pending)
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

    let mut errors = ReconcileErrors::default();
    for (key, result) in results {
        if let Err(err) = result {
            warn!(spec = %key, error = %err, retryable = err.is_retryable(), "Spec failed to reconcile");
            errors.push(key, err);
        }
    }
    errors.into_result()
}
