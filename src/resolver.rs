//! Asynchronous dependency resolution
//!
//! Resolution walks the module graph depth-first. For every name it:
//!
//! 1. fails with [`DeinError::Unregistered`] if the name is unknown,
//! 2. fails with [`DeinError::Circular`] if the name is already on the
//!    current chain,
//! 3. returns the cached handle if this registry instance has one,
//! 4. otherwise builds handles for all dependencies, then a handle that
//!    awaits them and invokes the callable, and publishes it with an atomic
//!    insert-if-absent.
//!
//! Handles are [`Shared`] futures, so every caller racing for a name polls
//! the same computation and the callable runs at most once per registry
//! instance. Steps 1-4 are synchronous; the whole dependency subtree is
//! wired before anything is awaited, which keeps cached handles acyclic.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use tracing::{debug, instrument, warn};

use crate::callable::{downcast, Args, Instance};
use crate::error::{DeinError, Result};
use crate::registry::Registry;
use crate::to_mapping;

/// In-flight or settled resolution, shareable between callers
pub(crate) type Pending = Shared<BoxFuture<'static, Result<Instance>>>;

// ============================================================================
// RESOLUTION CACHE
// ============================================================================

/// Per-registry memo of resolutions: name → pending-or-settled handle
#[derive(Default)]
pub(crate) struct ResolutionCache {
    entries: DashMap<Arc<str>, Pending>,
}

impl ResolutionCache {
    pub(crate) fn get(&self, name: &str) -> Option<Pending> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    /// Publish `pending` unless another handle got there first; returns the
    /// handle every caller must use
    pub(crate) fn insert_if_absent(&self, name: Arc<str>, pending: Pending) -> Pending {
        self.entries.entry(name).or_insert(pending).value().clone()
    }

    /// Cached names, sorted
    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().to_string()).collect();
        names.sort_unstable();
        names
    }
}

fn failed(err: DeinError) -> Pending {
    future::ready(Err(err)).boxed().shared()
}

// ============================================================================
// RESOLUTION
// ============================================================================

impl Registry {
    /// Resolve `name` and everything it depends on
    #[instrument(skip(self))]
    pub async fn resolve(&self, name: &str) -> Result<Instance> {
        self.resolve_module(name, &[]).await
    }

    /// Resolve `name` and downcast the value
    pub async fn resolve_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let instance = self.resolve(name).await?;
        downcast(name, instance)
    }

    /// Resolve several names concurrently into a name → value map
    ///
    /// Each name starts its own chain for cycle detection. The first failure
    /// fails the whole call.
    pub async fn resolve_all<I, S>(&self, names: I) -> Result<HashMap<String, Instance>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pending = names.into_iter().map(|name| {
            let name = name.as_ref().to_string();
            let handle = self.resolve_module(&name, &[]);
            async move { handle.await.map(|value| (name, value)) }
        });
        let resolved = future::try_join_all(pending).await?;
        Ok(to_mapping(resolved))
    }

    /// Handle for `name` on the chain `visited`
    fn resolve_module(&self, name: &str, visited: &[Arc<str>]) -> Pending {
        let Some((key, module)) = self.modules().get_key_value(name) else {
            warn!(name, "dependency is not registered");
            return failed(DeinError::Unregistered {
                name: name.to_string(),
            });
        };

        if visited.iter().any(|seen| seen.as_ref() == name) {
            let path: Vec<String> = visited
                .iter()
                .map(|seen| seen.to_string())
                .chain(std::iter::once(name.to_string()))
                .collect();
            warn!(cycle = %path.join(" -> "), "circular dependency");
            return failed(DeinError::Circular { path });
        }

        let cache = self.cache();
        if let Some(pending) = cache.get(name) {
            debug!(name, "cache hit");
            return pending;
        }

        let mut chain = visited.to_vec();
        chain.push(Arc::clone(key));
        let dependencies: Vec<Pending> = module
            .required()
            .iter()
            .map(|dependency| self.resolve_module(dependency, &chain))
            .collect();

        let module = Arc::clone(module);
        let owner = Arc::clone(key);
        let pending = async move {
            let values = future::try_join_all(dependencies).await?;
            debug!(name = %owner, kind = %module.kind(), "invoking module");

            let result = module
                .callable()
                .invoke(Args::new(module.required_shared(), values))
                .await;
            match &result {
                Ok(_) => debug!(name = %owner, "module settled"),
                Err(err) => warn!(name = %owner, error = %err, "module failed"),
            }
            result
        }
        .boxed()
        .shared();

        cache.insert_if_absent(Arc::clone(key), pending)
    }
}
