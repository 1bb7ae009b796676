//! Immutable module registry
//!
//! Every registration returns a new [`Registry`]; the receiver is never
//! touched. Modules are reference counted, so a derived registry copies only
//! the name table. [`RegistryBuilder`] stages many registrations and yields a
//! single snapshot.
//!
//! Each registry value owns its own resolution cache (see
//! [`crate::resolver`]). Cloning a `Registry` hands out another handle to
//! the same instance and therefore the same cache; registering on top of it
//! starts a fresh, empty one.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::callable::{BoxError, Callable, CallableKind};
use crate::config::DeinConfig;
use crate::error::Result;
use crate::resolver::ResolutionCache;
use crate::signature::SignatureInferer;

/// A named callable plus its dependency names, in positional order
#[derive(Clone)]
pub struct Module {
    callable: Callable,
    required: Arc<[String]>,
}

impl Module {
    /// Module with an explicit dependency list
    pub fn new<I, S>(callable: Callable, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            callable,
            required: required.into_iter().map(Into::<String>::into).collect(),
        }
    }

    /// Module whose dependency list is inferred from the callable
    pub fn infer(callable: Callable, inferer: &SignatureInferer) -> Result<Self> {
        let required = inferer.infer(&callable)?;
        Ok(Self::new(callable, required))
    }

    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub(crate) fn required_shared(&self) -> Arc<[String]> {
        Arc::clone(&self.required)
    }

    pub fn kind(&self) -> CallableKind {
        self.callable.kind()
    }

    pub fn is_constructible(&self) -> bool {
        self.callable.is_constructor()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("kind", &self.kind())
            .field("required", &self.required)
            .finish()
    }
}

pub(crate) type ModuleTable = FxHashMap<Arc<str>, Arc<Module>>;

// ============================================================================
// REGISTRY
// ============================================================================

/// Immutable collection of modules, root of all resolution requests
#[derive(Clone, Default)]
pub struct Registry {
    modules: Arc<ModuleTable>,
    config: DeinConfig,
    cache: Arc<OnceCell<ResolutionCache>>,
}

impl Registry {
    /// Empty registry with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty registry with `config`
    pub fn with_config(config: DeinConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Same modules under `config`, with an empty cache
    ///
    /// Dependency lists of already registered modules are kept; `config`
    /// applies to registrations made from the returned registry on.
    pub fn reconfigure(&self, config: DeinConfig) -> Self {
        self.to_builder().config(config).build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Builder seeded with this registry's modules and configuration
    pub fn to_builder(&self) -> RegistryBuilder {
        RegistryBuilder {
            modules: (*self.modules).clone(),
            config: self.config.clone(),
        }
    }

    pub fn config(&self) -> &DeinConfig {
        &self.config
    }

    /// Register `callable` under `name`, inferring its dependencies
    ///
    /// On inference failure nothing is registered.
    pub fn register(&self, name: impl Into<String>, callable: Callable) -> Result<Self> {
        Ok(self.to_builder().register(name, callable)?.build())
    }

    /// Register several callables; the last entry wins on duplicate names
    ///
    /// All-or-nothing: one inference failure fails the whole batch.
    pub fn register_batch<I, N>(&self, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, Callable)>,
        N: Into<String>,
    {
        let mut builder = self.to_builder();
        for (name, callable) in entries {
            builder = builder.register(name, callable)?;
        }
        Ok(builder.build())
    }

    /// Register a precomputed value
    pub fn register_value<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) -> Self {
        self.to_builder().value(name, value).build()
    }

    /// Register the eventual output of `pending`
    pub fn register_future<Fut, T, E>(&self, name: impl Into<String>, pending: Fut) -> Self
    where
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Any + Send + Sync,
        E: Into<BoxError> + 'static,
    {
        self.to_builder().future(name, pending).build()
    }

    /// Register a pre-built module as-is
    pub fn register_module(&self, name: impl Into<String>, module: Module) -> Self {
        self.to_builder().module(name, module).build()
    }

    /// Dependency names `callable` would be registered with
    pub fn infer_parameters(&self, callable: &Callable) -> Result<Vec<String>> {
        SignatureInferer::new(&self.config).infer(callable)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(|k| k.as_ref()).collect();
        names.sort_unstable();
        names
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name).map(|m| m.as_ref())
    }

    /// Dependency names of `name`, if registered
    pub fn required(&self, name: &str) -> Option<&[String]> {
        self.module(name).map(Module::required)
    }

    /// Names with a pending or settled entry in this instance's cache, sorted
    pub fn cached_names(&self) -> Vec<String> {
        self.cache.get().map(ResolutionCache::names).unwrap_or_default()
    }

    pub(crate) fn modules(&self) -> &ModuleTable {
        &self.modules
    }

    /// Cache of this instance, created on first use
    pub(crate) fn cache(&self) -> &ResolutionCache {
        self.cache.get_or_init(ResolutionCache::default)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("modules", &self.names())
            .field("cached", &self.cached_names())
            .finish()
    }
}

// ============================================================================
// REGISTRY BUILDER
// ============================================================================

/// Mutable staging area producing an immutable [`Registry`]
#[derive(Default)]
pub struct RegistryBuilder {
    modules: ModuleTable,
    config: DeinConfig,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration used for inference from here on
    pub fn config(mut self, config: DeinConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a callable, inferring its dependencies
    pub fn register(self, name: impl Into<String>, callable: Callable) -> Result<Self> {
        let module = Module::infer(callable, &SignatureInferer::new(&self.config))?;
        Ok(self.module(name, module))
    }

    /// Add a precomputed value
    pub fn value<T: Any + Send + Sync>(self, name: impl Into<String>, value: T) -> Self {
        self.module(name, Module::new(Callable::value(value), Vec::<String>::new()))
    }

    /// Add the eventual output of `pending`
    pub fn future<Fut, T, E>(self, name: impl Into<String>, pending: Fut) -> Self
    where
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Any + Send + Sync,
        E: Into<BoxError> + 'static,
    {
        self.module(name, Module::new(Callable::future(pending), Vec::<String>::new()))
    }

    /// Add a pre-built module, shadowing any previous one of the same name
    pub fn module(mut self, name: impl Into<String>, module: Module) -> Self {
        let name: Arc<str> = Arc::from(name.into());
        debug!(
            name = %name,
            kind = %module.kind(),
            required = ?module.required(),
            "registered module"
        );
        self.modules.insert(name, Arc::new(module));
        self
    }

    /// Freeze into a registry with an empty cache
    pub fn build(self) -> Registry {
        Registry {
            modules: Arc::new(self.modules),
            config: self.config,
            cache: Arc::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeinError;
    use pretty_assertions::assert_eq;

    fn unit(source: &str) -> Callable {
        Callable::from_fn(|_| Ok::<_, DeinError>(())).with_source(source)
    }

    #[test]
    fn register_does_not_mutate_parent() {
        let parent = Registry::new().register("a", unit("() => 'a'")).unwrap();
        let child = parent.register("b", unit("() => 'b'")).unwrap();

        assert!(parent.contains("a"));
        assert!(!parent.contains("b"));
        assert_eq!(child.names(), ["a", "b"]);
    }

    #[test]
    fn later_registration_shadows() {
        let first = Registry::new().register("x", unit("(a) => a")).unwrap();
        let second = first.register("x", unit("(b, c) => b")).unwrap();

        assert_eq!(first.required("x").unwrap(), ["a"]);
        assert_eq!(second.required("x").unwrap(), ["b", "c"]);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn batch_last_entry_wins() {
        let registry = Registry::new()
            .register_batch([
                ("a", unit("b => b")),
                ("b", unit("() => true")),
                ("a", unit("(c) => c")),
            ])
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.required("a").unwrap(), ["c"]);
    }

    #[test]
    fn failed_registration_leaves_nothing_behind() {
        let base = Registry::new().register_value("a", 1_u8);
        let err = base
            .register_batch([("ok", unit("() => 1")), ("bad", unit("not a function"))])
            .unwrap_err();

        assert!(matches!(err, DeinError::SignatureParse { .. }));
        assert_eq!(base.names(), ["a"]);
    }

    #[test]
    fn values_have_no_dependencies() {
        let registry = Registry::new().register_value("hello", String::from("world"));
        let module = registry.module("hello").unwrap();

        assert!(module.required().is_empty());
        assert_eq!(module.kind(), CallableKind::Factory);
        assert!(!module.is_constructible());
    }

    #[test]
    fn constructors_are_constructible() {
        let ctor = Callable::constructor(|_| Ok::<_, DeinError>(()))
            .with_source("class Service { constructor(db) { this.db = db; } }");
        let registry = Registry::new().register("service", ctor).unwrap();

        assert!(registry.module("service").unwrap().is_constructible());
        assert_eq!(registry.required("service").unwrap(), ["db"]);
    }

    #[test]
    fn config_is_inherited_by_derived_registries() {
        let config = DeinConfig {
            class_without_constructor: crate::config::ClassWithoutConstructor::ZeroDependencies,
        };
        let registry = Registry::with_config(config.clone())
            .register_value("a", 1_u8)
            .register("empty", unit("class Empty {}"))
            .unwrap();

        assert_eq!(registry.config(), &config);
        assert!(registry.required("empty").unwrap().is_empty());
        assert!(Registry::new().register("empty", unit("class Empty {}")).is_err());
    }

    #[test]
    fn reconfigure_keeps_modules_and_swaps_config() {
        let strict = Registry::new()
            .register("a", unit("(b) => b"))
            .unwrap()
            .register_value("b", 1_u8);
        let lenient_config = DeinConfig {
            class_without_constructor: crate::config::ClassWithoutConstructor::ZeroDependencies,
        };
        let lenient = strict.reconfigure(lenient_config.clone());

        assert_eq!(lenient.config(), &lenient_config);
        assert_eq!(lenient.names(), ["a", "b"]);
        assert_eq!(lenient.required("a").unwrap(), ["b"]);
        assert!(lenient.cached_names().is_empty());

        assert!(strict.register("empty", unit("class Empty {}")).is_err());
        let derived = lenient.register("empty", unit("class Empty {}")).unwrap();
        assert_eq!(derived.config(), &lenient_config);
        assert!(derived.required("empty").unwrap().is_empty());
        assert_eq!(strict.config(), &DeinConfig::default());
    }

    #[test]
    fn builder_stages_into_one_snapshot() {
        let registry = Registry::builder()
            .value("first", 1_i32)
            .value("second", 2_i32)
            .register("sum", unit("function sum(first, second) {}"))
            .unwrap()
            .module("manual", Module::new(unit("ignored"), ["first"]))
            .build();

        assert_eq!(registry.names(), ["first", "manual", "second", "sum"]);
        assert_eq!(registry.required("manual").unwrap(), ["first"]);
        assert!(registry.cached_names().is_empty());
    }
}
