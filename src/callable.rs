//! Callables wrapped by modules
//!
//! A [`Callable`] is either a factory (invoked, its asynchronous result
//! awaited) or a constructor (invoked synchronously to build a fresh
//! instance). Both receive their resolved dependencies positionally as
//! [`Args`], in the order of the module's dependency list.
//!
//! Dependency names come from [`Callable::inject`] or, as a compatibility
//! shim, from source text attached with [`Callable::with_source`].

use std::any::{type_name, Any};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::{DeinError, Result};

/// Type-erased resolved value
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Error type accepted from user callables
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type FactoryFn = dyn Fn(Args) -> BoxFuture<'static, Result<Instance>> + Send + Sync;
type ConstructorFn = dyn Fn(Args) -> Result<Instance> + Send + Sync;

/// Invocation semantics of a callable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallableKind {
    /// Plain call; an asynchronous result is awaited
    Factory,
    /// Synchronous construction of a new instance
    Constructor,
}

impl fmt::Display for CallableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Factory => write!(f, "factory"),
            Self::Constructor => write!(f, "constructor"),
        }
    }
}

#[derive(Clone)]
enum Body {
    Factory(Arc<FactoryFn>),
    Constructor(Arc<ConstructorFn>),
}

/// A factory or constructor plus the metadata used to infer its dependencies
#[derive(Clone)]
pub struct Callable {
    body: Body,
    source: Option<Arc<str>>,
    inject: Option<Arc<[String]>>,
}

impl Callable {
    fn from_body(body: Body) -> Self {
        Self {
            body,
            source: None,
            inject: None,
        }
    }

    /// Asynchronous factory; the returned future is awaited before the
    /// resolution settles
    pub fn factory<F, Fut, T, E>(f: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Any + Send + Sync,
        E: Into<BoxError> + 'static,
    {
        let call = move |args: Args| -> BoxFuture<'static, Result<Instance>> {
            let pending = f(args);
            async move {
                pending
                    .await
                    .map(into_instance)
                    .map_err(DeinError::from_callable)
            }
            .boxed()
        };
        Self::from_body(Body::Factory(Arc::new(call)))
    }

    /// Synchronous factory
    ///
    /// The returned value is wrapped into a fresh [`Instance`]; returning an
    /// `Instance` taken from [`Args`] would nest it. Use
    /// [`from_instance_fn`](Self::from_instance_fn) to hand one through.
    pub fn from_fn<F, T, E>(f: F) -> Self
    where
        F: Fn(Args) -> std::result::Result<T, E> + Send + Sync + 'static,
        T: Any + Send + Sync,
        E: Into<BoxError>,
    {
        let call = move |args: Args| -> BoxFuture<'static, Result<Instance>> {
            let result = f(args).map(into_instance).map_err(DeinError::from_callable);
            future::ready(result).boxed()
        };
        Self::from_body(Body::Factory(Arc::new(call)))
    }

    /// Synchronous factory returning an already type-erased value, stored as-is
    pub fn from_instance_fn<F, E>(f: F) -> Self
    where
        F: Fn(Args) -> std::result::Result<Instance, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let call = move |args: Args| -> BoxFuture<'static, Result<Instance>> {
            future::ready(f(args).map_err(DeinError::from_callable)).boxed()
        };
        Self::from_body(Body::Factory(Arc::new(call)))
    }

    /// Constructor: builds a new instance from its positional arguments
    pub fn constructor<F, T, E>(f: F) -> Self
    where
        F: Fn(Args) -> std::result::Result<T, E> + Send + Sync + 'static,
        T: Any + Send + Sync,
        E: Into<BoxError>,
    {
        let construct = move |args: Args| -> Result<Instance> {
            f(args).map(into_instance).map_err(DeinError::from_callable)
        };
        Self::from_body(Body::Constructor(Arc::new(construct)))
    }

    /// Zero-argument factory that always returns the same value
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        let instance = into_instance(value);
        let call = move |_: Args| -> BoxFuture<'static, Result<Instance>> {
            future::ready(Ok(Arc::clone(&instance))).boxed()
        };
        Self::from_body(Body::Factory(Arc::new(call))).inject(Vec::<String>::new())
    }

    /// Zero-argument factory settling with the output of `pending`
    ///
    /// The future is driven at most once, however many registries share
    /// the callable; every invocation observes the same outcome.
    pub fn future<Fut, T, E>(pending: Fut) -> Self
    where
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Any + Send + Sync,
        E: Into<BoxError> + 'static,
    {
        let shared = async move {
            pending
                .await
                .map(into_instance)
                .map_err(DeinError::from_callable)
        }
        .boxed()
        .shared();
        let call = move |_: Args| -> BoxFuture<'static, Result<Instance>> { shared.clone().boxed() };
        Self::from_body(Body::Factory(Arc::new(call))).inject(Vec::<String>::new())
    }

    /// Attach source text for textual dependency inference
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Declare dependency names explicitly; textual inference is skipped
    pub fn inject<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inject = Some(names.into_iter().map(Into::<String>::into).collect());
        self
    }

    pub fn kind(&self) -> CallableKind {
        match self.body {
            Body::Factory(_) => CallableKind::Factory,
            Body::Constructor(_) => CallableKind::Constructor,
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.kind() == CallableKind::Constructor
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Explicit dependency names, if declared
    pub fn injected(&self) -> Option<&[String]> {
        self.inject.as_deref()
    }

    /// Run the callable with already resolved arguments
    pub(crate) async fn invoke(&self, args: Args) -> Result<Instance> {
        match &self.body {
            Body::Constructor(construct) => construct(args),
            Body::Factory(call) => call(args).await,
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("kind", &self.kind())
            .field("source", &self.source)
            .field("inject", &self.inject)
            .finish()
    }
}

fn into_instance<T: Any + Send + Sync>(value: T) -> Instance {
    Arc::new(value)
}

/// Downcast a resolved instance, naming the dependency on failure
pub fn downcast<T: Any + Send + Sync>(name: &str, instance: Instance) -> Result<Arc<T>> {
    instance.downcast::<T>().map_err(|_| DeinError::TypeMismatch {
        name: name.to_string(),
        expected: type_name::<T>(),
    })
}

/// Resolved dependencies handed to a callable, in declaration order
#[derive(Clone)]
pub struct Args {
    names: Arc<[String]>,
    values: Vec<Instance>,
}

impl Args {
    pub(crate) fn new(names: Arc<[String]>, values: Vec<Instance>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dependency names, parallel to the values
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Untyped value at `index`
    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.values.get(index)
    }

    /// Typed value at `index`
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        let instance = self
            .values
            .get(index)
            .ok_or_else(|| DeinError::MissingArgument {
                argument: format!("#{}", index),
            })?;
        let name = self.names.get(index).map(String::as_str).unwrap_or_default();
        downcast(name, Arc::clone(instance))
    }

    /// Typed value of the dependency called `name`
    pub fn named<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| DeinError::MissingArgument {
                argument: name.to_string(),
            })?;
        self.get(index)
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args").field("names", &self.names).finish()
    }
}
