//! dein - asynchronous dependency-injection resolution engine
//!
//! Named modules (factories or constructors plus the names of what they
//! need) are collected into an immutable [`Registry`]. Resolving a name
//! walks the dependency graph, memoizes each module per registry instance
//! and reports cycles with the exact chain.
//!
//! ```text
//! Registry::new()
//!     .register_value("hello", "world")        ─┐
//!     .register("suffix", …)?                   ├─ each call → new Registry
//!     .register("say_hello", …)?               ─┘
//!     .resolve("say_hello").await?             → resolver walks hello, suffix
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`callable`] | `Callable` (factory / constructor), `Args`, `Instance` |
//! | [`signature`] | Dependency names from `inject` lists or source text |
//! | [`registry`] | Immutable `Registry`, `RegistryBuilder`, `Module` |
//! | [`resolver`] | Graph walk, per-registry cache, cycle detection |
//! | [`config`] | Inference policy from YAML / environment |
//! | [`error`] | Error types with fix suggestions |

use std::collections::HashMap;
use std::hash::Hash;

pub mod callable;
pub mod config;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod signature;

pub use callable::{downcast, Args, BoxError, Callable, CallableKind, Instance};
pub use config::{ClassWithoutConstructor, DeinConfig};
pub use error::{DeinError, FixSuggestion, Result};
pub use registry::{Module, Registry, RegistryBuilder};
pub use signature::{infer_parameters, SignatureInferer, SignatureShape};

/// Collect `(name, value)` pairs into a map; later pairs win
pub fn to_mapping<K, V, I>(pairs: I) -> HashMap<K, V>
where
    K: Eq + Hash,
    I: IntoIterator<Item = (K, V)>,
{
    pairs.into_iter().collect()
}
