//! Error types with fix suggestions
//!
//! Every failure a resolution can end with is a [`DeinError`]. The enum is
//! `Clone` because a failed resolution stays in the cache and is handed to
//! every caller that asks for the same name afterwards.

use std::sync::Arc;

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T, E = DeinError> = std::result::Result<T, E>;

/// Error raised by a user-supplied callable, shared between all observers
pub type CallableError = Arc<dyn std::error::Error + Send + Sync>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug, Clone)]
pub enum DeinError {
    // ─────────────────────────────────────────────────────────────
    // Resolution errors
    // ─────────────────────────────────────────────────────────────
    #[error("Dependency {name} is not registered.")]
    Unregistered { name: String },

    #[error("Circular dependency with `{}` detected.", .path.join(" -> "))]
    Circular { path: Vec<String> },

    /// Anything returned by a callable, passed through untouched
    #[error(transparent)]
    Callable(CallableError),

    // ─────────────────────────────────────────────────────────────
    // Registration errors
    // ─────────────────────────────────────────────────────────────
    #[error("Could not parse signature ({reason}): {text}")]
    SignatureParse { reason: String, text: String },

    // ─────────────────────────────────────────────────────────────
    // Argument access errors
    // ─────────────────────────────────────────────────────────────
    #[error("Dependency {name} is not of type {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("Argument {argument} was not provided")]
    MissingArgument { argument: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl DeinError {
    pub(crate) fn signature(reason: impl Into<String>, text: &str) -> Self {
        Self::SignatureParse {
            reason: reason.into(),
            text: text.to_string(),
        }
    }

    /// Wrap a callable's own error.
    ///
    /// A `DeinError` raised inside a callable (for example by
    /// [`Args::get`](crate::Args::get)) is returned as-is instead of nested.
    pub fn from_callable(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        match err.into().downcast::<DeinError>() {
            Ok(dein) => *dein,
            Err(other) => Self::Callable(Arc::from(other)),
        }
    }

    /// Cycle chain as `a -> b -> a`, if this is a circular dependency error
    pub fn cycle_path(&self) -> Option<String> {
        match self {
            Self::Circular { path } => Some(path.join(" -> ")),
            _ => None,
        }
    }
}

impl FixSuggestion for DeinError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            DeinError::Unregistered { .. } => {
                Some("Register the dependency (register, register_value or register_batch) before resolving")
            }
            DeinError::Circular { .. } => {
                Some("Break the cycle: one of the modules in the chain must not depend on the others")
            }
            DeinError::Callable(_) => None,
            DeinError::SignatureParse { .. } => {
                Some("Declare dependency names explicitly with Callable::inject")
            }
            DeinError::TypeMismatch { .. } => {
                Some("Check the type the dependency's callable returns")
            }
            DeinError::MissingArgument { .. } => {
                Some("Declare the argument in the module's dependency list")
            }
            DeinError::Config { .. } => {
                Some("Use 'reject' or 'zero-dependencies' for class_without_constructor")
            }
        }
    }
}
