//! Registry configuration
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`DEIN_CLASS_WITHOUT_CONSTRUCTOR`)
//! 2. YAML document ([`DeinConfig::from_yaml_str`])
//! 3. Defaults

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DeinError, Result};

/// How signature inference treats `class` sources that declare no constructor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassWithoutConstructor {
    /// Fail registration with a signature parse error
    #[default]
    Reject,
    /// Treat the class as having no dependencies
    ZeroDependencies,
}

impl FromStr for ClassWithoutConstructor {
    type Err = DeinError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "zero-dependencies" | "zero_dependencies" => Ok(Self::ZeroDependencies),
            other => Err(DeinError::Config {
                reason: format!("unknown class_without_constructor policy '{}'", other),
            }),
        }
    }
}

impl fmt::Display for ClassWithoutConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::ZeroDependencies => write!(f, "zero-dependencies"),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeinConfig {
    /// Policy for `class` sources without a `constructor`
    #[serde(default)]
    pub class_without_constructor: ClassWithoutConstructor,
}

impl DeinConfig {
    pub const ENV_CLASS_WITHOUT_CONSTRUCTOR: &'static str = "DEIN_CLASS_WITHOUT_CONSTRUCTOR";

    /// Defaults merged with the process environment
    pub fn load() -> Result<Self> {
        Self::default().with_env()
    }

    /// Parse a YAML document
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| DeinError::Config {
            reason: format!("Failed to parse config: {}", e),
        })
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over values already set.
    pub fn with_env(self) -> Result<Self> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Same as [`with_env`](Self::with_env) with a custom variable lookup
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(Self::ENV_CLASS_WITHOUT_CONSTRUCTOR) {
            if !value.is_empty() {
                self.class_without_constructor = value.parse()?;
            }
        }
        Ok(self)
    }
}
