//! Container configuration.
//!
//! Settings can be built in code or read from the environment:
//!
//! | Variable               | Values                 | Default   |
//! |------------------------|------------------------|-----------|
//! | `ROSTER_DI_MAX_DEPTH`  | positive integer       | `1024`    |
//! | `ROSTER_DI_DUPLICATES` | `replace` \| `reject`  | `replace` |

use std::env;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::internal::circular::MAX_DEPTH;

pub const MAX_DEPTH_VAR: &str = "ROSTER_DI_MAX_DEPTH";
pub const DUPLICATES_VAR: &str = "ROSTER_DI_DUPLICATES";

/// What `register*` does when the name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DuplicatePolicy {
    /// Last write wins; a cached singleton of the old registration is evicted
    #[default]
    Replace,
    /// Fail with `AlreadyRegistered`; use `replace_service` to override
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(DuplicatePolicy::Replace),
            "reject" => Ok(DuplicatePolicy::Reject),
            _ => Err(ConfigError::invalid(DUPLICATES_VAR, s)),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Replace => f.write_str("replace"),
            DuplicatePolicy::Reject => f.write_str("reject"),
        }
    }
}

/// Invalid configuration input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {key}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str) -> Self {
        Self { key, value: value.to_string() }
    }
}

/// Settings for a [`Container`](crate::Container)
///
/// # Examples
///
/// ```
/// use roster_di::{Container, ContainerConfig, DiError, DuplicatePolicy, Implementation};
///
/// let config = ContainerConfig::default().duplicate_policy(DuplicatePolicy::Reject);
/// let container = Container::with_config(config);
///
/// container.register_singleton("config", Implementation::value(1u8), &[]).unwrap();
/// let again = container.register_singleton("config", Implementation::value(2u8), &[]);
/// assert_eq!(again, Err(DiError::AlreadyRegistered("config".into())));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ContainerConfig {
    /// Longest dependency chain a single resolution may walk
    pub max_depth: usize,
    pub duplicates: DuplicatePolicy,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            duplicates: DuplicatePolicy::Replace,
        }
    }
}

impl ContainerConfig {
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Reads overrides from the process environment.
    ///
    /// Unset variables keep their defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(MAX_DEPTH_VAR) {
            config.max_depth = match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => depth,
                _ => return Err(ConfigError::invalid(MAX_DEPTH_VAR, &raw)),
            };
        }
        if let Some(raw) = lookup(DUPLICATES_VAR) {
            config.duplicates = raw.parse()?;
        }
        Ok(config)
    }
}
