//! Container configuration.
//!
//! This module provides [`ContainerOptions`] (override policy, depth guard,
//! metadata source and observers) and loading of the policy from environment
//! variables or, with the `config` feature, from any serde format.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::metadata::MetadataSource;
use crate::observer::{DiObserver, Observers};

/// Environment variable enabling overrides (`true`/`false`, `1`/`0`).
pub const ENV_ALLOW_OVERRIDE: &str = "DI_ALLOW_OVERRIDE";
/// Environment variable selecting the override strategy (`error`/`lastWins`).
pub const ENV_OVERRIDE_STRATEGY: &str = "DI_OVERRIDE_STRATEGY";
/// Environment variable bounding resolution depth.
pub const ENV_MAX_DEPTH: &str = "DI_MAX_DEPTH";

/// Default bound on nested resolutions.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// What happens when a key is registered twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "camelCase"))]
pub enum OverrideStrategy {
    /// Duplicate registration fails with `OverrideConflict`
    #[default]
    Error,
    /// The later registration replaces the earlier one
    LastWins,
}

impl FromStr for OverrideStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "error" => Ok(OverrideStrategy::Error),
            "lastWins" | "last_wins" | "last-wins" => Ok(OverrideStrategy::LastWins),
            other => Err(ConfigError::InvalidValue {
                name: ENV_OVERRIDE_STRATEGY,
                value: other.to_string(),
                expected: "\"error\" or \"lastWins\"",
            }),
        }
    }
}

impl fmt::Display for OverrideStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverrideStrategy::Error => "error",
            OverrideStrategy::LastWins => "lastWins",
        })
    }
}

/// Errors raised while loading options.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A setting has a value that cannot be parsed
    #[error("invalid value {value:?} for {name}: expected {expected}")]
    InvalidValue {
        /// Setting name
        name: &'static str,
        /// Raw value found
        value: String,
        /// Description of accepted values
        expected: &'static str,
    },
}

/// Container options.
///
/// Defaults: overrides disallowed, strategy [`OverrideStrategy::Error`],
/// depth bound [`DEFAULT_MAX_DEPTH`], no metadata source, no observers.
/// Scopes inherit the options of the container they were begun from.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{module, single, Container, ContainerOptions, OverrideStrategy, Resolver};
///
/// let options = ContainerOptions::new()
///     .allow_override(true)
///     .override_strategy(OverrideStrategy::LastWins);
///
/// let container = Container::with_options(options);
/// container.load(module![
///     single::<u8>().value(1),
///     single::<u8>().value(2),
/// ]).unwrap();
/// assert_eq!(*container.get::<u8>().unwrap(), 2);
/// ```
#[derive(Clone)]
pub struct ContainerOptions {
    allow_override: bool,
    override_strategy: OverrideStrategy,
    max_depth: usize,
    pub(crate) metadata: Option<Arc<dyn MetadataSource>>,
    pub(crate) observers: Observers,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            allow_override: false,
            override_strategy: OverrideStrategy::Error,
            max_depth: DEFAULT_MAX_DEPTH,
            metadata: None,
            observers: Observers::new(),
        }
    }
}

impl ContainerOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows or forbids replacing an existing registration.
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.allow_override = allow;
        self
    }

    /// Sets the override strategy.
    pub fn override_strategy(mut self, strategy: OverrideStrategy) -> Self {
        self.override_strategy = strategy;
        self
    }

    /// Bounds the number of nested resolutions.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    /// Installs a reflection metadata source for class providers without
    /// explicit dependencies.
    pub fn metadata(mut self, source: impl MetadataSource + 'static) -> Self {
        self.metadata = Some(Arc::new(source));
        self
    }

    /// Adds an observer.
    pub fn observer(mut self, observer: Arc<dyn DiObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    /// True if overrides are allowed.
    pub fn allows_override(&self) -> bool {
        self.allow_override
    }

    /// Configured strategy.
    pub fn strategy(&self) -> OverrideStrategy {
        self.override_strategy
    }

    /// Configured depth bound.
    pub fn depth_limit(&self) -> usize {
        self.max_depth
    }

    /// True when a duplicate registration replaces the existing one.
    ///
    /// Replacement requires both the flag and the `LastWins` strategy.
    pub fn permits_replacement(&self) -> bool {
        self.allow_override && self.override_strategy == OverrideStrategy::LastWins
    }

    /// Reads the override policy and depth bound from the environment.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    ///
    /// ```
    /// use ferrous_ioc::{ContainerOptions, OverrideStrategy};
    ///
    /// let options = ContainerOptions::from_lookup(|name| match name {
    ///     "DI_ALLOW_OVERRIDE" => Some("true".to_string()),
    ///     "DI_OVERRIDE_STRATEGY" => Some("lastWins".to_string()),
    ///     _ => None,
    /// }).unwrap();
    /// assert!(options.permits_replacement());
    /// assert_eq!(options.strategy(), OverrideStrategy::LastWins);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        if let Some(value) = lookup(ENV_ALLOW_OVERRIDE) {
            options.allow_override = parse_bool(ENV_ALLOW_OVERRIDE, &value)?;
        }
        if let Some(value) = lookup(ENV_OVERRIDE_STRATEGY) {
            options.override_strategy = value.parse()?;
        }
        if let Some(value) = lookup(ENV_MAX_DEPTH) {
            let depth = value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                name: ENV_MAX_DEPTH,
                value: value.clone(),
                expected: "a positive integer",
            })?;
            options = options.max_depth(depth);
        }
        Ok(options)
    }
}

impl fmt::Debug for ContainerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerOptions")
            .field("allow_override", &self.allow_override)
            .field("override_strategy", &self.override_strategy)
            .field("max_depth", &self.max_depth)
            .field("metadata", &self.metadata.is_some())
            .field("observers", &self.observers.has_observers())
            .finish()
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            expected: "a boolean",
        }),
    }
}

/// Serializable form of the override policy, e.g.
/// `{"allowOverride": true, "overrideStrategy": "lastWins"}`.
#[cfg(feature = "config")]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionsSpec {
    /// Allow replacing registrations
    pub allow_override: bool,
    /// Strategy applied to duplicates
    pub override_strategy: OverrideStrategy,
    /// Depth bound, defaulting to [`DEFAULT_MAX_DEPTH`]
    pub max_depth: Option<usize>,
}

#[cfg(feature = "config")]
impl From<OptionsSpec> for ContainerOptions {
    fn from(spec: OptionsSpec) -> Self {
        ContainerOptions::new()
            .allow_override(spec.allow_override)
            .override_strategy(spec.override_strategy)
            .max_depth(spec.max_depth.unwrap_or(DEFAULT_MAX_DEPTH))
    }
}
