//! Dispatcher configuration.
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic** — values set via builder methods
//! 2. **Environment variables** — values from `PLACER_*` env vars
//! 3. **Defaults** — [`DispatcherConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `PLACER_PROFILE_CALLS` | `bool` | `profile_calls` |
//! | `PLACER_REENTRANT` | `bool` | `reentrant_override` |

/// Environment variable enabling per-call profiling output.
pub const ENV_PROFILE_CALLS: &str = "PLACER_PROFILE_CALLS";
/// Environment variable overriding the policy's reentrance request.
pub const ENV_REENTRANT: &str = "PLACER_REENTRANT";

/// Error raised by configuration parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held an unparseable value.
    #[error("invalid value {value:?} for {variable}: expected {expected}")]
    InvalidEnvValue {
        /// The variable that failed to parse.
        variable: &'static str,
        /// The raw value found.
        value: String,
        /// What a valid value looks like.
        expected: &'static str,
    },
}

/// Tunable behavior of a [`Dispatcher`](crate::dispatch::Dispatcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DispatcherConfig {
    /// Emit per-call timing through the logging layer.
    pub profile_calls: bool,
    /// Overrides the reentrance flag of serialized policies. `None` honors
    /// the policy's own [`SyncModel`](crate::types::SyncModel).
    pub reentrant_override: Option<bool>,
}

impl DispatcherConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables per-call profiling.
    #[must_use]
    pub const fn profile_calls(mut self, enabled: bool) -> Self {
        self.profile_calls = enabled;
        self
    }

    /// Forces reentrance on or off for serialized policies.
    #[must_use]
    pub const fn reentrant(mut self, reentrant: bool) -> Self {
        self.reentrant_override = Some(reentrant);
        self
    }

    /// Applies `PLACER_*` environment overrides.
    ///
    /// Only variables present in the environment are applied; an
    /// unparseable value is an error rather than a silent default.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env(ENV_PROFILE_CALLS) {
            self.profile_calls = parse_bool(ENV_PROFILE_CALLS, &value)?;
        }
        if let Some(value) = read_env(ENV_REENTRANT) {
            self.reentrant_override = Some(parse_bool(ENV_REENTRANT, &value)?);
        }
        Ok(())
    }

    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }
}

fn read_env(variable: &str) -> Option<String> {
    std::env::var(variable).ok().filter(|v| !v.is_empty())
}

fn parse_bool(variable: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvValue {
            variable,
            value: value.to_owned(),
            expected: "a boolean (1/0, true/false, yes/no, on/off)",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::env_lock;

    #[test]
    fn builder_chain() {
        let config = DispatcherConfig::new().profile_calls(true).reentrant(false);
        assert!(config.profile_calls);
        assert_eq!(config.reentrant_override, Some(false));
    }

    #[test]
    fn env_overrides_apply() {
        let _guard = env_lock();
        std::env::set_var(ENV_PROFILE_CALLS, "yes");
        std::env::set_var(ENV_REENTRANT, "0");
        let config = DispatcherConfig::from_env().expect("valid env");
        assert!(config.profile_calls);
        assert_eq!(config.reentrant_override, Some(false));
        std::env::remove_var(ENV_PROFILE_CALLS);
        std::env::remove_var(ENV_REENTRANT);
    }

    #[test]
    fn bad_env_value_is_an_error() {
        let _guard = env_lock();
        std::env::set_var(ENV_PROFILE_CALLS, "maybe");
        let err = DispatcherConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvValue { .. }));
        std::env::remove_var(ENV_PROFILE_CALLS);
    }
}
