//! Error types for the placement subsystem.
//!
//! The fallible surface here is deliberately small. Constraint relations
//! return data, never errors; malformed policy behavior is a programmer
//! defect asserted in debug builds rather than recovered from. What remains
//! fallible is decoding constraint data received from a peer and parsing
//! configuration.

use crate::config::ConfigError;
use crate::wire::WireError;

/// Convenience alias for results in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error for the placement subsystem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Constraint data from a peer failed to decode.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// Configuration failed to parse.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Coarse classification for callers that branch on error source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Inter-node decoding.
    Wire,
    /// Local configuration.
    Config,
}

impl Error {
    /// Returns the error's category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Wire(_) => ErrorCategory::Wire,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_and_conversions() {
        let wire: Error = WireError::Truncated { needed: 4 }.into();
        assert_eq!(wire.category(), ErrorCategory::Wire);
        assert!(wire.to_string().contains("truncated"));

        let config: Error = ConfigError::InvalidEnvValue {
            variable: "PLACER_PROFILE_CALLS",
            value: "maybe".into(),
            expected: "a boolean",
        }
        .into();
        assert_eq!(config.category(), ErrorCategory::Config);
    }
}
