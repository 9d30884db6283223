//! Error types for configuration loading.

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// One or more required environment variables are unset or blank.
    #[error("missing required configuration: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    /// A variable is present but its value cannot be used.
    #[error("invalid value for {name}: {reason}")]
    InvalidValue {
        /// The environment variable name.
        name: String,
        /// What was expected.
        reason: String,
    },
}

/// Convenience result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
