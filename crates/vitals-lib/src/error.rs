use thiserror::Error;

/// Errors raised while turning tracker payloads into typed values.
#[derive(Error, Debug)]
pub enum VitalsError {
    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("invalid time window: {0}")]
    InvalidWindow(String),
}

/// Errors raised when loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(String),

    #[error("invalid configuration value: {0}")]
    ValidationError(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Refusals from the usage gate in front of the text-summary feature.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("password is incorrect")]
    InvalidPassword,

    #[error("session is not authenticated")]
    NotAuthenticated,

    #[error("usage limit of {max_uses} reached")]
    UsageExhausted { max_uses: u32 },
}
