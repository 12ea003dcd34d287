use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// The numeric operations themselves never fail; degenerate input yields
/// sentinel results instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
