use thiserror::Error;

/// Errors raised while assembling the layered helm configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `helm.toml` (or a `HELM__` environment override) failed to load or
    /// parse.
    #[error("Failed to assemble configuration from helm.toml and HELM__ overrides: {0}")]
    LoadError(#[from] config::ConfigError),

    /// The values deserialized cleanly but would misbehave at runtime.
    #[error("Rejected configuration value: {0}")]
    ValidationError(String),
}
