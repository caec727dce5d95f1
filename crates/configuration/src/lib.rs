use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{ComposerSettings, Config, FeedSettings, GatewaySettings};

/// Loads the application configuration from the `helm.toml` file.
///
/// This function is the primary entry point for this crate. It reads the configuration file,
/// deserializes it into our strongly-typed `Config` struct, and returns it.
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        // Tells the builder to look for a file named `helm.toml`
        .add_source(config::File::with_name("helm"))
        // Environment variables override the file, e.g. HELM__GATEWAY__BASE_URL.
        .add_source(
            config::Environment::with_prefix("HELM")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

/// Rejects configurations that would misbehave at runtime rather than
/// letting them surface as odd feed or composer behaviour later.
fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.feed.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "feed.poll_interval_ms must be greater than zero".to_string(),
        ));
    }
    if config.composer.max_leverage == 0 {
        return Err(ConfigError::ValidationError(
            "composer.max_leverage must be greater than zero".to_string(),
        ));
    }
    if config.composer.default_leverage == 0
        || config.composer.default_leverage > config.composer.max_leverage
    {
        return Err(ConfigError::ValidationError(format!(
            "composer.default_leverage must be within 1..={}",
            config.composer.max_leverage
        )));
    }
    Ok(())
}
