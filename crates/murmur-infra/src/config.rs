//! Runtime configuration loading.
//!
//! Reads `RuntimeConfig` from an optional TOML file. A missing or malformed
//! file yields the defaults.

use std::path::Path;

use murmur_types::config::RuntimeConfig;

/// Load runtime tunables from `path`, or the defaults when no path is given.
pub async fn load_runtime_config(path: Option<&Path>) -> RuntimeConfig {
    let Some(config_path) = path else {
        tracing::debug!("No config file given, using defaults");
        return RuntimeConfig::default();
    };

    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", config_path.display());
            return RuntimeConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return RuntimeConfig::default();
        }
    };

    match toml::from_str::<RuntimeConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            RuntimeConfig::default()
        }
    }
}
