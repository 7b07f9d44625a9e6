//! Global configuration loader for Al-Bayan.
//!
//! Reads `config.toml` from the data directory (`~/.albayan/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use albayan_types::config::GlobalConfig;

/// Smallest usable history window. Zero would send questions with no context.
const MIN_HISTORY_WINDOW: usize = 1;

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - Otherwise returns the parsed config with out-of-range values clamped.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => normalize(config),
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

fn normalize(mut config: GlobalConfig) -> GlobalConfig {
    if config.history_window < MIN_HISTORY_WINDOW {
        tracing::warn!("history_window must be at least {MIN_HISTORY_WINDOW}, clamping");
        config.history_window = MIN_HISTORY_WINDOW;
    }
    config.base_url = config.base_url.trim_end_matches('/').to_string();
    config
}
