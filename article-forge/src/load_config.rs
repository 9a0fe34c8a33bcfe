/// `load_config` module: Loads a static YAML config and injects secrets from the environment.
///
/// This is the only place where user-supplied YAML is parsed and mapped to the
/// strongly-typed settings of `article-forge-core`.
///
/// # Responsibilities
/// - Parse the YAML file into [`CliConfig`]
/// - Fill defaults for the optional `pipeline` and `segment` sections
/// - Inject the bridge API key from `ARTICLE_FORGE_API_KEY`; keys never live in the file
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
///
/// Accepted schema:
///
/// ```yaml
/// bridge:
///   base_url: http://127.0.0.1:8787
///   timeout_secs: 120
/// pipeline:
///   max_concurrency: 4
///   retry_rounds: 1
/// prompts:
///   provider: openai
///   model: gpt-4o-mini
/// assets:
///   provider: imagen
/// ```
use anyhow::Result;
use article_forge_core::config::{PipelineConfig, ProviderSettings, SegmentConfig};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Environment variable holding the bridge API key.
pub const API_KEY_ENV: &str = "ARTICLE_FORGE_API_KEY";

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    pub bridge: BridgeSection,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub prompts: ProviderSettings,
    pub assets: ProviderSettings,
    #[serde(default)]
    pub segment: SegmentConfig,
}

#[derive(Debug, Deserialize)]
pub struct BridgeSection {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Injected from the environment, ignored in the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_timeout_secs() -> u64 {
    120
}

/// Loads a static YAML config file (no secrets) and injects secrets from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if config.bridge.base_url.trim().is_empty() {
        error!("bridge.base_url is empty");
        anyhow::bail!("bridge.base_url must not be empty");
    }

    config.bridge.api_key = match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.is_empty() => {
            info!("{API_KEY_ENV} found in env");
            Some(key)
        }
        _ => {
            info!("{API_KEY_ENV} not set, bridge calls are unauthenticated");
            None
        }
    };

    config.pipeline.trace_loaded();
    info!(
        base_url = %config.bridge.base_url,
        prompt_provider = %config.prompts.provider,
        asset_provider = %config.assets.provider,
        "Config loaded and merged successfully"
    );
    Ok(config)
}
