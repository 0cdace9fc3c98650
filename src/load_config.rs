use crate::config::{Config, GenerationConfig};
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

const DEFAULT_WORKDIR: &str = "./repo_cloned";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_TEMPERATURE: f32 = 0.3;
const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Deserialize)]
struct StaticConfig {
    #[serde(default)]
    workdir: Option<PathBuf>,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    instructions_file: Option<PathBuf>,
    #[serde(default)]
    generation: GenerationSection,
}

#[derive(Deserialize, Default)]
struct GenerationSection {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

/// Loads a static YAML config file (no secrets) and injects env vars for
/// secrets. Returns a fully merged Config or an error.
///
/// The chat-completion credential (`OPENAI_API_KEY`) is deliberately not
/// required here: a missing key is logged as a warning and the failure
/// surfaces at the point of the first attempted call.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let static_conf: StaticConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let instructions = match (static_conf.instructions, static_conf.instructions_file) {
        (Some(text), None) => text,
        (None, Some(file)) => fs::read_to_string(&file).map_err(|e| {
            error!(error = ?e, file = ?file, "Failed to read instructions file");
            anyhow::anyhow!("Failed to read instructions file {:?}: {}", file, e)
        })?,
        (Some(_), Some(_)) => {
            anyhow::bail!("Config must set either 'instructions' or 'instructions_file', not both")
        }
        (None, None) => {
            anyhow::bail!("Config must set 'instructions' or 'instructions_file'")
        }
    };

    let api_key = match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Some(key),
        _ => {
            warn!("OPENAI_API_KEY environment variable not found");
            None
        }
    };

    let base_url = std::env::var("OPENAI_BASE_URL")
        .ok()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let generation = GenerationConfig {
        model: static_conf
            .generation
            .model
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        temperature: static_conf
            .generation
            .temperature
            .unwrap_or(DEFAULT_TEMPERATURE),
        base_url,
        api_key,
        timeout: Duration::from_secs(
            static_conf
                .generation
                .timeout_secs
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        ),
    };

    let config = Config {
        workdir: static_conf
            .workdir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKDIR)),
        instructions,
        generation,
    };

    config.trace_loaded();
    Ok(config)
}
