use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fully merged runtime configuration for one pipeline run.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Working root: cloned repositories land here, artifacts under OUTPUT/.
    pub workdir: PathBuf,
    /// Free-form natural-language instructions the intent extractor analyses.
    pub instructions: String,
    pub generation: GenerationConfig,
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            workdir = %self.workdir.display(),
            instructions_len = self.instructions.len(),
            model = %self.generation.model,
            "Loaded Config"
        );
        debug!(workdir = ?self.workdir, "Config loaded");
        self.generation.trace_loaded();
    }
}

/// Settings for the chat-completion service.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    /// Credential from the environment. Absence is a warning at load time;
    /// the call itself fails when attempted.
    pub api_key: Option<String>,
    /// Request timeout applied to every chat-completion call.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl GenerationConfig {
    pub fn trace_loaded(&self) {
        if self.api_key.is_none() {
            warn!("No API key configured; chat-completion calls will fail when attempted");
        }
        info!(
            model = %self.model,
            temperature = self.temperature,
            base_url = %self.base_url,
            timeout_secs = self.timeout.as_secs(),
            "Loaded GenerationConfig"
        );
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
