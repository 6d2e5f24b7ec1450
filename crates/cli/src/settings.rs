use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use facegate_core::detection::infrastructure::onnx_blazeface_adapter::DEFAULT_CONFIDENCE;
use facegate_core::scheduling::frame_scheduler::SchedulerConfig;
use facegate_core::validation::policy::ValidationPolicy;

/// Persisted tuning for the capture loop. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub policy: ValidationPolicy,
    pub scheduler: SchedulerConfig,
    pub confidence: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            policy: ValidationPolicy::default(),
            scheduler: SchedulerConfig::default(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceGate").join("settings.json"))
    }

    /// User settings file, or defaults when it is missing or unreadable.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    /// An explicitly requested file must exist and parse.
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        let settings = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
        Ok(settings)
    }
}
