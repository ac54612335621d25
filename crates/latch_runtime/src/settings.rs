//! Runtime settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Settings file looked up in the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = "latch.json";

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`.
    pub log_filter: String,
    /// Worker pool size; 0 lets rayon pick.
    pub worker_threads: usize,
    /// Scene document to load instead of the built-in demo scene.
    pub scene_path: Option<PathBuf>,
    /// Simulated clients in the connection demo.
    pub max_clients: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            worker_threads: 0,
            scene_path: None,
            max_clients: 48,
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(error) => {
                return Err(error).with_context(|| format!("reading {}", path.display()));
            }
        };
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let settings = Settings::load(Path::new("does/not/exist/latch.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "worker_threads": 4, "scene_path": "scenes/arena.json" }"#)
                .unwrap();
        assert_eq!(settings.worker_threads, 4);
        assert_eq!(settings.scene_path, Some(PathBuf::from("scenes/arena.json")));
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("latch-settings-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let result = Settings::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }
}
