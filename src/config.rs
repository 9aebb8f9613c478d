use crate::error::{Result, SearchError};
use crate::query::TextFields;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "topic-search";
const CONFIG_FILE: &str = "config.json";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Fields a plain text term searches
    #[serde(default)]
    pub text_fields: TextFields,

    /// Maximum number of hits printed. 0 means unlimited.
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// Corpus used when `--corpus` is not given
    #[serde(default)]
    pub default_corpus: Option<PathBuf>,
}

fn default_result_limit() -> usize {
    50
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            text_fields: TextFields::default(),
            result_limit: default_result_limit(),
            default_corpus: None,
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| SearchError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SearchError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_app_data_dir()?.join(CONFIG_FILE))
}

/// Get the application data directory, creating it if needed
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.ok_or_else(|| SearchError::Config("could not determine app data directory".to_string()))?;
    let app_dir = base.join(APP_NAME);
    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}
