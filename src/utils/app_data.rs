use crate::index::types::{BuildOptions, IndexState};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "mandex";
const CONFIG_FILE: &str = "config.json";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Collection roots searched when none are given on the command line
    #[serde(default = "default_roots")]
    pub roots: Vec<PathBuf>,

    /// Exclude documents whose metadata disagrees with their location
    #[serde(default)]
    pub strict: bool,

    /// Show a progress bar while indexing
    #[serde(default = "default_progress")]
    pub progress: bool,
}

fn default_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("/usr/share/man"), PathBuf::from("/usr/local/share/man")]
}

fn default_progress() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            roots: default_roots(),
            strict: false,
            progress: default_progress(),
        }
    }
}

impl AppConfig {
    /// Load config from the config directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
            let config: AppConfig = serde_json::from_str(&content).context("Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the config directory
    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Build options implied by the config; command-line flags may add to them
    pub fn build_options(&self, verbose: bool) -> BuildOptions {
        BuildOptions {
            strict: self.strict,
            verbose,
            progress: self.progress,
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    let app_dir = base.join(APP_NAME);
    fs::create_dir_all(&app_dir)?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

/// File holding the allocation state of a collection root between builds
pub fn get_state_path(root: &Path) -> Result<PathBuf> {
    let state_dir = get_app_data_dir()?.join("state");
    fs::create_dir_all(&state_dir)?;
    Ok(state_dir.join(format!("{}.json", hash_path(root))))
}

/// Saved allocation state of a collection root, if any
pub fn load_state(root: &Path) -> Result<Option<IndexState>> {
    let path = get_state_path(root)?;
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path).context("Failed to read index state")?;
    let state = serde_json::from_str(&content).context("Failed to parse index state")?;
    Ok(Some(state))
}

pub fn save_state(root: &Path, state: &IndexState) -> Result<()> {
    let path = get_state_path(root)?;
    let content = serde_json::to_string(state).context("Failed to serialize index state")?;
    fs::write(&path, content).context("Failed to write index state")?;
    Ok(())
}

/// Hash a path to create a unique file name
/// Format: first 16 chars of dir name + hash
fn hash_path(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let path_str = canonical.to_string_lossy();

    // Get directory name for readability
    let dir_name = canonical.file_name().and_then(|n| n.to_str()).unwrap_or("unknown");

    // Sanitize directory name (remove special chars, truncate)
    let sanitized: String = dir_name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(16)
        .collect();

    let mut hasher = DefaultHasher::new();
    path_str.hash(&mut hasher);
    let hash = hasher.finish();

    format!("{}-{:016x}", sanitized, hash)
}
