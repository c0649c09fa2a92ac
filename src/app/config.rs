use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_API_KEY_ENV, DEFAULT_BACKEND_URL, DEFAULT_MODEL, DEFAULT_STORAGE_NAMESPACE,
    HTTP_REQUEST_TIMEOUT_SECS,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Inference endpoint
    #[serde(default)]
    pub backend: BackendConfig,

    /// Chat defaults
    #[serde(default)]
    pub chat: ChatConfig,

    /// Where sessions are kept
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Inference endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Chat endpoint receiving `POST {message, model}`
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Environment variable holding an optional bearer token
    pub api_key_env: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BACKEND_URL.to_string(),
            timeout_secs: HTTP_REQUEST_TIMEOUT_SECS,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

/// Chat defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Model used when none is given on the command line
    pub default_model: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory; the platform data directory when unset
    pub data_dir: Option<PathBuf>,
    /// Subdirectory shared by all keys
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            namespace: DEFAULT_STORAGE_NAMESPACE.to_string(),
        }
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    let global_config = get_config_dir()?.join("config.toml");
    let local_config = PathBuf::from(".chatbox/config.toml");

    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    // Add global config if it exists
    if global_config.exists() {
        figment = figment.merge(Toml::file(&global_config));
    }

    // Add local config if it exists
    if local_config.exists() {
        figment = figment.merge(Toml::file(&local_config));
    }

    // Add environment variables (CHATBOX_ prefix, CHATBOX_BACKEND__URL etc.)
    figment = figment.merge(Env::prefixed("CHATBOX_").split("__"));

    figment.extract().context("Failed to load configuration")
}

/// Load configuration from one explicit file, still honouring the environment
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }

    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CHATBOX_").split("__"))
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "chatbox") {
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    } else {
        // Fallback to home directory
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let config_dir = PathBuf::from(home).join(".config").join("chatbox");
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }
}

/// Root directory for the session store
pub fn data_dir(config: &StorageConfig) -> Result<PathBuf> {
    if let Some(dir) = &config.data_dir {
        return Ok(dir.clone());
    }

    if let Some(proj_dirs) = ProjectDirs::from("", "", "chatbox") {
        Ok(proj_dirs.data_dir().to_path_buf())
    } else {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        Ok(PathBuf::from(home).join(".local").join("share").join("chatbox"))
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<PathBuf> {
    let config_file = get_config_dir()?.join("config.toml");

    if !config_file.exists() {
        save_config(&Config::default(), Some(config_file.clone()))?;
        println!("Created default configuration at: {}", config_file.display());
    } else {
        println!("Configuration already exists at: {}", config_file.display());
    }

    Ok(config_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend.url, DEFAULT_BACKEND_URL);
        assert_eq!(config.chat.default_model, "openai/gpt-3.5-turbo");
        assert_eq!(config.storage.namespace, "chatbox");
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[backend]
url = "https://chat.example.com/api/chat"
timeout_secs = 30
api_key_env = "EXAMPLE_KEY"

[storage]
namespace = "work"
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.backend.url, "https://chat.example.com/api/chat");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.storage.namespace, "work");
        assert_eq!(config.chat.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_saved_config_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let mut config = Config::default();
        config.chat.default_model = "openai/gpt-4".to_string();
        config.storage.data_dir = Some(temp_dir.path().join("data"));

        save_config(&config, Some(path.clone())).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.chat.default_model, "openai/gpt-4");
        assert_eq!(data_dir(&loaded.storage).unwrap(), temp_dir.path().join("data"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(load_config_from(Path::new("/definitely/not/here.toml")).is_err());
    }
}
