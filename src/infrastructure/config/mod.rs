//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub plugins: PluginConfig,
    pub evaluator: EvaluatorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub nickname: String,
    /// Prefix marking a channel line as a command, e.g. ".".
    pub command_prefix: String,
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginConfig {
    /// Names of bundled plugins to register at startup.
    pub enabled: Vec<String>,
    /// Root of the per-plugin storage directories.
    pub storage_directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EvaluatorConfig {
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                nickname: "parley".to_string(),
                command_prefix: ".".to_string(),
                channels: Vec::new(),
            },
            plugins: PluginConfig {
                enabled: vec!["greet".into(), "seen".into(), "memo".into()],
                storage_directory: default_storage_dir(),
            },
            evaluator: EvaluatorConfig { timeout_seconds: 5 },
        }
    }
}

fn default_storage_dir() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".parley-bot").join("data"),
        Err(_) => PathBuf::from(".parley-bot/data"),
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn load_env() -> Self {
        let mut config = Config::default();

        if let Ok(nickname) = std::env::var("BOT_NICK") {
            config.bot.nickname = nickname;
        }
        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            config.bot.command_prefix = prefix;
        }

        config
    }

    pub fn save(&self, path: impl Into<PathBuf>) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path.into(), content)
            .map_err(|e| ConfigError::Parse(format!("Failed to write config: {}", e)))
    }

    /// The storage directory of a plugin, created on demand.
    pub fn plugin_storage_dir(&self, plugin: &str) -> std::io::Result<PathBuf> {
        let dir = self.plugins.storage_directory.join(plugin);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn evaluator_timeout(&self) -> Duration {
        Duration::from_secs(self.evaluator.timeout_seconds)
    }
}
