//! Configuration model and TOML persistence
//!
//! Credentials live here as plain strings — config encryption is out of
//! scope. The core never stores keys anywhere else; they are passed per
//! call into the dispatch round.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_keys: ApiKeys,
    pub telegram: TelegramConfig,
    /// Last directory reports were saved to; doubles as the default output
    /// directory for the next round.
    pub last_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: String,
    pub anthropic: String,
    pub google: String,
    pub yandex: String,
    pub cohere: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl Config {
    /// `~/.multimind/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".multimind").join("config.toml"))
    }

    /// Load from `path`; a missing file yields the default config so first
    /// runs work without any setup.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config file {}", path.display()))
    }

    /// Non-blank API keys by provider registry name.
    pub fn credentials(&self) -> HashMap<String, String> {
        let pairs = [
            ("openai", &self.api_keys.openai),
            ("anthropic", &self.api_keys.anthropic),
            ("google", &self.api_keys.google),
            ("yandex", &self.api_keys.yandex),
            ("cohere", &self.api_keys.cohere),
        ];
        pairs
            .into_iter()
            .filter(|(_, key)| !key.trim().is_empty())
            .map(|(name, key)| (name.to_string(), key.clone()))
            .collect()
    }

    pub fn set_key(&mut self, provider: &str, key: String) -> Result<()> {
        match provider {
            "openai" => self.api_keys.openai = key,
            "anthropic" => self.api_keys.anthropic = key,
            "google" => self.api_keys.google = key,
            "yandex" => self.api_keys.yandex = key,
            "cohere" => self.api_keys.cohere = key,
            other => bail!("unknown provider: {other} (ollama needs no key)"),
        }
        Ok(())
    }

    pub fn telegram_configured(&self) -> bool {
        !self.telegram.bot_token.trim().is_empty() && !self.telegram.chat_id.trim().is_empty()
    }
}
