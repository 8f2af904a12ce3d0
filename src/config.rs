use crate::ai_provider::AiProvider;
use crate::error::{RadRvuError, Result};
use rad_rvu_common::DEFAULT_RATE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// セッションファイルの場所を上書きする環境変数
pub const SESSION_ENV: &str = "RAD_RVU_SESSION";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ai_provider: AiProvider,
    pub model: Option<String>,
    pub default_rate: f64,
    pub timeout_seconds: u64,
    pub max_image_bytes: u64,
    pub session_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ai_provider: AiProvider::Claude,
            model: None,
            default_rate: DEFAULT_RATE,
            timeout_seconds: 120,
            max_image_bytes: 20 * 1024 * 1024,
            session_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| RadRvuError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("rad-rvu"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// セッションファイルのパス（環境変数 > 設定 > デフォルト）
    pub fn session_path(&self) -> Result<PathBuf> {
        if let Ok(path) = std::env::var(SESSION_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        match &self.session_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("session.json")),
        }
    }

    pub fn set_default_rate(&mut self, rate: f64) -> Result<()> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(RadRvuError::Config(format!("不正なレート: {}", rate)));
        }
        self.default_rate = rate;
        self.save()
    }
}
