use crate::error::{PayrollError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const API_URL_ENV: &str = "HRMS_API_URL";
const API_TOKEN_ENV: &str = "HRMS_API_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub timeout_seconds: u64,
    /// アップロード後、存在確認までの待ち時間
    pub settle_delay_ms: u64,
    /// 完了表示から初期状態に戻るまでの秒数
    pub auto_reset_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_token: None,
            timeout_seconds: 120,
            settle_delay_ms: 2000,
            auto_reset_seconds: 5,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PayrollError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("hrms-payroll").join("config.json"))
    }

    pub fn get_api_url(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                return Ok(url.trim_end_matches('/').to_string());
            }
        }

        self.api_base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .ok_or(PayrollError::MissingApiUrl)
    }

    pub fn get_api_token(&self) -> Option<String> {
        std::env::var(API_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.api_token.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn auto_reset_delay(&self) -> Duration {
        Duration::from_secs(self.auto_reset_seconds)
    }
}
