use crate::error::{LabelValidatorError, Result};
use label_validator_common::scan::{DEFAULT_AUTO_SUBMIT_LENGTH, DEFAULT_DEBOUNCE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 保存先ディレクトリを上書きする環境変数
pub const STORAGE_DIR_ENV: &str = "LABEL_VALIDATOR_STORAGE_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// スナップショット保存先（省略時はデータディレクトリ）
    pub storage_dir: Option<PathBuf>,
    /// エクスポート先（省略時はカレント）
    pub export_dir: Option<PathBuf>,
    /// 自動送信する入力長
    pub auto_submit_length: usize,
    /// 自動送信までの待ち時間
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: None,
            export_dir: None,
            auto_submit_length: DEFAULT_AUTO_SUBMIT_LENGTH,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
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
            .ok_or_else(|| LabelValidatorError::Config("No se encontró el directorio personal".into()))?;
        Ok(home.join(".config").join("label-validator").join("config.json"))
    }

    /// 保存先ディレクトリ（環境変数 > 設定ファイル > データディレクトリ）
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(STORAGE_DIR_ENV) {
            if !dir.trim().is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }

        if let Some(dir) = &self.storage_dir {
            return Ok(dir.clone());
        }

        let data = dirs::data_dir()
            .ok_or_else(|| LabelValidatorError::Config("No se encontró el directorio de datos".into()))?;
        Ok(data.join("label-validator"))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn set_storage_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.storage_dir = Some(dir);
        self.save()
    }

    pub fn set_export_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.export_dir = Some(dir);
        self.save()
    }
}
