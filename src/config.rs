use crate::error::{OdiaOcrError, Result};
use crate::ocr::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// APIキーを読む環境変数
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub image_dir: PathBuf,
    pub annotation_csv: PathBuf,
    pub temp_dir: PathBuf,
    pub bind_address: String,
    pub allowed_origins: Vec<String>,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".into(),
            image_dir: PathBuf::from("uploaded_images"),
            annotation_csv: PathBuf::from("annotations").join("annotations.csv"),
            temp_dir: PathBuf::from("temp"),
            bind_address: "127.0.0.1:8000".into(),
            // Vite開発サーバー
            allowed_origins: vec![
                "http://localhost:5173".into(),
                "http://127.0.0.1:5173".into(),
            ],
            max_retries: 3,
            retry_delay_ms: 1000,
            timeout_seconds: 120,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// 指定パスから読み込み（存在しなければデフォルト）
    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| OdiaOcrError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("odia-ocr").join("config.json"))
    }

    /// APIキーを取得（環境変数を優先）
    pub fn get_api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(OdiaOcrError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries.max(1),
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_paths() {
        let config = Config::default();
        assert_eq!(config.image_dir, PathBuf::from("uploaded_images"));
        assert!(config.annotation_csv.ends_with("annotations.csv"));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(config.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_partial_file_is_filled_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"model": "gemini-2.0-flash", "max_retries": 5}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.bind_address, "127.0.0.1:8000");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            api_key: Some("secret".into()),
            retry_delay_ms: 10,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("secret"));
        assert_eq!(loaded.retry_delay_ms, 10);
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = Config {
            max_retries: 0,
            retry_delay_ms: 250,
            ..Default::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay, Duration::from_millis(250));
    }
}
