use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080/api";
pub const API_BASE_URL_ENV: &str = "OLIVER_API_BASE_URL";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Config {
    pub credentials_path: PathBuf,
    pub api_base_url: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "oliver").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let credentials_path = data_dir.join("credentials.json");
        let api_base_url = base_url_from(std::env::var(API_BASE_URL_ENV).ok());

        Ok(Config {
            credentials_path,
            api_base_url,
        })
    }
}

/// Blank values fall back to the default. A trailing slash is dropped so
/// paths can be appended with `/`.
fn base_url_from(value: Option<String>) -> String {
    value
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
}
