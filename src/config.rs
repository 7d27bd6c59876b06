use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::AuthUser;
use crate::currency::Currency;
use crate::domain::SettingsSnapshot;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the backend. Overridable per-invocation with
    /// `--api-url` / `FINLEY_API_URL`.
    pub api_url: String,

    /// Currency amounts are rendered in. Toggled by `currency toggle`.
    #[serde(default)]
    pub display_currency: Currency,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            display_currency: Currency::default(),
        }
    }
}

/// The cached login. Stored next to the config, deleted by `logout` and on
/// any 401 from the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: AuthUser,
    pub logged_in_at: DateTime<Utc>,
}

/// Locally cached copy of the server settings, refreshed whenever
/// `settings show` succeeds so theme and currency survive offline runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsCache {
    #[serde(default)]
    pub snapshot: SettingsSnapshot,
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    pub fn session_file(&self) -> PathBuf {
        self.config_dir.join("session.json")
    }

    pub fn settings_cache_file(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }
}

pub fn app_paths(override_home: Option<PathBuf>) -> Result<AppPaths> {
    if let Some(home) = override_home {
        return Ok(AppPaths {
            config_dir: home.join("config"),
            data_dir: home.join("data"),
        });
    }

    let proj = ProjectDirs::from("com", "finley", "finley")
        .context("Failed to resolve platform directories")?;

    Ok(AppPaths {
        config_dir: proj.config_dir().to_path_buf(),
        data_dir: proj.data_dir().to_path_buf(),
    })
}

pub fn load_or_init_config(paths: &AppPaths) -> Result<(AppConfig, PathBuf)> {
    fs::create_dir_all(&paths.config_dir)
        .with_context(|| format!("Failed to create config dir {}", paths.config_dir.display()))?;

    let cfg_path = paths.config_file();
    if !cfg_path.exists() {
        let cfg = AppConfig::default();
        write_config(&cfg_path, &cfg)?;
        return Ok((cfg, cfg_path));
    }

    let raw = fs::read_to_string(&cfg_path)
        .with_context(|| format!("Failed to read {}", cfg_path.display()))?;
    let cfg: AppConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", cfg_path.display()))?;

    Ok((cfg, cfg_path))
}

pub fn write_config(path: &Path, cfg: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn load_session(paths: &AppPaths) -> Result<Option<Session>> {
    let path = paths.session_file();
    if !path.exists() {
        return Ok(None);
    }
    let raw =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let session: Session = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(session))
}

pub fn save_session(paths: &AppPaths, session: &Session) -> Result<()> {
    fs::create_dir_all(&paths.config_dir)
        .with_context(|| format!("Failed to create config dir {}", paths.config_dir.display()))?;
    let path = paths.session_file();
    let json = serde_json::to_string_pretty(session)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn clear_session(paths: &AppPaths) -> Result<bool> {
    let path = paths.session_file();
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    Ok(true)
}

pub fn load_settings_cache(paths: &AppPaths) -> SettingsCache {
    let path = paths.settings_cache_file();
    // A broken or absent cache never blocks a command.
    fs::read_to_string(&path)
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

pub fn save_settings_cache(paths: &AppPaths, cache: &SettingsCache) -> Result<()> {
    fs::create_dir_all(&paths.data_dir)
        .with_context(|| format!("Failed to create data dir {}", paths.data_dir.display()))?;
    let path = paths.settings_cache_file();
    let json = serde_json::to_string_pretty(cache)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_override_nests_config_and_data() {
        let paths = app_paths(Some(PathBuf::from("/tmp/finley-test"))).unwrap();
        assert_eq!(paths.config_dir, PathBuf::from("/tmp/finley-test/config"));
        assert_eq!(paths.data_dir, PathBuf::from("/tmp/finley-test/data"));
    }

    #[test]
    fn settings_cache_defaults_when_file_is_missing_or_broken() {
        let dir = std::env::temp_dir().join("finley-cache-test");
        let paths = app_paths(Some(dir.clone())).unwrap();

        let cache = load_settings_cache(&paths);
        assert_eq!(cache.snapshot.points, 0);
        assert!(cache.fetched_at.is_none());

        fs::create_dir_all(&paths.data_dir).unwrap();
        fs::write(paths.settings_cache_file(), "not json").unwrap();
        let cache = load_settings_cache(&paths);
        assert!(cache.fetched_at.is_none());

        fs::remove_dir_all(&dir).ok();
    }
}
