use crate::query::CacheOptions;
use crate::source::http::DEFAULT_BASE_URL;
use crate::view::ViewOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const URL_ENV: &str = "TAGBOARD_URL";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagboardConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            per_page: default_per_page(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub live_search: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            live_search: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_stale_time_ms")]
    pub stale_time_ms: u64,
    #[serde(default = "default_gc_time_ms")]
    pub gc_time_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_ms: default_stale_time_ms(),
            gc_time_ms: default_gc_time_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default = "default_min_title_len")]
    pub min_title_len: usize,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            min_title_len: default_min_title_len(),
        }
    }
}

impl TagboardConfig {
    #[must_use]
    pub const fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            stale_time: Duration::from_millis(self.cache.stale_time_ms),
            page_size: self.api.per_page,
            gc_time: Duration::from_millis(self.cache.gc_time_ms),
        }
    }

    #[must_use]
    pub const fn view_options(&self) -> ViewOptions {
        ViewOptions {
            debounce: Duration::from_millis(self.view.debounce_ms),
            live_search: self.view.live_search,
        }
    }
}

/// Flags from the command line that win over every file and variable.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub config: TagboardConfig,
    pub source: Option<PathBuf>,
}

pub fn load_config_file(path: &Path) -> Result<TagboardConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<TagboardConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Candidate config files in lookup order: the working directory first,
/// then the per-user config directory.
#[must_use]
pub fn config_paths(project_root: &Path) -> Vec<PathBuf> {
    let mut paths = vec![project_root.join(".tagboard/config.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("tagboard/config.toml"));
    }
    paths
}

/// Load the first config file that exists, or defaults when none does.
pub fn load_config(project_root: &Path) -> Result<(TagboardConfig, Option<PathBuf>)> {
    for path in config_paths(project_root) {
        if path.exists() {
            let config = load_config_file(&path)?;
            tracing::debug!(path = %path.display(), "config loaded");
            return Ok((config, Some(path)));
        }
    }
    Ok((TagboardConfig::default(), None))
}

pub fn resolve_config(project_root: &Path, overrides: &Overrides) -> Result<EffectiveConfig> {
    let (mut config, source) = load_config(project_root)?;
    apply_overrides(&mut config, env::var(URL_ENV).ok(), overrides);
    Ok(EffectiveConfig { config, source })
}

fn apply_overrides(config: &mut TagboardConfig, env_url: Option<String>, overrides: &Overrides) {
    if let Some(url) = env_url.filter(|url| !url.trim().is_empty()) {
        config.api.base_url = url;
    }
    if let Some(url) = &overrides.base_url {
        config.api.base_url.clone_from(url);
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_per_page() -> u32 {
    10
}

const fn default_timeout_ms() -> u64 {
    10_000
}

const fn default_debounce_ms() -> u64 {
    1_000
}

const fn default_stale_time_ms() -> u64 {
    60_000
}

const fn default_gc_time_ms() -> u64 {
    300_000
}

const fn default_min_title_len() -> usize {
    crate::mutation::DEFAULT_MIN_TITLE_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_service() {
        let cfg = TagboardConfig::default();
        assert_eq!(cfg.api.base_url, "http://localhost:3333");
        assert_eq!(cfg.api.per_page, 10);
        assert_eq!(cfg.view.debounce_ms, 1000);
        assert!(!cfg.view.live_search);
        assert_eq!(cfg.cache_options(), CacheOptions::default());
        assert_eq!(cfg.view_options(), ViewOptions::default());
        assert_eq!(cfg.form.min_title_len, 3);
    }

    #[test]
    fn missing_project_config_falls_through() {
        let dir = tempfile::tempdir().expect("temp dir");
        let paths = config_paths(dir.path());
        assert_eq!(paths[0], dir.path().join(".tagboard/config.toml"));
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
output = "json"

[api]
base_url = "http://tags.internal:8080"

[view]
live_search = true
"#,
        )
        .expect("write config");

        let cfg = load_config_file(&path).expect("parse");
        assert_eq!(cfg.api.base_url, "http://tags.internal:8080");
        assert_eq!(cfg.api.per_page, 10);
        assert!(cfg.view.live_search);
        assert_eq!(cfg.view.debounce_ms, 1000);
        assert_eq!(cfg.output.as_deref(), Some("json"));
    }

    #[test]
    fn project_file_is_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(dir.path().join(".tagboard")).expect("mkdir");
        std::fs::write(
            dir.path().join(".tagboard/config.toml"),
            "[form]\nmin_title_len = 5\n",
        )
        .expect("write config");

        let (cfg, source) = load_config(dir.path()).expect("load");
        assert_eq!(cfg.form.min_title_len, 5);
        assert_eq!(source, Some(dir.path().join(".tagboard/config.toml")));
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nbase_url = 1").expect("write config");
        let err = load_config_file(&path).expect_err("should fail");
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn flag_wins_over_env() {
        let mut cfg = TagboardConfig::default();
        let overrides = Overrides {
            base_url: Some("http://flag".into()),
        };
        apply_overrides(&mut cfg, Some("http://env".into()), &overrides);
        assert_eq!(cfg.api.base_url, "http://flag");

        let mut cfg = TagboardConfig::default();
        apply_overrides(&mut cfg, Some("http://env".into()), &Overrides::default());
        assert_eq!(cfg.api.base_url, "http://env");
    }

    #[test]
    fn blank_env_url_is_ignored() {
        let mut cfg = TagboardConfig::default();
        apply_overrides(&mut cfg, Some("  ".into()), &Overrides::default());
        assert_eq!(cfg.api.base_url, DEFAULT_BASE_URL);
    }
}
