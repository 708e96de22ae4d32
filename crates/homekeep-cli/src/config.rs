// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use homekeep_app::RegionCatalog;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "warn";
const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            catalog: Catalog::default(),
            schedule: Schedule::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

/// Optional replacement for the built-in catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Schedule {
    pub default_region: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("HOMEKEEP_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set HOMEKEEP_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(homekeep_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no `version`; add `version = 1` at the top",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            homekeep_db::validate_db_path(db_path)?;
        }

        if let Some(catalog_path) = &self.catalog.path
            && catalog_path.trim().is_empty()
        {
            bail!(
                "catalog.path in {} is empty; remove it to use the built-in catalog",
                path.display()
            );
        }

        if let Some(level) = &self.log.level
            && !LOG_LEVELS.contains(&level.as_str())
        {
            bail!(
                "log.level in {} must be one of {}, got {level:?}",
                path.display(),
                LOG_LEVELS.join(", ")
            );
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => homekeep_db::default_db_path(),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn default_region(&self) -> Option<String> {
        self.schedule
            .default_region
            .as_deref()
            .map(str::trim)
            .filter(|region| !region.is_empty())
            .map(str::to_owned)
    }

    /// Load the configured catalog (or the built-in one) and check that the
    /// default region names one of its regions.
    pub fn load_catalog(&self) -> Result<RegionCatalog> {
        let catalog = match &self.catalog.path {
            Some(path) => RegionCatalog::load(Path::new(path))?,
            None => RegionCatalog::builtin()?,
        };

        if let Some(region) = self.default_region()
            && catalog.resolve_region(&region).is_none()
        {
            bail!(
                "schedule.default_region {region:?} is not a catalog region; choose one of: {}",
                catalog.zones().join(", ")
            );
        }
        Ok(catalog)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# homekeep config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/homekeep/homekeep.db)\n# db_path = \"/absolute/path/to/homekeep.db\"\n\n[catalog]\n# Optional. Replaces the built-in maintenance catalog.\n# path = \"/absolute/path/to/catalog.toml\"\n\n[schedule]\n# Used when a house's climate zone matches no catalog region.\n# default_region = \"Midwest\"\n\n[log]\n# error, warn, info, debug or trace. HOMEKEEP_LOG / RUST_LOG take precedence.\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n",
            path.display(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.log_level(), "warn");
        assert_eq!(config.default_region(), None);
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[log]\nlevel = \"info\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        assert!(error.to_string().contains("add `version = 1`"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[schedule]\ndefault_region = \" Great Lakes \"\n[log]\nlevel = \"debug\"\n",
        )?;
        let config = Config::load(&path)?;
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.default_region().as_deref(), Some("Great Lakes"));
        let catalog = config.load_catalog()?;
        assert_eq!(catalog.resolve_region("Great Lakes"), Some("Midwest"));
        Ok(())
    }

    #[test]
    fn unknown_log_level_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"loud\"\n")?;
        let error = Config::load(&path).expect_err("bad level should fail");
        assert!(error.to_string().contains("log.level"));
        Ok(())
    }

    #[test]
    fn default_region_must_name_a_catalog_region() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[schedule]\ndefault_region = \"Atlantis\"\n")?;
        let config = Config::load(&path)?;
        let error = config
            .load_catalog()
            .expect_err("unknown default region should fail");
        let message = error.to_string();
        assert!(message.contains("\"Atlantis\""));
        assert!(message.contains("Midwest"));
        Ok(())
    }

    #[test]
    fn catalog_path_loads_external_catalog() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let catalog_path = temp.path().join("catalog.toml");
        std::fs::write(
            &catalog_path,
            "[[task]]\ntitle = \"Rake leaves\"\ndescription = \"Rake.\"\npriority = \"low\"\n\n[[region]]\nname = \"Valley\"\n\n[[region.month]]\nmonth = 10\npriority = \"low\"\nseasonal = [\"rake-leaves\"]\n",
        )?;
        let config_path = temp.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!(
                "version = 1\n[catalog]\npath = {:?}\n",
                catalog_path.display().to_string()
            ),
        )?;

        let catalog = Config::load(&config_path)?.load_catalog()?;
        assert_eq!(catalog.zones(), vec!["Valley".to_owned()]);
        assert_eq!(catalog.task_count(), 1);
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("HOMEKEEP_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("HOMEKEEP_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn db_path_prefers_storage_config_over_env_override() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) =
            write_config("version = 1\n[storage]\ndb_path = \"/explicit/from-config.db\"\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("HOMEKEEP_DB_PATH", "/from/env.db");
        }
        let config = Config::load(&path)?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("HOMEKEEP_DB_PATH");
        }
        assert_eq!(config.db_path()?, PathBuf::from("/explicit/from-config.db"));
        Ok(())
    }

    #[test]
    fn db_path_uses_env_override_when_storage_db_path_missing() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 1\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("HOMEKEEP_DB_PATH", "/from/env-only.db");
        }
        let config = Config::load(&path)?;
        let resolved = config.db_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("HOMEKEEP_DB_PATH");
        }
        assert_eq!(resolved, PathBuf::from("/from/env-only.db"));
        Ok(())
    }

    #[test]
    fn db_path_rejects_uri_style_storage_value() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[storage]\ndb_path = \"https://evil.example/homekeep.db\"\n",
        )?;
        let error = Config::load(&path).expect_err("URI db_path should fail validation");
        assert!(error.to_string().contains("looks like a URI"));
        Ok(())
    }

    #[test]
    fn example_config_parses_and_names_every_section() -> Result<()> {
        let (_temp, path) = write_config("")?;
        let example = Config::example_config(&path);
        for section in ["[storage]", "[catalog]", "[schedule]", "[log]"] {
            assert!(example.contains(section), "missing {section}");
        }
        std::fs::write(&path, example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.log_level(), "warn");
        Ok(())
    }
}
