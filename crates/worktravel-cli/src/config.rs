// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging;

const CONFIG_VERSION: i64 = 1;
const CONFIG_PATH_ENV: &str = "WORKTRAVEL_CONFIG_PATH";
const DEFAULT_FLUSH_TIMEOUT: &str = "2s";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Storage {
    pub db_path: Option<String>,
    /// How long quitting waits for the last snapshot to reach disk.
    pub flush_timeout: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            db_path: None,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Ui {
    /// Ring the terminal bell when an edit starts.
    pub haptics: bool,
}

impl Default for Ui {
    fn default() -> Self {
        Self { haptics: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Log {
    pub level: String,
    pub dir: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LEVEL.to_owned(),
            dir: None,
        }
    }
}

impl Config {
    /// `$WORKTRAVEL_CONFIG_PATH`, else `<config dir>/worktravel/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let app_dir = dirs::config_dir()
            .ok_or_else(|| {
                anyhow!("no platform config directory; point {CONFIG_PATH_ENV} at a config file")
            })?
            .join(worktravel_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    /// A missing file means defaults; anything else must be a valid v1 file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        match value.get("version").and_then(toml::Value::as_integer) {
            Some(CONFIG_VERSION) => {}
            Some(other) => bail!(
                "{} declares config version {other}, but only version = {CONFIG_VERSION} is understood",
                path.display()
            ),
            None => bail!(
                "{} has no `version` key; add `version = {CONFIG_VERSION}` at the top (sections: [storage], [ui], [log])",
                path.display()
            ),
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config
            .check_fields()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    fn check_fields(&self) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            worktravel_db::validate_db_path(db_path).context("storage.db_path")?;
        }
        if self.flush_timeout().context("storage.flush_timeout")? == Duration::ZERO {
            bail!("storage.flush_timeout must be greater than zero");
        }
        logging::normalize_level(&self.log.level).context("log.level")?;
        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        self.storage
            .db_path
            .as_ref()
            .map_or_else(worktravel_db::default_db_path, |path| {
                Ok(PathBuf::from(path))
            })
    }

    pub fn flush_timeout(&self) -> Result<Duration> {
        parse_duration(&self.storage.flush_timeout)
    }

    pub fn haptics(&self) -> bool {
        self.ui.haptics
    }

    pub fn log_level(&self) -> &str {
        &self.log.level
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        self.log
            .dir
            .as_ref()
            .map_or_else(logging::default_log_dir, |dir| Ok(PathBuf::from(dir)))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            r#"# worktravel config
# Place this file at: {path}

version = {CONFIG_VERSION}

[storage]
# Defaults to the platform data dir, e.g. ~/.local/share/worktravel/worktravel.db
# db_path = "/absolute/path/to/worktravel.db"
flush_timeout = "{DEFAULT_FLUSH_TIMEOUT}"

[ui]
haptics = true

[log]
level = "{level}"
# dir = "/absolute/path/to/logs"
"#,
            path = path.display(),
            level = logging::DEFAULT_LEVEL,
        )
    }
}

/// Accepts `<N>ms`, `<N>s` or `<N>m`.
fn parse_duration(raw: &str) -> Result<Duration> {
    let trimmed = raw.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    let amount: u64 = digits
        .parse()
        .map_err(|_| anyhow!("invalid duration {raw:?}; expected a number followed by ms, s or m"))?;

    match unit {
        "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount.saturating_mul(60))),
        _ => bail!("invalid duration {raw:?}; unit must be ms, s or m (for example 500ms or 2s)"),
    }
}
