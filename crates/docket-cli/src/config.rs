// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use docket_app::{
    DEFAULT_DAYS_AFTER, DEFAULT_DAYS_BEFORE, DEFAULT_WINDOW_THRESHOLD, DefaultWindow, ReviewConfig,
};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::Date;

const APP_NAME: &str = "docket";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT: &str = "5s";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub review: Review,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: Server::default(),
            review: Review::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    pub days_before: Option<i64>,
    pub days_after: Option<i64>,
    pub window_threshold: Option<i64>,
}

impl Default for Review {
    fn default() -> Self {
        Self {
            days_before: Some(i64::from(DEFAULT_DAYS_BEFORE)),
            days_after: Some(i64::from(DEFAULT_DAYS_AFTER)),
            window_threshold: Some(DEFAULT_WINDOW_THRESHOLD as i64),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("DOCKET_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set DOCKET_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
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
                    "config file {} is not versioned. Add `version = 1` and put values under [server] and [review]",
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
        if self.server.base_url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            bail!("server.base_url in {} must not be empty", path.display());
        }

        if let Some(timeout) = &self.server.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed.is_zero() {
                bail!(
                    "server.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        for (key, value) in [
            ("review.days_before", self.review.days_before),
            ("review.days_after", self.review.days_after),
        ] {
            if let Some(days) = value
                && u16::try_from(days).is_err()
            {
                bail!(
                    "{key} in {} must be between 0 and {}, got {days}",
                    path.display(),
                    u16::MAX
                );
            }
        }

        if let Some(threshold) = self.review.window_threshold
            && threshold <= 0
        {
            bail!(
                "review.window_threshold in {} must be positive, got {}",
                path.display(),
                threshold
            );
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.server
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim()
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.server.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn window(&self) -> DefaultWindow {
        let clamp = |value: Option<i64>, fallback: u16| {
            value
                .and_then(|days| u16::try_from(days).ok())
                .unwrap_or(fallback)
        };
        DefaultWindow {
            days_before: clamp(self.review.days_before, DEFAULT_DAYS_BEFORE),
            days_after: clamp(self.review.days_after, DEFAULT_DAYS_AFTER),
        }
    }

    pub fn window_threshold(&self) -> usize {
        self.review
            .window_threshold
            .and_then(|threshold| usize::try_from(threshold).ok())
            .filter(|threshold| *threshold > 0)
            .unwrap_or(DEFAULT_WINDOW_THRESHOLD)
    }

    pub fn review_config(&self, today: Date) -> ReviewConfig {
        ReviewConfig {
            today,
            window: self.window(),
            window_threshold: self.window_threshold(),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# docket config\n# Place this file at: {}\n\nversion = 1\n\n[server]\nbase_url = \"{}\"\n# <N>ms, <N>s or <N>m\ntimeout = \"{}\"\n\n[review]\n# Default window is today - days_before through today + days_after\ndays_before = {}\ndays_after = {}\n# Above this many matching records only the neighbours of the cursor are drawn\nwindow_threshold = {}\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            DEFAULT_DAYS_BEFORE,
            DEFAULT_DAYS_AFTER,
            DEFAULT_WINDOW_THRESHOLD,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
