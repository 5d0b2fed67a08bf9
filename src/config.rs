use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    constants::{
        APP_NAME, CMD_SWITCHES, CONSOLE_FILTERS, PAGE_PRINTER, STARTUP_URL, TICK_INTERVAL,
        WINDOW_HEIGHT, WINDOW_TITLE, WINDOW_WIDTH,
    },
    engine::{EngineSettings, Switch},
    navigation::NavigationTarget,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid command line switch {0:?}")]
    InvalidSwitch(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub user_agent: Option<String>,
    pub switches: Vec<String>,
    pub cache_path: Option<PathBuf>,
    pub external_message_pump: bool,
    pub tick_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            switches: Vec::new(),
            cache_path: None,
            external_message_pump: true,
            tick_interval_ms: TICK_INTERVAL.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: WINDOW_TITLE.to_owned(),
            width: WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub url: Option<String>,
    pub html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub filters: Vec<String>,
    pub printer: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            filters: CONSOLE_FILTERS.iter().map(|filter| filter.to_string()).collect(),
            printer: PAGE_PRINTER.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub bind_to_frames: bool,
    pub zoom_delta: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub window: WindowConfig,
    pub navigation: NavigationConfig,
    pub console: ConsoleConfig,
    pub bridge: BridgeConfig,
    pub headers: BTreeMap<String, String>,
}

impl Config {
    /// Reads the given file, or the default location when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path().filter(|path| path.exists()) {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        debug!("Loading config from {}", path.display());

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
    }

    pub fn cache_path(&self) -> Option<PathBuf> {
        self.engine
            .cache_path
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join(APP_NAME)))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.engine.tick_interval_ms.max(1))
    }

    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        let defaults = CMD_SWITCHES.iter().map(|(name, value)| match value {
            Some(value) => Switch::with_value(*name, *value),
            None => Switch::flag(*name),
        });

        let configured = self
            .engine
            .switches
            .iter()
            .map(|switch| parse_switch(switch))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EngineSettings {
            user_agent: self.engine.user_agent.clone(),
            switches: defaults.chain(configured).collect(),
            external_message_pump: self.engine.external_message_pump,
            cache_path: self.cache_path(),
        })
    }

    /// Inline markup takes precedence over an address.
    pub fn navigation_target(&self) -> Result<NavigationTarget, ConfigError> {
        if let Some(html) = &self.navigation.html {
            return Ok(NavigationTarget::Html(html.clone()));
        }

        let url = self.navigation.url.as_deref().unwrap_or(STARTUP_URL);
        Ok(NavigationTarget::parse(url)?)
    }
}

/// Parses `name`, `name=value` or the same with leading dashes.
pub fn parse_switch(switch: &str) -> Result<Switch, ConfigError> {
    let trimmed = switch.trim().trim_start_matches('-');

    let parsed = match trimmed.split_once('=') {
        Some((name, value)) => Switch::with_value(name, value),
        None => Switch::flag(trimmed),
    };

    if parsed.name.is_empty() || parsed.name.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidSwitch(switch.to_owned()));
    }

    Ok(parsed)
}
