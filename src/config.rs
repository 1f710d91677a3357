//! Client configuration
//!
//! Loaded from `~/.memorymate/config.yaml` when present, then overridden by
//! `MEMORYMATE_BASE_URL` and `MEMORYMATE_LIVE_MODE`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_APPROVAL_INTERVAL, DEFAULT_BASE_URL,
    DEFAULT_FRAMES_INTERVAL, DEFAULT_PEOPLE_PATH, DEFAULT_STREAM_INTERVAL, SESSION_FILE_NAME,
};

pub const BASE_URL_ENV: &str = "MEMORYMATE_BASE_URL";
pub const LIVE_MODE_ENV: &str = "MEMORYMATE_LIVE_MODE";

/// How the live tab obtains frames
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LiveMode {
    /// Push channel at the base URL
    #[default]
    Socket,
    /// Poll `/api/get-frames`
    Frames,
    /// Poll `/api/stream`
    Stream,
}

impl LiveMode {
    pub fn parse(value: &str) -> Option<LiveMode> {
        match value.trim().to_ascii_lowercase().as_str() {
            "socket" | "ws" | "websocket" => Some(LiveMode::Socket),
            "frames" => Some(LiveMode::Frames),
            "stream" => Some(LiveMode::Stream),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LiveMode::Socket => "socket",
            LiveMode::Frames => "frames",
            LiveMode::Stream => "stream",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub mode: LiveMode,
    pub frames_interval_ms: u64,
    pub stream_interval_ms: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        LiveConfig {
            mode: LiveMode::default(),
            frames_interval_ms: DEFAULT_FRAMES_INTERVAL.as_millis() as u64,
            stream_interval_ms: DEFAULT_STREAM_INTERVAL.as_millis() as u64,
        }
    }
}

impl LiveConfig {
    /// Poll interval for the configured mode; `None` for the socket variant
    pub fn interval(&self) -> Option<Duration> {
        match self.mode {
            LiveMode::Socket => None,
            LiveMode::Frames => Some(Duration::from_millis(self.frames_interval_ms)),
            LiveMode::Stream => Some(Duration::from_millis(self.stream_interval_ms)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub approval_interval_ms: u64,
    pub people_path: String,
    pub live: LiveConfig,
    /// Where the latest socket frame is written; defaults to `<config dir>/frames`
    pub frame_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            approval_interval_ms: DEFAULT_APPROVAL_INTERVAL.as_millis() as u64,
            people_path: DEFAULT_PEOPLE_PATH.to_string(),
            live: LiveConfig::default(),
            frame_dir: None,
        }
    }
}

impl Config {
    /// Load from the default location and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&config_dir().join(CONFIG_FILE_NAME))?;
        config.apply_overrides(
            std::env::var(BASE_URL_ENV).ok(),
            std::env::var(LIVE_MODE_ENV).ok(),
        );
        Ok(config)
    }

    /// Read a YAML file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parse {}", path.display()))?;
        Ok(config.normalized())
    }

    pub fn apply_overrides(&mut self, base_url: Option<String>, live_mode: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(raw) = live_mode {
            match LiveMode::parse(&raw) {
                Some(mode) => self.live.mode = mode,
                None => tracing::warn!(value = %raw, "Ignoring unknown live mode"),
            }
        }
        let normalized = std::mem::take(self).normalized();
        *self = normalized;
    }

    fn normalized(mut self) -> Self {
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        if !self.people_path.starts_with('/') {
            self.people_path.insert(0, '/');
        }
        self
    }

    pub fn approval_interval(&self) -> Duration {
        Duration::from_millis(self.approval_interval_ms)
    }

    pub fn frame_dir(&self) -> PathBuf {
        self.frame_dir
            .clone()
            .unwrap_or_else(|| config_dir().join("frames"))
    }

    pub fn session_path(&self) -> PathBuf {
        config_dir().join(SESSION_FILE_NAME)
    }
}

/// `~/.memorymate`, or `./.memorymate` when there is no home directory
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}
