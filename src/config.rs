use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::analysis::AnalyzerConfig;

pub const ENV_SCREENPIPE_URL: &str = "SHORTLIST_SCREENPIPE_URL";
pub const ENV_BACKEND_URL: &str = "SHORTLIST_BACKEND_URL";
pub const ENV_EXPECTED_TITLE: &str = "SHORTLIST_EXPECTED_TITLE";

/// Timings for the screen monitor and the diagnostics loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorTiming {
    pub probe_interval_ms: u64,
    /// Wall-clock budget for the first successful probe.
    pub connect_timeout_ms: u64,
    /// Grace period between a successful probe and `Ready`, in 1 s ticks.
    pub init_countdown_secs: u32,
    pub poll_interval_ms: u64,
    /// Trailing window of OCR content requested on each query.
    pub ocr_window_secs: u64,
    pub ocr_limit: u32,
    pub request_timeout_ms: u64,
}

impl Default for MonitorTiming {
    fn default() -> Self {
        Self {
            probe_interval_ms: 1_000,
            connect_timeout_ms: 5_000,
            init_countdown_secs: 5,
            poll_interval_ms: 10_000,
            ocr_window_secs: 10,
            ocr_limit: 10,
            request_timeout_ms: 3_000,
        }
    }
}

impl MonitorTiming {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn ocr_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ocr_window_secs as i64)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProctorConfig {
    pub screenpipe_url: String,
    /// When unset, interview records and diagnostics stay in the local database.
    pub backend_url: Option<String>,
    pub analyzer: AnalyzerConfig,
    pub timing: MonitorTiming,
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self {
            screenpipe_url: "http://localhost:3030".into(),
            backend_url: None,
            analyzer: AnalyzerConfig::default(),
            timing: MonitorTiming::default(),
        }
    }
}

impl ProctorConfig {
    /// Read the settings file if it exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                warn!(
                    "Config file {} not found, using defaults",
                    path.display()
                );
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SCREENPIPE_URL).filter(|v| !v.is_empty()) {
            self.screenpipe_url = url;
        }
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.is_empty()) {
            self.backend_url = Some(url);
        }
        if let Some(title) = lookup(ENV_EXPECTED_TITLE).filter(|v| !v.is_empty()) {
            self.analyzer.expected_title = title;
        }
    }
}
