//! CLI configuration.
//!
//! Supports loading from a YAML file with environment variable overrides,
//! mirroring the teacher's `apps/server::config::ServerConfig`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// CLI-level configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// PCM sampling frequency, in Hz.
    /// Override: `KCS_FRAME_RATE`
    pub frame_rate: u32,

    /// KCS base tone, in Hz.
    /// Override: `KCS_BASE_FREQ`
    pub base_freq: u32,

    /// Gain applied when reading from the live audio device.
    /// Override: `KCS_GAIN`
    pub gain: f64,

    /// Volume applied when writing to the live audio device.
    /// Override: `KCS_VOLUME`
    pub volume: f64,

    /// Default lead-in duration written before data, in seconds.
    /// Override: `KCS_LEAD_IN_SECS`
    pub lead_in_secs: f64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            frame_rate: kcs_core::constants::DEFAULT_FRAME_RATE,
            base_freq: kcs_core::constants::DEFAULT_BASE_FREQ,
            gain: 1.0,
            volume: 1.0,
            lead_in_secs: kcs_core::constants::DEFAULT_LEAD_IN_SECS,
        }
    }
}

impl CliConfig {
    /// Loads configuration from a YAML file, then applies environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("KCS_FRAME_RATE") {
            if let Ok(v) = val.parse() {
                self.frame_rate = v;
            }
        }
        if let Ok(val) = std::env::var("KCS_BASE_FREQ") {
            if let Ok(v) = val.parse() {
                self.base_freq = v;
            }
        }
        if let Ok(val) = std::env::var("KCS_GAIN") {
            if let Ok(v) = val.parse() {
                self.gain = v;
            }
        }
        if let Ok(val) = std::env::var("KCS_VOLUME") {
            if let Ok(v) = val.parse() {
                self.volume = v;
            }
        }
        if let Ok(val) = std::env::var("KCS_LEAD_IN_SECS") {
            if let Ok(v) = val.parse() {
                self.lead_in_secs = v;
            }
        }
    }
}
