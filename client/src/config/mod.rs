//! Configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use speedhub_core::TEST_DURATION_MS;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub sequencer: SequencerConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// SQLite file holding cached IP and weather lookups
    #[serde(default = "default_cache_path")]
    pub cache_path: String,
    /// Per-request HTTP timeout, 0 disables it
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SequencerConfig {
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeatherConfig {
    /// Environment variable the API key is read from
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_cache_path() -> String {
    "speedhub-cache.db".to_string()
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_duration_ms() -> u64 {
    TEST_DURATION_MS
}

fn default_ip_lookup_url() -> String {
    "http://ip-api.com/json/".to_string()
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/3.0/onecall".to_string()
}

fn default_api_key_env() -> String {
    "OPENWEATHER_API_KEY".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            ip_lookup_url: default_ip_lookup_url(),
            weather_url: default_weather_url(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .with_context(|| "Failed to parse config file")?;

        if config.sequencer.duration_ms == 0 {
            anyhow::bail!("sequencer.duration_ms must be greater than zero");
        }

        Ok(config)
    }

    /// Use the config file when present, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        match self.general.http_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn test_duration(&self) -> Duration {
        Duration::from_millis(self.sequencer.duration_ms)
    }

    /// Weather API key from the configured environment variable
    pub fn weather_api_key(&self) -> Option<String> {
        std::env::var(&self.weather.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}
