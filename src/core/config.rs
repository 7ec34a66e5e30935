//! YAML configuration with environment overrides for provider credentials.

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

use super::history::{BasePolicy, DEFAULT_REQUEST_DELAY, HistorySettings};
use super::pipeline::DEFAULT_WINDOW_DAYS;

pub const EXCHANGE_RATES_KEY_VAR: &str = "EXCHANGE_RATES_API_KEY";
pub const EXCHANGE_RATE_KEY_VAR: &str = "EXCHANGE_RATE_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExchangeRatesProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub access_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExchangeRateProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProvidersConfig {
    pub exchangerates: Option<ExchangeRatesProviderConfig>,
    pub exchangerate: Option<ExchangeRateProviderConfig>,
}

impl Default for ExchangeRatesProviderConfig {
    fn default() -> Self {
        ExchangeRatesProviderConfig {
            base_url: "https://api.exchangeratesapi.io".to_string(),
            access_key: None,
        }
    }
}

impl Default for ExchangeRateProviderConfig {
    fn default() -> Self {
        ExchangeRateProviderConfig {
            base_url: "https://v6.exchangerate-api.com".to_string(),
            api_key: None,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            exchangerates: Some(ExchangeRatesProviderConfig::default()),
            exchangerate: Some(ExchangeRateProviderConfig::default()),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Pause between daily requests. Values under the provider minimum are raised to it.
    pub request_delay_ms: u64,
    pub base_policy: BasePolicy,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            request_delay_ms: DEFAULT_REQUEST_DELAY.as_millis() as u64,
            base_policy: BasePolicy::default(),
        }
    }
}

impl From<&HistoryConfig> for HistorySettings {
    fn from(config: &HistoryConfig) -> Self {
        HistorySettings {
            request_delay: Duration::from_millis(config.request_delay_ms)
                .max(DEFAULT_REQUEST_DELAY),
            base_policy: config.base_policy,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ForecastConfig {
    pub window_days: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults when it is absent.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };
        Ok(config.with_env_overrides(|name| std::env::var(name).ok()))
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "fxcast", "fxcast")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Replaces provider credentials with values found through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(EXCHANGE_RATES_KEY_VAR).filter(|k| !k.is_empty()) {
            self.providers
                .exchangerates
                .get_or_insert_with(ExchangeRatesProviderConfig::default)
                .access_key = Some(key);
        }
        if let Some(key) = lookup(EXCHANGE_RATE_KEY_VAR).filter(|k| !k.is_empty()) {
            self.providers
                .exchangerate
                .get_or_insert_with(ExchangeRateProviderConfig::default)
                .api_key = Some(key);
        }
        self
    }

    pub fn exchangerates(&self) -> Result<(&str, &str)> {
        let provider = self
            .providers
            .exchangerates
            .as_ref()
            .ok_or_else(|| anyhow!("providers.exchangerates is not configured"))?;
        let key = provider
            .access_key
            .as_deref()
            .ok_or_else(|| anyhow!("{EXCHANGE_RATES_KEY_VAR} is not set"))?;
        Ok((&provider.base_url, key))
    }

    pub fn exchangerate(&self) -> Result<(&str, &str)> {
        let provider = self
            .providers
            .exchangerate
            .as_ref()
            .ok_or_else(|| anyhow!("providers.exchangerate is not configured"))?;
        let key = provider
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("{EXCHANGE_RATE_KEY_VAR} is not set"))?;
        Ok((&provider.base_url, key))
    }
}
