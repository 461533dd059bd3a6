use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::loader::{LoadStrategy, RetryPolicy};
use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub loading: LoadingConfig,
    #[serde(default)]
    pub footer: FooterConfig,
}

/// Where the JSON documents live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL that `contact_path` and `feed_path` are resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_contact_path")]
    pub contact_path: String,
    #[serde(default = "default_feed_path")]
    pub feed_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Contact + feed in parallel, any failure fails the whole load.
    FailFast,
    /// Contact only, linear backoff between attempts.
    Retry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadingConfig {
    #[serde(default = "default_strategy")]
    pub strategy: StrategyKind,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FooterConfig {
    /// Name shown at the left edge of the footer.
    #[serde(default = "default_owner")]
    pub owner: String,
    /// Initial theme handed to the widget on startup.
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            contact_path: default_contact_path(),
            feed_path: default_feed_path(),
        }
    }
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            max_retries: default_max_retries(),
            backoff_step_ms: default_backoff_step_ms(),
        }
    }
}

impl Default for FooterConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            theme: default_theme(),
        }
    }
}

impl LoadingConfig {
    pub fn load_strategy(&self) -> LoadStrategy {
        match self.strategy {
            StrategyKind::FailFast => LoadStrategy::FailFast,
            StrategyKind::Retry => LoadStrategy::Retry(RetryPolicy {
                max_retries: self.max_retries,
                backoff_step: Duration::from_millis(self.backoff_step_ms),
            }),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/".to_string()
}

fn default_contact_path() -> String {
    "contact.json".to_string()
}

fn default_feed_path() -> String {
    "blog.json".to_string()
}

fn default_strategy() -> StrategyKind {
    StrategyKind::FailFast
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_step_ms() -> u64 {
    1000
}

fn default_owner() -> String {
    "guest@footer".to_string()
}

fn default_theme() -> String {
    "green".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source.contact_path, "contact.json");
        assert_eq!(config.source.feed_path, "blog.json");
        assert_eq!(config.loading.strategy, StrategyKind::FailFast);
        assert_eq!(config.loading.max_retries, 3);
        assert_eq!(config.loading.backoff_step_ms, 1000);
        assert_eq!(config.footer.theme, "green");
        assert!(config.source.base_url.starts_with("http://"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [loading]
            strategy = "retry"
            max_retries = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.loading.strategy, StrategyKind::Retry);
        assert_eq!(config.loading.max_retries, 5);
        assert_eq!(config.loading.backoff_step_ms, 1000);
        assert_eq!(config.source.contact_path, "contact.json");
    }

    #[test]
    fn retry_strategy_carries_policy() {
        let loading = LoadingConfig {
            strategy: StrategyKind::Retry,
            max_retries: 2,
            backoff_step_ms: 250,
        };
        match loading.load_strategy() {
            LoadStrategy::Retry(policy) => {
                assert_eq!(policy.max_retries, 2);
                assert_eq!(policy.backoff_step, Duration::from_millis(250));
            }
            other => panic!("expected retry strategy, got {other:?}"),
        }
    }

    #[test]
    fn config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.footer.owner, Config::default().footer.owner);
    }
}
