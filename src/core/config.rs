use crate::core::compose::CompositionTable;
use crate::core::rates::Benchmark;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

/// Cache expiry knobs, in seconds. Historical rates never change, so their
/// TTL only bounds memory; live rates go stale within minutes.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    pub historical_ttl_secs: u64,
    pub live_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            historical_ttl_secs: 7 * 24 * 3600,
            live_ttl_secs: 15 * 60,
        }
    }
}

impl CacheConfig {
    pub fn historical_ttl(&self) -> Duration {
        Duration::from_secs(self.historical_ttl_secs)
    }

    pub fn live_ttl(&self) -> Duration {
        Duration::from_secs(self.live_ttl_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub benchmarks: Vec<Benchmark>,
    #[serde(default)]
    pub composition: CompositionTable,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub ledger_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "reel")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    /// Ledger file location: explicit config path, else the platform data
    /// directory.
    pub fn ledger_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.ledger_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("in", "codito", "reel")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join("ledger.json"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::BenchmarkKind;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
benchmarks:
  - id: usd
    unit: "$"
    kind: currency
    ticker: "USDTRY=X"
  - id: gold
    unit: gr
    kind: gold_gram
    spot_ticker: "XAUUSD=X"
    fx_ticker: "USDTRY=X"
  - id: inflation
    unit: TL
    kind: inflation
    monthly_rate: 0.03
composition:
  version: 1
  codes:
    AFT:
      Equity: 0.9
      Cash: 0.1
ledger_path: "/tmp/ledger.json"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.benchmarks.len(), 3);
        assert_eq!(config.benchmarks[0].id, "usd");
        match &config.benchmarks[2].kind {
            BenchmarkKind::Inflation { monthly_rate } => assert_eq!(*monthly_rate, 0.03),
            other => panic!("Expected inflation, got {other:?}"),
        }
        assert_eq!(config.composition.version, 1);
        assert_eq!(config.composition.codes["AFT"]["Equity"], 0.9);
        assert_eq!(
            config.ledger_path().unwrap(),
            PathBuf::from("/tmp/ledger.json")
        );

        // Defaults kick in for omitted sections.
        assert_eq!(config.cache.live_ttl_secs, 15 * 60);
        assert_eq!(
            config.providers.yahoo.unwrap().base_url,
            "https://query1.finance.yahoo.com"
        );
    }

    #[test]
    fn test_provider_override() {
        let yaml_str = r#"
benchmarks: []
providers:
  yahoo:
    base_url: "http://example.com/yahoo"
cache:
  historical_ttl_secs: 60
  live_ttl_secs: 5
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(
            config.providers.yahoo.unwrap().base_url,
            "http://example.com/yahoo"
        );
        assert_eq!(config.cache.historical_ttl(), Duration::from_secs(60));
        assert_eq!(config.cache.live_ttl(), Duration::from_secs(5));
    }
}
