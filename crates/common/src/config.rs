use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::types::{NftTransfer, SortOrder};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub general: General,
    pub explorer: Explorer,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub cache: Cache,
    #[serde(default)]
    pub scoring: Scoring,
    #[serde(default)]
    pub fallbacks: Fallbacks,
    pub observability: Observability,
    pub web: Option<Web>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Explorer {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Prefix the percent-encoded target URL is appended to.
    pub relay_url: Option<String>,
    pub page_size: u32,
    #[serde(default)]
    pub sort: SortOrder,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub balance_ms: u64,
    pub transaction_count_ms: u64,
    pub token_transfers_ms: u64,
    pub nft_direct_ms: u64,
    pub nft_relay_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            balance_ms: 8_000,
            transaction_count_ms: 5_000,
            token_transfers_ms: 8_000,
            nft_direct_ms: 8_000,
            nft_relay_ms: 5_000,
        }
    }
}

impl Timeouts {
    pub fn balance(&self) -> Duration {
        Duration::from_millis(self.balance_ms)
    }

    pub fn transaction_count(&self) -> Duration {
        Duration::from_millis(self.transaction_count_ms)
    }

    pub fn token_transfers(&self) -> Duration {
        Duration::from_millis(self.token_transfers_ms)
    }

    pub fn nft_direct(&self) -> Duration {
        Duration::from_millis(self.nft_direct_ms)
    }

    pub fn nft_relay(&self) -> Duration {
        Duration::from_millis(self.nft_relay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Cache {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Scoring {
    pub weights: ScoringWeights,
    pub multipliers: NftMultipliers,
    pub thresholds: ActivityThresholds,
}

/// Points per unit of each account signal.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub balance: f64,
    pub transaction: f64,
    pub token_transfer: f64,
    pub soulbound_nft: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            balance: 100.0,
            transaction: 10.0,
            token_transfer: 5.0,
            soulbound_nft: 50.0,
        }
    }
}

/// Total-score multiplier by SoulBound NFT count.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct NftMultipliers {
    pub none: f64,
    pub one: f64,
    pub two: f64,
    pub three_or_more: f64,
}

impl Default for NftMultipliers {
    fn default() -> Self {
        Self {
            none: 1.0,
            one: 1.5,
            two: 2.5,
            three_or_more: 3.0,
        }
    }
}

/// Minimum transaction counts for the activity tiers, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActivityThresholds {
    pub power_user: u64,
    pub veteran: u64,
    pub active: u64,
    pub regular: u64,
}

impl Default for ActivityThresholds {
    fn default() -> Self {
        Self {
            power_user: 500,
            veteran: 200,
            active: 100,
            regular: 50,
        }
    }
}

/// Per-address data used when the explorer cannot answer.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Fallbacks {
    /// Manually verified transaction counts.
    pub transaction_counts: HashMap<String, u64>,
    /// Known NFT transfers, same shape as `tokennfttx` records.
    pub nft_holdings: HashMap<String, Vec<NftTransfer>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Observability {
    pub prometheus_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Web {
    pub port: u16,
    pub host: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.explorer.base_url.trim().is_empty(),
            "explorer.base_url must be set"
        );
        anyhow::ensure!(self.explorer.page_size > 0, "explorer.page_size must be > 0");

        let t = &self.timeouts;
        anyhow::ensure!(
            [
                t.balance_ms,
                t.transaction_count_ms,
                t.token_transfers_ms,
                t.nft_direct_ms,
                t.nft_relay_ms,
            ]
            .iter()
            .all(|ms| *ms > 0),
            "timeouts must all be > 0"
        );

        let w = &self.scoring.weights;
        anyhow::ensure!(
            [w.balance, w.transaction, w.token_transfer, w.soulbound_nft]
                .iter()
                .all(|x| *x >= 0.0),
            "scoring.weights must be >= 0"
        );

        // Non-decreasing steps keep the total monotonic in the NFT count.
        let m = &self.scoring.multipliers;
        anyhow::ensure!(m.none >= 1.0, "scoring.multipliers.none must be >= 1.0");
        anyhow::ensure!(
            m.none <= m.one && m.one <= m.two && m.two <= m.three_or_more,
            "scoring.multipliers must be non-decreasing"
        );

        let th = &self.scoring.thresholds;
        anyhow::ensure!(
            th.power_user > th.veteran && th.veteran > th.active && th.active > th.regular,
            "scoring.thresholds must be strictly descending"
        );

        anyhow::ensure!(self.cache.ttl_secs > 0, "cache.ttl_secs must be > 0");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[general]
log_level = "info"

[explorer]
base_url = "https://api.etherscan.io/api"
page_size = 100

[observability]
prometheus_port = 9095
"#;

    #[test]
    fn test_load_default_config() {
        let config = Config::from_toml_str(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config.general.log_level, "info");
        assert!(config.explorer.relay_url.is_some());
        assert_eq!(config.timeouts.nft_relay(), Duration::from_secs(5));
        assert_eq!(config.cache.ttl_secs, 30);
    }

    #[test]
    fn test_web_config_section() {
        let config = Config::from_toml_str(include_str!("../../../config/default.toml")).unwrap();
        let web = config.web.expect("web section should be present");
        assert_eq!(web.port, 8080);
        assert_eq!(web.host, "0.0.0.0");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        assert!(config.web.is_none());
        assert_eq!(config.general.log_format, LogFormat::Json);
        assert_eq!(config.explorer.sort, SortOrder::Desc);
        assert_eq!(config.scoring.multipliers, NftMultipliers::default());
        assert_eq!(config.scoring.thresholds.power_user, 500);
        assert!(config.fallbacks.transaction_counts.is_empty());
        assert_eq!(config.timeouts.transaction_count(), Duration::from_secs(5));
    }

    #[test]
    fn test_pretty_log_format_parses() {
        let toml = MINIMAL.replace(
            r#"log_level = "info""#,
            "log_level = \"info\"\nlog_format = \"pretty\"",
        );
        let config = Config::from_toml_str(&toml).unwrap();
        assert_eq!(config.general.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_fallback_tables_parse() {
        let toml = format!(
            r#"{MINIMAL}
[fallbacks.transaction_counts]
"0xAbC0000000000000000000000000000000000001" = 321

[[fallbacks.nft_holdings."0xabc0000000000000000000000000000000000001"]]
token_name = "SoulBoundNFT"
token_id = "7"
to = "0xabc0000000000000000000000000000000000001"
"#
        );
        let config = Config::from_toml_str(&toml).unwrap();
        assert_eq!(
            config.fallbacks.transaction_counts["0xAbC0000000000000000000000000000000000001"],
            321
        );
        let nfts = &config.fallbacks.nft_holdings["0xabc0000000000000000000000000000000000001"];
        assert_eq!(nfts.len(), 1);
        assert_eq!(nfts[0].token_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_rejects_decreasing_multipliers() {
        let toml = format!(
            r#"{MINIMAL}
[scoring.multipliers]
none = 1.0
one = 2.0
two = 1.5
three_or_more = 3.0
"#
        );
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("non-decreasing"));
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let toml = format!(
            r#"{MINIMAL}
[scoring.thresholds]
power_user = 100
veteran = 200
active = 50
regular = 10
"#
        );
        assert!(Config::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let toml = format!(
            r#"{MINIMAL}
[timeouts]
balance_ms = 0
"#
        );
        assert!(Config::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, MINIMAL.as_bytes()).unwrap();
        let config = Config::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.observability.prometheus_port, 9095);
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = Config::load_from("/definitely/missing/config.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
