//! Simulation configuration.
//!
//! Configuration can be loaded from environment variables (prefixed with
//! `ESCROW_`), from a serde-compatible file, or built programmatically.

use serde::{Deserialize, Serialize};

use crate::{EscrowError, Result, Wei, WEI_PER_ETHER};

/// Parameters for a simulated deployment: how many genesis accounts to
/// create and how much to fund each with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of genesis accounts. Account 0 deploys and owns the escrow;
    /// account 1 (when present) is the default contractor.
    pub accounts: u32,

    /// Initial funding per genesis account, in wei.
    pub funding_wei: Wei,

    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            accounts: 3,
            funding_wei: 10 * WEI_PER_ETHER,
            log_level: "info".to_string(),
        }
    }
}

impl SimConfig {
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    /// Load configuration from environment variables:
    /// - `ESCROW_ACCOUNTS` - number of genesis accounts
    /// - `ESCROW_FUNDING_WEI` - initial funding per account in wei
    /// - `ESCROW_LOG_LEVEL` - logging level
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(accounts) = std::env::var("ESCROW_ACCOUNTS") {
            config.accounts = accounts.parse().map_err(|e| {
                EscrowError::ConfigError(format!("Invalid ESCROW_ACCOUNTS: {}", e))
            })?;
        }

        if let Ok(funding) = std::env::var("ESCROW_FUNDING_WEI") {
            config.funding_wei = funding.parse().map_err(|e| {
                EscrowError::ConfigError(format!("Invalid ESCROW_FUNDING_WEI: {}", e))
            })?;
        }

        if let Ok(level) = std::env::var("ESCROW_LOG_LEVEL") {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.accounts == 0 {
            return Err(EscrowError::ConfigError(
                "at least one genesis account is required (the deployer)".into(),
            ));
        }
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(EscrowError::ConfigError(format!(
                "unknown log level: {}",
                other
            ))),
        }
    }
}

/// Builder for `SimConfig`.
#[derive(Clone, Debug, Default)]
pub struct SimConfigBuilder {
    accounts: Option<u32>,
    funding_wei: Option<Wei>,
    log_level: Option<String>,
}

impl SimConfigBuilder {
    pub fn accounts(mut self, accounts: u32) -> Self {
        self.accounts = Some(accounts);
        self
    }

    pub fn funding_wei(mut self, funding_wei: Wei) -> Self {
        self.funding_wei = Some(funding_wei);
        self
    }

    pub fn log_level(mut self, log_level: impl Into<String>) -> Self {
        self.log_level = Some(log_level.into());
        self
    }

    pub fn build(self) -> Result<SimConfig> {
        let defaults = SimConfig::default();
        let config = SimConfig {
            accounts: self.accounts.unwrap_or(defaults.accounts),
            funding_wei: self.funding_wei.unwrap_or(defaults.funding_wei),
            log_level: self.log_level.unwrap_or(defaults.log_level),
        };
        config.validate()?;
        Ok(config)
    }
}
