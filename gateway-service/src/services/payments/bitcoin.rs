//! Bitcoin payment rail.
//!
//! Quotes a deposit amount against a fixed BTC/USD rate and checks the
//! receive address for incoming funds through a block explorer API.

use anyhow::{Result, anyhow};
use gateway_core::error::AppError;
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

const SATS_PER_BTC: u64 = 100_000_000;

/// Bitcoin rail configuration.
#[derive(Debug, Clone)]
pub struct BitcoinConfig {
    /// Address deposits are quoted against.
    pub receive_address: String,
    /// Esplora-compatible explorer base URL.
    pub explorer_api_base: String,
    /// Fixed conversion rate used for quoting.
    pub btc_usd_rate: Decimal,
}

#[derive(Clone)]
pub struct BitcoinClient {
    client: Client,
    config: BitcoinConfig,
}

/// Deposit quote handed to the payer.
#[derive(Debug, Clone)]
pub struct BitcoinQuote {
    pub address: String,
    pub amount_btc: Decimal,
}

impl BitcoinClient {
    pub fn new(config: BitcoinConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Check if the bitcoin rail is configured.
    pub fn is_configured(&self) -> bool {
        !self.config.receive_address.is_empty() && self.config.btc_usd_rate > Decimal::ZERO
    }

    /// Quote a BTC deposit for a USD amount, rounded to satoshi precision.
    pub fn quote_deposit(&self, amount_usd: &Decimal) -> Result<BitcoinQuote, AppError> {
        if !self.is_configured() {
            return Err(AppError::ConfigError(anyhow!(
                "bitcoin payments are not configured"
            )));
        }

        let amount_btc = amount_usd
            .checked_div(self.config.btc_usd_rate)
            .ok_or_else(|| AppError::ConfigError(anyhow!("invalid BTC/USD rate")))?
            .round_dp(8);

        Ok(BitcoinQuote {
            address: self.config.receive_address.clone(),
            amount_btc,
        })
    }

    /// Check whether the address has received at least the quoted amount.
    /// Spends from the address are ignored; only total funds received count.
    pub async fn address_funded(&self, address: &str, amount_btc: &Decimal) -> Result<bool> {
        let required_sats = required_sats(amount_btc)
            .ok_or_else(|| anyhow!("deposit amount out of range: {}", amount_btc))?;

        let url = format!("{}/address/{}", self.config.explorer_api_base, address);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("explorer returned {}: {}", status, body));
        }

        let stats: AddressStats = response.json().await?;
        Ok(is_funded(&stats, required_sats))
    }
}

fn required_sats(amount_btc: &Decimal) -> Option<u64> {
    (amount_btc * Decimal::from(SATS_PER_BTC)).trunc().to_u64()
}

fn is_funded(stats: &AddressStats, required_sats: u64) -> bool {
    stats.chain_stats.funded_txo_sum >= required_sats
}

// ============================================================================
// Explorer API Response Types (Esplora-compatible)
// ============================================================================

#[derive(Debug, Deserialize)]
struct AddressStats {
    chain_stats: ChainStats,
}

#[derive(Debug, Deserialize)]
struct ChainStats {
    funded_txo_sum: u64,
}
