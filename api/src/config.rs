use std::env;

use anyhow::Context;
use serde::Serialize;

pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
pub const PUBLIC_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";
pub const LOCAL_PASSPHRASE: &str = "Standalone Network ; February 2017";

const DEFAULT_MEMBERSHIP_DURATION_SECONDS: i64 = 60 * 60 * 24 * 30;
const DEFAULT_TRANSFER_COOLDOWN_SECONDS: i64 = 60 * 60 * 24;
const DEFAULT_SETTLEMENT_TIMEOUT_SECONDS: i64 = 20;
const DEFAULT_SETTLEMENT_POLL_MILLIS: i64 = 1200;

/// Addresses of the deployed Soroban contracts the web client talks to.
///
/// The API never invokes these itself; they are echoed to clients and
/// recorded against invoices and listings.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ContractIds {
    pub membership: String,
    pub invoice_registry: String,
    pub marketplace: String,
    pub split_router: String,
    pub registrar: String,
    pub badge: String,
    pub native_asset: String,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Base URL for the API
    pub api_base_url: String,
    pub horizon_url: String,
    pub network_passphrase: String,
    pub explorer_base_url: String,
    pub explorer_network: String,
    pub contracts: ContractIds,
    /// Wallet that receives platform fees
    pub platform_treasury_address: Option<String>,
    pub platform_fee_bps: u32,
    /// Fallback membership price in stroops
    pub membership_price_stroops: i128,
    pub subscription_price_usd: String,
    pub membership_duration_seconds: i64,
    pub transfer_cooldown_seconds: i64,
    pub settlement_timeout_seconds: i64,
    pub settlement_poll_millis: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let platform_fee_bps = env::var("PLATFORM_FEE_BPS")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(0);
        if platform_fee_bps > 10_000 {
            anyhow::bail!("PLATFORM_FEE_BPS must not exceed 10000");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            horizon_url: env::var("STELLAR_HORIZON_URL")
                .unwrap_or_else(|_| "https://horizon-testnet.stellar.org".to_string()),
            network_passphrase: resolve_network_passphrase(
                env::var("STELLAR_NETWORK").ok().as_deref(),
                env::var("STELLAR_NETWORK_PASSPHRASE").ok().as_deref(),
            ),
            explorer_base_url: env::var("STELLAR_EXPLORER_BASE_URL")
                .unwrap_or_else(|_| "https://stellar.expert/explorer".to_string()),
            explorer_network: env::var("STELLAR_EXPLORER_NETWORK")
                .unwrap_or_else(|_| "testnet".to_string()),
            contracts: ContractIds {
                membership: trimmed_var("LUMENPASS_CONTRACT_ID").unwrap_or_default(),
                invoice_registry: trimmed_var("INVOICE_REGISTRY_CONTRACT_ID")
                    .or_else(|| trimmed_var("INVOICE_REGISTRY_CONTRACT_ADDRESS"))
                    .unwrap_or_default(),
                marketplace: trimmed_var("MARKETPLACE_CONTRACT_ID").unwrap_or_default(),
                split_router: trimmed_var("SPLIT_ROUTER_CONTRACT_ID").unwrap_or_default(),
                registrar: trimmed_var("REGISTRAR_CONTRACT_ID").unwrap_or_default(),
                badge: trimmed_var("BADGE_CONTRACT_ID").unwrap_or_default(),
                native_asset: trimmed_var("NATIVE_ASSET_CONTRACT_ID")
                    .unwrap_or_else(|| "native".to_string()),
            },
            platform_treasury_address: trimmed_var("PLATFORM_TREASURY_ADDRESS"),
            platform_fee_bps,
            membership_price_stroops: env::var("MEMBERSHIP_PRICE_STROOPS")
                .ok()
                .and_then(|v| v.trim().parse::<i128>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(0),
            subscription_price_usd: env::var("SUBSCRIPTION_PRICE_USD")
                .unwrap_or_else(|_| "99".to_string()),
            membership_duration_seconds: parse_positive_int(
                env::var("MEMBERSHIP_DURATION_SECONDS").ok().as_deref(),
                DEFAULT_MEMBERSHIP_DURATION_SECONDS,
            ),
            transfer_cooldown_seconds: parse_positive_int(
                env::var("MEMBERSHIP_TRANSFER_COOLDOWN_SECONDS").ok().as_deref(),
                DEFAULT_TRANSFER_COOLDOWN_SECONDS,
            ),
            settlement_timeout_seconds: parse_positive_int(
                env::var("SETTLEMENT_TIMEOUT_SECONDS").ok().as_deref(),
                DEFAULT_SETTLEMENT_TIMEOUT_SECONDS,
            ),
            settlement_poll_millis: parse_positive_int(
                env::var("SETTLEMENT_POLL_MILLIS").ok().as_deref(),
                DEFAULT_SETTLEMENT_POLL_MILLIS,
            ),
        })
    }
}

fn trimmed_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Map symbolic network names to passphrases.
///
/// Wallets reject names like "TESTNET", so a symbolic `STELLAR_NETWORK` wins
/// over an explicit passphrase, and testnet is the fallback.
pub fn resolve_network_passphrase(network: Option<&str>, passphrase: Option<&str>) -> String {
    match network.map(|n| n.trim().to_uppercase()).as_deref() {
        Some("PUBLIC") => PUBLIC_PASSPHRASE.to_string(),
        Some("TESTNET") => TESTNET_PASSPHRASE.to_string(),
        Some("LOCAL") => LOCAL_PASSPHRASE.to_string(),
        _ => passphrase
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(TESTNET_PASSPHRASE)
            .to_string(),
    }
}

/// Parse a positive integer setting, falling back on anything unusable
pub fn parse_positive_int(value: Option<&str>, fallback: i64) -> i64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.floor() as i64)
        .filter(|v| *v > 0)
        .unwrap_or(fallback)
}
