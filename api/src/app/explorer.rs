//! Links to ledger resources for display next to records

use serde::Serialize;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct ExplorerLinks {
    horizon_url: String,
    explorer_base_url: String,
    explorer_network: String,
}

/// Links attached to a response
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ResourceLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
}

impl ExplorerLinks {
    pub fn new(horizon_url: &str, explorer_base_url: &str, explorer_network: &str) -> Self {
        Self {
            horizon_url: horizon_url.trim_end_matches('/').to_string(),
            explorer_base_url: explorer_base_url.trim_end_matches('/').to_string(),
            explorer_network: explorer_network.trim().to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.horizon_url,
            &config.explorer_base_url,
            &config.explorer_network,
        )
    }

    pub fn transaction_url(&self, hash: Option<&str>) -> Option<String> {
        non_empty(hash).map(|h| format!("{}/transactions/{}", self.horizon_url, h))
    }

    pub fn account_url(&self, address: Option<&str>) -> Option<String> {
        non_empty(address).map(|a| format!("{}/accounts/{}", self.horizon_url, a))
    }

    pub fn contract_url(&self, contract_id: Option<&str>) -> Option<String> {
        non_empty(contract_id).map(|c| {
            format!(
                "{}/{}/contract/{}",
                self.explorer_base_url, self.explorer_network, c
            )
        })
    }

    pub fn links(
        &self,
        tx_hash: Option<&str>,
        account: Option<&str>,
        contract_id: Option<&str>,
    ) -> ResourceLinks {
        ResourceLinks {
            transaction: self.transaction_url(tx_hash),
            account: self.account_url(account),
            contract: self.contract_url(contract_id),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
