//! Horizon client port trait
//!
//! Defines the read-only slice of the Stellar Horizon API the backend needs
//! to verify payments.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::HorizonError;

/// Helper to deserialize null as default (empty vec, etc.)
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// Horizon transaction representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonTransaction {
    pub hash: String,
    pub successful: bool,
    #[serde(default)]
    pub source_account: Option<String>,
    #[serde(default)]
    pub memo_type: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl HorizonTransaction {
    /// Text memo, if the transaction carries one
    pub fn text_memo(&self) -> Option<&str> {
        match self.memo_type.as_deref() {
            Some("text") => self.memo.as_deref(),
            _ => None,
        }
    }
}

/// Horizon operation representation (payments carry `from`/`to`/`amount`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonOperation {
    pub id: String,
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    /// Decimal XLM amount, e.g. "12.5000000"
    #[serde(default)]
    pub amount: Option<String>,
}

impl HorizonOperation {
    pub fn is_native_payment(&self) -> bool {
        self.op_type == "payment" && self.asset_type.as_deref() == Some("native")
    }
}

/// Account balance line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonBalance {
    pub asset_type: String,
    pub balance: String,
}

/// Horizon account representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonAccount {
    pub account_id: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub balances: Vec<HorizonBalance>,
}

impl HorizonAccount {
    /// Native (XLM) balance string
    pub fn native_balance(&self) -> Option<&str> {
        self.balances
            .iter()
            .find(|b| b.asset_type == "native")
            .map(|b| b.balance.as_str())
    }
}

/// Horizon API client trait
#[async_trait]
pub trait HorizonClient: Send + Sync {
    /// Fetch a transaction by hash
    async fn get_transaction(&self, hash: &str) -> Result<HorizonTransaction, HorizonError>;

    /// List the operations of a transaction
    async fn list_operations(&self, hash: &str) -> Result<Vec<HorizonOperation>, HorizonError>;

    /// Fetch an account with its balances
    async fn get_account(&self, address: &str) -> Result<HorizonAccount, HorizonError>;
}
