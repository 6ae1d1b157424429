//! User domain entity
//!
//! A user is identified by the Stellar wallet that signs their transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A wallet-backed user account
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    /// Normalized (upper-case) `G...` address
    pub wallet_address: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub about: Option<String>,
    /// SHA-256 hash of the API key (never expose)
    #[serde(skip_serializing)]
    pub api_key_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name to show in the UI, falling back to the shortened wallet
    pub fn label(&self) -> String {
        self.display_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| crate::domain::ledger::summarize_account(Some(&self.wallet_address)))
    }
}

/// Data needed to create a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub wallet_address: String,
    pub display_name: Option<String>,
    pub api_key_hash: String,
}

/// Profile fields a user may edit. `None` leaves the field untouched,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
    pub about: Option<Option<String>>,
}
