//! Paylink domain entity
//!
//! A paylink is a public handle that resolves to a receiving address.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;
use crate::error::DomainError;

/// Unique identifier for a paylink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaylinkId(pub Uuid);

impl PaylinkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PaylinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PaylinkId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PaylinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A public payment handle
#[derive(Debug, Clone, Serialize)]
pub struct Paylink {
    pub id: PaylinkId,
    pub handle: String,
    pub owner_id: UserId,
    pub receiving_address: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Paylink {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// Data needed to create a new paylink
#[derive(Debug, Clone)]
pub struct NewPaylink {
    pub handle: String,
    pub owner_id: UserId,
    pub receiving_address: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

fn handle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{1,63}$").expect("static regex"))
}

/// Lower-case and validate a paylink handle
pub fn normalize_handle(handle: &str) -> Result<String, DomainError> {
    let normalized = handle.trim().to_lowercase();
    if !handle_re().is_match(&normalized) {
        return Err(DomainError::Validation(
            "Handles must be 2-64 characters of letters, numbers, '-' or '_' and start with a letter or number."
                .to_string(),
        ));
    }
    Ok(normalized)
}
