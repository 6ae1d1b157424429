//! Payout schedule domain entities
//!
//! A schedule is a named list of recipients with basis-point shares. Each
//! on-chain distribution through the split router is recorded as an execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;
use crate::domain::ledger::{ensure_total_bps, serialize_stroops};
use crate::error::DomainError;

/// Unique identifier for a payout schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayoutScheduleId(pub Uuid);

impl PayoutScheduleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PayoutScheduleId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PayoutScheduleId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PayoutScheduleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One payee of a schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRecipient {
    pub address: String,
    pub share_bps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayoutSchedule {
    pub id: PayoutScheduleId,
    pub owner_id: UserId,
    pub name: String,
    pub recipients: Vec<PayoutRecipient>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PayoutSchedule {
    pub fn shares(&self) -> Vec<u32> {
        self.recipients.iter().map(|r| r.share_bps).collect()
    }
}

#[derive(Debug, Clone)]
pub struct NewPayoutSchedule {
    pub owner_id: UserId,
    pub name: String,
    pub recipients: Vec<PayoutRecipient>,
}

/// A recorded split-router distribution
#[derive(Debug, Clone, Serialize)]
pub struct PayoutExecution {
    pub id: Uuid,
    pub schedule_id: PayoutScheduleId,
    pub owner_id: UserId,
    pub tx_hash: String,
    #[serde(serialize_with = "serialize_stroops")]
    pub total_amount: i128,
    pub executed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayoutExecution {
    pub schedule_id: PayoutScheduleId,
    pub owner_id: UserId,
    pub tx_hash: String,
    pub total_amount: i128,
    pub executed_at: DateTime<Utc>,
}

/// Raw recipient input; shares may arrive negative from clients
#[derive(Debug, Clone, Deserialize)]
pub struct RecipientInput {
    pub address: String,
    pub share_bps: i64,
    #[serde(default)]
    pub label: Option<String>,
}

/// Validate schedule recipients.
///
/// Addresses are normalized, shares floored at zero, blank labels dropped.
/// At least one recipient is required and shares must total 10000 bps.
pub fn sanitize_recipients(
    inputs: &[RecipientInput],
) -> Result<Vec<PayoutRecipient>, DomainError> {
    if inputs.is_empty() {
        return Err(DomainError::Validation(
            "Add at least one recipient".to_string(),
        ));
    }

    let recipients = inputs
        .iter()
        .map(|input| {
            let address = crate::domain::ledger::require_account_address(&input.address)?;
            let share_bps = input.share_bps.clamp(0, i64::from(u32::MAX)) as u32;
            let label = input
                .label
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from);
            Ok(PayoutRecipient {
                address,
                share_bps,
                label,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    let shares: Vec<u32> = recipients.iter().map(|r| r.share_bps).collect();
    ensure_total_bps(&shares)?;
    Ok(recipients)
}
