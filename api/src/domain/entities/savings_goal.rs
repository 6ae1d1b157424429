//! Savings goal domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;
use crate::domain::ledger::serialize_stroops;
use crate::error::DomainError;

/// Unique identifier for a savings goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SavingsGoalId(pub Uuid);

impl SavingsGoalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SavingsGoalId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SavingsGoalId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SavingsGoalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SavingsGoal {
    pub id: SavingsGoalId,
    pub owner_id: UserId,
    pub name: String,
    #[serde(serialize_with = "serialize_stroops")]
    pub target_amount: i128,
    #[serde(serialize_with = "serialize_stroops")]
    pub current_amount: i128,
    pub target_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavingsGoal {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Balance after applying a movement of `amount`
    pub fn apply(&self, movement_type: MovementType, amount: i128) -> Result<i128, DomainError> {
        if amount <= 0 {
            return Err(DomainError::Validation(
                "Amount must be greater than zero".to_string(),
            ));
        }
        let next = match movement_type {
            MovementType::Credit => self.current_amount.checked_add(amount),
            MovementType::Debit => self.current_amount.checked_sub(amount),
        }
        .ok_or_else(|| DomainError::Validation("Amount is too large".to_string()))?;

        if next < 0 {
            return Err(DomainError::Validation(
                "Insufficient balance for this withdrawal".to_string(),
            ));
        }
        Ok(next)
    }

    /// Balance after `movement`, refusing archived goals
    pub fn balance_after(&self, movement: &NewSavingsMovement) -> Result<i128, DomainError> {
        if self.is_archived() {
            return Err(DomainError::Conflict(
                "Archived goals cannot record movements".to_string(),
            ));
        }
        self.apply(movement.movement_type, movement.amount)
    }
}

#[derive(Debug, Clone)]
pub struct NewSavingsGoal {
    pub owner_id: UserId,
    pub name: String,
    pub target_amount: i128,
    pub target_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Detail edits. `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct SavingsGoalUpdate {
    pub name: Option<String>,
    pub target_amount: Option<i128>,
    pub target_date: Option<Option<DateTime<Utc>>>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Credit,
    Debit,
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementType::Credit => write!(f, "credit"),
            MovementType::Debit => write!(f, "debit"),
        }
    }
}

impl std::str::FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "credit" => Ok(MovementType::Credit),
            "debit" => Ok(MovementType::Debit),
            _ => Err(format!("Unknown movement type: {}", s)),
        }
    }
}

/// A deposit into or withdrawal from a goal
#[derive(Debug, Clone, Serialize)]
pub struct SavingsMovement {
    pub id: Uuid,
    pub goal_id: SavingsGoalId,
    pub owner_id: UserId,
    pub movement_type: MovementType,
    #[serde(serialize_with = "serialize_stroops")]
    pub amount: i128,
    pub tx_hash: Option<String>,
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSavingsMovement {
    pub goal_id: SavingsGoalId,
    pub owner_id: UserId,
    pub movement_type: MovementType,
    pub amount: i128,
    pub tx_hash: Option<String>,
    pub memo: Option<String>,
}
