//! Savings goal service

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::entities::{
    MovementType, NewSavingsGoal, NewSavingsMovement, SavingsGoal, SavingsGoalId,
    SavingsGoalUpdate, SavingsMovement, User,
};
use crate::domain::ledger::{normalize_optional_tx_hash, parse_non_negative_stroops, parse_stroops};
use crate::domain::ports::SavingsGoalRepository;
use crate::error::{AppError, DomainError};

const MAX_MEMO_LEN: usize = 140;

/// Service for managing savings goals
pub struct SavingsService<SR>
where
    SR: SavingsGoalRepository,
{
    goals: Arc<SR>,
}

impl<SR> SavingsService<SR>
where
    SR: SavingsGoalRepository,
{
    pub fn new(goals: Arc<SR>) -> Self {
        Self { goals }
    }

    pub async fn list_for_owner(&self, owner: &User) -> Result<Vec<SavingsGoal>, AppError> {
        Ok(self.goals.list_for_owner(&owner.id).await?)
    }

    pub async fn list_movements(
        &self,
        owner: &User,
        id: &SavingsGoalId,
    ) -> Result<Vec<SavingsMovement>, AppError> {
        self.owned_goal(owner, id).await?;
        Ok(self.goals.list_movements(id).await?)
    }

    pub async fn create(
        &self,
        owner: &User,
        name: &str,
        target_amount: &str,
        target_date: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> Result<SavingsGoal, AppError> {
        let name = require_name(name)?;
        let target_amount = parse_non_negative_stroops(target_amount)?;

        Ok(self
            .goals
            .create(&NewSavingsGoal {
                owner_id: owner.id,
                name,
                target_amount,
                target_date,
                notes: trimmed(notes),
            })
            .await?)
    }

    /// Edit goal details; an explicit `Some(None)` clears date or notes
    pub async fn update_details(
        &self,
        owner: &User,
        id: &SavingsGoalId,
        update: SavingsGoalUpdate,
    ) -> Result<SavingsGoal, AppError> {
        self.owned_goal(owner, id).await?;
        if let Some(target) = update.target_amount {
            if target < 0 {
                return Err(AppError::BadRequest(
                    "Target amount must be zero or positive".to_string(),
                ));
            }
        }
        let update = SavingsGoalUpdate {
            name: update.name.as_deref().map(require_name).transpose()?,
            target_amount: update.target_amount,
            target_date: update.target_date,
            notes: update.notes.map(trimmed),
        };
        Ok(self.goals.update_details(id, &update).await?)
    }

    pub async fn archive(&self, owner: &User, id: &SavingsGoalId) -> Result<SavingsGoal, AppError> {
        let goal = self.owned_goal(owner, id).await?;
        if goal.is_archived() {
            return Ok(goal);
        }
        Ok(self.goals.archive(id, Utc::now()).await?)
    }

    /// Deposit into or withdraw from a goal
    pub async fn record_movement(
        &self,
        owner: &User,
        id: &SavingsGoalId,
        movement_type: MovementType,
        amount: &str,
        tx_hash: Option<&str>,
        memo: Option<String>,
    ) -> Result<(SavingsGoal, SavingsMovement), AppError> {
        let goal = self.owned_goal(owner, id).await?;
        if goal.is_archived() {
            return Err(AppError::Domain(DomainError::Conflict(
                "Archived goals cannot record movements".to_string(),
            )));
        }

        let amount = parse_stroops(amount)?;
        goal.apply(movement_type, amount)?;

        let tx_hash = normalize_optional_tx_hash(tx_hash)?;
        if let Some(hash) = &tx_hash {
            if self.goals.find_movement_by_tx(hash).await?.is_some() {
                return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                    "Transaction {} already recorded",
                    hash
                ))));
            }
        }

        let memo = trimmed(memo);
        if memo.as_ref().map(|m| m.chars().count() > MAX_MEMO_LEN).unwrap_or(false) {
            return Err(AppError::BadRequest(format!(
                "Memo must be at most {} characters",
                MAX_MEMO_LEN
            )));
        }

        let movement = NewSavingsMovement {
            goal_id: *id,
            owner_id: owner.id,
            movement_type,
            amount,
            tx_hash,
            memo,
        };
        Ok(self.goals.record_movement(&movement).await?)
    }

    async fn owned_goal(&self, owner: &User, id: &SavingsGoalId) -> Result<SavingsGoal, AppError> {
        let goal = self
            .goals
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Savings goal {}", id)))?;
        if goal.owner_id != owner.id {
            return Err(AppError::Forbidden);
        }
        Ok(goal)
    }
}

fn require_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Goal name is required".to_string()));
    }
    Ok(name.to_string())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
