//! PostgreSQL adapter for SavingsGoalRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{
    MovementType, NewSavingsGoal, NewSavingsMovement, SavingsGoal, SavingsGoalId,
    SavingsGoalUpdate, SavingsMovement, UserId,
};
use crate::domain::ports::SavingsGoalRepository;
use crate::entity::{savings_goal_movements, savings_goals};
use crate::error::DomainError;

/// PostgreSQL implementation of SavingsGoalRepository
pub struct PostgresSavingsGoalRepository {
    db: DatabaseConnection,
}

impl PostgresSavingsGoalRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SavingsGoalRepository for PostgresSavingsGoalRepository {
    async fn list_for_owner(&self, owner_id: &UserId) -> Result<Vec<SavingsGoal>, DomainError> {
        let results = savings_goals::Entity::find()
            .filter(savings_goals::Column::OwnerId.eq(owner_id.0))
            .filter(savings_goals::Column::ArchivedAt.is_null())
            .order_by_desc(savings_goals::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn find_by_id(&self, id: &SavingsGoalId) -> Result<Option<SavingsGoal>, DomainError> {
        let result = savings_goals::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn create(&self, goal: &NewSavingsGoal) -> Result<SavingsGoal, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = savings_goals::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(goal.owner_id.0),
            name: Set(goal.name.clone()),
            target_amount: Set(goal.target_amount.to_string()),
            current_amount: Set("0".to_string()),
            target_date: Set(goal.target_date.map(|dt| dt.fixed_offset())),
            notes: Set(goal.notes.clone()),
            archived_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn update_details(
        &self,
        id: &SavingsGoalId,
        update: &SavingsGoalUpdate,
    ) -> Result<SavingsGoal, DomainError> {
        let mut model = savings_goals::ActiveModel {
            id: Set(id.0),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        if let Some(name) = &update.name {
            model.name = Set(name.clone());
        }
        if let Some(target) = update.target_amount {
            model.target_amount = Set(target.to_string());
        }
        if let Some(target_date) = update.target_date {
            model.target_date = Set(target_date.map(|dt| dt.fixed_offset()));
        }
        if let Some(notes) = &update.notes {
            model.notes = Set(notes.clone());
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn archive(
        &self,
        id: &SavingsGoalId,
        at: DateTime<Utc>,
    ) -> Result<SavingsGoal, DomainError> {
        let result = savings_goals::ActiveModel {
            id: Set(id.0),
            archived_at: Set(Some(at.fixed_offset())),
            updated_at: Set(at.fixed_offset()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn list_movements(
        &self,
        goal_id: &SavingsGoalId,
    ) -> Result<Vec<SavingsMovement>, DomainError> {
        let results = savings_goal_movements::Entity::find()
            .filter(savings_goal_movements::Column::GoalId.eq(goal_id.0))
            .order_by_desc(savings_goal_movements::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn find_movement_by_tx(
        &self,
        tx_hash: &str,
    ) -> Result<Option<SavingsMovement>, DomainError> {
        let result = savings_goal_movements::Entity::find()
            .filter(savings_goal_movements::Column::TxHash.eq(tx_hash))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn record_movement(
        &self,
        movement: &NewSavingsMovement,
    ) -> Result<(SavingsGoal, SavingsMovement), DomainError> {
        let now = Utc::now().fixed_offset();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        // SELECT .. FOR UPDATE serializes concurrent movements on one goal
        let current: SavingsGoal = savings_goals::Entity::find_by_id(movement.goal_id.0)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Savings goal {}", movement.goal_id)))?
            .into();
        let new_balance = current.balance_after(movement)?;

        let inserted = savings_goal_movements::ActiveModel {
            id: Set(Uuid::new_v4()),
            goal_id: Set(movement.goal_id.0),
            owner_id: Set(movement.owner_id.0),
            movement_type: Set(movement.movement_type.to_string()),
            amount: Set(movement.amount.to_string()),
            tx_hash: Set(movement.tx_hash.clone()),
            memo: Set(movement.memo.clone()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        let goal = savings_goals::ActiveModel {
            id: Set(movement.goal_id.0),
            current_amount: Set(new_balance.to_string()),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok((goal.into(), inserted.into()))
    }
}

/// Convert SeaORM model to domain entity
impl From<savings_goals::Model> for SavingsGoal {
    fn from(model: savings_goals::Model) -> Self {
        SavingsGoal {
            id: SavingsGoalId(model.id),
            owner_id: UserId(model.owner_id),
            name: model.name,
            target_amount: model.target_amount.parse().unwrap_or(0),
            current_amount: model.current_amount.parse().unwrap_or(0),
            target_date: model.target_date.map(|dt| dt.with_timezone(&Utc)),
            notes: model.notes,
            archived_at: model.archived_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Convert SeaORM model to domain entity
impl From<savings_goal_movements::Model> for SavingsMovement {
    fn from(model: savings_goal_movements::Model) -> Self {
        SavingsMovement {
            id: model.id,
            goal_id: SavingsGoalId(model.goal_id),
            owner_id: UserId(model.owner_id),
            movement_type: model.movement_type.parse().unwrap_or(MovementType::Credit),
            amount: model.amount.parse().unwrap_or(0),
            tx_hash: model.tx_hash,
            memo: model.memo,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
