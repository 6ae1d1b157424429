//! PostgreSQL adapter for PayoutRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{
    NewPayoutExecution, NewPayoutSchedule, PayoutExecution, PayoutRecipient, PayoutSchedule,
    PayoutScheduleId, UserId,
};
use crate::domain::ports::PayoutRepository;
use crate::entity::{payout_executions, payout_schedules};
use crate::error::DomainError;

/// PostgreSQL implementation of PayoutRepository
pub struct PostgresPayoutRepository {
    db: DatabaseConnection,
}

impl PostgresPayoutRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PayoutRepository for PostgresPayoutRepository {
    async fn list_schedules(&self, owner_id: &UserId) -> Result<Vec<PayoutSchedule>, DomainError> {
        let results = payout_schedules::Entity::find()
            .filter(payout_schedules::Column::OwnerId.eq(owner_id.0))
            .order_by_desc(payout_schedules::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn find_schedule(
        &self,
        id: &PayoutScheduleId,
    ) -> Result<Option<PayoutSchedule>, DomainError> {
        let result = payout_schedules::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn create_schedule(
        &self,
        schedule: &NewPayoutSchedule,
    ) -> Result<PayoutSchedule, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = payout_schedules::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(schedule.owner_id.0),
            name: Set(schedule.name.clone()),
            recipients: Set(serde_json::json!(schedule.recipients)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn update_schedule(
        &self,
        id: &PayoutScheduleId,
        name: &str,
        recipients: &[PayoutRecipient],
    ) -> Result<PayoutSchedule, DomainError> {
        let result = payout_schedules::ActiveModel {
            id: Set(id.0),
            name: Set(name.to_string()),
            recipients: Set(serde_json::json!(recipients)),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn delete_schedule(&self, id: &PayoutScheduleId) -> Result<(), DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        payout_executions::Entity::delete_many()
            .filter(payout_executions::Column::ScheduleId.eq(id.0))
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let result = payout_schedules::Entity::delete_by_id(id.0)
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Payout schedule {}", id)));
        }

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }

    async fn find_execution_by_tx(
        &self,
        schedule_id: &PayoutScheduleId,
        tx_hash: &str,
    ) -> Result<Option<PayoutExecution>, DomainError> {
        let result = payout_executions::Entity::find()
            .filter(payout_executions::Column::ScheduleId.eq(schedule_id.0))
            .filter(payout_executions::Column::TxHash.eq(tx_hash))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn create_execution(
        &self,
        execution: &NewPayoutExecution,
    ) -> Result<PayoutExecution, DomainError> {
        let model = payout_executions::ActiveModel {
            id: Set(Uuid::new_v4()),
            schedule_id: Set(execution.schedule_id.0),
            owner_id: Set(execution.owner_id.0),
            tx_hash: Set(execution.tx_hash.clone()),
            total_amount: Set(execution.total_amount.to_string()),
            executed_at: Set(execution.executed_at.fixed_offset()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn list_executions(
        &self,
        schedule_id: &PayoutScheduleId,
    ) -> Result<Vec<PayoutExecution>, DomainError> {
        let results = payout_executions::Entity::find()
            .filter(payout_executions::Column::ScheduleId.eq(schedule_id.0))
            .order_by_desc(payout_executions::Column::ExecutedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }
}

/// Convert SeaORM model to domain entity
impl From<payout_schedules::Model> for PayoutSchedule {
    fn from(model: payout_schedules::Model) -> Self {
        PayoutSchedule {
            id: PayoutScheduleId(model.id),
            owner_id: UserId(model.owner_id),
            name: model.name,
            recipients: serde_json::from_value(model.recipients).unwrap_or_default(),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Convert SeaORM model to domain entity
impl From<payout_executions::Model> for PayoutExecution {
    fn from(model: payout_executions::Model) -> Self {
        PayoutExecution {
            id: model.id,
            schedule_id: PayoutScheduleId(model.schedule_id),
            owner_id: UserId(model.owner_id),
            tx_hash: model.tx_hash,
            total_amount: model.total_amount.parse().unwrap_or(0),
            executed_at: model.executed_at.with_timezone(&Utc),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
