//! PostgreSQL adapter for PaylinkRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::entities::{NewPaylink, Paylink, PaylinkId, UserId};
use crate::domain::ports::PaylinkRepository;
use crate::entity::paylinks;
use crate::error::DomainError;

/// PostgreSQL implementation of PaylinkRepository
pub struct PostgresPaylinkRepository {
    db: DatabaseConnection,
}

impl PostgresPaylinkRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PaylinkRepository for PostgresPaylinkRepository {
    async fn find_by_handle(&self, handle: &str) -> Result<Option<Paylink>, DomainError> {
        let result = paylinks::Entity::find()
            .filter(paylinks::Column::Handle.eq(handle))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn list_active_for_owner(&self, owner_id: &UserId) -> Result<Vec<Paylink>, DomainError> {
        let results = paylinks::Entity::find()
            .filter(paylinks::Column::OwnerId.eq(owner_id.0))
            .filter(paylinks::Column::IsActive.eq(true))
            .filter(paylinks::Column::ArchivedAt.is_null())
            .order_by_desc(paylinks::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create(&self, paylink: &NewPaylink) -> Result<Paylink, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = paylinks::ActiveModel {
            id: Set(Uuid::new_v4()),
            handle: Set(paylink.handle.clone()),
            owner_id: Set(paylink.owner_id.0),
            receiving_address: Set(paylink.receiving_address.clone()),
            title: Set(paylink.title.clone()),
            description: Set(paylink.description.clone()),
            is_active: Set(true),
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

    async fn archive(&self, id: &PaylinkId, at: DateTime<Utc>) -> Result<Paylink, DomainError> {
        let result = paylinks::ActiveModel {
            id: Set(id.0),
            is_active: Set(false),
            archived_at: Set(Some(at.fixed_offset())),
            updated_at: Set(at.fixed_offset()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }
}

/// Convert SeaORM model to domain entity
impl From<paylinks::Model> for Paylink {
    fn from(model: paylinks::Model) -> Self {
        Paylink {
            id: PaylinkId(model.id),
            handle: model.handle,
            owner_id: UserId(model.owner_id),
            receiving_address: model.receiving_address,
            title: model.title,
            description: model.description,
            is_active: model.is_active,
            archived_at: model.archived_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
