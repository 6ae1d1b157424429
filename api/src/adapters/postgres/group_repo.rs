//! PostgreSQL adapter for GroupRepository
//!
//! Administrators and memberships live in their own tables keyed by
//! (group_id, user_id).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{
    BillingCadence, Group, GroupAdministrator, GroupId, GroupSettings, Membership,
    MembershipStatus, NewGroup, UserId, Visibility,
};
use crate::domain::ports::GroupRepository;
use crate::entity::{group_administrators, groups, memberships};
use crate::error::DomainError;

/// PostgreSQL implementation of GroupRepository
pub struct PostgresGroupRepository {
    db: DatabaseConnection,
}

impl PostgresGroupRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Attach administrators to group rows
    async fn hydrate(&self, models: Vec<groups::Model>) -> Result<Vec<Group>, DomainError> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let admins = group_administrators::Entity::find()
            .filter(group_administrators::Column::GroupId.is_in(ids))
            .order_by_asc(group_administrators::Column::Position)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let mut by_group: HashMap<Uuid, Vec<GroupAdministrator>> = HashMap::new();
        for admin in admins {
            by_group
                .entry(admin.group_id)
                .or_default()
                .push(GroupAdministrator {
                    user_id: UserId(admin.user_id),
                    share_bps: admin.share_bps.max(0) as u32,
                });
        }

        Ok(models
            .into_iter()
            .map(|m| {
                let administrators = by_group.remove(&m.id).unwrap_or_default();
                let mut group: Group = m.into();
                group.administrators = administrators;
                group
            })
            .collect())
    }

    async fn hydrate_one(&self, model: groups::Model) -> Result<Group, DomainError> {
        self.hydrate(vec![model])
            .await?
            .pop()
            .ok_or_else(|| DomainError::Internal("group vanished while loading".to_string()))
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn find_by_id(&self, id: &GroupId) -> Result<Option<Group>, DomainError> {
        let result = groups::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        match result {
            Some(model) => Ok(Some(self.hydrate_one(model).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Group>, DomainError> {
        let result = groups::Entity::find()
            .filter(groups::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        match result {
            Some(model) => Ok(Some(self.hydrate_one(model).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self, group: &NewGroup) -> Result<Group, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = groups::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(group.name.clone()),
            description: Set(group.description.clone()),
            short_description: Set(group.short_description.clone()),
            about_url: Set(group.about_url.clone()),
            thumbnail_url: Set(group.thumbnail_url.clone()),
            gallery_urls: Set(serde_json::json!(group.gallery_urls)),
            tags: Set(serde_json::json!(group.tags)),
            visibility: Set(group.visibility.to_string()),
            billing_cadence: Set(group.billing_cadence.to_string()),
            owner_id: Set(group.owner_id.0),
            price: Set(group.price.to_string()),
            member_number: Set(0),
            ends_on: Set(group.ends_on.map(|dt| dt.fixed_offset())),
            subscription_id: Set(group.subscription_id.clone()),
            last_subscription_paid_at: Set(group.last_subscription_paid_at.map(|dt| dt.fixed_offset())),
            last_subscription_tx_hash: Set(group.last_subscription_tx_hash.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn update_settings(
        &self,
        id: &GroupId,
        settings: &GroupSettings,
    ) -> Result<Group, DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let model = groups::ActiveModel {
            id: Set(id.0),
            short_description: Set(settings.short_description.clone()),
            about_url: Set(settings.about_url.clone()),
            thumbnail_url: Set(settings.thumbnail_url.clone()),
            gallery_urls: Set(serde_json::json!(settings.gallery_urls)),
            tags: Set(serde_json::json!(settings.tags)),
            visibility: Set(settings.visibility.to_string()),
            billing_cadence: Set(settings.billing_cadence.to_string()),
            price: Set(settings.price.to_string()),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        group_administrators::Entity::delete_many()
            .filter(group_administrators::Column::GroupId.eq(id.0))
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if !settings.administrators.is_empty() {
            let rows = settings
                .administrators
                .iter()
                .enumerate()
                .map(|(position, admin)| group_administrators::ActiveModel {
                    group_id: Set(id.0),
                    user_id: Set(admin.user_id.0),
                    share_bps: Set(admin.share_bps as i32),
                    position: Set(position as i32),
                });
            group_administrators::Entity::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(|e| DomainError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        self.hydrate_one(model).await
    }

    async fn update_description(
        &self,
        id: &GroupId,
        description: Option<&str>,
    ) -> Result<Group, DomainError> {
        let model = groups::ActiveModel {
            id: Set(id.0),
            description: Set(description.map(String::from)),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        self.hydrate_one(model).await
    }

    async fn update_subscription(
        &self,
        id: &GroupId,
        ends_on: DateTime<Utc>,
        paid_at: DateTime<Utc>,
        tx_hash: Option<&str>,
    ) -> Result<Group, DomainError> {
        let mut model = groups::ActiveModel {
            id: Set(id.0),
            ends_on: Set(Some(ends_on.fixed_offset())),
            last_subscription_paid_at: Set(Some(paid_at.fixed_offset())),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        if let Some(hash) = tx_hash {
            model.last_subscription_tx_hash = Set(Some(hash.to_string()));
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        self.hydrate_one(result).await
    }

    async fn set_member_number(
        &self,
        id: &GroupId,
        member_number: i32,
    ) -> Result<(), DomainError> {
        groups::ActiveModel {
            id: Set(id.0),
            member_number: Set(member_number),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }

    async fn list_public(&self, limit: u64, offset: u64) -> Result<Vec<Group>, DomainError> {
        let results = groups::Entity::find()
            .filter(groups::Column::Visibility.eq(Visibility::Public.to_string()))
            .order_by_desc(groups::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        self.hydrate(results).await
    }

    async fn list_owned(&self, owner_id: &UserId) -> Result<Vec<Group>, DomainError> {
        let results = groups::Entity::find()
            .filter(groups::Column::OwnerId.eq(owner_id.0))
            .order_by_desc(groups::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        self.hydrate(results).await
    }

    async fn list_joined(&self, user_id: &UserId) -> Result<Vec<Group>, DomainError> {
        let group_ids: Vec<Uuid> = memberships::Entity::find()
            .filter(memberships::Column::UserId.eq(user_id.0))
            .filter(memberships::Column::Status.eq(MembershipStatus::Active.to_string()))
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .into_iter()
            .map(|m| m.group_id)
            .collect();

        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let results = groups::Entity::find()
            .filter(groups::Column::Id.is_in(group_ids))
            .order_by_desc(groups::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        self.hydrate(results).await
    }

    async fn find_membership(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<Option<Membership>, DomainError> {
        let result = memberships::Entity::find_by_id((group_id.0, user_id.0))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn save_membership(&self, membership: &Membership) -> Result<Membership, DomainError> {
        let model = memberships::ActiveModel {
            group_id: Set(membership.group_id.0),
            user_id: Set(membership.user_id.0),
            status: Set(membership.status.to_string()),
            joined_at: Set(membership.joined_at.fixed_offset()),
            left_at: Set(membership.left_at.map(|dt| dt.fixed_offset())),
            pass_expires_at: Set(membership.pass_expires_at.map(|dt| dt.fixed_offset())),
        };

        memberships::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([memberships::Column::GroupId, memberships::Column::UserId])
                    .update_columns([
                        memberships::Column::Status,
                        memberships::Column::JoinedAt,
                        memberships::Column::LeftAt,
                        memberships::Column::PassExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(membership.clone())
    }

    async fn list_active_members(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<Membership>, DomainError> {
        let results = memberships::Entity::find()
            .filter(memberships::Column::GroupId.eq(group_id.0))
            .filter(memberships::Column::Status.eq(MembershipStatus::Active.to_string()))
            .order_by_asc(memberships::Column::JoinedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn count_active_members(&self, group_id: &GroupId) -> Result<i64, DomainError> {
        let count = memberships::Entity::find()
            .filter(memberships::Column::GroupId.eq(group_id.0))
            .filter(memberships::Column::Status.eq(MembershipStatus::Active.to_string()))
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(count as i64)
    }
}

fn json_strings(value: serde_json::Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

/// Convert SeaORM model to domain entity (administrators are loaded separately)
impl From<groups::Model> for Group {
    fn from(model: groups::Model) -> Self {
        Group {
            id: GroupId(model.id),
            name: model.name,
            description: model.description,
            short_description: model.short_description,
            about_url: model.about_url,
            thumbnail_url: model.thumbnail_url,
            gallery_urls: json_strings(model.gallery_urls),
            tags: json_strings(model.tags),
            visibility: model.visibility.parse().unwrap_or(Visibility::Public),
            billing_cadence: model.billing_cadence.parse().unwrap_or(BillingCadence::Free),
            owner_id: UserId(model.owner_id),
            price: model.price.parse().unwrap_or(0),
            member_number: model.member_number,
            ends_on: model.ends_on.map(|dt| dt.with_timezone(&Utc)),
            subscription_id: model.subscription_id,
            last_subscription_paid_at: model
                .last_subscription_paid_at
                .map(|dt| dt.with_timezone(&Utc)),
            last_subscription_tx_hash: model.last_subscription_tx_hash,
            administrators: Vec::new(),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Convert SeaORM model to domain entity
impl From<memberships::Model> for Membership {
    fn from(model: memberships::Model) -> Self {
        Membership {
            group_id: GroupId(model.group_id),
            user_id: UserId(model.user_id),
            status: model.status.parse().unwrap_or(MembershipStatus::Left),
            joined_at: model.joined_at.with_timezone(&Utc),
            left_at: model.left_at.map(|dt| dt.with_timezone(&Utc)),
            pass_expires_at: model.pass_expires_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}
