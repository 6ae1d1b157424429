//! PostgreSQL adapter for MarketplaceRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend,
    DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, Statement,
};

use crate::domain::entities::{Listing, NewListing, UserId, UserStats};
use crate::domain::ports::MarketplaceRepository;
use crate::entity::{marketplace_listings, marketplace_user_stats};
use crate::error::DomainError;

/// PostgreSQL implementation of MarketplaceRepository
pub struct PostgresMarketplaceRepository {
    db: DatabaseConnection,
}

impl PostgresMarketplaceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MarketplaceRepository for PostgresMarketplaceRepository {
    async fn find_listing(&self, listing_id: &str) -> Result<Option<Listing>, DomainError> {
        let result = marketplace_listings::Entity::find_by_id(listing_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn list_active(&self) -> Result<Vec<Listing>, DomainError> {
        let results = marketplace_listings::Entity::find()
            .filter(marketplace_listings::Column::Active.eq(true))
            .order_by_desc(marketplace_listings::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn list_by_seller(&self, seller_id: &UserId) -> Result<Vec<Listing>, DomainError> {
        let results = marketplace_listings::Entity::find()
            .filter(marketplace_listings::Column::SellerId.eq(seller_id.0))
            .order_by_desc(marketplace_listings::Column::UpdatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create_listing(&self, listing: &NewListing) -> Result<Listing, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = marketplace_listings::ActiveModel {
            listing_id: Set(listing.listing_id.clone()),
            seller_id: Set(listing.seller_id.0),
            seller_address: Set(listing.seller_address.clone()),
            price: Set(listing.price.to_string()),
            active: Set(true),
            last_tx_hash: Set(listing.last_tx_hash.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn update_listing(
        &self,
        listing_id: &str,
        active: bool,
        price: i128,
        last_tx_hash: Option<&str>,
    ) -> Result<Listing, DomainError> {
        let mut model = marketplace_listings::ActiveModel {
            listing_id: Set(listing_id.to_string()),
            active: Set(active),
            price: Set(price.to_string()),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        if let Some(hash) = last_tx_hash {
            model.last_tx_hash = Set(Some(hash.to_string()));
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn mark_sold(&self, listing_id: &str, tx_hash: &str) -> Result<Listing, DomainError> {
        // Conditional update: only one buyer can flip an active listing
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "UPDATE marketplace_listings SET active = FALSE, last_tx_hash = $1, updated_at = NOW() \
             WHERE listing_id = $2 AND active = TRUE",
            [tx_hash.into(), listing_id.into()],
        );
        let result = self
            .db
            .execute(stmt)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::Conflict(
                "Listing is no longer available".to_string(),
            ));
        }

        self.find_listing(listing_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Listing {}", listing_id)))
    }

    async fn get_stats(&self, user_id: &UserId) -> Result<Option<UserStats>, DomainError> {
        let result = marketplace_user_stats::Entity::find_by_id(user_id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn save_stats(&self, stats: &UserStats) -> Result<(), DomainError> {
        let model = marketplace_user_stats::ActiveModel {
            user_id: Set(stats.user_id.0),
            last_list_at: Set(stats.last_list_at.map(|dt| dt.fixed_offset())),
            last_cancel_at: Set(stats.last_cancel_at.map(|dt| dt.fixed_offset())),
            last_buy_at: Set(stats.last_buy_at.map(|dt| dt.fixed_offset())),
            daily_buy_count: Set(stats.daily_buy_count),
            buy_day_key: Set(stats.buy_day_key.clone()),
        };

        marketplace_user_stats::Entity::insert(model)
            .on_conflict(
                OnConflict::column(marketplace_user_stats::Column::UserId)
                    .update_columns([
                        marketplace_user_stats::Column::LastListAt,
                        marketplace_user_stats::Column::LastCancelAt,
                        marketplace_user_stats::Column::LastBuyAt,
                        marketplace_user_stats::Column::DailyBuyCount,
                        marketplace_user_stats::Column::BuyDayKey,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }
}

/// Convert SeaORM model to domain entity
impl From<marketplace_listings::Model> for Listing {
    fn from(model: marketplace_listings::Model) -> Self {
        Listing {
            listing_id: model.listing_id,
            seller_id: UserId(model.seller_id),
            seller_address: model.seller_address,
            price: model.price.parse().unwrap_or(0),
            active: model.active,
            last_tx_hash: model.last_tx_hash,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Convert SeaORM model to domain entity
impl From<marketplace_user_stats::Model> for UserStats {
    fn from(model: marketplace_user_stats::Model) -> Self {
        UserStats {
            user_id: UserId(model.user_id),
            last_list_at: model.last_list_at.map(|dt| dt.with_timezone(&Utc)),
            last_cancel_at: model.last_cancel_at.map(|dt| dt.with_timezone(&Utc)),
            last_buy_at: model.last_buy_at.map(|dt| dt.with_timezone(&Utc)),
            daily_buy_count: model.daily_buy_count,
            buy_day_key: model.buy_day_key,
        }
    }
}
