//! SeaORM entity for the `groups` table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub about_url: Option<String>,
    pub thumbnail_url: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub gallery_urls: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub visibility: String,
    pub billing_cadence: String,
    pub owner_id: Uuid,
    /// Stroops as a decimal string
    pub price: String,
    pub member_number: i32,
    pub ends_on: Option<DateTimeWithTimeZone>,
    pub subscription_id: Option<String>,
    pub last_subscription_paid_at: Option<DateTimeWithTimeZone>,
    pub last_subscription_tx_hash: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
