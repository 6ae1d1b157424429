//! SeaORM entity for the `marketplace_user_stats` table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "marketplace_user_stats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub last_list_at: Option<DateTimeWithTimeZone>,
    pub last_cancel_at: Option<DateTimeWithTimeZone>,
    pub last_buy_at: Option<DateTimeWithTimeZone>,
    pub daily_buy_count: i32,
    pub buy_day_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
