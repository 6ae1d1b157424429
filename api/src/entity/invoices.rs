//! SeaORM entity for the `invoices` table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    #[sea_orm(unique)]
    pub slug: String,
    pub number: String,
    pub title: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub due_at: Option<DateTimeWithTimeZone>,
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub total_amount: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub line_items: Json,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub paylink_handle: Option<String>,
    pub payer_address: Option<String>,
    pub registry_address: Option<String>,
    pub registry_invoice_id: Option<String>,
    pub issuance_tx_hash: Option<String>,
    pub payment_tx_hash: Option<String>,
    pub archived_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
