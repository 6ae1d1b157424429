//! PostgreSQL adapter for InvoiceRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    Invoice, InvoiceId, InvoicePatch, InvoiceStatus, LineItem, NewInvoice, UserId,
};
use crate::domain::ports::InvoiceRepository;
use crate::entity::invoices;
use crate::error::DomainError;

/// PostgreSQL implementation of InvoiceRepository
pub struct PostgresInvoiceRepository {
    db: DatabaseConnection,
}

impl PostgresInvoiceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        let result = invoices::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Invoice>, DomainError> {
        let result = invoices::Entity::find()
            .filter(invoices::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn count_for_owner(&self, owner_id: &UserId) -> Result<u64, DomainError> {
        invoices::Entity::find()
            .filter(invoices::Column::OwnerId.eq(owner_id.0))
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }

    async fn list_for_owner(&self, owner_id: &UserId) -> Result<Vec<Invoice>, DomainError> {
        let results = invoices::Entity::find()
            .filter(invoices::Column::OwnerId.eq(owner_id.0))
            .filter(invoices::Column::ArchivedAt.is_null())
            .order_by_desc(invoices::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create(&self, invoice: &NewInvoice) -> Result<Invoice, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = invoices::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(invoice.owner_id.0),
            slug: Set(invoice.slug.clone()),
            number: Set(invoice.number.clone()),
            title: Set(invoice.title.clone()),
            customer_name: Set(invoice.customer_name.clone()),
            customer_email: Set(invoice.customer_email.clone()),
            due_at: Set(invoice.due_at.map(|dt| dt.fixed_offset())),
            status: Set(InvoiceStatus::Draft.to_string()),
            notes: Set(invoice.notes.clone()),
            total_amount: Set(invoice.total_amount.to_string()),
            line_items: Set(serde_json::json!(invoice.line_items)),
            paid_at: Set(None),
            paylink_handle: Set(invoice.paylink_handle.clone()),
            payer_address: Set(invoice.payer_address.clone()),
            registry_address: Set(None),
            registry_invoice_id: Set(None),
            issuance_tx_hash: Set(None),
            payment_tx_hash: Set(None),
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

    async fn update(&self, id: &InvoiceId, patch: &InvoicePatch) -> Result<Invoice, DomainError> {
        let mut model = invoices::ActiveModel {
            id: Set(id.0),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        if let Some(status) = patch.status {
            model.status = Set(status.to_string());
        }
        if let Some(notes) = &patch.notes {
            model.notes = Set(notes.clone());
        }
        if let Some(due_at) = patch.due_at {
            model.due_at = Set(due_at.map(|dt| dt.fixed_offset()));
        }
        if let Some(handle) = &patch.paylink_handle {
            model.paylink_handle = Set(Some(handle.clone()));
        }
        if let Some(address) = &patch.registry_address {
            model.registry_address = Set(Some(address.clone()));
        }
        if let Some(registry_id) = &patch.registry_invoice_id {
            model.registry_invoice_id = Set(Some(registry_id.clone()));
        }
        if let Some(hash) = &patch.issuance_tx_hash {
            model.issuance_tx_hash = Set(Some(hash.clone()));
        }
        if let Some(hash) = &patch.payment_tx_hash {
            model.payment_tx_hash = Set(Some(hash.clone()));
        }
        if let Some(paid_at) = patch.paid_at {
            model.paid_at = Set(Some(paid_at.fixed_offset()));
        }
        if let Some(archived_at) = patch.archived_at {
            model.archived_at = Set(Some(archived_at.fixed_offset()));
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }
}

/// Convert SeaORM model to domain entity
impl From<invoices::Model> for Invoice {
    fn from(model: invoices::Model) -> Self {
        let line_items: Vec<LineItem> =
            serde_json::from_value(model.line_items).unwrap_or_default();

        Invoice {
            id: InvoiceId(model.id),
            owner_id: UserId(model.owner_id),
            slug: model.slug,
            number: model.number,
            title: model.title,
            customer_name: model.customer_name,
            customer_email: model.customer_email,
            due_at: model.due_at.map(|dt| dt.with_timezone(&Utc)),
            status: model.status.parse().unwrap_or(InvoiceStatus::Draft),
            notes: model.notes,
            total_amount: model.total_amount.parse().unwrap_or(0),
            line_items,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            paylink_handle: model.paylink_handle,
            payer_address: model.payer_address,
            registry_address: model.registry_address,
            registry_invoice_id: model.registry_invoice_id,
            issuance_tx_hash: model.issuance_tx_hash,
            payment_tx_hash: model.payment_tx_hash,
            archived_at: model.archived_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
