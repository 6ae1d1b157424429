//! Invoice service
//!
//! Drafting, on-chain registration, and payment bookkeeping for invoices.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::entities::invoice::{compute_total, generate_slug, invoice_number};
use crate::domain::entities::{
    Invoice, InvoicePatch, InvoiceStatus, LineItem, NewInvoice, User,
};
use crate::domain::entities::paylink::normalize_handle;
use crate::domain::ledger::{
    normalize_tx_hash, parse_non_negative_stroops, require_account_address,
    require_contract_address,
};
use crate::domain::ports::{InvoiceRepository, PaylinkRepository};
use crate::error::{AppError, DomainError};

/// Line item as submitted by the client
#[derive(Debug, Clone)]
pub struct LineItemInput {
    pub description: String,
    pub quantity: i64,
    /// Unit price in stroops
    pub unit_amount: String,
}

#[derive(Debug, Clone, Default)]
pub struct CreateInvoiceInput {
    pub title: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub line_items: Vec<LineItemInput>,
    pub paylink_handle: Option<String>,
    pub payer_address: Option<String>,
}

/// Service for managing invoices
pub struct InvoiceService<IR, PR>
where
    IR: InvoiceRepository,
    PR: PaylinkRepository,
{
    invoices: Arc<IR>,
    paylinks: Arc<PR>,
}

impl<IR, PR> InvoiceService<IR, PR>
where
    IR: InvoiceRepository,
    PR: PaylinkRepository,
{
    pub fn new(invoices: Arc<IR>, paylinks: Arc<PR>) -> Self {
        Self { invoices, paylinks }
    }

    pub async fn create(&self, owner: &User, input: CreateInvoiceInput) -> Result<Invoice, AppError> {
        if input.line_items.is_empty() {
            return Err(AppError::BadRequest(
                "Add at least one line item".to_string(),
            ));
        }

        let line_items = input
            .line_items
            .iter()
            .map(|item| {
                let unit = parse_non_negative_stroops(&item.unit_amount)?;
                Ok(LineItem {
                    description: item.description.trim().to_string(),
                    quantity: item.quantity.max(0),
                    unit_amount: unit.to_string(),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        let total_amount = compute_total(&line_items)?;

        let paylink_handle = match input.paylink_handle.as_deref().map(str::trim) {
            Some(handle) if !handle.is_empty() => Some(self.owned_paylink_handle(owner, handle).await?),
            _ => None,
        };
        let payer_address = match input.payer_address.as_deref().map(str::trim) {
            Some(address) if !address.is_empty() => Some(require_account_address(address)?),
            _ => None,
        };

        let now = Utc::now();
        let count = self.invoices.count_for_owner(&owner.id).await?;
        let new_invoice = NewInvoice {
            owner_id: owner.id,
            slug: generate_slug(now),
            number: invoice_number(now, count),
            title: trimmed(input.title),
            customer_name: trimmed(input.customer_name),
            customer_email: trimmed(input.customer_email),
            due_at: input.due_at,
            notes: trimmed(input.notes),
            total_amount,
            line_items,
            paylink_handle,
            payer_address,
        };

        let invoice = self.invoices.create(&new_invoice).await?;
        tracing::info!(slug = %invoice.slug, number = %invoice.number, "Created invoice");
        Ok(invoice)
    }

    /// Non-archived invoices of the owner, newest first
    pub async fn list_for_owner(&self, owner: &User) -> Result<Vec<Invoice>, AppError> {
        Ok(self.invoices.list_for_owner(&owner.id).await?)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Invoice, AppError> {
        self.invoices
            .find_by_slug(slug.trim())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invoice {}", slug.trim())))
    }

    /// Record the invoice-registry entry created by the owner's wallet
    pub async fn register_onchain(
        &self,
        owner: &User,
        slug: &str,
        registry_address: &str,
        registry_invoice_id: &str,
        tx_hash: &str,
    ) -> Result<Invoice, AppError> {
        let invoice = self.owned_invoice(owner, slug).await?;
        if invoice.is_archived() {
            return Err(conflict("Archived invoices cannot be registered"));
        }
        if invoice.is_paid() {
            return Err(conflict("Paid invoices cannot be registered"));
        }

        let registry_address = require_contract_address(registry_address)?;
        let registry_invoice_id = registry_invoice_id
            .trim()
            .parse::<u64>()
            .map_err(|_| AppError::BadRequest("Invalid registry invoice id".to_string()))?;
        let tx_hash = normalize_tx_hash(tx_hash)?;

        let patch = InvoicePatch {
            status: Some(InvoiceStatus::Issued),
            registry_address: Some(registry_address),
            registry_invoice_id: Some(registry_invoice_id.to_string()),
            issuance_tx_hash: Some(tx_hash),
            ..Default::default()
        };
        Ok(self.invoices.update(&invoice.id, &patch).await?)
    }

    /// Edit notes and due date. `None` keeps a field, `Some(None)` clears it.
    pub async fn update_notes(
        &self,
        owner: &User,
        slug: &str,
        notes: Option<Option<String>>,
        due_at: Option<Option<DateTime<Utc>>>,
    ) -> Result<Invoice, AppError> {
        let invoice = self.owned_invoice(owner, slug).await?;
        let patch = InvoicePatch {
            notes: notes.map(trimmed),
            due_at,
            ..Default::default()
        };
        Ok(self.invoices.update(&invoice.id, &patch).await?)
    }

    pub async fn attach_paylink(
        &self,
        owner: &User,
        slug: &str,
        handle: &str,
    ) -> Result<Invoice, AppError> {
        let invoice = self.owned_invoice(owner, slug).await?;
        let handle = self.owned_paylink_handle(owner, handle).await?;
        let patch = InvoicePatch {
            paylink_handle: Some(handle),
            ..Default::default()
        };
        Ok(self.invoices.update(&invoice.id, &patch).await?)
    }

    /// Hide an invoice from the owner's list; paid invoices are kept
    pub async fn archive(&self, owner: &User, slug: &str) -> Result<Invoice, AppError> {
        let invoice = self.owned_invoice(owner, slug).await?;
        invoice.ensure_archivable()?;
        if invoice.is_archived() {
            return Ok(invoice);
        }
        let patch = InvoicePatch {
            archived_at: Some(Utc::now()),
            ..Default::default()
        };
        Ok(self.invoices.update(&invoice.id, &patch).await?)
    }

    /// Owner-confirmed payment; repeat calls on a paid invoice are no-ops
    pub async fn mark_paid(
        &self,
        owner: &User,
        slug: &str,
        tx_hash: &str,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<Invoice, AppError> {
        let invoice = self.owned_invoice(owner, slug).await?;
        let tx_hash = normalize_tx_hash(tx_hash)?;
        settle(self.invoices.as_ref(), invoice, tx_hash, paid_at.unwrap_or_else(Utc::now)).await
    }

    async fn owned_invoice(&self, owner: &User, slug: &str) -> Result<Invoice, AppError> {
        let invoice = self.get_by_slug(slug).await?;
        if invoice.owner_id != owner.id {
            return Err(AppError::Forbidden);
        }
        Ok(invoice)
    }

    async fn owned_paylink_handle(&self, owner: &User, handle: &str) -> Result<String, AppError> {
        let handle = normalize_handle(handle)?;
        let paylink = self
            .paylinks
            .find_by_handle(&handle)
            .await?
            .filter(|p| !p.is_archived())
            .ok_or_else(|| AppError::NotFound(format!("Paylink {}", handle)))?;
        if paylink.owner_id != owner.id {
            return Err(AppError::Forbidden);
        }
        Ok(paylink.handle)
    }
}

/// Mark an invoice paid unless it already is
pub(crate) async fn settle<IR: InvoiceRepository + ?Sized>(
    invoices: &IR,
    invoice: Invoice,
    tx_hash: String,
    paid_at: DateTime<Utc>,
) -> Result<Invoice, AppError> {
    if invoice.is_paid() {
        return Ok(invoice);
    }
    invoice.ensure_payable()?;

    let patch = InvoicePatch {
        status: Some(InvoiceStatus::Paid),
        payment_tx_hash: Some(tx_hash),
        paid_at: Some(paid_at),
        ..Default::default()
    };
    let invoice = invoices.update(&invoice.id, &patch).await?;
    tracing::info!(slug = %invoice.slug, "Invoice paid");
    Ok(invoice)
}

fn conflict(message: &str) -> AppError {
    AppError::Domain(DomainError::Conflict(message.to_string()))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        test_invoice, test_paylink, test_user, InMemoryInvoiceRepository,
        InMemoryPaylinkRepository, ALICE, BOB, CONTRACT, TX_HASH,
    };

    type Service = InvoiceService<InMemoryInvoiceRepository, InMemoryPaylinkRepository>;

    fn create_service(
        invoices: InMemoryInvoiceRepository,
        paylinks: InMemoryPaylinkRepository,
    ) -> Service {
        InvoiceService::new(Arc::new(invoices), Arc::new(paylinks))
    }

    fn item(quantity: i64, unit_amount: &str) -> LineItemInput {
        LineItemInput {
            description: " Mixing ".to_string(),
            quantity,
            unit_amount: unit_amount.to_string(),
        }
    }

    #[tokio::test]
    async fn create_computes_total_and_number() {
        let owner = test_user(ALICE);
        let service = create_service(InMemoryInvoiceRepository::new(), InMemoryPaylinkRepository::new());

        let invoice = service
            .create(
                &owner,
                CreateInvoiceInput {
                    line_items: vec![item(2, "50000000"), item(-1, "7")],
                    payer_address: Some(BOB.to_lowercase()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(invoice.total_amount, 100_000_000);
        assert_eq!(invoice.line_items[1].quantity, 0);
        assert_eq!(invoice.line_items[0].description, "Mixing");
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert!(invoice.number.ends_with("-0001"));
        assert!(invoice.slug.starts_with("inv-"));
        assert_eq!(invoice.payer_address.as_deref(), Some(BOB));

        let second = service
            .create(
                &owner,
                CreateInvoiceInput {
                    line_items: vec![item(1, "1")],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(second.number.ends_with("-0002"));
    }

    #[tokio::test]
    async fn create_requires_line_items() {
        let owner = test_user(ALICE);
        let service = create_service(InMemoryInvoiceRepository::new(), InMemoryPaylinkRepository::new());

        let result = service.create(&owner, CreateInvoiceInput::default()).await;

        assert!(result.unwrap_err().to_string().contains("at least one line item"));
    }

    #[tokio::test]
    async fn create_rejects_fractional_unit_amounts() {
        let owner = test_user(ALICE);
        let service = create_service(InMemoryInvoiceRepository::new(), InMemoryPaylinkRepository::new());

        let result = service
            .create(
                &owner,
                CreateInvoiceInput {
                    line_items: vec![item(1, "1.5")],
                    ..Default::default()
                },
            )
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn create_rejects_foreign_paylink() {
        let owner = test_user(ALICE);
        let other = test_user(BOB);
        let paylink = test_paylink(&other, "bobs-link");
        let service = create_service(
            InMemoryInvoiceRepository::new(),
            InMemoryPaylinkRepository::new().with_paylink(paylink),
        );

        let result = service
            .create(
                &owner,
                CreateInvoiceInput {
                    line_items: vec![item(1, "10")],
                    paylink_handle: Some("bobs-link".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn register_sets_issued() {
        let owner = test_user(ALICE);
        let invoice = test_invoice(&owner, 100);
        let service = create_service(
            InMemoryInvoiceRepository::new().with_invoice(invoice.clone()),
            InMemoryPaylinkRepository::new(),
        );

        let registered = service
            .register_onchain(&owner, &invoice.slug, CONTRACT, "42", TX_HASH)
            .await
            .unwrap();

        assert_eq!(registered.status, InvoiceStatus::Issued);
        assert_eq!(registered.registry_address.as_deref(), Some(CONTRACT));
        assert_eq!(registered.registry_invoice_id.as_deref(), Some("42"));
        assert!(registered.is_registered());
    }

    #[tokio::test]
    async fn register_requires_owner() {
        let owner = test_user(ALICE);
        let other = test_user(BOB);
        let invoice = test_invoice(&owner, 100);
        let service = create_service(
            InMemoryInvoiceRepository::new().with_invoice(invoice.clone()),
            InMemoryPaylinkRepository::new(),
        );

        let result = service
            .register_onchain(&other, &invoice.slug, CONTRACT, "1", TX_HASH)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn archived_invoices_cannot_be_paid() {
        let owner = test_user(ALICE);
        let mut invoice = test_invoice(&owner, 100);
        invoice.archived_at = Some(Utc::now());
        let service = create_service(
            InMemoryInvoiceRepository::new().with_invoice(invoice.clone()),
            InMemoryPaylinkRepository::new(),
        );

        let result = service.mark_paid(&owner, &invoice.slug, TX_HASH, None).await;

        assert!(result.unwrap_err().to_string().contains("Archived invoices cannot be paid"));
    }

    #[tokio::test]
    async fn mark_paid_is_idempotent() {
        let owner = test_user(ALICE);
        let invoice = test_invoice(&owner, 100);
        let service = create_service(
            InMemoryInvoiceRepository::new().with_invoice(invoice.clone()),
            InMemoryPaylinkRepository::new(),
        );

        let paid = service
            .mark_paid(&owner, &invoice.slug, TX_HASH, None)
            .await
            .unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert_eq!(paid.payment_tx_hash.as_deref(), Some(TX_HASH));

        let other_hash = "b".repeat(64);
        let again = service
            .mark_paid(&owner, &invoice.slug, &other_hash, None)
            .await
            .unwrap();
        assert_eq!(again.payment_tx_hash.as_deref(), Some(TX_HASH));
        assert_eq!(again.paid_at, paid.paid_at);
    }

    #[tokio::test]
    async fn paid_invoices_cannot_be_archived() {
        let owner = test_user(ALICE);
        let mut invoice = test_invoice(&owner, 100);
        invoice.status = InvoiceStatus::Paid;
        let service = create_service(
            InMemoryInvoiceRepository::new().with_invoice(invoice.clone()),
            InMemoryPaylinkRepository::new(),
        );

        let result = service.archive(&owner, &invoice.slug).await;

        assert!(result.unwrap_err().to_string().contains("Paid invoices cannot be removed"));
    }

    #[tokio::test]
    async fn archive_hides_from_list() {
        let owner = test_user(ALICE);
        let invoice = test_invoice(&owner, 100);
        let service = create_service(
            InMemoryInvoiceRepository::new().with_invoice(invoice.clone()),
            InMemoryPaylinkRepository::new(),
        );

        assert_eq!(service.list_for_owner(&owner).await.unwrap().len(), 1);
        service.archive(&owner, &invoice.slug).await.unwrap();
        assert!(service.list_for_owner(&owner).await.unwrap().is_empty());
        assert!(service.get_by_slug(&invoice.slug).await.is_ok());
    }

    #[tokio::test]
    async fn notes_and_paylink_updates() {
        let owner = test_user(ALICE);
        let invoice = test_invoice(&owner, 100);
        let paylink = test_paylink(&owner, "studio");
        let service = create_service(
            InMemoryInvoiceRepository::new().with_invoice(invoice.clone()),
            InMemoryPaylinkRepository::new().with_paylink(paylink),
        );

        let due = Utc::now() + chrono::Duration::days(30);
        let updated = service
            .update_notes(&owner, &invoice.slug, Some(Some(" Net 30 ".to_string())), Some(Some(due)))
            .await
            .unwrap();
        assert_eq!(updated.notes.as_deref(), Some("Net 30"));
        assert_eq!(updated.due_at, Some(due));

        // omitted fields keep their value
        let kept = service
            .update_notes(&owner, &invoice.slug, None, None)
            .await
            .unwrap();
        assert_eq!(kept.notes.as_deref(), Some("Net 30"));
        assert_eq!(kept.due_at, Some(due));

        let cleared = service
            .update_notes(&owner, &invoice.slug, Some(None), Some(None))
            .await
            .unwrap();
        assert!(cleared.notes.is_none());
        assert!(cleared.due_at.is_none());

        let attached = service
            .attach_paylink(&owner, &invoice.slug, "Studio")
            .await
            .unwrap();
        assert_eq!(attached.paylink_handle.as_deref(), Some("studio"));
    }
}
