//! Invoice handlers
//!
//! Drafting and managing invoices, plus the public pay page and settlement.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::{CreateInvoiceInput, LineItemInput, ResourceLinks, SettlementOutcome};
use crate::domain::entities::{Invoice, User};
use crate::error::AppError;
use crate::AppState;

use super::double_option;

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub links: ResourceLinks,
}

#[derive(Debug, Deserialize)]
pub struct LineItemRequest {
    pub description: String,
    pub quantity: i64,
    /// Unit price in stroops
    pub unit_amount: String,
}

/// Request to draft an invoice
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub title: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItemRequest>,
    pub paylink_handle: Option<String>,
    /// Wallet expected to pay, if known
    pub payer_address: Option<String>,
}

/// On-chain registration reported by the client after signing
#[derive(Debug, Deserialize)]
pub struct RegisterInvoiceRequest {
    pub registry_address: String,
    pub registry_invoice_id: String,
    pub tx_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNotesRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Deserialize)]
pub struct AttachPaylinkRequest {
    pub handle: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkPaidRequest {
    pub tx_hash: String,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SettleInvoiceRequest {
    pub tx_hash: String,
}

/// POST /invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let input = CreateInvoiceInput {
        title: request.title,
        customer_name: request.customer_name,
        customer_email: request.customer_email,
        due_at: request.due_at,
        notes: request.notes,
        line_items: request
            .line_items
            .into_iter()
            .map(|item| LineItemInput {
                description: item.description,
                quantity: item.quantity,
                unit_amount: item.unit_amount,
            })
            .collect(),
        paylink_handle: request.paylink_handle,
        payer_address: request.payer_address,
    };
    let invoice = state.invoice_service.create(&user, input).await?;
    Ok(Json(invoice_response(&state, invoice)))
}

/// GET /invoices
///
/// The caller's invoices, archived ones excluded.
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let invoices = state.invoice_service.list_for_owner(&user).await?;
    Ok(Json(
        invoices
            .into_iter()
            .map(|i| invoice_response(&state, i))
            .collect(),
    ))
}

/// GET /invoices/:slug
///
/// Public pay page data.
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state.invoice_service.get_by_slug(&slug).await?;
    Ok(Json(invoice_response(&state, invoice)))
}

/// POST /invoices/:slug/register
pub async fn register_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(slug): Path<String>,
    Json(request): Json<RegisterInvoiceRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .invoice_service
        .register_onchain(
            &user,
            &slug,
            &request.registry_address,
            &request.registry_invoice_id,
            &request.tx_hash,
        )
        .await?;
    Ok(Json(invoice_response(&state, invoice)))
}

/// PATCH /invoices/:slug/notes
pub async fn update_notes(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(slug): Path<String>,
    Json(request): Json<UpdateNotesRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .invoice_service
        .update_notes(&user, &slug, request.notes, request.due_at)
        .await?;
    Ok(Json(invoice_response(&state, invoice)))
}

/// POST /invoices/:slug/paylink
pub async fn attach_paylink(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(slug): Path<String>,
    Json(request): Json<AttachPaylinkRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .invoice_service
        .attach_paylink(&user, &slug, &request.handle)
        .await?;
    Ok(Json(invoice_response(&state, invoice)))
}

/// POST /invoices/:slug/paid
///
/// Owner marks an invoice paid by hand.
pub async fn mark_paid(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(slug): Path<String>,
    Json(request): Json<MarkPaidRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .invoice_service
        .mark_paid(&user, &slug, &request.tx_hash, request.paid_at)
        .await?;
    Ok(Json(invoice_response(&state, invoice)))
}

/// DELETE /invoices/:slug
pub async fn archive_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(slug): Path<String>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state.invoice_service.archive(&user, &slug).await?;
    Ok(Json(invoice_response(&state, invoice)))
}

/// POST /invoices/:slug/settle
///
/// Verify a payment on the ledger and mark the invoice paid. Rejections
/// come back as `{"ok": false, "reason": ...}` with a 200.
pub async fn settle_invoice(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<SettleInvoiceRequest>,
) -> Result<Json<SettlementOutcome>, AppError> {
    let outcome = state
        .settlement_service
        .record_settlement(&slug, &request.tx_hash)
        .await?;
    Ok(Json(outcome))
}

fn invoice_response(state: &AppState, invoice: Invoice) -> InvoiceResponse {
    let tx_hash = invoice
        .payment_tx_hash
        .as_deref()
        .or(invoice.issuance_tx_hash.as_deref());
    InvoiceResponse {
        links: state.explorer.links(
            tx_hash,
            invoice.payer_address.as_deref(),
            invoice.registry_address.as_deref(),
        ),
        invoice,
    }
}
