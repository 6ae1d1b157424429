//! Invoice domain entity
//!
//! Invoices start as drafts, become `issued` once registered with the
//! on-chain invoice registry, and end `paid` after settlement.

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;
use crate::domain::ledger::serialize_stroops;
use crate::error::DomainError;

/// Unique identifier for an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceId(pub Uuid);

impl InvoiceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvoiceId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for InvoiceId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Invoice lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    Paid,
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Draft => write!(f, "draft"),
            InvoiceStatus::Issued => write!(f, "issued"),
            InvoiceStatus::Paid => write!(f, "paid"),
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "issued" => Ok(InvoiceStatus::Issued),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(format!("Unknown invoice status: {}", s)),
        }
    }
}

/// A billed line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: i64,
    /// Unit price in stroops, stored as a decimal string
    pub unit_amount: String,
}

impl LineItem {
    pub fn unit_stroops(&self) -> Result<i128, DomainError> {
        crate::domain::ledger::parse_non_negative_stroops(&self.unit_amount)
    }
}

/// An invoice
#[derive(Debug, Clone, Serialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub owner_id: UserId,
    pub slug: String,
    pub number: String,
    pub title: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    #[serde(serialize_with = "serialize_stroops")]
    pub total_amount: i128,
    pub line_items: Vec<LineItem>,
    pub paid_at: Option<DateTime<Utc>>,
    pub paylink_handle: Option<String>,
    pub payer_address: Option<String>,
    pub registry_address: Option<String>,
    pub registry_invoice_id: Option<String>,
    pub issuance_tx_hash: Option<String>,
    pub payment_tx_hash: Option<String>,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    pub fn is_registered(&self) -> bool {
        self.registry_address.is_some() && self.registry_invoice_id.is_some()
    }

    /// Archived invoices cannot be paid
    pub fn ensure_payable(&self) -> Result<(), DomainError> {
        if self.is_archived() {
            return Err(DomainError::Conflict(
                "Archived invoices cannot be paid".to_string(),
            ));
        }
        Ok(())
    }

    /// Paid invoices cannot be removed
    pub fn ensure_archivable(&self) -> Result<(), DomainError> {
        if self.is_paid() {
            return Err(DomainError::Conflict(
                "Paid invoices cannot be removed.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Data needed to create a new invoice
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub owner_id: UserId,
    pub slug: String,
    pub number: String,
    pub title: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub total_amount: i128,
    pub line_items: Vec<LineItem>,
    pub paylink_handle: Option<String>,
    pub payer_address: Option<String>,
}

/// Partial update applied to an invoice row
#[derive(Debug, Clone, Default)]
pub struct InvoicePatch {
    pub status: Option<InvoiceStatus>,
    pub notes: Option<Option<String>>,
    pub due_at: Option<Option<DateTime<Utc>>>,
    pub paylink_handle: Option<String>,
    pub registry_address: Option<String>,
    pub registry_invoice_id: Option<String>,
    pub issuance_tx_hash: Option<String>,
    pub payment_tx_hash: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

/// Sum of `unit_amount * quantity` over all line items
pub fn compute_total(line_items: &[LineItem]) -> Result<i128, DomainError> {
    line_items.iter().try_fold(0i128, |total, item| {
        let unit = item.unit_stroops()?;
        unit.checked_mul(i128::from(item.quantity.max(0)))
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| DomainError::Validation("Invoice total is too large".to_string()))
    })
}

/// Public slug: `inv-<base36 millis>-<6 random base36 chars>`
pub fn generate_slug(now: DateTime<Utc>) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let random: String = (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("inv-{}-{}", to_base36(now.timestamp_millis().max(0) as u64), random)
}

/// Human invoice number: `CB-<year>-<sequence>`
pub fn invoice_number(now: DateTime<Utc>, existing_count: u64) -> String {
    format!("CB-{}-{:04}", now.year(), existing_count + 1)
}

fn to_base36(mut value: u64) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
