//! Settlement verification against Horizon
//!
//! Payments are signed and submitted by the client wallet. This service only
//! looks the resulting transaction up and checks it pays the right account.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::time::{sleep, Instant};

use crate::domain::entities::paylink::normalize_handle;
use crate::domain::entities::Invoice;
use crate::domain::ledger::{
    display_amount, normalize_tx_hash, parse_amount, require_account_address, serialize_stroops,
};
use crate::domain::ports::{
    HorizonClient, HorizonOperation, HorizonTransaction, InvoiceRepository, PaylinkRepository,
    UserRepository,
};
use crate::error::{AppError, HorizonError};

use super::invoice_service::settle;

/// Longest text memo Stellar accepts
pub const MAX_TEXT_MEMO_LEN: usize = 28;

/// Why a settlement was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementFailure {
    InvoiceNotFound,
    InvoiceArchived,
    InvoiceNotRegistered,
    AlreadyPaid,
    TransactionFailed,
    MemoMismatch,
    NoMatchingPayment,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    /// Amount paid in stroops
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SettlementFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<Invoice>,
}

impl SettlementOutcome {
    fn failed(reason: SettlementFailure) -> Self {
        Self {
            ok: false,
            payer: None,
            amount: None,
            reason: Some(reason),
            invoice: None,
        }
    }

    fn paid(payment: MatchedPayment) -> Self {
        Self {
            ok: true,
            payer: Some(payment.payer),
            amount: Some(payment.amount.to_string()),
            reason: None,
            invoice: None,
        }
    }
}

/// What a payment has to look like to count
#[derive(Debug, Clone, Default)]
pub struct PaymentExpectation {
    pub to: String,
    pub amount: Option<i128>,
    pub from: Option<String>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPayment {
    pub payer: String,
    pub amount: i128,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountBalance {
    pub address: String,
    #[serde(serialize_with = "serialize_stroops")]
    pub balance: i128,
    pub label: String,
}

#[derive(Debug, Clone, Copy)]
pub struct SettlementTiming {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl SettlementTiming {
    pub fn from_config(timeout_seconds: i64, poll_millis: i64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_seconds.max(0) as u64),
            poll_interval: Duration::from_millis(poll_millis.max(1) as u64),
        }
    }
}

/// Service verifying on-chain payments for invoices and paylinks
pub struct SettlementService<IR, PR, UR, HC>
where
    IR: InvoiceRepository,
    PR: PaylinkRepository,
    UR: UserRepository,
    HC: HorizonClient,
{
    invoices: Arc<IR>,
    paylinks: Arc<PR>,
    users: Arc<UR>,
    horizon: Arc<HC>,
    timing: SettlementTiming,
}

impl<IR, PR, UR, HC> SettlementService<IR, PR, UR, HC>
where
    IR: InvoiceRepository,
    PR: PaylinkRepository,
    UR: UserRepository,
    HC: HorizonClient,
{
    pub fn new(
        invoices: Arc<IR>,
        paylinks: Arc<PR>,
        users: Arc<UR>,
        horizon: Arc<HC>,
        timing: SettlementTiming,
    ) -> Self {
        Self {
            invoices,
            paylinks,
            users,
            horizon,
            timing,
        }
    }

    /// Verify `tx_hash` pays invoice `slug` and mark it paid
    pub async fn record_settlement(
        &self,
        slug: &str,
        tx_hash: &str,
    ) -> Result<SettlementOutcome, AppError> {
        let tx_hash = normalize_tx_hash(tx_hash)?;

        let invoice = match self.invoices.find_by_slug(slug.trim()).await? {
            Some(invoice) => invoice,
            None => return Ok(SettlementOutcome::failed(SettlementFailure::InvoiceNotFound)),
        };
        if invoice.is_archived() {
            return Ok(SettlementOutcome::failed(SettlementFailure::InvoiceArchived));
        }
        if invoice.is_paid() {
            return Ok(SettlementOutcome::failed(SettlementFailure::AlreadyPaid));
        }
        if !invoice.is_registered() {
            return Ok(SettlementOutcome::failed(
                SettlementFailure::InvoiceNotRegistered,
            ));
        }

        let expected = PaymentExpectation {
            to: self.receiving_address(&invoice).await?,
            amount: Some(invoice.total_amount),
            from: invoice.payer_address.clone(),
            memo: Some(invoice.number.clone()),
        };

        let payment = match self.verify(&tx_hash, &expected).await? {
            Ok(payment) => payment,
            Err(reason) => {
                tracing::warn!(slug = %invoice.slug, tx_hash = %tx_hash, ?reason, "Settlement rejected");
                return Ok(SettlementOutcome::failed(reason));
            }
        };

        let invoice = settle(self.invoices.as_ref(), invoice, tx_hash, Utc::now()).await?;
        let mut outcome = SettlementOutcome::paid(payment);
        outcome.invoice = Some(invoice);
        Ok(outcome)
    }

    /// Check `tx_hash` pays the paylink `handle`
    pub async fn verify_paylink_payment(
        &self,
        handle: &str,
        tx_hash: &str,
        amount: Option<&str>,
        from: Option<&str>,
        memo: Option<&str>,
    ) -> Result<SettlementOutcome, AppError> {
        let tx_hash = normalize_tx_hash(tx_hash)?;
        let handle = normalize_handle(handle)?;
        let paylink = self
            .paylinks
            .find_by_handle(&handle)
            .await?
            .filter(|p| p.is_active && !p.is_archived())
            .ok_or_else(|| AppError::NotFound(format!("Paylink {}", handle)))?;

        let amount = match amount.map(str::trim).filter(|a| !a.is_empty()) {
            Some(a) => Some(parse_amount(a)?),
            None => None,
        };
        let from = match from.map(str::trim).filter(|f| !f.is_empty()) {
            Some(f) => Some(require_account_address(f)?),
            None => None,
        };

        let expected = PaymentExpectation {
            to: paylink.receiving_address,
            amount,
            from,
            memo: memo.filter(|m| !m.trim().is_empty()).map(str::to_string),
        };

        Ok(match self.verify(&tx_hash, &expected).await? {
            Ok(payment) => SettlementOutcome::paid(payment),
            Err(reason) => SettlementOutcome::failed(reason),
        })
    }

    /// Native balance of an account
    pub async fn account_balance(&self, address: &str) -> Result<AccountBalance, AppError> {
        let address = require_account_address(address)?;
        let account = self.horizon.get_account(&address).await?;
        let balance = match account.native_balance() {
            Some(b) => parse_amount(b)?,
            None => 0,
        };
        Ok(AccountBalance {
            address,
            balance,
            label: display_amount(balance),
        })
    }

    async fn receiving_address(&self, invoice: &Invoice) -> Result<String, AppError> {
        if let Some(handle) = &invoice.paylink_handle {
            if let Some(paylink) = self.paylinks.find_by_handle(handle).await? {
                return Ok(paylink.receiving_address);
            }
            tracing::warn!(slug = %invoice.slug, handle = %handle, "Attached paylink missing");
        }
        let owner = self
            .users
            .find_by_id(&invoice.owner_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Invoice owner {} missing", invoice.owner_id)))?;
        Ok(owner.wallet_address)
    }

    async fn verify(
        &self,
        tx_hash: &str,
        expected: &PaymentExpectation,
    ) -> Result<Result<MatchedPayment, SettlementFailure>, AppError> {
        let tx = match self.wait_for_transaction(tx_hash).await? {
            Some(tx) => tx,
            None => return Ok(Err(SettlementFailure::TransactionFailed)),
        };
        let operations = self.horizon.list_operations(tx_hash).await?;
        Ok(match_payment(&tx, &operations, expected))
    }

    /// Poll until the transaction is successful. `None` when it failed or
    /// never showed up before the timeout.
    async fn wait_for_transaction(
        &self,
        tx_hash: &str,
    ) -> Result<Option<HorizonTransaction>, AppError> {
        let deadline = Instant::now() + self.timing.timeout;
        loop {
            match self.horizon.get_transaction(tx_hash).await {
                Ok(tx) if tx.successful => return Ok(Some(tx)),
                Ok(_) => return Ok(None),
                Err(HorizonError::TransactionNotFound(_)) => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction not on ledger yet");
                }
                Err(e) => return Err(e.into()),
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(self.timing.poll_interval).await;
        }
    }
}

/// Find a native payment matching `expected` in a successful transaction
pub fn match_payment(
    tx: &HorizonTransaction,
    operations: &[HorizonOperation],
    expected: &PaymentExpectation,
) -> Result<MatchedPayment, SettlementFailure> {
    let wanted_memo = expected.memo.as_deref().filter(|m| !m.trim().is_empty());
    if let (Some(want), Some(got)) = (wanted_memo, tx.text_memo()) {
        // compared verbatim, as submitted
        let want: String = want.chars().take(MAX_TEXT_MEMO_LEN).collect();
        if got != want {
            return Err(SettlementFailure::MemoMismatch);
        }
    }

    operations
        .iter()
        .filter(|op| op.is_native_payment())
        .find_map(|op| {
            let to = op.to.as_deref()?;
            if !to.eq_ignore_ascii_case(&expected.to) {
                return None;
            }
            let amount = parse_amount(op.amount.as_deref()?).ok()?;
            if expected.amount.map(|a| a != amount).unwrap_or(false) {
                return None;
            }
            let payer = op
                .from
                .clone()
                .or_else(|| tx.source_account.clone())
                .unwrap_or_default();
            if let Some(from) = &expected.from {
                if !payer.eq_ignore_ascii_case(from) {
                    return None;
                }
            }
            Some(MatchedPayment { payer, amount })
        })
        .ok_or(SettlementFailure::NoMatchingPayment)
}
