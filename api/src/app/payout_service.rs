//! Payout service
//!
//! Payout schedules describe how the split router divides a payment.
//! Executions record each distribution the owner submitted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::payout::sanitize_recipients;
use crate::domain::entities::{
    NewPayoutExecution, NewPayoutSchedule, PayoutExecution, PayoutSchedule, PayoutScheduleId,
    RecipientInput, User,
};
use crate::domain::ledger::{display_amount, normalize_tx_hash, parse_stroops, serialize_stroops, split_by_bps};
use crate::domain::ports::PayoutRepository;
use crate::error::AppError;

/// One line of a split preview
#[derive(Debug, Clone, Serialize)]
pub struct SplitShare {
    pub address: String,
    pub label: Option<String>,
    pub share_bps: u32,
    #[serde(serialize_with = "serialize_stroops")]
    pub amount: i128,
    pub amount_label: String,
}

/// Service for managing payout schedules
pub struct PayoutService<PR>
where
    PR: PayoutRepository,
{
    payouts: Arc<PR>,
}

impl<PR> PayoutService<PR>
where
    PR: PayoutRepository,
{
    pub fn new(payouts: Arc<PR>) -> Self {
        Self { payouts }
    }

    pub async fn list_schedules(&self, owner: &User) -> Result<Vec<PayoutSchedule>, AppError> {
        Ok(self.payouts.list_schedules(&owner.id).await?)
    }

    pub async fn create_schedule(
        &self,
        owner: &User,
        name: &str,
        recipients: &[RecipientInput],
    ) -> Result<PayoutSchedule, AppError> {
        let name = require_name(name)?;
        let recipients = sanitize_recipients(recipients)?;

        let schedule = self
            .payouts
            .create_schedule(&NewPayoutSchedule {
                owner_id: owner.id,
                name,
                recipients,
            })
            .await?;
        tracing::info!(schedule_id = %schedule.id, "Created payout schedule");
        Ok(schedule)
    }

    pub async fn update_schedule(
        &self,
        owner: &User,
        id: &PayoutScheduleId,
        name: &str,
        recipients: &[RecipientInput],
    ) -> Result<PayoutSchedule, AppError> {
        self.owned_schedule(owner, id).await?;
        let name = require_name(name)?;
        let recipients = sanitize_recipients(recipients)?;
        Ok(self.payouts.update_schedule(id, &name, &recipients).await?)
    }

    /// Delete a schedule and its execution history
    pub async fn delete_schedule(&self, owner: &User, id: &PayoutScheduleId) -> Result<(), AppError> {
        self.owned_schedule(owner, id).await?;
        self.payouts.delete_schedule(id).await?;
        tracing::info!(schedule_id = %id, "Deleted payout schedule");
        Ok(())
    }

    /// Record a distribution; the same transaction is only recorded once
    pub async fn record_execution(
        &self,
        owner: &User,
        id: &PayoutScheduleId,
        tx_hash: &str,
        total_amount: &str,
        executed_at: Option<DateTime<Utc>>,
    ) -> Result<PayoutExecution, AppError> {
        self.owned_schedule(owner, id).await?;
        let tx_hash = normalize_tx_hash(tx_hash)?;
        let total_amount = parse_stroops(total_amount)?;
        if total_amount <= 0 {
            return Err(AppError::BadRequest(
                "Total amount must be positive".to_string(),
            ));
        }

        if let Some(existing) = self.payouts.find_execution_by_tx(id, &tx_hash).await? {
            return Ok(existing);
        }

        Ok(self
            .payouts
            .create_execution(&NewPayoutExecution {
                schedule_id: *id,
                owner_id: owner.id,
                tx_hash,
                total_amount,
                executed_at: executed_at.unwrap_or_else(Utc::now),
            })
            .await?)
    }

    pub async fn list_executions(
        &self,
        owner: &User,
        id: &PayoutScheduleId,
    ) -> Result<Vec<PayoutExecution>, AppError> {
        self.owned_schedule(owner, id).await?;
        Ok(self.payouts.list_executions(id).await?)
    }

    /// Amount each recipient receives, as the split router computes it
    pub async fn preview_split(
        &self,
        owner: &User,
        id: &PayoutScheduleId,
        amount: &str,
    ) -> Result<Vec<SplitShare>, AppError> {
        let schedule = self.owned_schedule(owner, id).await?;
        let amount = parse_stroops(amount)?;
        let parts = split_by_bps(amount, &schedule.shares())?;

        Ok(schedule
            .recipients
            .into_iter()
            .zip(parts)
            .map(|(recipient, amount)| SplitShare {
                address: recipient.address,
                label: recipient.label,
                share_bps: recipient.share_bps,
                amount,
                amount_label: display_amount(amount),
            })
            .collect())
    }

    async fn owned_schedule(
        &self,
        owner: &User,
        id: &PayoutScheduleId,
    ) -> Result<PayoutSchedule, AppError> {
        let schedule = self
            .payouts
            .find_schedule(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payout schedule {}", id)))?;
        if schedule.owner_id != owner.id {
            return Err(AppError::Forbidden);
        }
        Ok(schedule)
    }
}

fn require_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Schedule name is required".to_string()));
    }
    Ok(name.to_string())
}
