//! Paylink service

use std::sync::Arc;

use chrono::Utc;

use crate::domain::entities::paylink::normalize_handle;
use crate::domain::entities::{NewPaylink, Paylink, User};
use crate::domain::ledger::require_account_address;
use crate::domain::ports::PaylinkRepository;
use crate::error::{AppError, DomainError};

#[derive(Debug, Clone, Default)]
pub struct CreatePaylinkInput {
    pub handle: String,
    /// Defaults to the owner's wallet
    pub receiving_address: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Service for managing paylinks
pub struct PaylinkService<PR>
where
    PR: PaylinkRepository,
{
    paylinks: Arc<PR>,
}

impl<PR> PaylinkService<PR>
where
    PR: PaylinkRepository,
{
    pub fn new(paylinks: Arc<PR>) -> Self {
        Self { paylinks }
    }

    pub async fn create(&self, owner: &User, input: CreatePaylinkInput) -> Result<Paylink, AppError> {
        let handle = normalize_handle(&input.handle)?;
        if self.paylinks.find_by_handle(&handle).await?.is_some() {
            return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                "Handle '{}' is taken",
                handle
            ))));
        }

        let receiving_address = match input.receiving_address.as_deref().map(str::trim) {
            Some(address) if !address.is_empty() => require_account_address(address)?,
            _ => owner.wallet_address.clone(),
        };

        let paylink = self
            .paylinks
            .create(&NewPaylink {
                handle,
                owner_id: owner.id,
                receiving_address,
                title: trimmed(input.title),
                description: trimmed(input.description),
            })
            .await?;
        tracing::info!(handle = %paylink.handle, "Created paylink");
        Ok(paylink)
    }

    pub async fn list_for_owner(&self, owner: &User) -> Result<Vec<Paylink>, AppError> {
        Ok(self.paylinks.list_active_for_owner(&owner.id).await?)
    }

    /// Public lookup; archived paylinks are hidden
    pub async fn get_by_handle(&self, handle: &str) -> Result<Paylink, AppError> {
        let handle = normalize_handle(handle)?;
        self.paylinks
            .find_by_handle(&handle)
            .await?
            .filter(|p| p.is_active && !p.is_archived())
            .ok_or_else(|| AppError::NotFound(format!("Paylink {}", handle)))
    }

    pub async fn archive(&self, owner: &User, handle: &str) -> Result<Paylink, AppError> {
        let handle = normalize_handle(handle)?;
        let paylink = self
            .paylinks
            .find_by_handle(&handle)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Paylink {}", handle)))?;
        if paylink.owner_id != owner.id {
            return Err(AppError::Forbidden);
        }
        if paylink.is_archived() {
            return Ok(paylink);
        }
        Ok(self.paylinks.archive(&paylink.id, Utc::now()).await?)
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
