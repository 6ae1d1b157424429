//! Marketplace service
//!
//! Mirrors membership-pass listings from the marketplace contract and keeps
//! the per-user timestamps behind its cooldowns.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::marketplace::{
    normalize_listing_id, remaining_ms, CANCEL_COOLDOWN_SECONDS, LIST_COOLDOWN_SECONDS,
};
use crate::domain::entities::{Cooldowns, Listing, NewListing, User, UserStats};
use crate::domain::ledger::{
    display_amount, normalize_optional_tx_hash, parse_stroops, platform_fee, serialize_stroops,
};
use crate::domain::ports::MarketplaceRepository;
use crate::error::{AppError, DomainError};

/// Stats with remaining cooldowns for display
#[derive(Debug, Clone, Serialize)]
pub struct UserStatsView {
    #[serde(flatten)]
    pub stats: UserStats,
    pub buys_today: i32,
    pub cooldowns: Cooldowns,
}

/// Split of a sale price between platform and seller
#[derive(Debug, Clone, Serialize)]
pub struct FeeBreakdown {
    #[serde(serialize_with = "serialize_stroops")]
    pub price: i128,
    pub fee_bps: u32,
    #[serde(serialize_with = "serialize_stroops")]
    pub platform_fee: i128,
    #[serde(serialize_with = "serialize_stroops")]
    pub seller_amount: i128,
    pub price_label: String,
    pub seller_label: String,
}

/// Service for marketplace listings
pub struct MarketplaceService<MR>
where
    MR: MarketplaceRepository,
{
    market: Arc<MR>,
    transfer_cooldown_seconds: i64,
    platform_fee_bps: u32,
}

impl<MR> MarketplaceService<MR>
where
    MR: MarketplaceRepository,
{
    pub fn new(market: Arc<MR>, transfer_cooldown_seconds: i64, platform_fee_bps: u32) -> Self {
        Self {
            market,
            transfer_cooldown_seconds,
            platform_fee_bps,
        }
    }

    pub async fn list_active(&self) -> Result<Vec<Listing>, AppError> {
        Ok(self.market.list_active().await?)
    }

    pub async fn list_mine(&self, user: &User) -> Result<Vec<Listing>, AppError> {
        Ok(self.market.list_by_seller(&user.id).await?)
    }

    /// Mirror a new listing. Already-active listings are returned as-is and
    /// inactive ones are reactivated.
    pub async fn create_listing(
        &self,
        seller: &User,
        listing_id: &str,
        price: &str,
        tx_hash: Option<&str>,
    ) -> Result<Listing, AppError> {
        let listing_id = normalize_listing_id(listing_id)?;
        let price = parse_stroops(price)?;
        if price <= 0 {
            return Err(AppError::BadRequest("Price must be positive".to_string()));
        }
        let tx_hash = normalize_optional_tx_hash(tx_hash)?;

        let existing = self.market.find_listing(&listing_id).await?;
        if let Some(listing) = &existing {
            if listing.seller_id != seller.id {
                return Err(AppError::Forbidden);
            }
            if listing.active {
                return Ok(listing.clone());
            }
        }

        let now = Utc::now();
        let mut stats = self.stats_for(seller).await?;
        ensure_elapsed(
            remaining_ms(stats.last_list_at, LIST_COOLDOWN_SECONDS, now),
            "Listing",
        )?;
        ensure_elapsed(
            remaining_ms(stats.last_buy_at, self.transfer_cooldown_seconds, now),
            "Transfer",
        )?;

        let listing = match existing {
            Some(_) => {
                self.market
                    .update_listing(&listing_id, true, price, tx_hash.as_deref())
                    .await?
            }
            None => {
                self.market
                    .create_listing(&NewListing {
                        listing_id,
                        seller_id: seller.id,
                        seller_address: seller.wallet_address.clone(),
                        price,
                        last_tx_hash: tx_hash,
                    })
                    .await?
            }
        };

        stats.last_list_at = Some(now);
        self.market.save_stats(&stats).await?;
        tracing::info!(listing_id = %listing.listing_id, "Listed pass");
        Ok(listing)
    }

    pub async fn cancel_listing(
        &self,
        seller: &User,
        listing_id: &str,
        tx_hash: Option<&str>,
    ) -> Result<Listing, AppError> {
        let listing = self.find_listing(listing_id).await?;
        if listing.seller_id != seller.id {
            return Err(AppError::Forbidden);
        }
        if !listing.active {
            return Err(AppError::Domain(DomainError::Conflict(
                "Listing is not active".to_string(),
            )));
        }
        let tx_hash = normalize_optional_tx_hash(tx_hash)?;

        let now = Utc::now();
        let mut stats = self.stats_for(seller).await?;
        ensure_elapsed(
            remaining_ms(stats.last_cancel_at, CANCEL_COOLDOWN_SECONDS, now),
            "Cancel",
        )?;

        let listing = self
            .market
            .update_listing(&listing.listing_id, false, listing.price, tx_hash.as_deref())
            .await?;
        stats.last_cancel_at = Some(now);
        self.market.save_stats(&stats).await?;
        Ok(listing)
    }

    /// Record a purchase made through the marketplace contract
    pub async fn record_purchase(
        &self,
        buyer: &User,
        listing_id: &str,
        tx_hash: &str,
    ) -> Result<Listing, AppError> {
        let listing = self.find_listing(listing_id).await?;
        if listing.seller_id == buyer.id {
            return Err(AppError::BadRequest(
                "You cannot buy your own listing".to_string(),
            ));
        }
        if !listing.active {
            return Err(AppError::Domain(DomainError::Conflict(
                "Listing is no longer available".to_string(),
            )));
        }
        let tx_hash = normalize_optional_tx_hash(Some(tx_hash))?
            .ok_or_else(|| AppError::BadRequest("Transaction hash is required".to_string()))?;

        let listing = self.market.mark_sold(&listing.listing_id, &tx_hash).await?;

        let mut stats = self.stats_for(buyer).await?;
        stats.record_buy(Utc::now());
        self.market.save_stats(&stats).await?;

        tracing::info!(listing_id = %listing.listing_id, buyer_id = %buyer.id, "Recorded purchase");
        Ok(listing)
    }

    pub async fn get_user_stats(&self, user: &User) -> Result<UserStatsView, AppError> {
        let stats = self.stats_for(user).await?;
        Ok(self.view_at(stats, Utc::now()))
    }

    pub fn fee_breakdown(&self, price: &str) -> Result<FeeBreakdown, AppError> {
        let price = parse_stroops(price)?;
        if price <= 0 {
            return Err(AppError::BadRequest("Price must be positive".to_string()));
        }
        let fee = platform_fee(price, self.platform_fee_bps)?;
        Ok(FeeBreakdown {
            price,
            fee_bps: self.platform_fee_bps,
            platform_fee: fee,
            seller_amount: price - fee,
            price_label: display_amount(price),
            seller_label: display_amount(price - fee),
        })
    }

    fn view_at(&self, stats: UserStats, now: DateTime<Utc>) -> UserStatsView {
        UserStatsView {
            buys_today: stats.buys_today(now),
            cooldowns: Cooldowns::compute(&stats, now, self.transfer_cooldown_seconds),
            stats,
        }
    }

    async fn find_listing(&self, listing_id: &str) -> Result<Listing, AppError> {
        let listing_id = normalize_listing_id(listing_id)?;
        self.market
            .find_listing(&listing_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Listing {}", listing_id)))
    }

    async fn stats_for(&self, user: &User) -> Result<UserStats, AppError> {
        Ok(self
            .market
            .get_stats(&user.id)
            .await?
            .unwrap_or_else(|| UserStats::empty(user.id)))
    }
}

fn ensure_elapsed(remaining_ms: i64, action: &str) -> Result<(), DomainError> {
    if remaining_ms > 0 {
        return Err(DomainError::Conflict(format!(
            "{} cooldown active, try again in {}s",
            action,
            (remaining_ms + 999) / 1000
        )));
    }
    Ok(())
}
