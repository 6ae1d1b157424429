//! Marketplace domain entities
//!
//! Listings mirror membership passes put up for sale on the marketplace
//! contract. Per-user stats back the cooldowns the contract enforces, so the
//! client can tell users how long to wait before they sign anything.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::user::UserId;
use crate::domain::ledger::serialize_stroops;
use crate::error::DomainError;

pub const LIST_COOLDOWN_SECONDS: i64 = 60;
pub const CANCEL_COOLDOWN_SECONDS: i64 = 30;

/// A pass listed for sale
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    /// Contract listing id (u128, decimal)
    pub listing_id: String,
    pub seller_id: UserId,
    pub seller_address: String,
    #[serde(serialize_with = "serialize_stroops")]
    pub price: i128,
    pub active: bool,
    pub last_tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewListing {
    pub listing_id: String,
    pub seller_id: UserId,
    pub seller_address: String,
    pub price: i128,
    pub last_tx_hash: Option<String>,
}

/// Marketplace activity of a user
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserStats {
    pub user_id: UserId,
    pub last_list_at: Option<DateTime<Utc>>,
    pub last_cancel_at: Option<DateTime<Utc>>,
    pub last_buy_at: Option<DateTime<Utc>>,
    pub daily_buy_count: i32,
    /// UTC day (`YYYY-MM-DD`) that `daily_buy_count` refers to
    pub buy_day_key: Option<String>,
}

impl UserStats {
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }

    /// Purchases made on the UTC day of `now`
    pub fn buys_today(&self, now: DateTime<Utc>) -> i32 {
        if self.buy_day_key.as_deref() == Some(day_key(now).as_str()) {
            self.daily_buy_count
        } else {
            0
        }
    }

    /// Record a purchase at `now`, resetting the daily count on a new day
    pub fn record_buy(&mut self, now: DateTime<Utc>) {
        self.daily_buy_count = self.buys_today(now) + 1;
        self.buy_day_key = Some(day_key(now));
        self.last_buy_at = Some(now);
    }
}

/// Remaining cooldowns in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cooldowns {
    pub list_ms: i64,
    pub cancel_ms: i64,
    pub transfer_ms: i64,
}

impl Cooldowns {
    pub fn compute(stats: &UserStats, now: DateTime<Utc>, transfer_cooldown_seconds: i64) -> Self {
        Self {
            list_ms: remaining_ms(stats.last_list_at, LIST_COOLDOWN_SECONDS, now),
            cancel_ms: remaining_ms(stats.last_cancel_at, CANCEL_COOLDOWN_SECONDS, now),
            transfer_ms: remaining_ms(stats.last_buy_at, transfer_cooldown_seconds, now),
        }
    }
}

/// Milliseconds left before `seconds` have elapsed since `last`
pub fn remaining_ms(last: Option<DateTime<Utc>>, seconds: i64, now: DateTime<Utc>) -> i64 {
    match last {
        Some(last) => ((last + Duration::seconds(seconds)) - now)
            .num_milliseconds()
            .max(0),
        None => 0,
    }
}

pub fn day_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Listing ids are u128 values issued by the marketplace contract
pub fn normalize_listing_id(listing_id: &str) -> Result<String, DomainError> {
    listing_id
        .trim()
        .parse::<u128>()
        .map(|id| id.to_string())
        .map_err(|_| DomainError::Validation(format!("Invalid listing id: '{}'", listing_id.trim())))
}
