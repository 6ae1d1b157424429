//! Group domain entity
//!
//! A creator community. Paid groups require members to hold an unexpired
//! membership pass; the owner keeps the group live by renewing a platform
//! subscription.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;
use crate::domain::ledger::{serialize_stroops, BPS_DENOMINATOR};

/// Maximum number of tags stored per group
pub const MAX_GROUP_TAGS: usize = 10;

/// Unique identifier for a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub Uuid);

impl GroupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for GroupId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who can discover the group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            _ => Err(format!("Unknown visibility: {}", s)),
        }
    }
}

/// Billing cadence for members
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCadence {
    #[default]
    Free,
    Monthly,
}

impl std::fmt::Display for BillingCadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillingCadence::Free => write!(f, "free"),
            BillingCadence::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for BillingCadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(BillingCadence::Free),
            "monthly" => Ok(BillingCadence::Monthly),
            _ => Err(format!("Unknown billing cadence: {}", s)),
        }
    }
}

/// Revenue administrator of a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupAdministrator {
    pub user_id: UserId,
    pub share_bps: u32,
}

/// A creator community
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub about_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub gallery_urls: Vec<String>,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub billing_cadence: BillingCadence,
    pub owner_id: UserId,
    /// Membership price in stroops (0 for free groups)
    #[serde(serialize_with = "serialize_stroops")]
    pub price: i128,
    /// Number of active members
    pub member_number: i32,
    /// When the owner's platform subscription lapses
    pub ends_on: Option<DateTime<Utc>>,
    pub subscription_id: Option<String>,
    pub last_subscription_paid_at: Option<DateTime<Utc>>,
    pub last_subscription_tx_hash: Option<String>,
    pub administrators: Vec<GroupAdministrator>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn is_paid(&self) -> bool {
        self.price > 0
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.owner_id == *user_id
    }

    /// Subscription still running at `now`
    pub fn is_subscription_active(&self, now: DateTime<Utc>) -> bool {
        self.ends_on.map(|e| e > now).unwrap_or(false)
    }
}

/// Data needed to create a new group
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub about_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub gallery_urls: Vec<String>,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub billing_cadence: BillingCadence,
    pub owner_id: UserId,
    pub price: i128,
    pub ends_on: Option<DateTime<Utc>>,
    pub subscription_id: Option<String>,
    pub last_subscription_paid_at: Option<DateTime<Utc>>,
    pub last_subscription_tx_hash: Option<String>,
}

/// Settings an owner may change after creation
#[derive(Debug, Clone)]
pub struct GroupSettings {
    pub short_description: Option<String>,
    pub about_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub gallery_urls: Vec<String>,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub billing_cadence: BillingCadence,
    pub price: i128,
    pub administrators: Vec<GroupAdministrator>,
}

/// Membership status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Left,
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipStatus::Active => write!(f, "active"),
            MembershipStatus::Left => write!(f, "left"),
        }
    }
}

impl std::str::FromStr for MembershipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(MembershipStatus::Active),
            "left" => Ok(MembershipStatus::Left),
            _ => Err(format!("Unknown membership status: {}", s)),
        }
    }
}

/// A user's membership in a group
#[derive(Debug, Clone, Serialize)]
pub struct Membership {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub pass_expires_at: Option<DateTime<Utc>>,
}

impl Membership {
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }

    pub fn has_valid_pass(&self, now: DateTime<Utc>) -> bool {
        self.pass_expires_at.map(|e| e > now).unwrap_or(false)
    }
}

/// Trim, lower-case and deduplicate tags, keeping the first `MAX_GROUP_TAGS`
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() || out.contains(&tag) {
            continue;
        }
        out.push(tag);
        if out.len() == MAX_GROUP_TAGS {
            break;
        }
    }
    out
}

/// Clip administrator shares to 10000 bps in total.
///
/// The overflow is taken from the last administrator, and administrators
/// left with no share are dropped.
pub fn normalize_admin_shares(mut admins: Vec<GroupAdministrator>) -> Vec<GroupAdministrator> {
    let total: u64 = admins.iter().map(|a| u64::from(a.share_bps)).sum();
    let limit = u64::from(BPS_DENOMINATOR);
    if total > limit {
        if let Some(last) = admins.last_mut() {
            let diff = total - limit;
            last.share_bps = u64::from(last.share_bps).saturating_sub(diff) as u32;
        }
    }
    admins.retain(|a| a.share_bps > 0);
    admins
}
