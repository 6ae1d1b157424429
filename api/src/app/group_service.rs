//! Group service
//!
//! Creation and settings of creator groups, membership passes, and the
//! owner's platform subscription.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::entities::group::{normalize_admin_shares, normalize_tags};
use crate::domain::entities::{
    BillingCadence, Group, GroupAdministrator, GroupId, GroupSettings, Membership,
    MembershipStatus, NewGroup, User, UserId, Visibility,
};
use crate::domain::ledger::{
    display_amount, extend_expiry, normalize_optional_tx_hash, require_account_address,
    serialize_stroops,
};
use crate::domain::ports::{GroupRepository, UserRepository};
use crate::error::{AppError, DomainError};

const MAX_GROUP_NAME_LEN: usize = 80;
const PUBLIC_PAGE_LIMIT: u64 = 100;

/// Membership pricing and subscription terms
#[derive(Debug, Clone)]
pub struct GroupTerms {
    pub membership_duration: Duration,
    pub membership_price_stroops: i128,
    pub subscription_price_usd: String,
}

/// Input for a new group
#[derive(Debug, Clone, Default)]
pub struct CreateGroupInput {
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub about_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub gallery_urls: Vec<String>,
    pub tags: Vec<String>,
    pub visibility: Option<Visibility>,
    pub billing_cadence: Option<BillingCadence>,
    pub price: i128,
    pub subscription_id: Option<String>,
    pub subscription_tx_hash: Option<String>,
}

/// Administrator as submitted by the owner
#[derive(Debug, Clone)]
pub struct AdministratorInput {
    pub wallet_address: String,
    pub share_bps: i64,
}

/// Owner-editable settings
#[derive(Debug, Clone, Default)]
pub struct UpdateSettingsInput {
    pub short_description: Option<String>,
    pub about_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub gallery_urls: Vec<String>,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub billing_cadence: BillingCadence,
    pub price: i128,
    pub administrators: Vec<AdministratorInput>,
}

/// A member as listed on the group page
#[derive(Debug, Clone, Serialize)]
pub struct GroupMember {
    pub user_id: UserId,
    pub wallet_address: Option<String>,
    pub display_name: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub pass_expires_at: Option<DateTime<Utc>>,
}

/// Platform membership price shown before checkout
#[derive(Debug, Clone, Serialize)]
pub struct FeeQuote {
    #[serde(serialize_with = "serialize_stroops")]
    pub price_stroops: i128,
    pub price_label: String,
    pub usd_label: String,
}

/// Service for managing groups and memberships
pub struct GroupService<GR, UR>
where
    GR: GroupRepository,
    UR: UserRepository,
{
    groups: Arc<GR>,
    users: Arc<UR>,
    terms: GroupTerms,
}

impl<GR, UR> GroupService<GR, UR>
where
    GR: GroupRepository,
    UR: UserRepository,
{
    pub fn new(groups: Arc<GR>, users: Arc<UR>, terms: GroupTerms) -> Self {
        Self {
            groups,
            users,
            terms,
        }
    }

    /// Create a group owned by `owner`, who becomes its first member
    pub async fn create(&self, owner: &User, input: CreateGroupInput) -> Result<Group, AppError> {
        let name = input.name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_GROUP_NAME_LEN {
            return Err(AppError::BadRequest(format!(
                "Group name must be between 1 and {} characters",
                MAX_GROUP_NAME_LEN
            )));
        }
        if self.groups.find_by_name(&name).await?.is_some() {
            return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                "Group with name '{}' already exists",
                name
            ))));
        }
        ensure_price(input.price)?;

        let tx_hash = normalize_optional_tx_hash(input.subscription_tx_hash.as_deref())?;
        let now = Utc::now();
        let (ends_on, paid_at) = match tx_hash {
            Some(_) => (Some(now + self.terms.membership_duration), Some(now)),
            None => (None, None),
        };

        let new_group = NewGroup {
            name,
            description: trimmed(input.description),
            short_description: trimmed(input.short_description),
            about_url: trimmed(input.about_url),
            thumbnail_url: trimmed(input.thumbnail_url),
            gallery_urls: clean_urls(input.gallery_urls),
            tags: normalize_tags(&input.tags),
            visibility: input.visibility.unwrap_or_default(),
            billing_cadence: cadence_for(input.price, input.billing_cadence.unwrap_or_default()),
            owner_id: owner.id,
            price: input.price,
            ends_on,
            subscription_id: trimmed(input.subscription_id),
            last_subscription_paid_at: paid_at,
            last_subscription_tx_hash: tx_hash,
        };

        let mut group = self.groups.create(&new_group).await?;
        self.groups
            .save_membership(&Membership {
                group_id: group.id,
                user_id: owner.id,
                status: MembershipStatus::Active,
                joined_at: now,
                left_at: None,
                pass_expires_at: None,
            })
            .await?;
        group.member_number = self.refresh_member_number(&group.id).await?;

        tracing::info!(group_id = %group.id, owner_id = %owner.id, "Created group");
        Ok(group)
    }

    pub async fn update_settings(
        &self,
        owner: &User,
        group_id: &GroupId,
        input: UpdateSettingsInput,
    ) -> Result<Group, AppError> {
        self.owned_group(owner, group_id).await?;
        ensure_price(input.price)?;

        let mut administrators = Vec::with_capacity(input.administrators.len());
        for admin in &input.administrators {
            let wallet = require_account_address(&admin.wallet_address)?;
            let user = self.users.find_by_wallet(&wallet).await?.ok_or_else(|| {
                DomainError::Validation(format!("No user found for wallet {}", wallet))
            })?;
            administrators.push(GroupAdministrator {
                user_id: user.id,
                share_bps: admin.share_bps.clamp(0, i64::from(u32::MAX)) as u32,
            });
        }

        let settings = GroupSettings {
            short_description: trimmed(input.short_description),
            about_url: trimmed(input.about_url),
            thumbnail_url: trimmed(input.thumbnail_url),
            gallery_urls: clean_urls(input.gallery_urls),
            tags: normalize_tags(&input.tags),
            visibility: input.visibility,
            billing_cadence: cadence_for(input.price, input.billing_cadence),
            price: input.price,
            administrators: normalize_admin_shares(administrators),
        };

        Ok(self.groups.update_settings(group_id, &settings).await?)
    }

    pub async fn update_description(
        &self,
        owner: &User,
        group_id: &GroupId,
        description: Option<String>,
    ) -> Result<Group, AppError> {
        self.owned_group(owner, group_id).await?;
        let description = trimmed(description);
        Ok(self
            .groups
            .update_description(group_id, description.as_deref())
            .await?)
    }

    /// Join a group, or refresh the pass of an existing membership
    pub async fn join(
        &self,
        user: &User,
        group_id: &GroupId,
        pass_expires_at: Option<DateTime<Utc>>,
        tx_hash: Option<&str>,
    ) -> Result<Membership, AppError> {
        let group = self.get(group_id).await?;
        if group.is_owned_by(&user.id) {
            return Err(AppError::BadRequest(
                "Owners are already members of their group".to_string(),
            ));
        }

        let now = Utc::now();
        if group.is_paid() && !pass_expires_at.map(|e| e > now).unwrap_or(false) {
            return Err(AppError::BadRequest(
                "A valid membership pass is required to join this group".to_string(),
            ));
        }
        let tx_hash = normalize_optional_tx_hash(tx_hash)?;

        let membership = match self.groups.find_membership(group_id, &user.id).await? {
            Some(existing) if existing.is_active() => Membership {
                pass_expires_at: pass_expires_at.or(existing.pass_expires_at),
                ..existing
            },
            Some(existing) => Membership {
                status: MembershipStatus::Active,
                joined_at: now,
                left_at: None,
                pass_expires_at,
                ..existing
            },
            None => Membership {
                group_id: *group_id,
                user_id: user.id,
                status: MembershipStatus::Active,
                joined_at: now,
                left_at: None,
                pass_expires_at,
            },
        };

        let membership = self.groups.save_membership(&membership).await?;
        self.refresh_member_number(group_id).await?;

        tracing::info!(
            group_id = %group_id,
            user_id = %user.id,
            tx_hash = tx_hash.as_deref().unwrap_or("-"),
            "Joined group"
        );
        Ok(membership)
    }

    pub async fn leave(&self, user: &User, group_id: &GroupId) -> Result<Membership, AppError> {
        let group = self.get(group_id).await?;
        if group.is_owned_by(&user.id) {
            return Err(AppError::BadRequest(
                "Owners cannot leave their own group".to_string(),
            ));
        }

        let existing = self
            .groups
            .find_membership(group_id, &user.id)
            .await?
            .filter(Membership::is_active)
            .ok_or_else(|| AppError::NotFound("Active membership".to_string()))?;

        let membership = self
            .groups
            .save_membership(&Membership {
                status: MembershipStatus::Left,
                left_at: Some(Utc::now()),
                ..existing
            })
            .await?;
        self.refresh_member_number(group_id).await?;
        Ok(membership)
    }

    /// Extend the owner's subscription; unexpired time carries over
    pub async fn renew_subscription(
        &self,
        owner: &User,
        group_id: &GroupId,
        tx_hash: Option<&str>,
    ) -> Result<DateTime<Utc>, AppError> {
        let group = self.owned_group(owner, group_id).await?;
        let tx_hash = normalize_optional_tx_hash(tx_hash)?;

        let now = Utc::now();
        let ends_on = extend_expiry(group.ends_on, now, self.terms.membership_duration);
        let group = self
            .groups
            .update_subscription(group_id, ends_on, now, tx_hash.as_deref())
            .await?;

        tracing::info!(group_id = %group_id, ends_on = %ends_on, "Renewed subscription");
        Ok(group.ends_on.unwrap_or(ends_on))
    }

    pub async fn list_public(&self, limit: u64, offset: u64) -> Result<Vec<Group>, AppError> {
        Ok(self
            .groups
            .list_public(limit.clamp(1, PUBLIC_PAGE_LIMIT), offset)
            .await?)
    }

    pub async fn get(&self, group_id: &GroupId) -> Result<Group, AppError> {
        self.groups
            .find_by_id(group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {}", group_id)))
    }

    pub async fn list_owned(&self, user: &User) -> Result<Vec<Group>, AppError> {
        Ok(self.groups.list_owned(&user.id).await?)
    }

    pub async fn list_joined(&self, user: &User) -> Result<Vec<Group>, AppError> {
        Ok(self.groups.list_joined(&user.id).await?)
    }

    pub async fn list_members(&self, group_id: &GroupId) -> Result<Vec<GroupMember>, AppError> {
        self.get(group_id).await?;
        let memberships = self.groups.list_active_members(group_id).await?;

        let mut members = Vec::with_capacity(memberships.len());
        for membership in memberships {
            let user = self.users.find_by_id(&membership.user_id).await?;
            members.push(GroupMember {
                user_id: membership.user_id,
                wallet_address: user.as_ref().map(|u| u.wallet_address.clone()),
                display_name: user.and_then(|u| u.display_name),
                joined_at: membership.joined_at,
                pass_expires_at: membership.pass_expires_at,
            });
        }
        Ok(members)
    }

    pub fn platform_fee_quote(&self) -> FeeQuote {
        let price = self.terms.membership_price_stroops;
        FeeQuote {
            price_stroops: price,
            price_label: display_amount(price),
            usd_label: format!("${}", self.terms.subscription_price_usd),
        }
    }

    async fn owned_group(&self, owner: &User, group_id: &GroupId) -> Result<Group, AppError> {
        let group = self.get(group_id).await?;
        if !group.is_owned_by(&owner.id) {
            return Err(AppError::Forbidden);
        }
        Ok(group)
    }

    async fn refresh_member_number(&self, group_id: &GroupId) -> Result<i32, AppError> {
        let count = self.groups.count_active_members(group_id).await? as i32;
        self.groups.set_member_number(group_id, count).await?;
        Ok(count)
    }
}

fn ensure_price(price: i128) -> Result<(), DomainError> {
    if price < 0 {
        return Err(DomainError::Validation(
            "Price must be zero or positive".to_string(),
        ));
    }
    Ok(())
}

/// Paid groups always bill monthly
fn cadence_for(price: i128, requested: BillingCadence) -> BillingCadence {
    if price > 0 {
        BillingCadence::Monthly
    } else {
        requested
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_urls(urls: Vec<String>) -> Vec<String> {
    urls.into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect()
}
