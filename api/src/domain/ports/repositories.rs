//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{
    Group, GroupId, GroupSettings, Invoice, InvoiceId, InvoicePatch, Listing, Membership,
    NewGroup, NewInvoice, NewListing, NewPaylink, NewPayoutExecution, NewPayoutSchedule,
    NewSavingsGoal, NewSavingsMovement, NewUser, Paylink, PaylinkId, PayoutExecution,
    PayoutRecipient, PayoutSchedule, PayoutScheduleId, ProfileUpdate, SavingsGoal, SavingsGoalId,
    SavingsGoalUpdate, SavingsMovement, User, UserId, UserStats,
};
use crate::error::DomainError;

/// Repository for User entities
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Find a user by normalized wallet address
    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>, DomainError>;

    /// Find a user by API key hash
    async fn find_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError>;

    async fn create(&self, user: &NewUser) -> Result<User, DomainError>;

    /// Replace the stored API key hash
    async fn update_api_key_hash(&self, id: &UserId, hash: &str) -> Result<(), DomainError>;

    async fn update_profile(&self, id: &UserId, update: &ProfileUpdate)
        -> Result<User, DomainError>;
}

/// Repository for groups and their memberships
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_by_id(&self, id: &GroupId) -> Result<Option<Group>, DomainError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Group>, DomainError>;

    async fn create(&self, group: &NewGroup) -> Result<Group, DomainError>;

    /// Apply owner settings, replacing the administrator list
    async fn update_settings(
        &self,
        id: &GroupId,
        settings: &GroupSettings,
    ) -> Result<Group, DomainError>;

    async fn update_description(
        &self,
        id: &GroupId,
        description: Option<&str>,
    ) -> Result<Group, DomainError>;

    /// Record a subscription renewal
    async fn update_subscription(
        &self,
        id: &GroupId,
        ends_on: DateTime<Utc>,
        paid_at: DateTime<Utc>,
        tx_hash: Option<&str>,
    ) -> Result<Group, DomainError>;

    async fn set_member_number(&self, id: &GroupId, member_number: i32)
        -> Result<(), DomainError>;

    /// Public groups, newest first
    async fn list_public(&self, limit: u64, offset: u64) -> Result<Vec<Group>, DomainError>;

    async fn list_owned(&self, owner_id: &UserId) -> Result<Vec<Group>, DomainError>;

    /// Groups where the user holds an active membership
    async fn list_joined(&self, user_id: &UserId) -> Result<Vec<Group>, DomainError>;

    async fn find_membership(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<Option<Membership>, DomainError>;

    /// Insert or replace a membership keyed by (group, user)
    async fn save_membership(&self, membership: &Membership) -> Result<Membership, DomainError>;

    /// Active memberships, oldest first
    async fn list_active_members(&self, group_id: &GroupId)
        -> Result<Vec<Membership>, DomainError>;

    async fn count_active_members(&self, group_id: &GroupId) -> Result<i64, DomainError>;
}

/// Repository for invoices
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Invoice>, DomainError>;

    /// Number of invoices ever created by the owner (archived included)
    async fn count_for_owner(&self, owner_id: &UserId) -> Result<u64, DomainError>;

    /// Non-archived invoices, newest first
    async fn list_for_owner(&self, owner_id: &UserId) -> Result<Vec<Invoice>, DomainError>;

    async fn create(&self, invoice: &NewInvoice) -> Result<Invoice, DomainError>;

    async fn update(&self, id: &InvoiceId, patch: &InvoicePatch) -> Result<Invoice, DomainError>;
}

/// Repository for paylinks
#[async_trait]
pub trait PaylinkRepository: Send + Sync {
    async fn find_by_handle(&self, handle: &str) -> Result<Option<Paylink>, DomainError>;

    /// Active, non-archived paylinks, newest first
    async fn list_active_for_owner(&self, owner_id: &UserId) -> Result<Vec<Paylink>, DomainError>;

    async fn create(&self, paylink: &NewPaylink) -> Result<Paylink, DomainError>;

    /// Deactivate and stamp `archived_at`
    async fn archive(&self, id: &PaylinkId, at: DateTime<Utc>) -> Result<Paylink, DomainError>;
}

/// Repository for payout schedules and their executions
#[async_trait]
pub trait PayoutRepository: Send + Sync {
    /// Schedules of an owner, newest first
    async fn list_schedules(&self, owner_id: &UserId) -> Result<Vec<PayoutSchedule>, DomainError>;

    async fn find_schedule(
        &self,
        id: &PayoutScheduleId,
    ) -> Result<Option<PayoutSchedule>, DomainError>;

    async fn create_schedule(
        &self,
        schedule: &NewPayoutSchedule,
    ) -> Result<PayoutSchedule, DomainError>;

    async fn update_schedule(
        &self,
        id: &PayoutScheduleId,
        name: &str,
        recipients: &[PayoutRecipient],
    ) -> Result<PayoutSchedule, DomainError>;

    /// Delete a schedule together with its executions
    async fn delete_schedule(&self, id: &PayoutScheduleId) -> Result<(), DomainError>;

    async fn find_execution_by_tx(
        &self,
        schedule_id: &PayoutScheduleId,
        tx_hash: &str,
    ) -> Result<Option<PayoutExecution>, DomainError>;

    async fn create_execution(
        &self,
        execution: &NewPayoutExecution,
    ) -> Result<PayoutExecution, DomainError>;

    /// Executions of a schedule, most recent first
    async fn list_executions(
        &self,
        schedule_id: &PayoutScheduleId,
    ) -> Result<Vec<PayoutExecution>, DomainError>;
}

/// Repository for savings goals and their movements
#[async_trait]
pub trait SavingsGoalRepository: Send + Sync {
    /// Non-archived goals, newest first
    async fn list_for_owner(&self, owner_id: &UserId) -> Result<Vec<SavingsGoal>, DomainError>;

    async fn find_by_id(&self, id: &SavingsGoalId) -> Result<Option<SavingsGoal>, DomainError>;

    async fn create(&self, goal: &NewSavingsGoal) -> Result<SavingsGoal, DomainError>;

    async fn update_details(
        &self,
        id: &SavingsGoalId,
        update: &SavingsGoalUpdate,
    ) -> Result<SavingsGoal, DomainError>;

    async fn archive(&self, id: &SavingsGoalId, at: DateTime<Utc>)
        -> Result<SavingsGoal, DomainError>;

    /// Movements of a goal, most recent first
    async fn list_movements(&self, goal_id: &SavingsGoalId)
        -> Result<Vec<SavingsMovement>, DomainError>;

    async fn find_movement_by_tx(&self, tx_hash: &str)
        -> Result<Option<SavingsMovement>, DomainError>;

    /// Apply a movement to the current goal balance and insert it in one step.
    /// Fails with `Conflict` on archived goals and `Validation` when a debit
    /// would take the balance below zero.
    async fn record_movement(
        &self,
        movement: &NewSavingsMovement,
    ) -> Result<(SavingsGoal, SavingsMovement), DomainError>;
}

/// Repository for marketplace listings and per-user stats
#[async_trait]
pub trait MarketplaceRepository: Send + Sync {
    async fn find_listing(&self, listing_id: &str) -> Result<Option<Listing>, DomainError>;

    /// Active listings, newest first
    async fn list_active(&self) -> Result<Vec<Listing>, DomainError>;

    async fn list_by_seller(&self, seller_id: &UserId) -> Result<Vec<Listing>, DomainError>;

    async fn create_listing(&self, listing: &NewListing) -> Result<Listing, DomainError>;

    /// Update the mutable listing fields
    async fn update_listing(
        &self,
        listing_id: &str,
        active: bool,
        price: i128,
        last_tx_hash: Option<&str>,
    ) -> Result<Listing, DomainError>;

    /// Deactivate an active listing after a sale. `Conflict` if it is no longer active.
    async fn mark_sold(&self, listing_id: &str, tx_hash: &str) -> Result<Listing, DomainError>;

    async fn get_stats(&self, user_id: &UserId) -> Result<Option<UserStats>, DomainError>;

    async fn save_stats(&self, stats: &UserStats) -> Result<(), DomainError>;
}
