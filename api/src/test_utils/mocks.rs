//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::domain::entities::{
    Group, GroupId, GroupSettings, Invoice, InvoiceId, InvoicePatch, InvoiceStatus, Listing,
    Membership, NewGroup, NewInvoice, NewListing, NewPaylink, NewPayoutExecution,
    NewPayoutSchedule, NewSavingsGoal, NewSavingsMovement, NewUser, Paylink, PaylinkId,
    PayoutExecution, PayoutRecipient, PayoutSchedule, PayoutScheduleId, ProfileUpdate,
    SavingsGoal, SavingsGoalId, SavingsGoalUpdate, SavingsMovement, User, UserId, UserStats,
};
use crate::domain::ports::{
    GroupRepository, HorizonAccount, HorizonClient, HorizonOperation, HorizonTransaction,
    InvoiceRepository, MarketplaceRepository, PaylinkRepository, PayoutRepository,
    SavingsGoalRepository, UserRepository,
};
use crate::error::{DomainError, HorizonError};

fn not_found(what: &str, id: impl std::fmt::Display) -> DomainError {
    DomainError::NotFound(format!("{} {}", what, id))
}

/// Newest first, like the Postgres adapters
fn newest_first<T>(mut items: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

// ============================================================================
// In-Memory User Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a user for testing
    pub fn with_user(self, user: User) -> Self {
        self.users.write().unwrap().insert(user.id, user);
        self
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().unwrap().get(id).cloned())
    }

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.wallet_address == wallet_address)
            .cloned())
    }

    async fn find_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.api_key_hash == hash)
            .cloned())
    }

    async fn create(&self, user: &NewUser) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.wallet_address == user.wallet_address) {
            return Err(DomainError::AlreadyExists(user.wallet_address.clone()));
        }
        let created = User {
            id: UserId::new(),
            wallet_address: user.wallet_address.clone(),
            display_name: user.display_name.clone(),
            avatar_url: None,
            about: None,
            api_key_hash: user.api_key_hash.clone(),
            created_at: Utc::now(),
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_api_key_hash(&self, id: &UserId, hash: &str) -> Result<(), DomainError> {
        let mut users = self.users.write().unwrap();
        let user = users.get_mut(id).ok_or_else(|| not_found("User", id))?;
        user.api_key_hash = hash.to_string();
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        let user = users.get_mut(id).ok_or_else(|| not_found("User", id))?;
        if let Some(display_name) = &update.display_name {
            user.display_name = display_name.clone();
        }
        if let Some(avatar_url) = &update.avatar_url {
            user.avatar_url = avatar_url.clone();
        }
        if let Some(about) = &update.about {
            user.about = about.clone();
        }
        Ok(user.clone())
    }
}

// ============================================================================
// In-Memory Group Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryGroupRepository {
    groups: Arc<RwLock<HashMap<GroupId, Group>>>,
    memberships: Arc<RwLock<HashMap<(GroupId, UserId), Membership>>>,
}

impl InMemoryGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a group for testing
    pub fn with_group(self, group: Group) -> Self {
        self.groups.write().unwrap().insert(group.id, group);
        self
    }

    /// Pre-populate with a membership for testing
    pub fn with_membership(self, membership: Membership) -> Self {
        self.memberships
            .write()
            .unwrap()
            .insert((membership.group_id, membership.user_id), membership);
        self
    }

    fn modify(
        &self,
        id: &GroupId,
        f: impl FnOnce(&mut Group),
    ) -> Result<Group, DomainError> {
        let mut groups = self.groups.write().unwrap();
        let group = groups.get_mut(id).ok_or_else(|| not_found("Group", id))?;
        f(group);
        Ok(group.clone())
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn find_by_id(&self, id: &GroupId) -> Result<Option<Group>, DomainError> {
        Ok(self.groups.read().unwrap().get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Group>, DomainError> {
        Ok(self
            .groups
            .read()
            .unwrap()
            .values()
            .find(|g| g.name == name)
            .cloned())
    }

    async fn create(&self, group: &NewGroup) -> Result<Group, DomainError> {
        let created = Group {
            id: GroupId::new(),
            name: group.name.clone(),
            description: group.description.clone(),
            short_description: group.short_description.clone(),
            about_url: group.about_url.clone(),
            thumbnail_url: group.thumbnail_url.clone(),
            gallery_urls: group.gallery_urls.clone(),
            tags: group.tags.clone(),
            visibility: group.visibility,
            billing_cadence: group.billing_cadence,
            owner_id: group.owner_id,
            price: group.price,
            member_number: 0,
            ends_on: group.ends_on,
            subscription_id: group.subscription_id.clone(),
            last_subscription_paid_at: group.last_subscription_paid_at,
            last_subscription_tx_hash: group.last_subscription_tx_hash.clone(),
            administrators: Vec::new(),
            created_at: Utc::now(),
        };
        self.groups
            .write()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_settings(
        &self,
        id: &GroupId,
        settings: &GroupSettings,
    ) -> Result<Group, DomainError> {
        self.modify(id, |g| {
            g.short_description = settings.short_description.clone();
            g.about_url = settings.about_url.clone();
            g.thumbnail_url = settings.thumbnail_url.clone();
            g.gallery_urls = settings.gallery_urls.clone();
            g.tags = settings.tags.clone();
            g.visibility = settings.visibility;
            g.billing_cadence = settings.billing_cadence;
            g.price = settings.price;
            g.administrators = settings.administrators.clone();
        })
    }

    async fn update_description(
        &self,
        id: &GroupId,
        description: Option<&str>,
    ) -> Result<Group, DomainError> {
        self.modify(id, |g| g.description = description.map(String::from))
    }

    async fn update_subscription(
        &self,
        id: &GroupId,
        ends_on: DateTime<Utc>,
        paid_at: DateTime<Utc>,
        tx_hash: Option<&str>,
    ) -> Result<Group, DomainError> {
        self.modify(id, |g| {
            g.ends_on = Some(ends_on);
            g.last_subscription_paid_at = Some(paid_at);
            if let Some(hash) = tx_hash {
                g.last_subscription_tx_hash = Some(hash.to_string());
            }
        })
    }

    async fn set_member_number(
        &self,
        id: &GroupId,
        member_number: i32,
    ) -> Result<(), DomainError> {
        self.modify(id, |g| g.member_number = member_number)?;
        Ok(())
    }

    async fn list_public(&self, limit: u64, offset: u64) -> Result<Vec<Group>, DomainError> {
        let groups: Vec<Group> = self
            .groups
            .read()
            .unwrap()
            .values()
            .filter(|g| g.visibility == crate::domain::entities::Visibility::Public)
            .cloned()
            .collect();
        Ok(newest_first(groups, |g| g.created_at)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn list_owned(&self, owner_id: &UserId) -> Result<Vec<Group>, DomainError> {
        let groups: Vec<Group> = self
            .groups
            .read()
            .unwrap()
            .values()
            .filter(|g| g.owner_id == *owner_id)
            .cloned()
            .collect();
        Ok(newest_first(groups, |g| g.created_at))
    }

    async fn list_joined(&self, user_id: &UserId) -> Result<Vec<Group>, DomainError> {
        let joined: Vec<GroupId> = self
            .memberships
            .read()
            .unwrap()
            .values()
            .filter(|m| m.user_id == *user_id && m.is_active())
            .map(|m| m.group_id)
            .collect();
        let groups: Vec<Group> = self
            .groups
            .read()
            .unwrap()
            .values()
            .filter(|g| joined.contains(&g.id))
            .cloned()
            .collect();
        Ok(newest_first(groups, |g| g.created_at))
    }

    async fn find_membership(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<Option<Membership>, DomainError> {
        Ok(self
            .memberships
            .read()
            .unwrap()
            .get(&(*group_id, *user_id))
            .cloned())
    }

    async fn save_membership(&self, membership: &Membership) -> Result<Membership, DomainError> {
        self.memberships
            .write()
            .unwrap()
            .insert((membership.group_id, membership.user_id), membership.clone());
        Ok(membership.clone())
    }

    async fn list_active_members(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<Membership>, DomainError> {
        let mut members: Vec<Membership> = self
            .memberships
            .read()
            .unwrap()
            .values()
            .filter(|m| m.group_id == *group_id && m.is_active())
            .cloned()
            .collect();
        members.sort_by_key(|m| m.joined_at);
        Ok(members)
    }

    async fn count_active_members(&self, group_id: &GroupId) -> Result<i64, DomainError> {
        Ok(self
            .memberships
            .read()
            .unwrap()
            .values()
            .filter(|m| m.group_id == *group_id && m.is_active())
            .count() as i64)
    }
}

// ============================================================================
// In-Memory Invoice Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    invoices: Arc<RwLock<HashMap<InvoiceId, Invoice>>>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with an invoice for testing
    pub fn with_invoice(self, invoice: Invoice) -> Self {
        self.invoices.write().unwrap().insert(invoice.id, invoice);
        self
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        Ok(self.invoices.read().unwrap().get(id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Invoice>, DomainError> {
        Ok(self
            .invoices
            .read()
            .unwrap()
            .values()
            .find(|i| i.slug == slug)
            .cloned())
    }

    async fn count_for_owner(&self, owner_id: &UserId) -> Result<u64, DomainError> {
        Ok(self
            .invoices
            .read()
            .unwrap()
            .values()
            .filter(|i| i.owner_id == *owner_id)
            .count() as u64)
    }

    async fn list_for_owner(&self, owner_id: &UserId) -> Result<Vec<Invoice>, DomainError> {
        let invoices: Vec<Invoice> = self
            .invoices
            .read()
            .unwrap()
            .values()
            .filter(|i| i.owner_id == *owner_id && !i.is_archived())
            .cloned()
            .collect();
        Ok(newest_first(invoices, |i| i.created_at))
    }

    async fn create(&self, invoice: &NewInvoice) -> Result<Invoice, DomainError> {
        let mut invoices = self.invoices.write().unwrap();
        if invoices.values().any(|i| i.slug == invoice.slug) {
            return Err(DomainError::AlreadyExists(invoice.slug.clone()));
        }
        let now = Utc::now();
        let created = Invoice {
            id: InvoiceId::new(),
            owner_id: invoice.owner_id,
            slug: invoice.slug.clone(),
            number: invoice.number.clone(),
            title: invoice.title.clone(),
            customer_name: invoice.customer_name.clone(),
            customer_email: invoice.customer_email.clone(),
            due_at: invoice.due_at,
            status: InvoiceStatus::Draft,
            notes: invoice.notes.clone(),
            total_amount: invoice.total_amount,
            line_items: invoice.line_items.clone(),
            paid_at: None,
            paylink_handle: invoice.paylink_handle.clone(),
            payer_address: invoice.payer_address.clone(),
            registry_address: None,
            registry_invoice_id: None,
            issuance_tx_hash: None,
            payment_tx_hash: None,
            archived_at: None,
            created_at: now,
            updated_at: now,
        };
        invoices.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: &InvoiceId, patch: &InvoicePatch) -> Result<Invoice, DomainError> {
        let mut invoices = self.invoices.write().unwrap();
        let invoice = invoices.get_mut(id).ok_or_else(|| not_found("Invoice", id))?;
        if let Some(status) = patch.status {
            invoice.status = status;
        }
        if let Some(notes) = &patch.notes {
            invoice.notes = notes.clone();
        }
        if let Some(due_at) = patch.due_at {
            invoice.due_at = due_at;
        }
        if let Some(handle) = &patch.paylink_handle {
            invoice.paylink_handle = Some(handle.clone());
        }
        if let Some(address) = &patch.registry_address {
            invoice.registry_address = Some(address.clone());
        }
        if let Some(registry_id) = &patch.registry_invoice_id {
            invoice.registry_invoice_id = Some(registry_id.clone());
        }
        if let Some(hash) = &patch.issuance_tx_hash {
            invoice.issuance_tx_hash = Some(hash.clone());
        }
        if let Some(hash) = &patch.payment_tx_hash {
            invoice.payment_tx_hash = Some(hash.clone());
        }
        if let Some(paid_at) = patch.paid_at {
            invoice.paid_at = Some(paid_at);
        }
        if let Some(archived_at) = patch.archived_at {
            invoice.archived_at = Some(archived_at);
        }
        invoice.updated_at = Utc::now();
        Ok(invoice.clone())
    }
}

// ============================================================================
// In-Memory Paylink Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryPaylinkRepository {
    paylinks: Arc<RwLock<HashMap<PaylinkId, Paylink>>>,
}

impl InMemoryPaylinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a paylink for testing
    pub fn with_paylink(self, paylink: Paylink) -> Self {
        self.paylinks.write().unwrap().insert(paylink.id, paylink);
        self
    }
}

#[async_trait]
impl PaylinkRepository for InMemoryPaylinkRepository {
    async fn find_by_handle(&self, handle: &str) -> Result<Option<Paylink>, DomainError> {
        Ok(self
            .paylinks
            .read()
            .unwrap()
            .values()
            .find(|p| p.handle == handle)
            .cloned())
    }

    async fn list_active_for_owner(&self, owner_id: &UserId) -> Result<Vec<Paylink>, DomainError> {
        let paylinks: Vec<Paylink> = self
            .paylinks
            .read()
            .unwrap()
            .values()
            .filter(|p| p.owner_id == *owner_id && p.is_active && !p.is_archived())
            .cloned()
            .collect();
        Ok(newest_first(paylinks, |p| p.created_at))
    }

    async fn create(&self, paylink: &NewPaylink) -> Result<Paylink, DomainError> {
        let mut paylinks = self.paylinks.write().unwrap();
        if paylinks.values().any(|p| p.handle == paylink.handle) {
            return Err(DomainError::AlreadyExists(paylink.handle.clone()));
        }
        let now = Utc::now();
        let created = Paylink {
            id: PaylinkId::new(),
            handle: paylink.handle.clone(),
            owner_id: paylink.owner_id,
            receiving_address: paylink.receiving_address.clone(),
            title: paylink.title.clone(),
            description: paylink.description.clone(),
            is_active: true,
            archived_at: None,
            created_at: now,
            updated_at: now,
        };
        paylinks.insert(created.id, created.clone());
        Ok(created)
    }

    async fn archive(&self, id: &PaylinkId, at: DateTime<Utc>) -> Result<Paylink, DomainError> {
        let mut paylinks = self.paylinks.write().unwrap();
        let paylink = paylinks.get_mut(id).ok_or_else(|| not_found("Paylink", id))?;
        paylink.is_active = false;
        paylink.archived_at = Some(at);
        paylink.updated_at = at;
        Ok(paylink.clone())
    }
}

// ============================================================================
// In-Memory Payout Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryPayoutRepository {
    schedules: Arc<RwLock<HashMap<PayoutScheduleId, PayoutSchedule>>>,
    executions: Arc<RwLock<Vec<PayoutExecution>>>,
}

impl InMemoryPayoutRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a schedule for testing
    pub fn with_schedule(self, schedule: PayoutSchedule) -> Self {
        self.schedules.write().unwrap().insert(schedule.id, schedule);
        self
    }
}

#[async_trait]
impl PayoutRepository for InMemoryPayoutRepository {
    async fn list_schedules(&self, owner_id: &UserId) -> Result<Vec<PayoutSchedule>, DomainError> {
        let schedules: Vec<PayoutSchedule> = self
            .schedules
            .read()
            .unwrap()
            .values()
            .filter(|s| s.owner_id == *owner_id)
            .cloned()
            .collect();
        Ok(newest_first(schedules, |s| s.created_at))
    }

    async fn find_schedule(
        &self,
        id: &PayoutScheduleId,
    ) -> Result<Option<PayoutSchedule>, DomainError> {
        Ok(self.schedules.read().unwrap().get(id).cloned())
    }

    async fn create_schedule(
        &self,
        schedule: &NewPayoutSchedule,
    ) -> Result<PayoutSchedule, DomainError> {
        let now = Utc::now();
        let created = PayoutSchedule {
            id: PayoutScheduleId::new(),
            owner_id: schedule.owner_id,
            name: schedule.name.clone(),
            recipients: schedule.recipients.clone(),
            created_at: now,
            updated_at: now,
        };
        self.schedules
            .write()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_schedule(
        &self,
        id: &PayoutScheduleId,
        name: &str,
        recipients: &[PayoutRecipient],
    ) -> Result<PayoutSchedule, DomainError> {
        let mut schedules = self.schedules.write().unwrap();
        let schedule = schedules
            .get_mut(id)
            .ok_or_else(|| not_found("Payout schedule", id))?;
        schedule.name = name.to_string();
        schedule.recipients = recipients.to_vec();
        schedule.updated_at = Utc::now();
        Ok(schedule.clone())
    }

    async fn delete_schedule(&self, id: &PayoutScheduleId) -> Result<(), DomainError> {
        self.executions
            .write()
            .unwrap()
            .retain(|e| e.schedule_id != *id);
        self.schedules.write().unwrap().remove(id);
        Ok(())
    }

    async fn find_execution_by_tx(
        &self,
        schedule_id: &PayoutScheduleId,
        tx_hash: &str,
    ) -> Result<Option<PayoutExecution>, DomainError> {
        Ok(self
            .executions
            .read()
            .unwrap()
            .iter()
            .find(|e| e.schedule_id == *schedule_id && e.tx_hash == tx_hash)
            .cloned())
    }

    async fn create_execution(
        &self,
        execution: &NewPayoutExecution,
    ) -> Result<PayoutExecution, DomainError> {
        let created = PayoutExecution {
            id: Uuid::new_v4(),
            schedule_id: execution.schedule_id,
            owner_id: execution.owner_id,
            tx_hash: execution.tx_hash.clone(),
            total_amount: execution.total_amount,
            executed_at: execution.executed_at,
            created_at: Utc::now(),
        };
        self.executions.write().unwrap().push(created.clone());
        Ok(created)
    }

    async fn list_executions(
        &self,
        schedule_id: &PayoutScheduleId,
    ) -> Result<Vec<PayoutExecution>, DomainError> {
        let executions: Vec<PayoutExecution> = self
            .executions
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.schedule_id == *schedule_id)
            .cloned()
            .collect();
        Ok(newest_first(executions, |e| e.executed_at))
    }
}

// ============================================================================
// In-Memory Savings Goal Repository
// ============================================================================

#[derive(Default)]
pub struct InMemorySavingsGoalRepository {
    goals: Arc<RwLock<HashMap<SavingsGoalId, SavingsGoal>>>,
    movements: Arc<RwLock<Vec<SavingsMovement>>>,
}

impl InMemorySavingsGoalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a goal for testing
    pub fn with_goal(self, goal: SavingsGoal) -> Self {
        self.goals.write().unwrap().insert(goal.id, goal);
        self
    }
}

#[async_trait]
impl SavingsGoalRepository for InMemorySavingsGoalRepository {
    async fn list_for_owner(&self, owner_id: &UserId) -> Result<Vec<SavingsGoal>, DomainError> {
        let goals: Vec<SavingsGoal> = self
            .goals
            .read()
            .unwrap()
            .values()
            .filter(|g| g.owner_id == *owner_id && !g.is_archived())
            .cloned()
            .collect();
        Ok(newest_first(goals, |g| g.created_at))
    }

    async fn find_by_id(&self, id: &SavingsGoalId) -> Result<Option<SavingsGoal>, DomainError> {
        Ok(self.goals.read().unwrap().get(id).cloned())
    }

    async fn create(&self, goal: &NewSavingsGoal) -> Result<SavingsGoal, DomainError> {
        let now = Utc::now();
        let created = SavingsGoal {
            id: SavingsGoalId::new(),
            owner_id: goal.owner_id,
            name: goal.name.clone(),
            target_amount: goal.target_amount,
            current_amount: 0,
            target_date: goal.target_date,
            notes: goal.notes.clone(),
            archived_at: None,
            created_at: now,
            updated_at: now,
        };
        self.goals
            .write()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_details(
        &self,
        id: &SavingsGoalId,
        update: &SavingsGoalUpdate,
    ) -> Result<SavingsGoal, DomainError> {
        let mut goals = self.goals.write().unwrap();
        let goal = goals.get_mut(id).ok_or_else(|| not_found("Savings goal", id))?;
        if let Some(name) = &update.name {
            goal.name = name.clone();
        }
        if let Some(target) = update.target_amount {
            goal.target_amount = target;
        }
        if let Some(target_date) = update.target_date {
            goal.target_date = target_date;
        }
        if let Some(notes) = &update.notes {
            goal.notes = notes.clone();
        }
        goal.updated_at = Utc::now();
        Ok(goal.clone())
    }

    async fn archive(
        &self,
        id: &SavingsGoalId,
        at: DateTime<Utc>,
    ) -> Result<SavingsGoal, DomainError> {
        let mut goals = self.goals.write().unwrap();
        let goal = goals.get_mut(id).ok_or_else(|| not_found("Savings goal", id))?;
        goal.archived_at = Some(at);
        goal.updated_at = at;
        Ok(goal.clone())
    }

    async fn list_movements(
        &self,
        goal_id: &SavingsGoalId,
    ) -> Result<Vec<SavingsMovement>, DomainError> {
        let movements: Vec<SavingsMovement> = self
            .movements
            .read()
            .unwrap()
            .iter()
            .filter(|m| m.goal_id == *goal_id)
            .cloned()
            .collect();
        Ok(newest_first(movements, |m| m.created_at))
    }

    async fn find_movement_by_tx(
        &self,
        tx_hash: &str,
    ) -> Result<Option<SavingsMovement>, DomainError> {
        Ok(self
            .movements
            .read()
            .unwrap()
            .iter()
            .find(|m| m.tx_hash.as_deref() == Some(tx_hash))
            .cloned())
    }

    async fn record_movement(
        &self,
        movement: &NewSavingsMovement,
    ) -> Result<(SavingsGoal, SavingsMovement), DomainError> {
        let now = Utc::now();
        let mut goals = self.goals.write().unwrap();
        let goal = goals
            .get_mut(&movement.goal_id)
            .ok_or_else(|| not_found("Savings goal", movement.goal_id))?;
        goal.current_amount = goal.balance_after(movement)?;
        goal.updated_at = now;

        let recorded = SavingsMovement {
            id: Uuid::new_v4(),
            goal_id: movement.goal_id,
            owner_id: movement.owner_id,
            movement_type: movement.movement_type,
            amount: movement.amount,
            tx_hash: movement.tx_hash.clone(),
            memo: movement.memo.clone(),
            created_at: now,
        };
        self.movements.write().unwrap().push(recorded.clone());
        Ok((goal.clone(), recorded))
    }
}

// ============================================================================
// In-Memory Marketplace Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryMarketplaceRepository {
    listings: Arc<RwLock<HashMap<String, Listing>>>,
    stats: Arc<RwLock<HashMap<UserId, UserStats>>>,
}

impl InMemoryMarketplaceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a listing for testing
    pub fn with_listing(self, listing: Listing) -> Self {
        self.listings
            .write()
            .unwrap()
            .insert(listing.listing_id.clone(), listing);
        self
    }

    /// Pre-populate with user stats for testing
    pub fn with_stats(self, stats: UserStats) -> Self {
        self.stats.write().unwrap().insert(stats.user_id, stats);
        self
    }
}

#[async_trait]
impl MarketplaceRepository for InMemoryMarketplaceRepository {
    async fn find_listing(&self, listing_id: &str) -> Result<Option<Listing>, DomainError> {
        Ok(self.listings.read().unwrap().get(listing_id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Listing>, DomainError> {
        let listings: Vec<Listing> = self
            .listings
            .read()
            .unwrap()
            .values()
            .filter(|l| l.active)
            .cloned()
            .collect();
        Ok(newest_first(listings, |l| l.created_at))
    }

    async fn list_by_seller(&self, seller_id: &UserId) -> Result<Vec<Listing>, DomainError> {
        let listings: Vec<Listing> = self
            .listings
            .read()
            .unwrap()
            .values()
            .filter(|l| l.seller_id == *seller_id)
            .cloned()
            .collect();
        Ok(newest_first(listings, |l| l.updated_at))
    }

    async fn create_listing(&self, listing: &NewListing) -> Result<Listing, DomainError> {
        let mut listings = self.listings.write().unwrap();
        if listings.contains_key(&listing.listing_id) {
            return Err(DomainError::AlreadyExists(listing.listing_id.clone()));
        }
        let now = Utc::now();
        let created = Listing {
            listing_id: listing.listing_id.clone(),
            seller_id: listing.seller_id,
            seller_address: listing.seller_address.clone(),
            price: listing.price,
            active: true,
            last_tx_hash: listing.last_tx_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        listings.insert(created.listing_id.clone(), created.clone());
        Ok(created)
    }

    async fn update_listing(
        &self,
        listing_id: &str,
        active: bool,
        price: i128,
        last_tx_hash: Option<&str>,
    ) -> Result<Listing, DomainError> {
        let mut listings = self.listings.write().unwrap();
        let listing = listings
            .get_mut(listing_id)
            .ok_or_else(|| not_found("Listing", listing_id))?;
        listing.active = active;
        listing.price = price;
        if let Some(hash) = last_tx_hash {
            listing.last_tx_hash = Some(hash.to_string());
        }
        listing.updated_at = Utc::now();
        Ok(listing.clone())
    }

    async fn mark_sold(&self, listing_id: &str, tx_hash: &str) -> Result<Listing, DomainError> {
        let mut listings = self.listings.write().unwrap();
        let listing = listings
            .get_mut(listing_id)
            .filter(|l| l.active)
            .ok_or_else(|| DomainError::Conflict("Listing is no longer available".to_string()))?;
        listing.active = false;
        listing.last_tx_hash = Some(tx_hash.to_string());
        listing.updated_at = Utc::now();
        Ok(listing.clone())
    }

    async fn get_stats(&self, user_id: &UserId) -> Result<Option<UserStats>, DomainError> {
        Ok(self.stats.read().unwrap().get(user_id).cloned())
    }

    async fn save_stats(&self, stats: &UserStats) -> Result<(), DomainError> {
        self.stats
            .write()
            .unwrap()
            .insert(stats.user_id, stats.clone());
        Ok(())
    }
}

// ============================================================================
// Mock Horizon Client
// ============================================================================

/// A mock Horizon client that returns scripted ledger data
#[derive(Default)]
pub struct MockHorizonClient {
    pub should_fail: Arc<RwLock<bool>>,
    transactions: Arc<RwLock<HashMap<String, HorizonTransaction>>>,
    operations: Arc<RwLock<HashMap<String, Vec<HorizonOperation>>>>,
    accounts: Arc<RwLock<HashMap<String, HorizonAccount>>>,
    /// Hashes looked up, in call order
    pub lookups: Arc<RwLock<Vec<String>>>,
}

impl MockHorizonClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call answers with a 503
    pub fn failing() -> Self {
        let client = Self::default();
        *client.should_fail.write().unwrap() = true;
        client
    }

    pub fn with_transaction(self, tx: HorizonTransaction) -> Self {
        self.transactions
            .write()
            .unwrap()
            .insert(tx.hash.clone(), tx);
        self
    }

    pub fn with_operations(self, hash: &str, operations: Vec<HorizonOperation>) -> Self {
        self.operations
            .write()
            .unwrap()
            .insert(hash.to_string(), operations);
        self
    }

    pub fn with_account(self, account: HorizonAccount) -> Self {
        self.accounts
            .write()
            .unwrap()
            .insert(account.account_id.clone(), account);
        self
    }

    fn check_fail(&self) -> Result<(), HorizonError> {
        if *self.should_fail.read().unwrap() {
            return Err(HorizonError::Api {
                status: 503,
                message: "Mock failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl HorizonClient for MockHorizonClient {
    async fn get_transaction(&self, hash: &str) -> Result<HorizonTransaction, HorizonError> {
        self.check_fail()?;
        self.lookups.write().unwrap().push(hash.to_string());
        self.transactions
            .read()
            .unwrap()
            .get(hash)
            .cloned()
            .ok_or_else(|| HorizonError::TransactionNotFound(hash.to_string()))
    }

    async fn list_operations(&self, hash: &str) -> Result<Vec<HorizonOperation>, HorizonError> {
        self.check_fail()?;
        Ok(self
            .operations
            .read()
            .unwrap()
            .get(hash)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_account(&self, address: &str) -> Result<HorizonAccount, HorizonError> {
        self.check_fail()?;
        self.accounts
            .read()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| HorizonError::AccountNotFound(address.to_string()))
    }
}
