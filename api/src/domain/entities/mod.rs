//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod group;
pub mod invoice;
pub mod marketplace;
pub mod paylink;
pub mod payout;
pub mod savings_goal;
pub mod user;

pub use group::{
    BillingCadence, Group, GroupAdministrator, GroupId, GroupSettings, Membership,
    MembershipStatus, NewGroup, Visibility,
};
pub use invoice::{Invoice, InvoiceId, InvoicePatch, InvoiceStatus, LineItem, NewInvoice};
pub use marketplace::{Cooldowns, Listing, NewListing, UserStats};
pub use paylink::{NewPaylink, Paylink, PaylinkId};
pub use payout::{
    NewPayoutExecution, NewPayoutSchedule, PayoutExecution, PayoutRecipient, PayoutSchedule,
    PayoutScheduleId, RecipientInput,
};
pub use savings_goal::{
    MovementType, NewSavingsGoal, NewSavingsMovement, SavingsGoal, SavingsGoalId,
    SavingsGoalUpdate, SavingsMovement,
};
pub use user::{NewUser, ProfileUpdate, User, UserId};
