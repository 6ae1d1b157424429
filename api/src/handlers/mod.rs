//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod accounts;
pub mod groups;
pub mod invoices;
pub mod marketplace;
pub mod network;
pub mod paylinks;
pub mod payouts;
pub mod savings;
pub mod users;

use serde::{Deserialize, Deserializer};

pub use accounts::get_balance;
pub use groups::{
    create_group, fee_quote, get_group, join_group, leave_group, list_groups, list_joined,
    list_members, list_owned, renew_subscription, update_description, update_settings,
};
pub use invoices::{
    archive_invoice, attach_paylink, create_invoice, get_invoice, list_invoices, mark_paid,
    register_invoice, settle_invoice, update_notes,
};
pub use marketplace::{
    cancel_listing, create_listing, fee_breakdown, get_stats, list_listings, list_my_listings,
    purchase_listing,
};
pub use network::get_network;
pub use paylinks::{archive_paylink, create_paylink, get_paylink, list_paylinks, verify_payment};
pub use payouts::{
    create_schedule, delete_schedule, list_executions, list_schedules, preview_split,
    record_execution, update_schedule,
};
pub use savings::{
    archive_goal, create_goal, list_goals, list_movements, record_movement, update_goal,
};
pub use users::{get_me, get_user, store_user, update_me};

/// Keeps an explicit `null` apart from a missing key in PATCH bodies.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
