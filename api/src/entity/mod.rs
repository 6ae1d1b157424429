//! SeaORM entity models
//!
//! Row shapes of the PostgreSQL schema in `migrations/`. Stroop amounts are
//! stored as decimal text since they exceed `i64`.

pub mod group_administrators;
pub mod groups;
pub mod invoices;
pub mod marketplace_listings;
pub mod marketplace_user_stats;
pub mod memberships;
pub mod paylinks;
pub mod payout_executions;
pub mod payout_schedules;
pub mod savings_goal_movements;
pub mod savings_goals;
pub mod users;
