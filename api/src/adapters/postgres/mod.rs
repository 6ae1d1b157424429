//! PostgreSQL adapters
//!
//! Implementations of repository traits using SeaORM and PostgreSQL.

pub mod group_repo;
pub mod invoice_repo;
pub mod marketplace_repo;
pub mod paylink_repo;
pub mod payout_repo;
pub mod savings_goal_repo;
pub mod user_repo;

#[cfg(test)]
mod integration_tests;

pub use group_repo::PostgresGroupRepository;
pub use invoice_repo::PostgresInvoiceRepository;
pub use marketplace_repo::PostgresMarketplaceRepository;
pub use paylink_repo::PostgresPaylinkRepository;
pub use payout_repo::PostgresPayoutRepository;
pub use savings_goal_repo::PostgresSavingsGoalRepository;
pub use user_repo::PostgresUserRepository;
