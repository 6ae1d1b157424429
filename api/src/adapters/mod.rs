//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod horizon;
pub mod postgres;

pub use horizon::HorizonClientImpl;
pub use postgres::{
    PostgresGroupRepository, PostgresInvoiceRepository, PostgresMarketplaceRepository,
    PostgresPaylinkRepository, PostgresPayoutRepository, PostgresSavingsGoalRepository,
    PostgresUserRepository,
};
