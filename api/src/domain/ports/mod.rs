//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod horizon;
pub mod repositories;

pub use horizon::{HorizonAccount, HorizonBalance, HorizonClient, HorizonOperation, HorizonTransaction};
pub use repositories::{
    GroupRepository, InvoiceRepository, MarketplaceRepository, PaylinkRepository,
    PayoutRepository, SavingsGoalRepository, UserRepository,
};
