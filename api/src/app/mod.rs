//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, ports, and the ledger.

pub mod explorer;
pub mod group_service;
pub mod invoice_service;
pub mod marketplace_service;
pub mod paylink_service;
pub mod payout_service;
pub mod savings_service;
pub mod settlement_service;
pub mod user_service;

pub use explorer::{ExplorerLinks, ResourceLinks};
pub use group_service::{
    AdministratorInput, CreateGroupInput, FeeQuote, GroupMember, GroupService, GroupTerms,
    UpdateSettingsInput,
};
pub use invoice_service::{CreateInvoiceInput, InvoiceService, LineItemInput};
pub use marketplace_service::{FeeBreakdown, MarketplaceService, UserStatsView};
pub use paylink_service::{CreatePaylinkInput, PaylinkService};
pub use payout_service::{PayoutService, SplitShare};
pub use savings_service::SavingsService;
#[allow(unused_imports)]
pub use settlement_service::{
    match_payment, AccountBalance, PaymentExpectation, SettlementFailure, SettlementOutcome,
    SettlementService, SettlementTiming,
};
pub use user_service::{hash_api_key, UserService};
