//! Stellar Horizon adapter
//!
//! Read-only HTTP client used to verify payments and read balances.

mod client;

pub use client::HorizonClientImpl;
