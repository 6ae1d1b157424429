//! Domain layer
//!
//! Contains pure business logic with no external dependencies.
//! - `entities`: Domain models representing core business concepts
//! - `ledger`: Stroop amounts, addresses and basis-point math
//! - `ports`: Trait definitions for external dependencies

pub mod entities;
pub mod ledger;
pub mod ports;
