//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{
    BillingCadence, Group, GroupId, Invoice, InvoiceId, InvoiceStatus, LineItem, Listing,
    Paylink, PaylinkId, SavingsGoal, SavingsGoalId, User, UserId, Visibility,
};
use crate::domain::ports::{HorizonAccount, HorizonBalance, HorizonOperation, HorizonTransaction};

pub const ALICE: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";
pub const BOB: &str = "GUJZDEGXDNCF32EPF3DHODZDOCIS2JHTLGMXGEDN73U55XTPLPFT7V4S";
pub const CAROL: &str = "GEH2KVJ72CEUVW75EFR6EDT4SYWB5WKH7DNSIPZZ7FK4ZRI3R2WYOJFL";
pub const CONTRACT: &str = "CGVQ6KBNXJBTFQXKWOVOMPZOM7WBBR6QMW4WXFOGO6MVN6A6WFHYM6L3";
pub const TX_HASH: &str = "3389e9f0f1a65f19736cacf544c2e825313e8447f569233bb8db39aa607c8889";

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Create a test user for a wallet
pub fn test_user(wallet: &str) -> User {
    User {
        id: UserId(Uuid::new_v4()),
        wallet_address: wallet.to_string(),
        display_name: None,
        avatar_url: None,
        about: None,
        api_key_hash: format!("hash-{}", wallet),
        created_at: Utc::now(),
    }
}

/// Create a public group owned by `owner`
pub fn test_group(owner: &User, price: i128) -> Group {
    Group {
        id: GroupId(Uuid::new_v4()),
        name: format!("group-{}", short_id()),
        description: None,
        short_description: Some("A test group".to_string()),
        about_url: None,
        thumbnail_url: None,
        gallery_urls: Vec::new(),
        tags: vec!["music".to_string()],
        visibility: Visibility::Public,
        billing_cadence: if price > 0 {
            BillingCadence::Monthly
        } else {
            BillingCadence::Free
        },
        owner_id: owner.id,
        price,
        member_number: 0,
        ends_on: None,
        subscription_id: None,
        last_subscription_paid_at: None,
        last_subscription_tx_hash: None,
        administrators: Vec::new(),
        created_at: Utc::now(),
    }
}

/// Create a draft invoice with a single line item
pub fn test_invoice(owner: &User, total: i128) -> Invoice {
    let now = Utc::now();
    Invoice {
        id: InvoiceId(Uuid::new_v4()),
        owner_id: owner.id,
        slug: format!("inv-test-{}", short_id()),
        number: "CB-2026-0001".to_string(),
        title: Some("Session work".to_string()),
        customer_name: None,
        customer_email: None,
        due_at: None,
        status: InvoiceStatus::Draft,
        notes: None,
        total_amount: total,
        line_items: vec![LineItem {
            description: "Session".to_string(),
            quantity: 1,
            unit_amount: total.to_string(),
        }],
        paid_at: None,
        paylink_handle: None,
        payer_address: None,
        registry_address: None,
        registry_invoice_id: None,
        issuance_tx_hash: None,
        payment_tx_hash: None,
        archived_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// Create an active paylink paying the owner's wallet
pub fn test_paylink(owner: &User, handle: &str) -> Paylink {
    let now = Utc::now();
    Paylink {
        id: PaylinkId(Uuid::new_v4()),
        handle: handle.to_string(),
        owner_id: owner.id,
        receiving_address: owner.wallet_address.clone(),
        title: None,
        description: None,
        is_active: true,
        archived_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// Create an empty savings goal
pub fn test_goal(owner: &User, target: i128) -> SavingsGoal {
    let now = Utc::now();
    SavingsGoal {
        id: SavingsGoalId(Uuid::new_v4()),
        owner_id: owner.id,
        name: "Test goal".to_string(),
        target_amount: target,
        current_amount: 0,
        target_date: None,
        notes: None,
        archived_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// Create an active marketplace listing
pub fn test_listing(seller: &User, listing_id: &str, price: i128) -> Listing {
    let now = Utc::now();
    Listing {
        listing_id: listing_id.to_string(),
        seller_id: seller.id,
        seller_address: seller.wallet_address.clone(),
        price,
        active: true,
        last_tx_hash: None,
        created_at: now,
        updated_at: now,
    }
}

/// Horizon transaction record; `memo` is a text memo
pub fn horizon_tx(hash: &str, successful: bool, memo: Option<&str>) -> HorizonTransaction {
    HorizonTransaction {
        hash: hash.to_string(),
        successful,
        source_account: None,
        memo_type: Some(if memo.is_some() { "text" } else { "none" }.to_string()),
        memo: memo.map(String::from),
        created_at: None,
    }
}

/// Native payment operation of `amount` XLM
pub fn native_payment(from: &str, to: &str, amount: &str) -> HorizonOperation {
    HorizonOperation {
        id: short_id(),
        op_type: "payment".to_string(),
        asset_type: Some("native".to_string()),
        from: Some(from.to_string()),
        to: Some(to.to_string()),
        amount: Some(amount.to_string()),
    }
}

/// Account holding `balance` XLM
pub fn horizon_account(address: &str, balance: &str) -> HorizonAccount {
    HorizonAccount {
        account_id: address.to_string(),
        balances: vec![HorizonBalance {
            asset_type: "native".to_string(),
            balance: balance.to_string(),
        }],
    }
}
