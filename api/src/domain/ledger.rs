//! Ledger value helpers
//!
//! Amount parsing/formatting in stroops, Stellar address and transaction hash
//! normalization, and the basis-point arithmetic shared with the on-chain
//! split router, membership and marketplace contracts.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::error::DomainError;

/// Decimal places of the settlement token (XLM)
pub const SETTLEMENT_TOKEN_DECIMALS: u32 = 7;
pub const SETTLEMENT_TOKEN_SYMBOL: &str = "XLM";
/// 100% expressed in basis points
pub const BPS_DENOMINATOR: u32 = 10_000;

const STROOPS_PER_UNIT: i128 = 10_000_000;

fn decimal_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d*(\.\d+)?$").expect("static regex"))
}

fn account_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^G[A-Z2-7]{55}$").expect("static regex"))
}

fn contract_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^C[A-Z2-7]{55}$").expect("static regex"))
}

fn tx_hash_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-f]{64}$").expect("static regex"))
}

/// Convert a human readable amount ("1.5") into stroops.
///
/// Extra fraction digits beyond seven are truncated. An empty string is zero.
pub fn parse_amount(value: &str) -> Result<i128, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    if !decimal_amount_re().is_match(value) {
        return Err(DomainError::Validation(
            "Enter a positive numeric amount.".to_string(),
        ));
    }

    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let fraction: String = fraction
        .chars()
        .chain(std::iter::repeat('0'))
        .take(SETTLEMENT_TOKEN_DECIMALS as usize)
        .collect();

    let overflow = || DomainError::Validation(format!("Amount '{}' is too large", value));
    let whole: i128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let fraction: i128 = fraction.parse().map_err(|_| overflow())?;

    whole
        .checked_mul(STROOPS_PER_UNIT)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(overflow)
}

/// Parse an integer stroop amount such as "15000000"
pub fn parse_stroops(value: &str) -> Result<i128, DomainError> {
    value
        .trim()
        .parse::<i128>()
        .map_err(|_| DomainError::Validation(format!("Invalid amount: '{}'", value.trim())))
}

/// Parse a non-negative integer stroop amount
pub fn parse_non_negative_stroops(value: &str) -> Result<i128, DomainError> {
    let amount = parse_stroops(value)?;
    if amount < 0 {
        return Err(DomainError::Validation(
            "Amounts must be non-negative".to_string(),
        ));
    }
    Ok(amount)
}

/// Format stroops as "1,234.5 XLM".
///
/// Rounds half-up at `max_fraction_digits` and keeps at least
/// `min_fraction_digits` digits after the point.
pub fn format_amount(stroops: i128, min_fraction_digits: u32, max_fraction_digits: u32) -> String {
    let max_frac = max_fraction_digits.min(SETTLEMENT_TOKEN_DECIMALS);
    let min_frac = min_fraction_digits.min(max_frac);

    let negative = stroops < 0;
    let abs = stroops.unsigned_abs();
    let scale = 10u128.pow(SETTLEMENT_TOKEN_DECIMALS - max_frac);
    let rounded = (abs + scale / 2) / scale;
    let frac_base = 10u128.pow(max_frac);
    let whole = rounded / frac_base;
    let frac = rounded % frac_base;

    let mut frac_digits = if max_frac == 0 {
        String::new()
    } else {
        format!("{:0width$}", frac, width = max_frac as usize)
    };
    while frac_digits.len() > min_frac as usize && frac_digits.ends_with('0') {
        frac_digits.pop();
    }

    let mut out = String::new();
    if negative && rounded > 0 {
        out.push('-');
    }
    out.push_str(&group_thousands(whole));
    if !frac_digits.is_empty() {
        out.push('.');
        out.push_str(&frac_digits);
    }
    out.push(' ');
    out.push_str(SETTLEMENT_TOKEN_SYMBOL);
    out
}

/// Default display: up to four fraction digits
pub fn display_amount(stroops: i128) -> String {
    format_amount(stroops, 0, 4)
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Trim and upper-case a Stellar address
pub fn normalize_address(address: &str) -> String {
    address.trim().to_uppercase()
}

/// `G...` account address (ed25519 public key, strkey encoded)
pub fn is_account_address(address: &str) -> bool {
    account_re().is_match(address)
}

/// `C...` Soroban contract address
pub fn is_contract_address(address: &str) -> bool {
    contract_re().is_match(address)
}

/// Normalize and validate an account address
pub fn require_account_address(address: &str) -> Result<String, DomainError> {
    let normalized = normalize_address(address);
    if !is_account_address(&normalized) {
        return Err(DomainError::Validation(format!(
            "Invalid Stellar account address: '{}'",
            address.trim()
        )));
    }
    Ok(normalized)
}

/// Normalize and validate a contract address
pub fn require_contract_address(address: &str) -> Result<String, DomainError> {
    let normalized = normalize_address(address);
    if !is_contract_address(&normalized) {
        return Err(DomainError::Validation(format!(
            "Invalid contract address: '{}'",
            address.trim()
        )));
    }
    Ok(normalized)
}

/// Trim and lower-case a transaction hash, requiring 64 hex characters
pub fn normalize_tx_hash(hash: &str) -> Result<String, DomainError> {
    let normalized = hash.trim().to_lowercase();
    if !tx_hash_re().is_match(&normalized) {
        return Err(DomainError::Validation(format!(
            "Invalid transaction hash: '{}'",
            hash.trim()
        )));
    }
    Ok(normalized)
}

/// Normalize an optional hash; blank input counts as absent
pub fn normalize_optional_tx_hash(hash: Option<&str>) -> Result<Option<String>, DomainError> {
    match hash.map(str::trim).filter(|h| !h.is_empty()) {
        Some(h) => normalize_tx_hash(h).map(Some),
        None => Ok(None),
    }
}

/// Shorten an address for display: `GABCDE…WXYZ`
pub fn summarize_account(address: Option<&str>) -> String {
    summarize_account_with(address, 6, 4, "Unknown account")
}

pub fn summarize_account_with(
    address: Option<&str>,
    prefix: usize,
    suffix: usize,
    fallback: &str,
) -> String {
    let address = match address {
        Some(a) if !a.is_empty() => a,
        _ => return fallback.to_string(),
    };

    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= prefix + suffix + 3 {
        return address.to_string();
    }

    let head: String = chars[..prefix].iter().collect();
    let tail: String = chars[chars.len() - suffix..].iter().collect();
    format!("{}…{}", head, tail)
}

/// Split `amount` across `shares_bps`; the rounding remainder goes to the last share.
pub fn split_by_bps(amount: i128, shares_bps: &[u32]) -> Result<Vec<i128>, DomainError> {
    if amount <= 0 {
        return Err(DomainError::Validation(
            "amount must be positive".to_string(),
        ));
    }
    if shares_bps.is_empty() {
        return Err(DomainError::Validation(
            "at least one recipient required".to_string(),
        ));
    }
    ensure_total_bps(shares_bps)?;

    let mut parts = shares_bps
        .iter()
        .map(|bps| bps_of(amount, *bps))
        .collect::<Result<Vec<i128>, DomainError>>()?;
    let allocated: i128 = parts.iter().sum();
    if let Some(last) = parts.last_mut() {
        *last += amount - allocated;
    }
    Ok(parts)
}

/// Shares must total exactly 10000 bps
pub fn ensure_total_bps(shares_bps: &[u32]) -> Result<(), DomainError> {
    let total: u64 = shares_bps.iter().map(|b| u64::from(*b)).sum();
    if total != u64::from(BPS_DENOMINATOR) {
        return Err(DomainError::Validation(
            "Shares must total 100% (10000 bps).".to_string(),
        ));
    }
    Ok(())
}

/// Platform fee taken from `price`
pub fn platform_fee(price: i128, fee_bps: u32) -> Result<i128, DomainError> {
    if fee_bps > BPS_DENOMINATOR {
        return Err(DomainError::Validation(
            "fee bps cannot exceed 10000".to_string(),
        ));
    }
    bps_of(price, fee_bps)
}

fn bps_of(amount: i128, bps: u32) -> Result<i128, DomainError> {
    amount
        .checked_mul(i128::from(bps))
        .map(|scaled| scaled / i128::from(BPS_DENOMINATOR))
        .ok_or_else(|| DomainError::Validation("Amount is too large".to_string()))
}

/// New expiry after a renewal: unexpired time is carried over
pub fn extend_expiry(
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    duration: Duration,
) -> DateTime<Utc> {
    let base = current.map_or(now, |c| c.max(now));
    base + duration
}

/// Serialize stroops as a decimal string so JavaScript clients keep precision
pub fn serialize_stroops<S>(value: &i128, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&value.to_string())
}
