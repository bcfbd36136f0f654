//! Helpers to parse the string encodings callers send us.
//!
//! Addresses and hashes arrive in the URL path and are rejected by the client
//! layer, so their failures are reported as upstream errors (500). Amounts and
//! hex payloads are request fields and fail validation (400).

use std::str::FromStr;

use alloy::primitives::{
    utils::{format_units, parse_ether},
    Address, Bytes, TxHash, U256,
};
use alloy_primitives::hex;

use crate::error::ServiceError;

/// Parse an address, with or without the `0x` prefix.
pub fn parse_address(value: &str) -> Result<Address, ServiceError> {
    Address::from_str(value.trim())
        .map_err(|e| ServiceError::Upstream(format!("invalid address \"{}\": {}", value, e)))
}

/// Parse a 32-byte transaction hash.
pub fn parse_tx_hash(value: &str) -> Result<TxHash, ServiceError> {
    TxHash::from_str(value.trim()).map_err(|e| {
        ServiceError::Upstream(format!("invalid transaction hash \"{}\": {}", value, e))
    })
}

/// Parse a hex string into `Bytes`.
///
/// The `0x` prefix is optional and `"0x"` (or `""`) yields empty bytes.
pub fn parse_hex_bytes(field: &str, value: &str) -> Result<Bytes, ServiceError> {
    let digits = value.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);
    if digits.is_empty() {
        return Ok(Bytes::new());
    }
    let data = hex::decode(digits)
        .map_err(|e| ServiceError::Validation(format!("Invalid hex in '{}': {}", field, e)))?;
    Ok(Bytes::from(data))
}

/// Parse a decimal ether amount ("1.5") into wei.
pub fn parse_ether_amount(value: &str) -> Result<U256, ServiceError> {
    let value = value.trim();
    if value.starts_with('-') {
        return Err(ServiceError::Validation(format!(
            "Invalid value \"{}\": amount must not be negative",
            value
        )));
    }
    parse_ether(value)
        .map_err(|e| ServiceError::Validation(format!("Invalid value \"{}\": {}", value, e)))
}

/// Format wei as a decimal ether string ("1.5", "0.0").
pub fn format_ether(wei: U256) -> String {
    format_in_units(wei, "ether")
}

/// Format a wei gas price as decimal gwei ("20.0").
pub fn format_gwei(wei: u128) -> String {
    format_in_units(U256::from(wei), "gwei")
}

fn format_in_units(amount: U256, unit: &str) -> String {
    match format_units(amount, unit) {
        Ok(formatted) => trim_fraction(&formatted),
        // units are compile-time constants above
        Err(_) => amount.to_string(),
    }
}

/// Drop trailing zeros of the fractional part, keeping at least one digit.
fn trim_fraction(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => format!("{}.0", formatted),
    }
}
