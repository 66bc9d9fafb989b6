//! EVM address syntax and EIP-55 checksum validation

use alloy::primitives::Address;
use chainpay_error::{ChainpayError, Result};
use serde::Serialize;
use std::str::FromStr;

/// Outcome of [`validate_address`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressValidation {
    /// Whether the input is a usable address
    pub is_valid: bool,
    /// EIP-55 checksummed form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_form: Option<String>,
    /// Why the input was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Parses an address, enforcing the checksum on mixed-case input
pub fn parse_address(input: &str) -> Result<Address> {
    let invalid = |reason: &str| ChainpayError::InvalidAddress {
        address: input.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = input.trim();
    let Some(hex_part) = trimmed.strip_prefix("0x") else {
        return Err(invalid("missing 0x prefix"));
    };
    if hex_part.len() != 40 {
        return Err(invalid("expected 40 hex characters"));
    }
    if !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid("contains non-hex characters"));
    }

    let has_lower = hex_part.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex_part.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(trimmed, None).map_err(|_| invalid("invalid EIP-55 checksum"))
    } else {
        Address::from_str(trimmed).map_err(|_| invalid("not a valid address"))
    }
}

/// Validates an address without raising
pub fn validate_address(input: &str) -> AddressValidation {
    match parse_address(input) {
        Ok(address) => AddressValidation {
            is_valid: true,
            normalized_form: Some(address.to_checksum(None)),
            reason: None,
        },
        Err(ChainpayError::InvalidAddress { reason, .. }) => AddressValidation {
            is_valid: false,
            normalized_form: None,
            reason: Some(reason),
        },
        Err(other) => AddressValidation {
            is_valid: false,
            normalized_form: None,
            reason: Some(other.to_string()),
        },
    }
}
