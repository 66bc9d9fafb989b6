//! Private key handling
//!
//! [`SecretKey`] owns raw key bytes. It is zeroized on drop, cannot be
//! copied or cloned from outside this crate, and never prints its
//! contents. Everything else in the engine works with the derived
//! [`Address`] or the masked form.

use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use chainpay_error::{ChainpayError, Result};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Characters kept at each end of a masked key
const MASK_KEEP: usize = 10;

fn invalid(reason: &str) -> ChainpayError {
    ChainpayError::InvalidPrivateKey {
        reason: reason.to_string(),
    }
}

/// A secp256k1 signing key held in memory for the session
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; 32],
}

impl SecretKey {
    /// Parses `0x`-optional hex of exactly 64 characters
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex_part.len() != 64 {
            return Err(invalid("expected 64 hex characters"));
        }
        if !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid("contains non-hex characters"));
        }

        let mut bytes = [0u8; 32];
        if hex::decode_to_slice(hex_part, &mut bytes).is_err() {
            bytes.zeroize();
            return Err(invalid("contains non-hex characters"));
        }

        let key = Self { bytes };
        bytes.zeroize();
        key.signer()?;
        Ok(key)
    }

    /// Generates a fresh key from the OS CSPRNG
    pub fn generate() -> Self {
        let signer = PrivateKeySigner::random();
        let mut bytes = signer.to_bytes();
        let key = Self { bytes: bytes.0 };
        bytes.0.zeroize();
        key
    }

    /// Signer for local signing
    pub(crate) fn signer(&self) -> Result<PrivateKeySigner> {
        let mut bytes = B256::from(self.bytes);
        let signer = PrivateKeySigner::from_bytes(&bytes);
        bytes.0.zeroize();
        signer.map_err(|_| invalid("not a valid secp256k1 scalar"))
    }

    /// Derived account address
    pub fn address(&self) -> Result<Address> {
        Ok(self.signer()?.address())
    }

    /// Full `0x`-prefixed hex. Only for handing a freshly created key to
    /// its owner.
    pub fn expose_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(self.bytes)))
    }

    /// First and last ten characters of the `0x` hex form
    pub fn masked(&self) -> String {
        mask_key(&self.expose_hex())
    }

    pub(crate) fn duplicate(&self) -> Self {
        Self { bytes: self.bytes }
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// Masks a key string to its first and last ten characters
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= MASK_KEEP * 2 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..MASK_KEEP].iter().collect();
    let tail: String = chars[chars.len() - MASK_KEEP..].iter().collect();
    format!("{head}...{tail}")
}

/// Address for a key string without registering anything
pub fn derive_address(private_key: &str) -> Result<Address> {
    SecretKey::parse(private_key)?.address()
}
