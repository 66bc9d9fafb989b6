//! Native and token balance lookups
//!
//! A [`BalanceResult`] holds one entry per asset, native first. Failures on
//! one asset become error entries so the rest of the batch still reports.

use alloy::primitives::Address;
use chainpay_error::ChainpayError;
use chainpay_provider::EvmClient;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::amount::{Amount, AmountView};
use crate::engine::map_provider_error;
use crate::network::NetworkDescriptor;
use crate::token::Asset;

/// Key used for the native entry when the network itself is unknown
pub const UNKNOWN_NATIVE_KEY: &str = "native";

/// One asset's balance, or why it could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BalanceEntry {
    /// Balance read successfully
    Amount {
        /// Raw, decimals and human forms
        #[serde(flatten)]
        amount: AmountView,
        /// Token contract, absent for native
        #[serde(skip_serializing_if = "Option::is_none")]
        contract_address: Option<Address>,
    },
    /// Lookup failed
    Error {
        /// Stable error kind
        error_kind: String,
        /// Error message
        message: String,
    },
}

impl BalanceEntry {
    /// Entry for a failed lookup
    pub fn from_error(err: &ChainpayError) -> Self {
        Self::Error {
            error_kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }

    /// Amount, when the lookup succeeded
    pub fn amount(&self) -> Option<&AmountView> {
        match self {
            Self::Amount { amount, .. } => Some(amount),
            Self::Error { .. } => None,
        }
    }

    /// Error kind, when the lookup failed
    pub fn error_kind(&self) -> Option<&str> {
        match self {
            Self::Amount { .. } => None,
            Self::Error { error_kind, .. } => Some(error_kind),
        }
    }
}

/// Balances of one address on one network, in query order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceResult {
    /// Checksummed owner address
    pub address: String,
    /// Network name as resolved (or as requested, when unknown)
    pub network: String,
    entries: Vec<(String, BalanceEntry)>,
}

impl BalanceResult {
    /// Empty result for `address` on `network`
    pub fn new(address: &Address, network: impl Into<String>) -> Self {
        Self {
            address: address.to_checksum(None),
            network: network.into(),
            entries: Vec::new(),
        }
    }

    /// Appends an entry; an existing key is replaced in place
    pub fn push(&mut self, key: impl Into<String>, entry: BalanceEntry) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = entry,
            None => self.entries.push((key, entry)),
        }
    }

    /// Entry for `key`
    pub fn get(&self, key: &str) -> Option<&BalanceEntry> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    /// Entries in order
    pub fn entries(&self) -> &[(String, BalanceEntry)] {
        &self.entries
    }

    /// Keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

struct OrderedEntries<'a>(&'a [(String, BalanceEntry)]);

impl Serialize for OrderedEntries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, entry) in self.0 {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

impl Serialize for BalanceResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("address", &self.address)?;
        map.serialize_entry("network", &self.network)?;
        map.serialize_entry("balances", &OrderedEntries(&self.entries))?;
        map.end()
    }
}

/// Reads the balance of `asset` held by `owner`
pub async fn read_asset(
    client: &EvmClient,
    network: &NetworkDescriptor,
    owner: Address,
    asset: &Asset,
) -> BalanceEntry {
    let raw = match asset.contract() {
        None => client.get_balance(owner).await,
        Some(contract) => client.get_token_balance(contract, owner).await,
    };

    match raw {
        Ok(raw) => BalanceEntry::Amount {
            amount: Amount::from_raw(raw, asset.decimals()).into(),
            contract_address: asset.contract(),
        },
        Err(err) => {
            let err = map_provider_error(network.name, err);
            tracing::warn!(
                network = %network.name,
                asset = asset.symbol(),
                error = %err,
                "balance lookup failed"
            );
            BalanceEntry::from_error(&err)
        }
    }
}

/// Resolves `symbol` on `network` and reads its balance. Returns the entry
/// key alongside the entry.
pub async fn read_symbol(
    client: &EvmClient,
    network: &NetworkDescriptor,
    owner: Address,
    symbol: &str,
) -> (String, BalanceEntry) {
    match Asset::resolve(Some(symbol), network) {
        Ok(asset) => {
            let entry = read_asset(client, network, owner, &asset).await;
            (asset.symbol().to_string(), entry)
        }
        Err(err) => (symbol.trim().to_ascii_uppercase(), BalanceEntry::from_error(&err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, U256};

    const OWNER: Address = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");

    fn amount(raw: u64, decimals: u8) -> BalanceEntry {
        BalanceEntry::Amount {
            amount: Amount::from_raw(U256::from(raw), decimals).into(),
            contract_address: None,
        }
    }

    #[test]
    fn test_serialization_keeps_query_order() {
        let mut result = BalanceResult::new(&OWNER, "ethereum_mainnet");
        result.push("ETH", amount(1, 18));
        result.push("WETH", amount(2, 18));
        result.push("DAI", amount(3, 18));
        result.push(
            "XYZ",
            BalanceEntry::from_error(&ChainpayError::UnknownToken {
                symbol: "XYZ".into(),
                network: "ethereum_mainnet".into(),
            }),
        );

        let text = serde_json::to_string(&result).unwrap();
        let eth = text.find("\"ETH\"").unwrap();
        let weth = text.find("\"WETH\"").unwrap();
        let dai = text.find("\"DAI\"").unwrap();
        let xyz = text.find("\"XYZ\"").unwrap();
        assert!(eth < weth && weth < dai && dai < xyz);
        assert!(text.contains("\"error_kind\":\"unknown_token\""));
        assert!(text.contains(&OWNER.to_checksum(None)));
    }

    #[test]
    fn test_entry_shape() {
        let json = serde_json::to_value(amount(1_500_000, 6)).unwrap();
        assert_eq!(json["raw_amount"], "1500000");
        assert_eq!(json["decimals"], 6);
        assert_eq!(json["human_amount"], "1.5");
        assert!(json.get("contract_address").is_none());
    }

    #[test]
    fn test_push_replaces_duplicate_keys() {
        let mut result = BalanceResult::new(&OWNER, "base_sepolia");
        result.push("ETH", amount(1, 18));
        result.push("ETH", amount(5, 18));
        assert_eq!(result.entries().len(), 1);
        assert_eq!(result.get("ETH").unwrap().amount().unwrap().raw_amount, "5");
    }
}
