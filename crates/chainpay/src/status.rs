//! Transaction status from live chain state

use alloy::primitives::B256;
use chainpay_error::{ChainpayError, Result};
use chainpay_provider::{erc20, EvmClient, RpcTransaction};
use std::str::FromStr;

use crate::amount::format_units;
use crate::engine::map_provider_error;
use crate::network::NetworkDescriptor;
use crate::token::TokenRegistry;
use crate::transaction::{TransactionRecord, TxStatus};

/// Parses `0x` followed by 64 hex characters
pub fn parse_tx_hash(input: &str) -> Result<B256> {
    let invalid = |reason: &str| ChainpayError::InvalidArgument {
        name: "tx_hash".to_string(),
        reason: reason.to_string(),
    };
    let trimmed = input.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .ok_or_else(|| invalid("missing 0x prefix"))?;
    if hex_part.len() != 64 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid("expected 0x followed by 64 hex characters"));
    }
    B256::from_str(trimmed).map_err(|e| invalid(&e.to_string()))
}

/// Confirmations of a transaction mined at `block` given the chain head
pub fn confirmations(latest: u64, block: u64) -> u64 {
    latest.saturating_sub(block).saturating_add(1)
}

fn describe(record: &mut TransactionRecord, network: &NetworkDescriptor, tx: &RpcTransaction) {
    record.from_address = Some(tx.from);

    let token_transfer = tx.to.and_then(|contract| {
        let token = TokenRegistry::global().by_contract(contract, network.name)?;
        let (recipient, amount) = erc20::decode_transfer(&tx.input)?;
        Some((token, recipient, amount))
    });

    match token_transfer {
        Some((token, recipient, amount)) => {
            record.to_address = Some(recipient);
            record.amount = Some(format_units(amount, token.decimals));
            record.asset = Some(token.symbol.to_string());
        }
        None => {
            record.to_address = tx.to;
            record.amount = Some(format_units(tx.value, network.native_decimals));
            record.asset = Some(network.native_symbol.to_string());
        }
    }
}

/// Rebuilds the record for `hash` from the node
pub async fn track(client: &EvmClient, network: &NetworkDescriptor, hash: B256) -> Result<TransactionRecord> {
    let rpc = |e| map_provider_error(network.name, e);
    let hash_hex = format!("{hash:#x}");

    let receipt = client.transaction_receipt(hash).await.map_err(rpc)?;
    let tx = client.transaction_by_hash(hash).await.map_err(rpc)?;

    let Some(receipt) = receipt else {
        let Some(tx) = tx else {
            tracing::debug!(network = %network.name, tx_hash = %hash_hex, "transaction not found");
            return Ok(TransactionRecord::bare(hash, TxStatus::NotFound, network));
        };
        let mut record = TransactionRecord {
            confirmations: Some(0),
            explorer_url: Some(network.tx_url(&hash_hex)),
            ..TransactionRecord::bare(hash, TxStatus::Pending, network)
        };
        describe(&mut record, network, &tx);
        return Ok(record);
    };

    let mut record = TransactionRecord {
        from_address: Some(receipt.from),
        to_address: receipt.to,
        explorer_url: Some(network.tx_url(&hash_hex)),
        ..TransactionRecord::bare(hash, TxStatus::Pending, network)
    };
    if let Some(tx) = &tx {
        describe(&mut record, network, tx);
    }

    match receipt.block() {
        None => {
            record.confirmations = Some(0);
        }
        Some(block) => {
            let latest = client.block_number().await.map_err(rpc)?;
            let confirmed = confirmations(latest, block);
            record.block_number = Some(block);
            record.confirmations = Some(confirmed);
            record.status = if !receipt.succeeded() {
                TxStatus::Failed
            } else if confirmed < network.min_confirmations {
                TxStatus::Pending
            } else {
                TxStatus::Confirmed
            };
        }
    }

    tracing::debug!(
        network = %network.name,
        tx_hash = %hash_hex,
        status = %record.status,
        confirmations = ?record.confirmations,
        "transaction status"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tx_hash() {
        let good = format!("0x{}", "ab".repeat(32));
        assert!(parse_tx_hash(&good).is_ok());

        for bad in [
            "",
            "0x",
            "0x1234",
            &"ab".repeat(32),
            &format!("0x{}", "zz".repeat(32)),
            &format!("0x{}", "ab".repeat(33)),
        ] {
            let err = parse_tx_hash(bad).unwrap_err();
            assert_eq!(err.kind(), "invalid_argument", "{bad:?}");
        }
    }

    #[test]
    fn test_confirmations() {
        assert_eq!(confirmations(100, 100), 1);
        assert_eq!(confirmations(111, 100), 12);
        // lagging head never underflows
        assert_eq!(confirmations(99, 100), 1);
    }
}
