//! Transfer drafting, fee estimation, local signing and broadcast
//!
//! A transfer moves through `Draft -> GasEstimated -> Signed -> Submitted`.
//! Confirmation is observed separately by the status tracker. Signing is
//! local; the signed payload is broadcast at most once.

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::TransactionRequest;
use chainpay_error::{ChainpayError, Result};
use chainpay_provider::{erc20, CallRequest, EvmClient, ProviderError};
use serde::Serialize;
use std::fmt;

use crate::amount::{format_units, Amount};
use crate::engine::map_provider_error;
use crate::keys::SecretKey;
use crate::network::NetworkDescriptor;
use crate::token::Asset;
use crate::wallet::WalletManager;

/// Gas limit used for native transfers when the node cannot estimate
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;
/// Gas limit used for token transfers when the node cannot estimate
pub const TOKEN_TRANSFER_GAS: u64 = 60_000;

const GWEI_DECIMALS: u8 = 9;

/// An unsigned transfer of `amount` smallest units of `asset` to `to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDraft {
    /// Recipient
    pub to: Address,
    /// Asset being moved
    pub asset: Asset,
    /// Smallest units
    pub amount: U256,
}

impl TransferDraft {
    /// Creates a draft
    pub fn new(to: Address, asset: Asset, amount: U256) -> Self {
        Self { to, asset, amount }
    }

    /// Where the transaction is sent: the recipient, or the token contract
    pub fn target(&self) -> Address {
        self.asset.contract().unwrap_or(self.to)
    }

    /// Native value attached to the transaction
    pub fn value(&self) -> U256 {
        if self.asset.is_native() {
            self.amount
        } else {
            U256::ZERO
        }
    }

    /// Calldata: empty for native, ERC-20 `transfer` for tokens
    pub fn input(&self) -> Bytes {
        match self.asset {
            Asset::Native { .. } => Bytes::new(),
            Asset::Token { .. } => erc20::transfer_calldata(self.to, self.amount),
        }
    }

    /// Gas limit used when estimation reverts
    pub fn default_gas_limit(&self) -> u64 {
        if self.asset.is_native() {
            NATIVE_TRANSFER_GAS
        } else {
            TOKEN_TRANSFER_GAS
        }
    }

    /// Human form of the amount
    pub fn human_amount(&self) -> String {
        Amount::from_raw(self.amount, self.asset.decimals()).human()
    }

    /// Request for `eth_estimateGas`
    pub fn call_request(&self, from: Option<Address>) -> CallRequest {
        let mut request = CallRequest::new(self.target());
        if let Some(from) = from {
            request = request.from(from);
        }
        if self.asset.is_native() {
            request = request.value(self.amount);
        } else {
            request = request.data(self.input());
        }
        request
    }

    /// Legacy EIP-155 transaction ready for signing
    pub fn to_request(
        &self,
        from: Address,
        nonce: u64,
        gas_limit: u64,
        gas_price: u128,
        chain_id: u64,
    ) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(from)
            .with_to(self.target())
            .with_value(self.value())
            .with_input(self.input())
            .with_nonce(nonce)
            .with_gas_limit(gas_limit)
            .with_gas_price(gas_price)
            .with_chain_id(chain_id)
    }
}

/// Fee quote for a draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasEstimate {
    /// Network name
    pub network: String,
    /// Gas price in wei
    pub gas_price: u128,
    /// Gas limit
    pub gas_limit: u64,
    /// Whether the limit is the default after a reverted estimate
    pub default_limit: bool,
    /// Native currency symbol
    pub native_symbol: &'static str,
    /// Native currency decimals
    pub native_decimals: u8,
}

impl GasEstimate {
    /// `gas_price * gas_limit` in wei
    pub fn fee_wei(&self) -> U256 {
        U256::from(self.gas_price) * U256::from(self.gas_limit)
    }

    /// Fee as an exact decimal in native units
    pub fn estimated_fee(&self) -> String {
        format_units(self.fee_wei(), self.native_decimals)
    }

    /// Gas price as an exact decimal in gwei
    pub fn gas_price_gwei(&self) -> String {
        format_units(U256::from(self.gas_price), GWEI_DECIMALS)
    }
}

/// Signed payload and its locally computed hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// EIP-2718 encoded bytes
    pub raw: Bytes,
    /// Transaction hash
    pub hash: B256,
}

/// Signs `request` with `key`
pub async fn sign_request(key: &SecretKey, request: TransactionRequest) -> Result<SignedTransaction> {
    let wallet = EthereumWallet::from(key.signer()?);
    let envelope = request
        .build(&wallet)
        .await
        .map_err(|e| ChainpayError::Signing(e.to_string()))?;
    Ok(SignedTransaction {
        hash: *envelope.tx_hash(),
        raw: envelope.encoded_2718().into(),
    })
}

/// Lifecycle state reported for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Broadcast accepted, not yet observed on chain
    Submitted,
    /// Known to the node but below the confirmation threshold
    Pending,
    /// Mined, succeeded and sufficiently confirmed
    Confirmed,
    /// Mined with a failed execution status
    Failed,
    /// Unknown to the node
    NotFound,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "submitted",
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
            Self::NotFound => "not_found",
        };
        f.write_str(s)
    }
}

/// A transaction as seen at submission or on the latest status query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    /// Transaction hash
    #[serde(rename = "transaction_hash")]
    pub hash: B256,
    /// Lifecycle state
    pub status: TxStatus,
    /// Network name
    pub network: String,
    /// Sender
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_address: Option<Address>,
    /// Recipient of the value (decoded for token transfers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_address: Option<Address>,
    /// Exact human amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Token symbol or native symbol
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    /// Inclusion block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Confirmations at query time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
    /// Explorer link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

impl TransactionRecord {
    /// Record with only the hash, status and network set
    pub fn bare(hash: B256, status: TxStatus, network: &NetworkDescriptor) -> Self {
        Self {
            hash,
            status,
            network: network.name.to_string(),
            from_address: None,
            to_address: None,
            amount: None,
            asset: None,
            block_number: None,
            confirmations: None,
            explorer_url: None,
        }
    }
}

/// Which key signs a transfer
pub enum KeySource<'a> {
    /// A key supplied for this call only
    Key(&'a SecretKey),
    /// A wallet registered with the manager
    Wallet {
        /// Wallet registry
        manager: &'a WalletManager,
        /// Wallet label
        label: String,
    },
}

impl KeySource<'_> {
    /// Address of the signing account
    pub async fn address(&self) -> Result<Address> {
        match self {
            Self::Key(key) => key.address(),
            Self::Wallet { manager, label } => Ok(manager.get(label).await?.address),
        }
    }

    async fn sign(&self, request: TransactionRequest) -> Result<SignedTransaction> {
        match self {
            Self::Key(key) => sign_request(key, request).await,
            Self::Wallet { manager, label } => manager.sign(label, request).await,
        }
    }
}

impl fmt::Debug for KeySource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(_) => f.write_str("KeySource::Key(<redacted>)"),
            Self::Wallet { label, .. } => f.debug_struct("KeySource::Wallet").field("label", label).finish(),
        }
    }
}

fn is_revert(err: &ProviderError) -> bool {
    match err {
        ProviderError::Rpc { code, message } => {
            *code == 3 || message.to_ascii_lowercase().contains("execution reverted")
        }
        _ => false,
    }
}

fn is_insufficient_funds(err: &ProviderError) -> bool {
    matches!(err, ProviderError::Rpc { message, .. } if message.to_ascii_lowercase().contains("insufficient funds"))
}

/// Quotes gas price and limit for `draft`.
///
/// A quote never requires funds: when the node rejects the estimate because
/// `from` cannot pay, the default limit is used instead.
pub async fn estimate_fees(
    client: &EvmClient,
    network: &NetworkDescriptor,
    draft: &TransferDraft,
    from: Option<Address>,
) -> Result<GasEstimate> {
    estimate_with(client, network, draft, from, true).await
}

async fn estimate_with(
    client: &EvmClient,
    network: &NetworkDescriptor,
    draft: &TransferDraft,
    from: Option<Address>,
    quote_only: bool,
) -> Result<GasEstimate> {
    let mut gas_price = client
        .gas_price()
        .await
        .map_err(|e| map_provider_error(network.name, e))?;
    if gas_price == 0 {
        tracing::debug!(network = %network.name, "node reported zero gas price, using fallback");
        gas_price = network.fallback_gas_price_wei;
    }

    let (gas_limit, default_limit) = match client.estimate_gas(&draft.call_request(from)).await {
        Ok(limit) => (limit, false),
        Err(err) if is_revert(&err) || (quote_only && is_insufficient_funds(&err)) => {
            tracing::warn!(
                network = %network.name,
                error = %err,
                "gas estimate rejected, using default limit"
            );
            (draft.default_gas_limit(), true)
        }
        Err(err) => return Err(map_provider_error(network.name, err)),
    };

    Ok(GasEstimate {
        network: network.name.to_string(),
        gas_price,
        gas_limit,
        default_limit,
        native_symbol: network.native_symbol,
        native_decimals: network.native_decimals,
    })
}

fn insufficient(needed: U256, available: U256) -> ChainpayError {
    ChainpayError::InsufficientFunds {
        needed: Some(needed.to_string()),
        available: Some(available.to_string()),
    }
}

/// Checks that `from` can cover the transfer and its fee
pub async fn preflight(
    client: &EvmClient,
    network: &NetworkDescriptor,
    draft: &TransferDraft,
    from: Address,
    estimate: &GasEstimate,
) -> Result<()> {
    let native = client
        .get_balance(from)
        .await
        .map_err(|e| map_provider_error(network.name, e))?;
    let fee = estimate.fee_wei();

    match draft.asset {
        Asset::Native { .. } => {
            let needed = draft.amount.saturating_add(fee);
            if native < needed {
                return Err(insufficient(needed, native));
            }
        }
        Asset::Token { contract, .. } => {
            if native < fee {
                return Err(insufficient(fee, native));
            }
            let held = client
                .get_token_balance(contract, from)
                .await
                .map_err(|e| map_provider_error(network.name, e))?;
            if held < draft.amount {
                return Err(insufficient(draft.amount, held));
            }
        }
    }
    Ok(())
}

/// Estimates, checks funds, signs and broadcasts `draft` once
pub async fn submit(
    client: &EvmClient,
    network: &NetworkDescriptor,
    draft: &TransferDraft,
    signer: &KeySource<'_>,
) -> Result<TransactionRecord> {
    let from = signer.address().await?;
    let nonce = client
        .transaction_count(from)
        .await
        .map_err(|e| map_provider_error(network.name, e))?;
    let estimate = estimate_with(client, network, draft, Some(from), false).await?;
    preflight(client, network, draft, from, &estimate).await?;

    let request = draft.to_request(from, nonce, estimate.gas_limit, estimate.gas_price, network.chain_id);
    let signed = signer.sign(request).await?;
    tracing::debug!(
        network = %network.name,
        from = %from,
        nonce,
        gas_limit = estimate.gas_limit,
        tx_hash = %signed.hash,
        "transaction signed"
    );

    let node_hash = client
        .send_raw_transaction(&signed.raw)
        .await
        .map_err(|e| map_provider_error(network.name, e))?;
    if node_hash != signed.hash {
        tracing::warn!(
            network = %network.name,
            local = %signed.hash,
            node = %node_hash,
            "node returned a different transaction hash"
        );
    }
    tracing::info!(
        network = %network.name,
        tx_hash = %signed.hash,
        asset = draft.asset.symbol(),
        "transaction submitted"
    );

    let hash_hex = format!("{:#x}", signed.hash);
    Ok(TransactionRecord {
        from_address: Some(from),
        to_address: Some(draft.to),
        amount: Some(draft.human_amount()),
        asset: Some(draft.asset.symbol().to_string()),
        explorer_url: Some(network.tx_url(&hash_hex)),
        ..TransactionRecord::bare(signed.hash, TxStatus::Submitted, network)
    })
}
