//! Tool catalog
//!
//! Each tool is a thin adapter: it deserializes its arguments, calls the
//! engine and shapes the result as a JSON object. Failures are returned as
//! `{error, error_kind}` payloads rather than protocol errors.

use async_trait::async_trait;
use chainpay::{
    BalanceResult, ChainpayError, PaymentEngine, Result, TransactionRecord, WalletKind, WalletManager,
    WalletSummary,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Shown next to every freshly generated private key
pub const PRIVATE_KEY_WARNING: &str =
    "Store this private key securely. It is shown only once and anyone holding it controls the funds.";

/// A named operation exposed to clients
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name, also usable as a direct JSON-RPC method
    fn name(&self) -> &'static str;

    /// One-line description
    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object
    fn input_schema(&self) -> Value;

    /// Runs the tool
    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value>;

    /// Listing entry for `tools/list`
    fn definition(&self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.input_schema(),
        })
    }
}

/// `{error, error_kind}` payload for a failed call
pub fn error_payload(err: &ChainpayError) -> Value {
    json!({
        "error": err.to_string(),
        "error_kind": err.kind(),
    })
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| ChainpayError::InvalidArgument {
        name: "arguments".to_string(),
        reason: e.to_string(),
    })
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn network_property() -> Value {
    let names: Vec<&str> = chainpay::list_networks().iter().map(|n| n.name).collect();
    json!({
        "type": "string",
        "description": "Network name (optional, defaults to the configured network)",
        "enum": names,
    })
}

fn token_property() -> Value {
    json!({
        "type": "string",
        "description": "Token symbol such as USDC or DAI (optional, native currency when omitted or ETH)",
    })
}

fn string_property(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn record_payload(record: &TransactionRecord) -> Value {
    let mut out = Map::new();
    out.insert("transaction_hash".into(), json!(format!("{:#x}", record.hash)));
    out.insert("status".into(), json!(record.status.to_string()));
    out.insert("network".into(), json!(record.network));
    if let Some(from) = record.from_address {
        out.insert("from_address".into(), json!(from.to_checksum(None)));
    }
    if let Some(to) = record.to_address {
        out.insert("to_address".into(), json!(to.to_checksum(None)));
    }
    if let Some(amount) = &record.amount {
        out.insert("amount".into(), json!(amount));
    }
    if let Some(asset) = &record.asset {
        out.insert("token_symbol".into(), json!(asset));
    }
    if let Some(block) = record.block_number {
        out.insert("block_number".into(), json!(block));
    }
    if let Some(confirmations) = record.confirmations {
        out.insert("confirmations".into(), json!(confirmations));
    }
    if let Some(url) = &record.explorer_url {
        out.insert("explorer_url".into(), json!(url));
    }
    Value::Object(out)
}

fn balance_payload(result: &BalanceResult) -> Result<Value> {
    Ok(serde_json::to_value(result)?)
}

fn wallet_list_payload(wallets: &[WalletSummary]) -> Value {
    let current = wallets.iter().find(|w| w.is_current).map(|w| w.label.clone());
    let entries: Vec<Value> = wallets
        .iter()
        .map(|w| {
            json!({
                "label": w.label,
                "address": w.address.to_checksum(None),
                "wallet_type": w.kind.to_string(),
                "is_current": w.is_current,
            })
        })
        .collect();
    json!({
        "wallets": entries,
        "count": wallets.len(),
        "current_wallet": current,
    })
}

// ============================================================================
// Registry and network tools
// ============================================================================

struct GetNetworkInfo;

#[derive(Deserialize)]
struct NetworkArgs {
    #[serde(default)]
    network: Option<String>,
}

#[async_trait]
impl Tool for GetNetworkInfo {
    fn name(&self) -> &'static str {
        "get_network_info"
    }

    fn description(&self) -> &'static str {
        "Network details and a live connectivity check"
    }

    fn input_schema(&self) -> Value {
        object_schema(json!({ "network": network_property() }), &[])
    }

    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: NetworkArgs = parse_args(args)?;
        let info = engine.network_info(args.network.as_deref()).await?;
        Ok(serde_json::to_value(info)?)
    }
}

struct ListNetworks;

#[async_trait]
impl Tool for ListNetworks {
    fn name(&self) -> &'static str {
        "list_networks"
    }

    fn description(&self) -> &'static str {
        "All supported networks"
    }

    fn input_schema(&self) -> Value {
        object_schema(json!({}), &[])
    }

    async fn call(&self, engine: &PaymentEngine, _args: Value) -> Result<Value> {
        let networks: Vec<Value> = engine
            .list_networks()
            .iter()
            .map(|n| {
                json!({
                    "name": n.name,
                    "display_name": n.display_name,
                    "chain_id": n.chain_id,
                    "native_token": n.native_symbol,
                    "is_testnet": n.is_testnet,
                    "min_confirmations": n.min_confirmations,
                    "explorer_url": n.explorer_url,
                })
            })
            .collect();
        Ok(json!({
            "default_network": engine.config().default_network,
            "networks": networks,
        }))
    }
}

struct GetSupportedTokens;

#[async_trait]
impl Tool for GetSupportedTokens {
    fn name(&self) -> &'static str {
        "get_supported_tokens"
    }

    fn description(&self) -> &'static str {
        "Registered ERC-20 tokens, optionally for one network"
    }

    fn input_schema(&self) -> Value {
        object_schema(json!({ "network": network_property() }), &[])
    }

    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: NetworkArgs = parse_args(args)?;
        let mut tokens = Map::new();
        for token in engine.supported_tokens(args.network.as_deref())? {
            tokens.insert(
                token.display_symbol(),
                json!({
                    "name": token.name,
                    "address": token.contract_address.to_checksum(None),
                    "decimals": token.decimals,
                    "network": token.network_name,
                    "symbol": token.symbol,
                }),
            );
        }
        Ok(json!({ "supported_tokens": tokens }))
    }
}

struct ValidateAddress;

#[derive(Deserialize)]
struct ValidateAddressArgs {
    address: String,
    #[serde(default)]
    network: Option<String>,
}

#[async_trait]
impl Tool for ValidateAddress {
    fn name(&self) -> &'static str {
        "validate_address"
    }

    fn description(&self) -> &'static str {
        "Check address syntax and EIP-55 checksum"
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "address": string_property("Address to validate"),
                "network": network_property(),
            }),
            &["address"],
        )
    }

    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: ValidateAddressArgs = parse_args(args)?;
        if let Some(network) = args.network.as_deref() {
            engine.resolve_network(Some(network))?;
        }
        Ok(serde_json::to_value(engine.validate_address(&args.address))?)
    }
}

// ============================================================================
// Balances
// ============================================================================

struct GetBalance;

#[derive(Deserialize)]
struct GetBalanceArgs {
    address: String,
    #[serde(default)]
    network: Option<String>,
    #[serde(default)]
    token_symbol: Option<String>,
    #[serde(default)]
    token_symbols: Vec<String>,
    #[serde(default)]
    networks: Vec<String>,
}

#[async_trait]
impl Tool for GetBalance {
    fn name(&self) -> &'static str {
        "get_balance"
    }

    fn description(&self) -> &'static str {
        "Native and token balances of an address"
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "address": string_property("Address to query"),
                "network": network_property(),
                "token_symbol": token_property(),
                "token_symbols": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Several tokens, reported after the native balance (optional)",
                },
                "networks": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Query native balances on several networks at once (optional)",
                },
            }),
            &["address"],
        )
    }

    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: GetBalanceArgs = parse_args(args)?;
        if !args.networks.is_empty() {
            let results = engine.get_balances_multi(&args.address, &args.networks).await?;
            let results: Vec<Value> = results.iter().map(balance_payload).collect::<Result<_>>()?;
            return Ok(json!({ "address": args.address, "results": results }));
        }
        let result = if args.token_symbols.is_empty() {
            engine
                .get_balance(&args.address, args.network.as_deref(), args.token_symbol.as_deref())
                .await?
        } else {
            engine
                .get_balances(&args.address, args.network.as_deref(), &args.token_symbols)
                .await?
        };
        balance_payload(&result)
    }
}

struct GetAgentWalletBalance;

#[derive(Deserialize)]
struct AgentBalanceArgs {
    #[serde(default, alias = "label")]
    wallet_label: Option<String>,
    #[serde(default)]
    network: Option<String>,
    #[serde(default)]
    token_symbol: Option<String>,
}

#[async_trait]
impl Tool for GetAgentWalletBalance {
    fn name(&self) -> &'static str {
        "get_agent_wallet_balance"
    }

    fn description(&self) -> &'static str {
        "Balance of an agent wallet (the current or first agent wallet when no label is given)"
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "wallet_label": string_property("Agent wallet label (optional)"),
                "network": network_property(),
                "token_symbol": token_property(),
            }),
            &[],
        )
    }

    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: AgentBalanceArgs = parse_args(args)?;
        let (wallet, balance) = engine
            .agent_wallet_balance(
                args.wallet_label.as_deref(),
                args.network.as_deref(),
                args.token_symbol.as_deref(),
            )
            .await?;
        let mut payload = balance_payload(&balance)?;
        if let Value::Object(map) = &mut payload {
            map.insert("wallet_label".into(), json!(wallet.label));
            map.insert("wallet_type".into(), json!(wallet.kind.to_string()));
        }
        Ok(payload)
    }
}

// ============================================================================
// Wallets
// ============================================================================

struct CreateWallet;

#[derive(Deserialize)]
struct CreateWalletArgs {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    wallet_type: Option<String>,
}

#[async_trait]
impl Tool for CreateWallet {
    fn name(&self) -> &'static str {
        "create_wallet"
    }

    fn description(&self) -> &'static str {
        "Generate a new key pair; registers it when a label is given"
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "label": string_property("Register the wallet under this label (optional)"),
                "wallet_type": {
                    "type": "string",
                    "enum": ["agent", "user"],
                    "default": "agent",
                    "description": "Kind used when registering",
                },
            }),
            &[],
        )
    }

    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: CreateWalletArgs = parse_args(args)?;
        let kind = args
            .wallet_type
            .as_deref()
            .map(WalletKind::parse)
            .transpose()?
            .unwrap_or(WalletKind::Agent);

        let generated = WalletManager::create_wallet()?;
        let mut payload = json!({
            "address": generated.address.to_checksum(None),
            "private_key": generated.private_key().as_str(),
            "warning": PRIVATE_KEY_WARNING,
        });
        if let Some(label) = args.label.as_deref().filter(|l| !l.trim().is_empty()) {
            let handle = engine.wallets().adopt(&generated, label, kind).await?;
            payload["label"] = json!(handle.label);
            payload["wallet_type"] = json!(handle.kind.to_string());
        }
        Ok(payload)
    }
}

struct CreateAgentWallet;

#[derive(Deserialize)]
struct OptionalLabelArgs {
    #[serde(default)]
    label: Option<String>,
}

#[async_trait]
impl Tool for CreateAgentWallet {
    fn name(&self) -> &'static str {
        "create_agent_wallet"
    }

    fn description(&self) -> &'static str {
        "Generate and register an agent wallet for automated operations"
    }

    fn input_schema(&self) -> Value {
        object_schema(json!({ "label": string_property("Wallet label (optional)") }), &[])
    }

    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: OptionalLabelArgs = parse_args(args)?;
        let handle = engine.wallets().create_agent_wallet(args.label.as_deref()).await?;
        Ok(json!({
            "success": true,
            "label": handle.label,
            "address": handle.address.to_checksum(None),
            "wallet_type": handle.kind.to_string(),
            "created_at": handle.created_at.to_rfc3339(),
        }))
    }
}

struct SetUserWallet;

#[derive(Deserialize)]
struct SetUserWalletArgs {
    private_key: String,
    #[serde(default)]
    label: Option<String>,
}

#[async_trait]
impl Tool for SetUserWallet {
    fn name(&self) -> &'static str {
        "set_user_wallet"
    }

    fn description(&self) -> &'static str {
        "Import a private key as a user wallet"
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "private_key": string_property("Hex private key, 0x optional"),
                "label": string_property("Wallet label (optional, defaults to 'default')"),
            }),
            &["private_key"],
        )
    }

    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: SetUserWalletArgs = parse_args(args)?;
        let handle = engine
            .wallets()
            .set_user_wallet(&args.private_key, args.label.as_deref())
            .await?;
        Ok(json!({
            "success": true,
            "address": handle.address.to_checksum(None),
            "label": handle.label,
        }))
    }
}

struct GetWalletAddress;

#[derive(Deserialize)]
struct PrivateKeyArgs {
    private_key: String,
}

#[async_trait]
impl Tool for GetWalletAddress {
    fn name(&self) -> &'static str {
        "get_wallet_address"
    }

    fn description(&self) -> &'static str {
        "Derive the address of a private key without registering it"
    }

    fn input_schema(&self) -> Value {
        object_schema(json!({ "private_key": string_property("Hex private key") }), &["private_key"])
    }

    async fn call(&self, _engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: PrivateKeyArgs = parse_args(args)?;
        Ok(match WalletManager::get_wallet_address(&args.private_key) {
            Ok((address, masked)) => json!({
                "success": true,
                "address": address.to_checksum(None),
                "private_key_masked": masked,
            }),
            Err(err) => json!({
                "success": false,
                "error": err.to_string(),
                "error_kind": err.kind(),
            }),
        })
    }
}

struct ListWallets {
    name: &'static str,
    description: &'static str,
    kind: Option<WalletKind>,
}

#[async_trait]
impl Tool for ListWallets {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn input_schema(&self) -> Value {
        object_schema(json!({}), &[])
    }

    async fn call(&self, engine: &PaymentEngine, _args: Value) -> Result<Value> {
        let wallets = engine.wallets().list(self.kind).await;
        Ok(wallet_list_payload(&wallets))
    }
}

struct SwitchWallet;

#[derive(Debug, Deserialize)]
struct LabelArgs {
    label: String,
}

#[async_trait]
impl Tool for SwitchWallet {
    fn name(&self) -> &'static str {
        "switch_wallet"
    }

    fn description(&self) -> &'static str {
        "Make a registered wallet the current one"
    }

    fn input_schema(&self) -> Value {
        object_schema(json!({ "label": string_property("Wallet label") }), &["label"])
    }

    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: LabelArgs = parse_args(args)?;
        let handle = engine.wallets().switch(&args.label).await?;
        Ok(json!({
            "success": true,
            "current_wallet": handle.label,
            "address": handle.address.to_checksum(None),
            "wallet_type": handle.kind.to_string(),
        }))
    }
}

struct RemoveWallet;

#[async_trait]
impl Tool for RemoveWallet {
    fn name(&self) -> &'static str {
        "remove_wallet"
    }

    fn description(&self) -> &'static str {
        "Forget a registered wallet"
    }

    fn input_schema(&self) -> Value {
        object_schema(json!({ "label": string_property("Wallet label") }), &["label"])
    }

    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: LabelArgs = parse_args(args)?;
        let handle = engine.wallets().remove(&args.label).await?;
        let current = engine.wallets().current().await.map(|w| w.label);
        Ok(json!({
            "success": true,
            "removed": handle.label,
            "current_wallet": current,
        }))
    }
}

// ============================================================================
// Transactions
// ============================================================================

struct EstimateGasFees;

#[derive(Deserialize)]
struct EstimateArgs {
    to_address: String,
    amount: String,
    #[serde(default)]
    network: Option<String>,
    #[serde(default)]
    token_symbol: Option<String>,
    #[serde(default)]
    from_address: Option<String>,
}

#[async_trait]
impl Tool for EstimateGasFees {
    fn name(&self) -> &'static str {
        "estimate_gas_fees"
    }

    fn description(&self) -> &'static str {
        "Estimate gas price, gas limit and total fee for a transfer"
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "to_address": string_property("Recipient address"),
                "amount": string_property("Amount in token units, e.g. \"0.5\""),
                "network": network_property(),
                "token_symbol": token_property(),
                "from_address": string_property("Sender to estimate from (optional)"),
            }),
            &["to_address", "amount"],
        )
    }

    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: EstimateArgs = parse_args(args)?;
        let estimate = engine
            .estimate_gas_fees_from(
                args.from_address.as_deref(),
                &args.to_address,
                &args.amount,
                args.network.as_deref(),
                args.token_symbol.as_deref(),
            )
            .await?;
        Ok(json!({
            "gas_price_gwei": estimate.gas_price_gwei(),
            "gas_limit": estimate.gas_limit,
            "estimated_fee_eth": estimate.estimated_fee(),
            "gas_price_wei": estimate.gas_price.to_string(),
            "estimated_fee_wei": estimate.fee_wei().to_string(),
            "native_token": estimate.native_symbol,
            "network": estimate.network,
        }))
    }
}

struct SendTransaction;

#[derive(Deserialize)]
struct SendArgs {
    to_address: String,
    amount: String,
    #[serde(default)]
    network: Option<String>,
    #[serde(default)]
    token_symbol: Option<String>,
    #[serde(default)]
    private_key: Option<String>,
    #[serde(default)]
    from_wallet_label: Option<String>,
}

#[async_trait]
impl Tool for SendTransaction {
    fn name(&self) -> &'static str {
        "send_transaction"
    }

    fn description(&self) -> &'static str {
        "Sign and broadcast a native or token transfer"
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "to_address": string_property("Recipient address"),
                "amount": string_property("Amount in token units, e.g. \"0.5\""),
                "network": network_property(),
                "token_symbol": token_property(),
                "private_key": string_property("Signing key (optional; the wallet is used otherwise)"),
                "from_wallet_label": string_property("Registered wallet to sign with (optional, current wallet by default)"),
            }),
            &["to_address", "amount"],
        )
    }

    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: SendArgs = parse_args(args)?;
        let network = args.network.as_deref();
        let token = args.token_symbol.as_deref();
        let record = match args.private_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                engine
                    .send_transaction(&args.to_address, &args.amount, network, key, token)
                    .await?
            }
            None => {
                engine
                    .send_from_wallet(args.from_wallet_label.as_deref(), &args.to_address, &args.amount, network, token)
                    .await?
            }
        };
        Ok(record_payload(&record))
    }
}

struct SendFromAgentWallet;

#[derive(Deserialize)]
struct AgentSendArgs {
    to_address: String,
    amount: String,
    #[serde(default)]
    network: Option<String>,
    #[serde(default)]
    token_symbol: Option<String>,
    #[serde(default, alias = "label", alias = "wallet_label")]
    from_wallet_label: Option<String>,
}

#[async_trait]
impl Tool for SendFromAgentWallet {
    fn name(&self) -> &'static str {
        "send_from_agent_wallet"
    }

    fn description(&self) -> &'static str {
        "Sign with an agent wallet and broadcast a transfer"
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "to_address": string_property("Recipient address"),
                "amount": string_property("Amount in token units, e.g. \"0.5\""),
                "network": network_property(),
                "token_symbol": token_property(),
                "from_wallet_label": string_property("Agent wallet label (optional)"),
            }),
            &["to_address", "amount"],
        )
    }

    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: AgentSendArgs = parse_args(args)?;
        let record = engine
            .send_from_agent_wallet(
                args.from_wallet_label.as_deref(),
                &args.to_address,
                &args.amount,
                args.network.as_deref(),
                args.token_symbol.as_deref(),
            )
            .await?;
        Ok(record_payload(&record))
    }
}

struct GetTransactionStatus;

#[derive(Deserialize)]
struct StatusArgs {
    tx_hash: String,
    #[serde(default)]
    network: Option<String>,
}

#[async_trait]
impl Tool for GetTransactionStatus {
    fn name(&self) -> &'static str {
        "get_transaction_status"
    }

    fn description(&self) -> &'static str {
        "Live status and confirmations of a transaction"
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "tx_hash": string_property("Transaction hash, 0x followed by 64 hex characters"),
                "network": network_property(),
            }),
            &["tx_hash"],
        )
    }

    async fn call(&self, engine: &PaymentEngine, args: Value) -> Result<Value> {
        let args: StatusArgs = parse_args(args)?;
        let record = engine
            .get_transaction_status(&args.tx_hash, args.network.as_deref())
            .await?;
        Ok(record_payload(&record))
    }
}

// ============================================================================
// Registry
// ============================================================================

/// All tools, in listing order
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// The built-in tool set
    pub fn new() -> Self {
        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(GetBalance),
            Box::new(SendTransaction),
            Box::new(GetTransactionStatus),
            Box::new(EstimateGasFees),
            Box::new(CreateWallet),
            Box::new(CreateAgentWallet),
            Box::new(GetNetworkInfo),
            Box::new(ListNetworks),
            Box::new(GetSupportedTokens),
            Box::new(ValidateAddress),
            Box::new(SetUserWallet),
            Box::new(ListWallets {
                name: "list_wallets",
                description: "All registered wallets",
                kind: None,
            }),
            Box::new(ListWallets {
                name: "list_agent_wallets",
                description: "Registered agent wallets",
                kind: Some(WalletKind::Agent),
            }),
            Box::new(ListWallets {
                name: "list_user_wallets",
                description: "Registered user wallets",
                kind: Some(WalletKind::User),
            }),
            Box::new(GetAgentWalletBalance),
            Box::new(SendFromAgentWallet),
            Box::new(SwitchWallet),
            Box::new(RemoveWallet),
            Box::new(GetWalletAddress),
        ];
        Self { tools }
    }

    /// Looks up a tool by name
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// Tool names in listing order
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Definitions for `tools/list`
    pub fn definitions(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Number of tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs `name`; failures become error payloads
    pub async fn call(&self, engine: &PaymentEngine, name: &str, args: Value) -> Value {
        let Some(tool) = self.get(name) else {
            return error_payload(&ChainpayError::InvalidArgument {
                name: "name".to_string(),
                reason: format!("unknown tool '{name}'"),
            });
        };

        tracing::debug!(tool = name, "tool call");
        match tool.call(engine, args).await {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(tool = name, kind = err.kind(), error = %err, "tool call failed");
                error_payload(&err)
            }
        }
    }
}
