//! Built-in catalog of supported EVM networks

use chainpay_error::{ChainpayError, Result};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;

/// Chain family, shared by a mainnet and its testnets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkFamily {
    /// Ethereum L1
    Ethereum,
    /// Base L2
    Base,
    /// BNB Smart Chain
    Bsc,
    /// Polygon PoS
    Polygon,
    /// Avalanche C-Chain
    Avalanche,
}

impl NetworkFamily {
    /// Suffix used in display aliases such as `USDC_BASE`
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Ethereum => "ETHEREUM",
            Self::Base => "BASE",
            Self::Bsc => "BSC",
            Self::Polygon => "POLYGON",
            Self::Avalanche => "AVALANCHE",
        }
    }

    /// Parses an alias suffix
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_uppercase().as_str() {
            "ETHEREUM" | "ETH" => Some(Self::Ethereum),
            "BASE" => Some(Self::Base),
            "BSC" | "BNB" => Some(Self::Bsc),
            "POLYGON" | "MATIC" => Some(Self::Polygon),
            "AVALANCHE" | "AVAX" => Some(Self::Avalanche),
            _ => None,
        }
    }
}

/// A supported network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkDescriptor {
    /// Canonical name, e.g. `base_sepolia`
    pub name: &'static str,
    /// Human-readable name
    pub display_name: &'static str,
    /// EIP-155 chain ID
    pub chain_id: u64,
    /// RPC endpoints in failover order
    pub rpc_urls: &'static [&'static str],
    /// Block explorer base URL
    pub explorer_url: &'static str,
    /// Native currency symbol
    pub native_symbol: &'static str,
    /// Native currency decimals
    pub native_decimals: u8,
    /// Whether this is a test network
    pub is_testnet: bool,
    /// Confirmations required before a transaction counts as confirmed
    pub min_confirmations: u64,
    /// Gas price used when the node reports none
    pub fallback_gas_price_wei: u128,
    /// Chain family
    pub family: NetworkFamily,
}

impl NetworkDescriptor {
    /// Explorer link for a transaction hash
    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, hash)
    }

    /// Explorer link for an address
    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer_url, address)
    }

    /// Environment variable that overrides the primary RPC URL
    pub fn rpc_env_var(&self) -> String {
        format!("{}_RPC_URL", self.name.to_ascii_uppercase())
    }
}

impl fmt::Display for NetworkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.chain_id)
    }
}

const GWEI: u128 = 1_000_000_000;

// Chain IDs
pub const ETHEREUM_MAINNET_CHAIN_ID: u64 = 1;
pub const ETHEREUM_SEPOLIA_CHAIN_ID: u64 = 11_155_111;
pub const BASE_MAINNET_CHAIN_ID: u64 = 8453;
pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84_532;
pub const BSC_MAINNET_CHAIN_ID: u64 = 56;
pub const BSC_TESTNET_CHAIN_ID: u64 = 97;
pub const POLYGON_MAINNET_CHAIN_ID: u64 = 137;
pub const POLYGON_AMOY_CHAIN_ID: u64 = 80_002;
pub const AVALANCHE_MAINNET_CHAIN_ID: u64 = 43_114;
pub const AVALANCHE_FUJI_CHAIN_ID: u64 = 43_113;

static NETWORKS: [NetworkDescriptor; 10] = [
    NetworkDescriptor {
        name: "ethereum_mainnet",
        display_name: "Ethereum Mainnet",
        chain_id: ETHEREUM_MAINNET_CHAIN_ID,
        rpc_urls: &[
            "https://ethereum-rpc.publicnode.com",
            "https://eth.llamarpc.com",
        ],
        explorer_url: "https://etherscan.io",
        native_symbol: "ETH",
        native_decimals: 18,
        is_testnet: false,
        min_confirmations: 12,
        fallback_gas_price_wei: 20 * GWEI,
        family: NetworkFamily::Ethereum,
    },
    NetworkDescriptor {
        name: "ethereum_sepolia",
        display_name: "Ethereum Sepolia",
        chain_id: ETHEREUM_SEPOLIA_CHAIN_ID,
        rpc_urls: &[
            "https://ethereum-sepolia-rpc.publicnode.com",
            "https://sepolia.drpc.org",
        ],
        explorer_url: "https://sepolia.etherscan.io",
        native_symbol: "ETH",
        native_decimals: 18,
        is_testnet: true,
        min_confirmations: 3,
        fallback_gas_price_wei: GWEI,
        family: NetworkFamily::Ethereum,
    },
    NetworkDescriptor {
        name: "base_mainnet",
        display_name: "Base Mainnet",
        chain_id: BASE_MAINNET_CHAIN_ID,
        rpc_urls: &["https://base-rpc.publicnode.com", "https://mainnet.base.org"],
        explorer_url: "https://basescan.org",
        native_symbol: "ETH",
        native_decimals: 18,
        is_testnet: false,
        min_confirmations: 6,
        fallback_gas_price_wei: 20 * GWEI,
        family: NetworkFamily::Base,
    },
    NetworkDescriptor {
        name: "base_sepolia",
        display_name: "Base Sepolia",
        chain_id: BASE_SEPOLIA_CHAIN_ID,
        rpc_urls: &[
            "https://base-sepolia-rpc.publicnode.com",
            "https://sepolia.base.org",
        ],
        explorer_url: "https://sepolia.basescan.org",
        native_symbol: "ETH",
        native_decimals: 18,
        is_testnet: true,
        min_confirmations: 1,
        fallback_gas_price_wei: GWEI,
        family: NetworkFamily::Base,
    },
    NetworkDescriptor {
        name: "bsc_mainnet",
        display_name: "BNB Smart Chain",
        chain_id: BSC_MAINNET_CHAIN_ID,
        rpc_urls: &["https://bsc-rpc.publicnode.com", "https://bsc-dataseed.bnbchain.org"],
        explorer_url: "https://bscscan.com",
        native_symbol: "BNB",
        native_decimals: 18,
        is_testnet: false,
        min_confirmations: 15,
        fallback_gas_price_wei: 5 * GWEI,
        family: NetworkFamily::Bsc,
    },
    NetworkDescriptor {
        name: "bsc_testnet",
        display_name: "BNB Smart Chain Testnet",
        chain_id: BSC_TESTNET_CHAIN_ID,
        rpc_urls: &[
            "https://bsc-testnet-rpc.publicnode.com",
            "https://data-seed-prebsc-1-s1.bnbchain.org:8545",
        ],
        explorer_url: "https://testnet.bscscan.com",
        native_symbol: "BNB",
        native_decimals: 18,
        is_testnet: true,
        min_confirmations: 3,
        fallback_gas_price_wei: 10 * GWEI,
        family: NetworkFamily::Bsc,
    },
    NetworkDescriptor {
        name: "polygon_mainnet",
        display_name: "Polygon Mainnet",
        chain_id: POLYGON_MAINNET_CHAIN_ID,
        rpc_urls: &["https://polygon-bor-rpc.publicnode.com", "https://polygon-rpc.com"],
        explorer_url: "https://polygonscan.com",
        native_symbol: "MATIC",
        native_decimals: 18,
        is_testnet: false,
        min_confirmations: 64,
        fallback_gas_price_wei: 30 * GWEI,
        family: NetworkFamily::Polygon,
    },
    NetworkDescriptor {
        name: "polygon_amoy",
        display_name: "Polygon Amoy",
        chain_id: POLYGON_AMOY_CHAIN_ID,
        rpc_urls: &[
            "https://polygon-amoy-bor-rpc.publicnode.com",
            "https://rpc-amoy.polygon.technology",
        ],
        explorer_url: "https://amoy.polygonscan.com",
        native_symbol: "MATIC",
        native_decimals: 18,
        is_testnet: true,
        min_confirmations: 3,
        fallback_gas_price_wei: 30 * GWEI,
        family: NetworkFamily::Polygon,
    },
    NetworkDescriptor {
        name: "avalanche_mainnet",
        display_name: "Avalanche C-Chain",
        chain_id: AVALANCHE_MAINNET_CHAIN_ID,
        rpc_urls: &[
            "https://avalanche-c-chain-rpc.publicnode.com",
            "https://api.avax.network/ext/bc/C/rpc",
        ],
        explorer_url: "https://snowtrace.io",
        native_symbol: "AVAX",
        native_decimals: 18,
        is_testnet: false,
        min_confirmations: 1,
        fallback_gas_price_wei: 25 * GWEI,
        family: NetworkFamily::Avalanche,
    },
    NetworkDescriptor {
        name: "avalanche_fuji",
        display_name: "Avalanche Fuji",
        chain_id: AVALANCHE_FUJI_CHAIN_ID,
        rpc_urls: &[
            "https://avalanche-fuji-c-chain-rpc.publicnode.com",
            "https://api.avax-test.network/ext/bc/C/rpc",
        ],
        explorer_url: "https://testnet.snowtrace.io",
        native_symbol: "AVAX",
        native_decimals: 18,
        is_testnet: true,
        min_confirmations: 1,
        fallback_gas_price_wei: 25 * GWEI,
        family: NetworkFamily::Avalanche,
    },
];

/// Read-only network lookup
#[derive(Debug)]
pub struct NetworkRegistry {
    networks: &'static [NetworkDescriptor],
}

static REGISTRY: Lazy<NetworkRegistry> = Lazy::new(|| NetworkRegistry { networks: &NETWORKS });

impl NetworkRegistry {
    /// The process-wide registry
    pub fn global() -> &'static NetworkRegistry {
        &REGISTRY
    }

    /// Looks up a network by canonical name, case-insensitively
    pub fn get(&self, name: &str) -> Result<&'static NetworkDescriptor> {
        let wanted = name.trim();
        self.networks
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ChainpayError::UnknownNetwork {
                network: name.to_string(),
            })
    }

    /// Looks up a network by chain ID
    pub fn by_chain_id(&self, chain_id: u64) -> Option<&'static NetworkDescriptor> {
        self.networks.iter().find(|n| n.chain_id == chain_id)
    }

    /// All networks in catalog order
    pub fn list(&self) -> &'static [NetworkDescriptor] {
        self.networks
    }

    /// Canonical names in catalog order
    pub fn names(&self) -> Vec<&'static str> {
        self.networks.iter().map(|n| n.name).collect()
    }
}

/// Resolves `name`, or `default` when the request omits it
pub fn resolve_network(name: Option<&str>, default: &str) -> Result<&'static NetworkDescriptor> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => NetworkRegistry::global().get(name),
        None => NetworkRegistry::global().get(default),
    }
}

/// All networks in catalog order
pub fn list_networks() -> &'static [NetworkDescriptor] {
    NetworkRegistry::global().list()
}
