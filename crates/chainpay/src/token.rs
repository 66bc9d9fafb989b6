//! Per-network ERC-20 token registry and the native/token asset split

use alloy::primitives::{address, Address};
use chainpay_error::{ChainpayError, Result};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::network::{NetworkDescriptor, NetworkFamily, NetworkRegistry};

/// A registered ERC-20 token on one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenDescriptor {
    /// Plain symbol, e.g. `USDC`
    pub symbol: &'static str,
    /// Token name
    pub name: &'static str,
    /// Network the contract lives on
    pub network_name: &'static str,
    /// Contract address
    pub contract_address: Address,
    /// Decimal places, at most 18
    pub decimals: u8,
}

impl TokenDescriptor {
    /// Symbol shown to users: plain on Ethereum mainnet, `SYMBOL_TAG` elsewhere
    pub fn display_symbol(&self) -> String {
        match NetworkRegistry::global().get(self.network_name) {
            Ok(net) if net.name != "ethereum_mainnet" => {
                format!("{}_{}", self.symbol, net.family.tag())
            }
            _ => self.symbol.to_string(),
        }
    }
}

const fn token(
    symbol: &'static str,
    name: &'static str,
    network_name: &'static str,
    contract_address: Address,
    decimals: u8,
) -> TokenDescriptor {
    TokenDescriptor {
        symbol,
        name,
        network_name,
        contract_address,
        decimals,
    }
}

static TOKENS: Lazy<TokenRegistry> = Lazy::new(|| {
    TokenRegistry::new(vec![
        // ========== USDC ==========
        token("USDC", "USD Coin", "ethereum_mainnet", address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), 6),
        token("USDC", "USD Coin", "base_mainnet", address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"), 6),
        token("USDC", "USD Coin", "bsc_mainnet", address!("8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d"), 18),
        token("USDC", "USD Coin", "polygon_mainnet", address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359"), 6),
        // ========== DAI ==========
        token("DAI", "Dai Stablecoin", "ethereum_mainnet", address!("6B175474E89094C44Da98b954EedeAC495271d0F"), 18),
        token("DAI", "Dai Stablecoin", "base_mainnet", address!("50c5725949A6F0c72E6C4a641F24049A917DB0Cb"), 18),
        token("DAI", "Dai Stablecoin", "bsc_mainnet", address!("1AF3F329e8BE154074D8769D1FFa4eE058B1DBc3"), 18),
        token("DAI", "Dai Stablecoin", "polygon_mainnet", address!("8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063"), 18),
        // ========== WETH ==========
        token("WETH", "Wrapped Ether", "ethereum_mainnet", address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), 18),
        token("WETH", "Wrapped Ether", "base_mainnet", address!("4200000000000000000000000000000000000006"), 18),
    ])
});

/// Read-only token lookup keyed by `(symbol, network)`
#[derive(Debug)]
pub struct TokenRegistry {
    tokens: Vec<TokenDescriptor>,
}

impl TokenRegistry {
    fn new(tokens: Vec<TokenDescriptor>) -> Self {
        Self { tokens }
    }

    /// The process-wide registry
    pub fn global() -> &'static TokenRegistry {
        &TOKENS
    }

    fn find(&self, symbol: &str, network: &str) -> Option<&TokenDescriptor> {
        self.tokens.iter().find(|t| {
            t.symbol.eq_ignore_ascii_case(symbol) && t.network_name.eq_ignore_ascii_case(network)
        })
    }

    /// Resolves `symbol` on `network`.
    ///
    /// The plain `(symbol, network)` key is tried first. A `SYMBOL_TAG`
    /// alias only resolves when TAG names the family of `network`.
    pub fn resolve(&self, symbol: &str, network: &NetworkDescriptor) -> Result<&TokenDescriptor> {
        let symbol = symbol.trim();
        if let Some(token) = self.find(symbol, network.name) {
            return Ok(token);
        }

        if let Some((base, tag)) = symbol.rsplit_once('_') {
            if NetworkFamily::from_tag(tag) == Some(network.family) {
                if let Some(token) = self.find(base, network.name) {
                    return Ok(token);
                }
            }
        }

        Err(ChainpayError::UnknownToken {
            symbol: symbol.to_string(),
            network: network.name.to_string(),
        })
    }

    /// Finds a token by contract address on a network
    pub fn by_contract(&self, contract: Address, network: &str) -> Option<&TokenDescriptor> {
        self.tokens
            .iter()
            .find(|t| t.contract_address == contract && t.network_name == network)
    }

    /// Tokens on `network`, in registry order
    pub fn for_network(&self, network: &str) -> Vec<&TokenDescriptor> {
        self.tokens
            .iter()
            .filter(|t| t.network_name.eq_ignore_ascii_case(network))
            .collect()
    }

    /// All tokens in registry order
    pub fn list(&self) -> &[TokenDescriptor] {
        &self.tokens
    }
}

/// What a balance query or transfer moves
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Asset {
    /// The network's native currency
    Native {
        /// Currency symbol
        symbol: &'static str,
        /// Decimal places
        decimals: u8,
    },
    /// An ERC-20 token
    Token {
        /// Contract address
        contract: Address,
        /// Decimal places
        decimals: u8,
        /// Plain symbol
        symbol: &'static str,
    },
}

/// Symbol accepted as the native currency on any network
pub const NATIVE_ALIAS: &str = "ETH";

impl Asset {
    /// Native currency of `network`
    pub fn native(network: &NetworkDescriptor) -> Self {
        Self::Native {
            symbol: network.native_symbol,
            decimals: network.native_decimals,
        }
    }

    /// Resolves an optional symbol on `network`.
    ///
    /// `None`, the network's native symbol or [`NATIVE_ALIAS`] selects the
    /// native currency. The alias holds on every network, so `ETH` on BSC
    /// resolves to BNB; the returned asset carries the real symbol.
    pub fn resolve(symbol: Option<&str>, network: &NetworkDescriptor) -> Result<Self> {
        match symbol.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Self::native(network)),
            Some(s) if s.eq_ignore_ascii_case(network.native_symbol) || s.eq_ignore_ascii_case(NATIVE_ALIAS) => {
                Ok(Self::native(network))
            }
            Some(s) => {
                let token = TokenRegistry::global().resolve(s, network)?;
                Ok(Self::Token {
                    contract: token.contract_address,
                    decimals: token.decimals,
                    symbol: token.symbol,
                })
            }
        }
    }

    /// Symbol of the asset
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Native { symbol, .. } | Self::Token { symbol, .. } => *symbol,
        }
    }

    /// Decimal places of the asset
    pub fn decimals(&self) -> u8 {
        match self {
            Self::Native { decimals, .. } | Self::Token { decimals, .. } => *decimals,
        }
    }

    /// Contract address for tokens
    pub fn contract(&self) -> Option<Address> {
        match self {
            Self::Native { .. } => None,
            Self::Token { contract, .. } => Some(*contract),
        }
    }

    /// True for the native currency
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native { .. })
    }
}

/// Resolves `symbol` on `network` through the process-wide registry
pub fn resolve_token(symbol: &str, network: &NetworkDescriptor) -> Result<&'static TokenDescriptor> {
    TokenRegistry::global().resolve(symbol, network)
}

/// All registered tokens in registry order
pub fn list_tokens() -> &'static [TokenDescriptor] {
    TokenRegistry::global().list()
}
