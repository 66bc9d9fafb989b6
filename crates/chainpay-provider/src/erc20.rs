//! ERC-20 call encoding

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::{ProviderError, Result};

sol! {
    function balanceOf(address account) external view returns (uint256);
    function transfer(address to, uint256 amount) external returns (bool);
}

/// Calldata for `balanceOf(owner)`
pub fn balance_of_calldata(owner: Address) -> Bytes {
    balanceOfCall { account: owner }.abi_encode().into()
}

/// Calldata for `transfer(to, amount)`
pub fn transfer_calldata(to: Address, amount: U256) -> Bytes {
    transferCall { to, amount }.abi_encode().into()
}

/// Decodes the return data of `balanceOf`
pub fn decode_balance(data: &[u8]) -> Result<U256> {
    balanceOfCall::abi_decode_returns(data)
        .map_err(|e| ProviderError::Decode(format!("balanceOf: {e}")))
}

/// Recipient and amount of a `transfer` call, if `input` is one
pub fn decode_transfer(input: &[u8]) -> Option<(Address, U256)> {
    if input.len() < 4 || input[..4] != transferCall::SELECTOR {
        return None;
    }
    transferCall::abi_decode(input)
        .ok()
        .map(|call| (call.to, call.amount))
}
