// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-20 token contract call encoding.
//!
//! Calls are encoded to raw calldata and sent through
//! [`ChainClient::contract_read`](super::ChainClient::contract_read) or
//! embedded in a signed transaction, so the engine never needs a
//! provider-bound contract instance.

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall,
};

use super::client::ChainError;

// Define the ERC-20 interface using alloy's sol! macro
sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
    }
}

/// Calldata for `balanceOf(account)`.
pub fn balance_of_calldata(account: Address) -> Bytes {
    IERC20::balanceOfCall { account }.abi_encode().into()
}

/// Calldata for `transfer(to, amount)`.
pub fn transfer_calldata(to: Address, amount: U256) -> Bytes {
    IERC20::transferCall { to, amount }.abi_encode().into()
}

/// Calldata for `allowance(owner, spender)`.
pub fn allowance_calldata(owner: Address, spender: Address) -> Bytes {
    IERC20::allowanceCall { owner, spender }.abi_encode().into()
}

/// Decode the `uint256` returned by `balanceOf`.
pub fn decode_balance_of(output: &[u8]) -> Result<U256, ChainError> {
    IERC20::balanceOfCall::abi_decode_returns(output)
        .map_err(|e| ChainError::InvalidResponse(format!("balanceOf: {e}")))
}

/// Decode the `uint256` returned by `allowance`.
pub fn decode_allowance(output: &[u8]) -> Result<U256, ChainError> {
    IERC20::allowanceCall::abi_decode_returns(output)
        .map_err(|e| ChainError::InvalidResponse(format!("allowance: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLDER: Address = Address::repeat_byte(0x11);
    const RECIPIENT: Address = Address::repeat_byte(0x22);

    #[test]
    fn balance_of_selector_and_padding() {
        let data = balance_of_calldata(HOLDER);
        // keccak256("balanceOf(address)")[..4]
        assert_eq!(&data[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(&data[16..], HOLDER.as_slice());
    }

    #[test]
    fn transfer_selector() {
        let data = transfer_calldata(RECIPIENT, U256::from(1_000_000u64));
        // keccak256("transfer(address,uint256)")[..4]
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(U256::from_be_slice(&data[36..68]), U256::from(1_000_000u64));
    }

    #[test]
    fn decode_balance_word() {
        let word = U256::from(1_000_000u64).to_be_bytes::<32>();
        assert_eq!(decode_balance_of(&word).unwrap(), U256::from(1_000_000u64));
    }

    #[test]
    fn decode_rejects_short_output() {
        assert!(matches!(
            decode_balance_of(&[0x01, 0x02]),
            Err(ChainError::InvalidResponse(_))
        ));
    }
}
