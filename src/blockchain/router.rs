// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! UniswapV2-style router call encoding.

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall,
};

sol! {
    interface IUniswapV2Router02 {
        function swapExactTokensForTokens(
            uint256 amountIn,
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external returns (uint256[] memory amounts);
    }
}

/// Calldata for `swapExactTokensForTokens` over a two-hop path.
///
/// Output is delivered back to `recipient`; the router reverts once
/// `deadline` (unix seconds) has passed.
pub fn swap_exact_tokens_calldata(
    amount_in: U256,
    amount_out_min: U256,
    from_token: Address,
    to_token: Address,
    recipient: Address,
    deadline: u64,
) -> Bytes {
    IUniswapV2Router02::swapExactTokensForTokensCall {
        amountIn: amount_in,
        amountOutMin: amount_out_min,
        path: vec![from_token, to_token],
        to: recipient,
        deadline: U256::from(deadline),
    }
    .abi_encode()
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_two_hop_path_and_deadline() {
        let from = Address::repeat_byte(0xaa);
        let to = Address::repeat_byte(0xbb);
        let me = Address::repeat_byte(0xcc);

        let data = swap_exact_tokens_calldata(U256::from(5u64), U256::from(1u64), from, to, me, 1_700_000_000);

        // keccak256("swapExactTokensForTokens(uint256,uint256,address[],address,uint256)")[..4]
        assert_eq!(&data[..4], &[0x38, 0xed, 0x17, 0x39]);

        let decoded =
            IUniswapV2Router02::swapExactTokensForTokensCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.amountIn, U256::from(5u64));
        assert_eq!(decoded.amountOutMin, U256::from(1u64));
        assert_eq!(decoded.path, vec![from, to]);
        assert_eq!(decoded.to, me);
        assert_eq!(decoded.deadline, U256::from(1_700_000_000u64));
    }
}
