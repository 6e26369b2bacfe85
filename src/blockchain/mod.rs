// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM chain integration.
//!
//! This module provides functionality for:
//! - Reading native and ERC-20 balances through a [`ChainClient`]
//! - Encoding ERC-20 and swap-router calls
//! - Signing legacy (EIP-155) transactions
//! - Fixed-point amount conversions

pub mod client;
pub mod erc20;
pub mod router;
pub mod signing;
pub mod types;

pub use client::{ChainClient, ChainError, RpcChainClient};
pub use signing::{SignedTransaction, SigningContext, SigningError};
pub use types::*;
