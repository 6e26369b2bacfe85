// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Portfolio - multi-asset balance and transfer engine
//!
//! Aggregates native and ERC-20 balances on an EVM chain with oracle prices,
//! and quotes, signs and broadcasts transfers and router swaps behind a
//! pre-flight affordability check.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - EVM JSON-RPC client, ABI encoding, signing
//! - `oracle` - price quotes (CoinMarketCap)
//! - `engine` - portfolio aggregation, transfers and swaps
//! - `credentials` - signing credential lookup

pub mod api;
pub mod blockchain;
pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod oracle;
pub mod state;
