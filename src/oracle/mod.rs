// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fiat price quotes for catalog assets.

pub mod coinmarketcap;

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

pub use coinmarketcap::CoinMarketCapClient;

/// USD market data for one symbol, fetched per request and never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub symbol: String,
    pub price_usd: Decimal,
    pub percent_change_24h: Decimal,
    pub volume_24h: Decimal,
    pub market_cap: Decimal,
    /// Provider-specific asset id
    pub external_id: u64,
}

/// Quote provider.
///
/// A symbol absent from the returned map has no quote; that is not an error.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn quotes(&self, symbols: &[String]) -> Result<HashMap<String, PriceQuote>, OracleError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    #[error("Price oracle configuration missing: {0}")]
    MissingConfig(String),

    #[error("Price oracle request failed: {0}")]
    Request(String),

    #[error("Price oracle response was invalid: {0}")]
    InvalidResponse(String),
}
