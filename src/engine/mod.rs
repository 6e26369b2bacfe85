// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Portfolio aggregation and value-transfer engines.
//!
//! - [`BalanceAggregator`] - balances joined with oracle prices
//! - [`TransferEngine`] - native and ERC-20 transfers with fee quotes
//! - [`SwapEngine`] - router swaps with balance, allowance and gas pre-flight
//!
//! Engines own no mutable state beyond the per-address signing locks; the
//! chain and oracle clients are injected and shared.

pub mod catalog;
pub mod context;
pub mod error;
pub mod locks;
pub mod portfolio;
pub mod swap;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testing;

use alloy::primitives::U256;
use rust_decimal::Decimal;

use crate::blockchain::{decimal_to_units, units_to_decimal, AmountError};

pub use catalog::{Asset, AssetCatalog, CatalogError};
pub use context::CallContext;
pub use error::{EngineError, Step};
pub use locks::AddressLocks;
pub use portfolio::{AssetListing, BalanceAggregator, PortfolioEntry, PortfolioSnapshot};
pub use swap::{SwapEngine, SwapReceipt, SwapRequest};
pub use transfer::{TransferEngine, TransferFeeQuote, TransferReceipt, TransferRequest};

pub(crate) const GWEI_DECIMALS: u8 = 9;

/// Whole units to smallest units, rejecting amounts the asset cannot represent.
pub(crate) fn to_units(amount: Decimal, decimals: u8) -> Result<U256, EngineError> {
    decimal_to_units(amount, decimals).map_err(|e| match e {
        AmountError::Overflow => EngineError::ArithmeticOverflow,
        other => EngineError::invalid(other.to_string()),
    })
}

pub(crate) fn whole_units(raw: U256, decimals: u8) -> Result<Decimal, EngineError> {
    units_to_decimal(raw, decimals).map_err(|_| EngineError::ArithmeticOverflow)
}
