// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Portfolio aggregation: on-chain balances joined with oracle prices.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use alloy::primitives::{Address, U256};
use futures::future::try_join_all;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::{
    catalog::{Asset, AssetCatalog},
    context::CallContext,
    error::{EngineError, Step},
    whole_units,
};
use crate::{
    blockchain::{erc20, ChainClient},
    oracle::{PriceOracle, PriceQuote},
};

/// One asset's line in a portfolio.
#[derive(Debug, Clone)]
pub struct PortfolioEntry {
    pub asset: Asset,
    pub raw_balance: U256,
    /// Whole units (`raw / 10^decimals`)
    pub balance: Decimal,
    /// `balance × priceUSD`, zero when unquoted
    pub fiat_value: Decimal,
    pub quote: Option<PriceQuote>,
}

#[derive(Debug, Clone)]
pub struct PortfolioSnapshot {
    pub address: Address,
    /// Same order as the requested assets
    pub entries: Vec<PortfolioEntry>,
    pub total_fiat_value: Decimal,
    pub reference_symbol: String,
    /// `total_fiat_value / priceUSD(reference)`, zero without a usable price
    pub total_value_in_reference_asset: Decimal,
}

/// Catalog asset with its current quote, if the oracle has one.
#[derive(Debug, Clone)]
pub struct AssetListing {
    pub asset: Asset,
    pub quote: Option<PriceQuote>,
}

pub struct BalanceAggregator {
    chain: Arc<dyn ChainClient>,
    oracle: Arc<dyn PriceOracle>,
    catalog: Arc<AssetCatalog>,
}

impl BalanceAggregator {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        oracle: Arc<dyn PriceOracle>,
        catalog: Arc<AssetCatalog>,
    ) -> Self {
        Self {
            chain,
            oracle,
            catalog,
        }
    }

    /// Balances and fiat values of `assets` held by `wallet`.
    ///
    /// Quotes are requested for exactly the symbols of `assets`. Balance reads
    /// run concurrently; any failed read or a failed quote request fails the
    /// whole call.
    pub async fn get_portfolio(
        &self,
        ctx: &CallContext,
        wallet: Address,
        assets: &[Asset],
    ) -> Result<PortfolioSnapshot, EngineError> {
        self.validate(assets)?;
        info!(address = %wallet, assets = assets.len(), "Building portfolio");

        let symbols: Vec<String> = assets.iter().map(|a| a.symbol.clone()).collect();
        let quotes = self.fetch_quotes(ctx, &symbols);
        let balances = try_join_all(
            assets
                .iter()
                .map(|asset| self.read_balance(ctx, wallet, asset)),
        );
        let (mut quotes, balances) = tokio::try_join!(quotes, balances)?;

        let mut entries = Vec::with_capacity(assets.len());
        let mut total_fiat_value = Decimal::ZERO;
        for (asset, raw_balance) in assets.iter().zip(balances) {
            let balance = whole_units(raw_balance, asset.decimals)?;
            let quote = quotes.remove(&asset.symbol);
            let fiat_value = match &quote {
                Some(quote) => balance
                    .checked_mul(quote.price_usd)
                    .ok_or(EngineError::ArithmeticOverflow)?,
                None => {
                    warn!(symbol = %asset.symbol, "No price quote, fiat value counted as zero");
                    Decimal::ZERO
                }
            };
            total_fiat_value = total_fiat_value
                .checked_add(fiat_value)
                .ok_or(EngineError::ArithmeticOverflow)?;

            entries.push(PortfolioEntry {
                asset: asset.clone(),
                raw_balance,
                balance,
                fiat_value,
                quote,
            });
        }

        let reference_symbol = self.catalog.reference_symbol().to_string();
        let reference_price = entries
            .iter()
            .find(|e| e.asset.symbol.eq_ignore_ascii_case(&reference_symbol))
            .and_then(|e| e.quote.as_ref())
            .map(|q| q.price_usd)
            .filter(|price| !price.is_zero());
        let total_value_in_reference_asset = match reference_price {
            Some(price) => total_fiat_value
                .checked_div(price)
                .ok_or(EngineError::ArithmeticOverflow)?,
            None => Decimal::ZERO,
        };

        info!(
            address = %wallet,
            total_fiat_value = %total_fiat_value,
            reference = %reference_symbol,
            total_value_in_reference_asset = %total_value_in_reference_asset,
            "Portfolio built"
        );

        Ok(PortfolioSnapshot {
            address: wallet,
            entries,
            total_fiat_value,
            reference_symbol,
            total_value_in_reference_asset,
        })
    }

    /// Every catalog asset with its current quote.
    pub async fn list_assets(&self, ctx: &CallContext) -> Result<Vec<AssetListing>, EngineError> {
        let symbols: Vec<String> = self
            .catalog
            .assets()
            .iter()
            .map(|a| a.symbol.clone())
            .collect();
        let mut quotes = self.fetch_quotes(ctx, &symbols).await?;

        Ok(self
            .catalog
            .assets()
            .iter()
            .map(|asset| AssetListing {
                asset: asset.clone(),
                quote: quotes.remove(&asset.symbol),
            })
            .collect())
    }

    async fn fetch_quotes(
        &self,
        ctx: &CallContext,
        symbols: &[String],
    ) -> Result<HashMap<String, PriceQuote>, EngineError> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }
        ctx.bounded(Step::Quotes, self.oracle.quotes(symbols))
            .await?
            .map_err(|e| EngineError::QuoteUnavailable(e.to_string()))
    }

    fn validate(&self, assets: &[Asset]) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for asset in assets {
            if !self.catalog.contains(asset) {
                return Err(EngineError::invalid(format!(
                    "asset {} is not in the catalog",
                    asset.symbol
                )));
            }
            if !seen.insert(asset.symbol.to_ascii_uppercase()) {
                return Err(EngineError::invalid(format!(
                    "asset {} requested twice",
                    asset.symbol
                )));
            }
        }
        Ok(())
    }

    async fn read_balance(
        &self,
        ctx: &CallContext,
        wallet: Address,
        asset: &Asset,
    ) -> Result<U256, EngineError> {
        let read_failed = |reason: String| EngineError::BalanceReadFailed {
            asset: asset.symbol.clone(),
            reason,
        };

        let raw = match asset.contract_address {
            None => ctx
                .bounded(Step::NativeBalance, self.chain.native_balance(wallet))
                .await
                .map_err(|e| e.with_asset(&asset.symbol))?
                .map_err(|e| read_failed(e.to_string()))?,
            Some(contract) => {
                let output = ctx
                    .bounded(
                        Step::TokenBalance,
                        self.chain
                            .contract_read(contract, erc20::balance_of_calldata(wallet)),
                    )
                    .await
                    .map_err(|e| e.with_asset(&asset.symbol))?
                    .map_err(|e| read_failed(e.to_string()))?;
                erc20::decode_balance_of(&output).map_err(|e| read_failed(e.to_string()))?
            }
        };

        debug!(address = %wallet, symbol = %asset.symbol, raw = %raw, "Balance read");
        Ok(raw)
    }
}
