// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Portfolio and asset listing endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::parse_address;
use crate::{
    blockchain::format_amount,
    engine::{Asset, AssetListing, PortfolioEntry, PortfolioSnapshot},
    error::ApiError,
    oracle::{coinmarketcap::image_url, PriceQuote},
    state::AppState,
};

/// Query parameters for the portfolio request.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PortfolioQuery {
    /// Assets to include (comma-separated symbols, contract addresses or
    /// "native"). Defaults to the whole catalog.
    pub assets: Option<String>,
}

/// Catalog asset with provider metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct AssetResponse {
    pub symbol: String,
    pub name: String,
    /// Token contract, absent for the native coin
    pub contract_address: Option<String>,
    pub decimals: u8,
    /// Price provider id
    pub token_id: Option<u64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssetListResponse {
    pub reference_symbol: String,
    pub assets: Vec<AssetResponse>,
}

/// One portfolio line.
#[derive(Debug, Serialize, ToSchema)]
pub struct PortfolioEntryResponse {
    #[serde(flatten)]
    pub asset: AssetResponse,
    /// Balance in whole units, exact
    pub balance: String,
    /// Balance in the smallest unit
    pub balance_raw: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price_usd: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub fiat_value: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub percent_change_24h: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub volume_24h: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub market_cap: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PortfolioResponse {
    pub address: String,
    pub entries: Vec<PortfolioEntryResponse>,
    /// Sum of fiat values in USD
    #[serde(with = "rust_decimal::serde::float")]
    pub total_fiat_value: Decimal,
    pub reference_symbol: String,
    /// Total expressed in the reference asset; 0 when it has no price
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value_in_reference_asset: Decimal,
}

fn asset_response(asset: &Asset, quote: Option<&PriceQuote>) -> AssetResponse {
    let token_id = quote.map(|q| q.external_id);
    AssetResponse {
        symbol: asset.symbol.clone(),
        name: asset.name.clone(),
        contract_address: asset.contract_address.map(|a| a.to_string()),
        decimals: asset.decimals,
        token_id,
        image_url: token_id.map(image_url),
    }
}

impl From<&AssetListing> for AssetResponse {
    fn from(listing: &AssetListing) -> Self {
        asset_response(&listing.asset, listing.quote.as_ref())
    }
}

impl From<PortfolioEntry> for PortfolioEntryResponse {
    fn from(entry: PortfolioEntry) -> Self {
        let quote = entry.quote.as_ref();
        Self {
            asset: asset_response(&entry.asset, quote),
            balance: format_amount(entry.raw_balance, entry.asset.decimals),
            balance_raw: entry.raw_balance.to_string(),
            price_usd: quote.map(|q| q.price_usd),
            fiat_value: entry.fiat_value,
            percent_change_24h: quote.map(|q| q.percent_change_24h),
            volume_24h: quote.map(|q| q.volume_24h),
            market_cap: quote.map(|q| q.market_cap),
        }
    }
}

impl From<PortfolioSnapshot> for PortfolioResponse {
    fn from(snapshot: PortfolioSnapshot) -> Self {
        Self {
            address: snapshot.address.to_string(),
            entries: snapshot.entries.into_iter().map(Into::into).collect(),
            total_fiat_value: snapshot.total_fiat_value,
            reference_symbol: snapshot.reference_symbol,
            total_value_in_reference_asset: snapshot.total_value_in_reference_asset,
        }
    }
}

/// List catalog assets with provider ids and logos.
#[utoipa::path(
    get,
    path = "/v1/assets",
    tag = "Portfolio",
    responses(
        (status = 200, description = "Catalog assets", body = AssetListResponse),
        (status = 503, description = "Price provider unavailable")
    )
)]
pub async fn list_assets(State(state): State<AppState>) -> Result<Json<AssetListResponse>, ApiError> {
    let listing = state.portfolio.list_assets(&state.call_context()).await?;

    Ok(Json(AssetListResponse {
        reference_symbol: state.catalog.reference_symbol().to_string(),
        assets: listing.iter().map(AssetResponse::from).collect(),
    }))
}

/// Get a wallet's balances valued in USD and in the reference asset.
///
/// Assets without a price quote are listed with a fiat value of zero.
#[utoipa::path(
    get,
    path = "/v1/wallets/{address}/portfolio",
    tag = "Portfolio",
    params(
        ("address" = String, Path, description = "Wallet address"),
        PortfolioQuery
    ),
    responses(
        (status = 200, description = "Portfolio snapshot", body = PortfolioResponse),
        (status = 400, description = "Invalid address or asset"),
        (status = 503, description = "Chain node or price provider unavailable")
    )
)]
pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<PortfolioQuery>,
) -> Result<Json<PortfolioResponse>, ApiError> {
    let wallet = parse_address(&address, "address")?;

    let assets: Vec<Asset> = match query.assets.as_deref().map(str::trim) {
        Some(list) if !list.is_empty() => list
            .split(',')
            .map(|token| state.catalog.resolve(token).cloned())
            .collect::<Result<_, _>>()?,
        _ => state.catalog.assets().to_vec(),
    };

    let snapshot = state
        .portfolio
        .get_portfolio(&state.call_context(), wallet, &assets)
        .await?;

    Ok(Json(snapshot.into()))
}
