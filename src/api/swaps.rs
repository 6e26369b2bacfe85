// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Router swap endpoint.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{parse_address, signer_for};
use crate::{engine::SwapRequest, error::ApiError, state::AppState};

/// Swap request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SwapBody {
    /// Token sold (symbol or contract address)
    #[schema(example = "USDC")]
    pub from_asset: String,
    /// Token bought (symbol or contract address)
    #[schema(example = "SHIB")]
    pub to_asset: String,
    /// Amount of `from_asset` in whole units
    #[schema(value_type = String, example = "25")]
    pub amount: Decimal,
    /// Minimum `to_asset` received, in whole units
    #[schema(value_type = Option<String>, example = "1000000")]
    pub min_amount_out: Option<Decimal>,
    /// Router deadline; defaults to the configured horizon from now
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SwapReceiptResponse {
    pub transaction_id: String,
    pub explorer_url: Option<String>,
    pub router: String,
    pub nonce: u64,
    pub chain_id: u64,
    pub deadline: DateTime<Utc>,
    pub amount_in_raw: String,
    pub min_amount_out_raw: String,
    pub gas_limit: u64,
    pub gas_price_wei: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub estimated_gas_fee: Decimal,
    pub fee_symbol: String,
}

/// Swap one catalog token for another through the configured router.
///
/// The wallet's token balance, router allowance and gas balance are checked
/// before anything is signed.
#[utoipa::path(
    post,
    path = "/v1/wallets/{address}/swaps",
    tag = "Swaps",
    params(("address" = String, Path, description = "Sending wallet address")),
    request_body = SwapBody,
    responses(
        (status = 200, description = "Swap broadcast", body = SwapReceiptResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "No signing credential for address"),
        (status = 422, description = "Insufficient funds or allowance, gas estimation or broadcast failed"),
        (status = 503, description = "Chain node unavailable, swaps or signing not configured")
    )
)]
pub async fn execute_swap(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(body): Json<SwapBody>,
) -> Result<Json<SwapReceiptResponse>, ApiError> {
    let engine = state
        .swaps
        .clone()
        .ok_or_else(|| ApiError::service_unavailable("swap router is not configured"))?;

    let request = SwapRequest {
        from: parse_address(&address, "address")?,
        from_asset: state.catalog.resolve(&body.from_asset)?.clone(),
        to_asset: state.catalog.resolve(&body.to_asset)?.clone(),
        amount: body.amount,
        min_amount_out: body.min_amount_out,
        deadline: body.deadline,
    };
    let signer = signer_for(&state, request.from).await?;

    let receipt = engine
        .execute(&state.call_context(), &request, &signer)
        .await?;

    let transaction_id = receipt.transaction_id.to_string();
    Ok(Json(SwapReceiptResponse {
        explorer_url: state.network.tx_url(&transaction_id),
        transaction_id,
        router: engine.router().to_string(),
        nonce: receipt.nonce,
        chain_id: receipt.chain_id,
        deadline: receipt.deadline,
        amount_in_raw: receipt.amount_in_raw.to_string(),
        min_amount_out_raw: receipt.min_amount_out_raw.to_string(),
        gas_limit: receipt.gas_limit,
        gas_price_wei: receipt.gas_price_wei.to_string(),
        estimated_gas_fee: receipt.estimated_gas_fee,
        fee_symbol: receipt.fee_symbol,
    }))
}
