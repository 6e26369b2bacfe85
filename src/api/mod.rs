// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use alloy::primitives::Address;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{blockchain::SigningContext, error::ApiError, state::AppState};

pub mod health;
pub mod portfolio;
pub mod swaps;
pub mod transfers;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/assets", get(portfolio::list_assets))
        .route(
            "/wallets/{address}/portfolio",
            get(portfolio::get_portfolio),
        )
        .route(
            "/wallets/{address}/transfers/quote",
            post(transfers::quote_transfer),
        )
        .route(
            "/wallets/{address}/transfers",
            post(transfers::execute_transfer),
        )
        .route("/wallets/{address}/swaps", post(swaps::execute_swap))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

/// Parse a wallet or recipient address from a path or body field.
pub(crate) fn parse_address(raw: &str, field: &str) -> Result<Address, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("{field} is not a valid address: {raw}")))
}

/// Signing credential for `address`, if a credential source is configured.
pub(crate) async fn signer_for(
    state: &AppState,
    address: Address,
) -> Result<SigningContext, ApiError> {
    let resolver = state
        .credentials
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("transaction signing is not configured"))?;
    Ok(resolver.resolve(address).await?)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        portfolio::list_assets,
        portfolio::get_portfolio,
        transfers::quote_transfer,
        transfers::execute_transfer,
        swaps::execute_swap
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            portfolio::AssetResponse,
            portfolio::AssetListResponse,
            portfolio::PortfolioEntryResponse,
            portfolio::PortfolioResponse,
            transfers::TransferBody,
            transfers::TransferQuoteResponse,
            transfers::TransferReceiptResponse,
            swaps::SwapBody,
            swaps::SwapReceiptResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Portfolio", description = "Balances and fiat valuation"),
        (name = "Transfers", description = "Native and token transfers"),
        (name = "Swaps", description = "Router token swaps")
    )
)]
struct ApiDoc;
