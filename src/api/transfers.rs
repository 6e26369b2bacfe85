// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transfer quote and execution endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{parse_address, signer_for};
use crate::{
    engine::{TransferFeeQuote, TransferReceipt, TransferRequest},
    error::ApiError,
    state::AppState,
};

/// Transfer request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferBody {
    /// Recipient address
    #[schema(example = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e")]
    pub to: String,
    /// Asset symbol, contract address or "native"
    #[schema(example = "BNB")]
    pub asset: String,
    /// Amount in whole units (e.g. "0.5")
    #[schema(value_type = String, example = "0.5")]
    pub amount: Decimal,
}

/// Transfer cost estimate.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferQuoteResponse {
    pub from: String,
    pub to: String,
    pub asset: String,
    pub token_address: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub amount_raw: String,
    /// Gas price in wei
    pub gas_price_wei: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub gas_price_gwei: Decimal,
    pub gas_limit: u64,
    /// Estimated fee in native units
    #[serde(with = "rust_decimal::serde::float")]
    pub estimated_gas_fee: Decimal,
    pub estimated_gas_fee_raw: String,
    /// Native units required: fee plus amount for native transfers
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
    pub total_cost_raw: String,
    pub fee_symbol: String,
}

/// Broadcast transfer.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferReceiptResponse {
    pub transaction_id: String,
    /// Block explorer link, when an explorer is configured
    pub explorer_url: Option<String>,
    pub nonce: u64,
    pub chain_id: u64,
    pub quote: TransferQuoteResponse,
}

impl From<TransferFeeQuote> for TransferQuoteResponse {
    fn from(quote: TransferFeeQuote) -> Self {
        Self {
            from: quote.from.to_string(),
            to: quote.to.to_string(),
            asset: quote.asset.symbol,
            token_address: quote.asset.contract_address.map(|a| a.to_string()),
            amount: quote.amount,
            amount_raw: quote.amount_raw.to_string(),
            gas_price_wei: quote.gas_price_wei.to_string(),
            gas_price_gwei: quote.gas_price_gwei,
            gas_limit: quote.gas_limit,
            estimated_gas_fee: quote.estimated_gas_fee,
            estimated_gas_fee_raw: quote.estimated_gas_fee_raw.to_string(),
            total_cost: quote.total_cost,
            total_cost_raw: quote.total_cost_raw.to_string(),
            fee_symbol: quote.fee_symbol,
        }
    }
}

fn receipt_response(state: &AppState, receipt: TransferReceipt) -> TransferReceiptResponse {
    let transaction_id = receipt.transaction_id.to_string();
    TransferReceiptResponse {
        explorer_url: state.network.tx_url(&transaction_id),
        transaction_id,
        nonce: receipt.nonce,
        chain_id: receipt.chain_id,
        quote: receipt.quote.into(),
    }
}

fn transfer_request(
    state: &AppState,
    address: &str,
    body: TransferBody,
) -> Result<TransferRequest, ApiError> {
    Ok(TransferRequest {
        from: parse_address(address, "address")?,
        to: parse_address(&body.to, "to")?,
        asset: state.catalog.resolve(&body.asset)?.clone(),
        amount: body.amount,
    })
}

/// Estimate the cost of a transfer.
///
/// Fails with 422 when the wallet cannot cover amount plus gas.
#[utoipa::path(
    post,
    path = "/v1/wallets/{address}/transfers/quote",
    tag = "Transfers",
    params(("address" = String, Path, description = "Sending wallet address")),
    request_body = TransferBody,
    responses(
        (status = 200, description = "Fee quote", body = TransferQuoteResponse),
        (status = 400, description = "Invalid request"),
        (status = 422, description = "Insufficient funds or gas estimation failed"),
        (status = 503, description = "Chain node unavailable")
    )
)]
pub async fn quote_transfer(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(body): Json<TransferBody>,
) -> Result<Json<TransferQuoteResponse>, ApiError> {
    let request = transfer_request(&state, &address, body)?;
    let quote = state
        .transfers
        .quote(&state.call_context(), &request)
        .await?;

    Ok(Json(quote.into()))
}

/// Sign and broadcast a transfer.
#[utoipa::path(
    post,
    path = "/v1/wallets/{address}/transfers",
    tag = "Transfers",
    params(("address" = String, Path, description = "Sending wallet address")),
    request_body = TransferBody,
    responses(
        (status = 200, description = "Transfer broadcast", body = TransferReceiptResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "No signing credential for address"),
        (status = 422, description = "Insufficient funds, gas estimation or broadcast failed"),
        (status = 503, description = "Chain node unavailable or signing not configured")
    )
)]
pub async fn execute_transfer(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(body): Json<TransferBody>,
) -> Result<Json<TransferReceiptResponse>, ApiError> {
    let request = transfer_request(&state, &address, body)?;
    let signer = signer_for(&state, request.from).await?;

    let receipt = state
        .transfers
        .execute(&state.call_context(), &request, &signer)
        .await?;

    Ok(Json(receipt_response(&state, receipt)))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::tests::{post_json, send, test_app},
        blockchain::{signing::tests::TEST_KEY_HEX, SigningContext},
        credentials::{CredentialError, CredentialResolver},
        engine::testing::{ether, Method},
    };
    use alloy::primitives::{Address, U256};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    struct FixedKey;

    #[async_trait]
    impl CredentialResolver for FixedKey {
        async fn resolve(&self, address: Address) -> Result<SigningContext, CredentialError> {
            let context = SigningContext::from_hex(TEST_KEY_HEX).unwrap();
            if context.address() == address {
                Ok(context)
            } else {
                Err(CredentialError::NotFound(address))
            }
        }
    }

    fn sender() -> Address {
        SigningContext::from_hex(TEST_KEY_HEX).unwrap().address()
    }

    fn body(amount: &str) -> serde_json::Value {
        json!({
            "to": "0x2222222222222222222222222222222222222222",
            "asset": "BNB",
            "amount": amount
        })
    }

    #[tokio::test]
    async fn quote_reports_fee_and_total() {
        let app = test_app(None, None);
        app.chain.set_native(sender(), ether(1));

        let (status, quote) = send(
            app.state,
            post_json(&format!("/v1/wallets/{}/transfers/quote", sender()), body("0.5")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["estimated_gas_fee"], 0.00105);
        assert_eq!(quote["total_cost"], 0.50105);
        assert_eq!(quote["gas_limit"], 21_000);
        assert_eq!(quote["gas_price_wei"], "50000000000");
        assert_eq!(quote["total_cost_raw"], "501050000000000000");
    }

    #[tokio::test]
    async fn unaffordable_quote_is_unprocessable() {
        let app = test_app(None, None);
        app.chain.set_native(sender(), U256::from(1u64));

        let (status, error) = send(
            app.state,
            post_json(&format!("/v1/wallets/{}/transfers/quote", sender()), body("0.5")),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error["error_code"], "insufficient_funds");
    }

    #[tokio::test]
    async fn execute_returns_transaction_and_explorer_link() {
        let app = test_app(Some(Arc::new(FixedKey)), None);
        app.chain.set_native(sender(), ether(1));

        let (status, receipt) = send(
            app.state,
            post_json(&format!("/v1/wallets/{}/transfers", sender()), body("0.5")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let tx_id = receipt["transaction_id"].as_str().unwrap();
        assert!(tx_id.starts_with("0x") && tx_id.len() == 66);
        assert_eq!(
            receipt["explorer_url"],
            format!("https://bscscan.com/tx/{tx_id}")
        );
        assert_eq!(app.chain.count(Method::Broadcast), 1);
    }

    #[tokio::test]
    async fn execute_without_credentials_is_unavailable() {
        let app = test_app(None, None);

        let (status, _) = send(
            app.state,
            post_json(&format!("/v1/wallets/{}/transfers", sender()), body("0.5")),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(app.chain.calls().is_empty());
    }

    #[tokio::test]
    async fn execute_for_unknown_wallet_is_forbidden() {
        let app = test_app(Some(Arc::new(FixedKey)), None);

        let (status, _) = send(
            app.state,
            post_json(
                "/v1/wallets/0x3333333333333333333333333333333333333333/transfers",
                body("0.5"),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn malformed_recipient_is_bad_request() {
        let app = test_app(None, None);
        let mut payload = body("0.5");
        payload["to"] = json!("0xnope");

        let (status, _) = send(
            app.state,
            post_json(&format!("/v1/wallets/{}/transfers/quote", sender()), payload),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
