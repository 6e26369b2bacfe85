// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CoinMarketCap `quotes/latest` integration.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{OracleError, PriceOracle, PriceQuote};

const QUOTES_LATEST_PATH: &str = "/v1/cryptocurrency/quotes/latest";
const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";
const CONVERT: &str = "USD";
const IMAGE_BASE_URL: &str = "https://s2.coinmarketcap.com/static/img/coins/64x64";

/// Logo URL for a CoinMarketCap asset id.
pub fn image_url(external_id: u64) -> String {
    format!("{IMAGE_BASE_URL}/{external_id}.png")
}

#[derive(Debug, Clone)]
pub struct CoinMarketCapClient {
    base_url: String,
    api_key: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct QuotesLatestResponse {
    status: Option<ApiStatus>,
    #[serde(default)]
    data: HashMap<String, CoinEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    error_code: i64,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoinEntry {
    id: u64,
    #[serde(default)]
    quote: HashMap<String, MarketQuote>,
}

#[derive(Debug, Deserialize)]
struct MarketQuote {
    price: Option<Decimal>,
    volume_24h: Option<Decimal>,
    percent_change_24h: Option<Decimal>,
    market_cap: Option<Decimal>,
}

impl CoinMarketCapClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(OracleError::MissingConfig("API key".to_string()));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            api_key,
            http,
        })
    }

    async fn quotes_latest(&self, symbols: &str) -> Result<QuotesLatestResponse, OracleError> {
        let response = self
            .http
            .get(format!(
                "{}{}",
                self.base_url.trim_end_matches('/'),
                QUOTES_LATEST_PATH
            ))
            .header(API_KEY_HEADER, &self.api_key)
            .header("Accept", "application/json")
            .query(&[
                ("symbol", symbols),
                ("convert", CONVERT),
                ("skip_invalid", "true"),
            ])
            .send()
            .await
            .map_err(|e| OracleError::Request(format!("GET {QUOTES_LATEST_PATH} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Request(format!(
                "GET {QUOTES_LATEST_PATH} returned {status}: {body}"
            )));
        }

        response.json().await.map_err(|e| {
            OracleError::InvalidResponse(format!("GET {QUOTES_LATEST_PATH} invalid JSON: {e}"))
        })
    }
}

#[async_trait]
impl PriceOracle for CoinMarketCapClient {
    async fn quotes(&self, symbols: &[String]) -> Result<HashMap<String, PriceQuote>, OracleError> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let joined = symbols
            .iter()
            .map(|s| s.to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join(",");
        let response = self.quotes_latest(&joined).await?;

        extract_quotes(response, symbols)
    }
}

/// Pick the requested symbols out of a `quotes/latest` payload.
///
/// Symbols with no entry or no USD price are left out of the result.
fn extract_quotes(
    response: QuotesLatestResponse,
    symbols: &[String],
) -> Result<HashMap<String, PriceQuote>, OracleError> {
    if let Some(status) = &response.status {
        if status.error_code != 0 {
            return Err(OracleError::Request(format!(
                "error {}: {}",
                status.error_code,
                status.error_message.as_deref().unwrap_or("unknown")
            )));
        }
    }

    let mut data: HashMap<String, CoinEntry> = response
        .data
        .into_iter()
        .map(|(symbol, entry)| (symbol.to_ascii_uppercase(), entry))
        .collect();

    let mut quotes = HashMap::with_capacity(symbols.len());
    for symbol in symbols {
        let Some(mut entry) = data.remove(&symbol.to_ascii_uppercase()) else {
            warn!(symbol = %symbol, "No quote returned for symbol");
            continue;
        };
        let Some(market) = entry.quote.remove(CONVERT) else {
            warn!(symbol = %symbol, "Quote has no {} conversion", CONVERT);
            continue;
        };
        let Some(price_usd) = market.price else {
            warn!(symbol = %symbol, "Quote has no price");
            continue;
        };

        debug!(symbol = %symbol, price_usd = %price_usd, "Received quote");
        quotes.insert(
            symbol.clone(),
            PriceQuote {
                symbol: symbol.clone(),
                price_usd,
                percent_change_24h: market.percent_change_24h.unwrap_or_default(),
                volume_24h: market.volume_24h.unwrap_or_default(),
                market_cap: market.market_cap.unwrap_or_default(),
                external_id: entry.id,
            },
        );
    }

    Ok(quotes)
}
