// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory chain and oracle doubles that record every call.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use alloy::{
    primitives::{keccak256, Address, Bytes, B256, U256},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};
use async_trait::async_trait;
use rust_decimal::Decimal;

use super::catalog::{Asset, AssetCatalog};
use crate::{
    blockchain::{erc20::IERC20, ChainClient, ChainError},
    oracle::{OracleError, PriceOracle, PriceQuote},
};

pub const GWEI: u128 = 1_000_000_000;

pub fn ether(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(18u64))
}

/// BTC-referenced catalog with a native coin and a 6-decimal stablecoin.
pub fn catalog() -> AssetCatalog {
    AssetCatalog::new(
        vec![
            Asset::token("Bitcoin", "BTC", Address::repeat_byte(0xb1), 18),
            Asset::native("BNB", "BNB", 18),
            Asset::token("Shiba Inu", "SHIB", Address::repeat_byte(0x5b), 18),
            Asset::token("USD Coin", "USDC", Address::repeat_byte(0x6d), 6),
        ],
        "BTC",
    )
    .unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    NativeBalance,
    BalanceOf,
    Allowance,
    Nonce,
    GasPrice,
    EstimateGas,
    ChainId,
    Broadcast,
}

#[derive(Debug, Default)]
struct ChainState {
    native: HashMap<Address, U256>,
    tokens: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    nonces: HashMap<Address, u64>,
    gas_price: u128,
    gas_limit: u64,
    chain_id: u64,
    failures: HashMap<Method, ChainError>,
    stalled: HashSet<Method>,
    calls: Vec<Method>,
    estimates: Vec<TransactionRequest>,
    broadcasts: Vec<Bytes>,
}

/// Scriptable [`ChainClient`].
#[derive(Debug)]
pub struct MockChain {
    state: Mutex<ChainState>,
}

impl MockChain {
    /// Chain 56 with 21000 gas at 50 gwei and no balances.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ChainState {
                gas_price: 50 * GWEI,
                gas_limit: 21_000,
                chain_id: 56,
                ..Default::default()
            }),
        })
    }

    fn with<R>(&self, f: impl FnOnce(&mut ChainState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn set_native(&self, holder: Address, amount: U256) {
        self.with(|s| s.native.insert(holder, amount));
    }

    pub fn set_token(&self, token: Address, holder: Address, amount: U256) {
        self.with(|s| s.tokens.insert((token, holder), amount));
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.with(|s| s.allowances.insert((token, owner, spender), amount));
    }

    pub fn set_gas(&self, gas_limit: u64, gas_price: u128) {
        self.with(|s| {
            s.gas_limit = gas_limit;
            s.gas_price = gas_price;
        });
    }

    pub fn set_nonce(&self, holder: Address, nonce: u64) {
        self.with(|s| s.nonces.insert(holder, nonce));
    }

    pub fn fail(&self, method: Method, error: ChainError) {
        self.with(|s| s.failures.insert(method, error));
    }

    /// Make `method` never complete.
    pub fn stall(&self, method: Method) {
        self.with(|s| s.stalled.insert(method));
    }

    pub fn calls(&self) -> Vec<Method> {
        self.with(|s| s.calls.clone())
    }

    pub fn count(&self, method: Method) -> usize {
        self.with(|s| s.calls.iter().filter(|m| **m == method).count())
    }

    pub fn estimates(&self) -> Vec<TransactionRequest> {
        self.with(|s| s.estimates.clone())
    }

    pub fn broadcasts(&self) -> Vec<Bytes> {
        self.with(|s| s.broadcasts.clone())
    }

    async fn enter(&self, method: Method) -> Result<(), ChainError> {
        let (stalled, failure) = self.with(|s| {
            s.calls.push(method);
            (s.stalled.contains(&method), s.failures.get(&method).cloned())
        });
        if stalled {
            std::future::pending::<()>().await;
        }
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn word(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes::<32>().to_vec())
}

#[async_trait]
impl ChainClient for MockChain {
    async fn native_balance(&self, address: Address) -> Result<U256, ChainError> {
        self.enter(Method::NativeBalance).await?;
        Ok(self.with(|s| s.native.get(&address).copied().unwrap_or_default()))
    }

    async fn contract_read(&self, contract: Address, call_data: Bytes) -> Result<Bytes, ChainError> {
        if let Ok(call) = IERC20::balanceOfCall::abi_decode(&call_data) {
            self.enter(Method::BalanceOf).await?;
            let balance = self.with(|s| {
                s.tokens
                    .get(&(contract, call.account))
                    .copied()
                    .unwrap_or_default()
            });
            return Ok(word(balance));
        }
        if let Ok(call) = IERC20::allowanceCall::abi_decode(&call_data) {
            self.enter(Method::Allowance).await?;
            let allowance = self.with(|s| {
                s.allowances
                    .get(&(contract, call.owner, call.spender))
                    .copied()
                    .unwrap_or_default()
            });
            return Ok(word(allowance));
        }
        Err(ChainError::Rejected("execution reverted".to_string()))
    }

    async fn nonce(&self, address: Address) -> Result<u64, ChainError> {
        self.enter(Method::Nonce).await?;
        Ok(self.with(|s| s.nonces.get(&address).copied().unwrap_or_default()))
    }

    async fn suggest_gas_price(&self) -> Result<u128, ChainError> {
        self.enter(Method::GasPrice).await?;
        Ok(self.with(|s| s.gas_price))
    }

    async fn estimate_gas(&self, call: TransactionRequest) -> Result<u64, ChainError> {
        self.enter(Method::EstimateGas).await?;
        self.with(|s| {
            let value = call.value.unwrap_or_default();
            let balance = call
                .from
                .and_then(|from| s.native.get(&from).copied())
                .unwrap_or_default();
            s.estimates.push(call);
            // Same refusal geth gives for an unaffordable value transfer
            if value > balance {
                return Err(ChainError::Rejected(
                    "insufficient funds for transfer".to_string(),
                ));
            }
            Ok(s.gas_limit)
        })
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.enter(Method::ChainId).await?;
        Ok(self.with(|s| s.chain_id))
    }

    async fn broadcast(&self, signed_tx: Bytes) -> Result<B256, ChainError> {
        self.enter(Method::Broadcast).await?;
        let hash = keccak256(&signed_tx);
        self.with(|s| s.broadcasts.push(signed_tx));
        Ok(hash)
    }
}

#[derive(Debug, Default)]
struct OracleState {
    quotes: HashMap<String, PriceQuote>,
    failure: Option<OracleError>,
    requests: Vec<Vec<String>>,
}

/// Scriptable [`PriceOracle`].
#[derive(Debug, Default)]
pub struct MockOracle {
    state: Mutex<OracleState>,
}

impl MockOracle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_price(&self, symbol: &str, price_usd: Decimal, external_id: u64) {
        self.state.lock().unwrap().quotes.insert(
            symbol.to_string(),
            PriceQuote {
                symbol: symbol.to_string(),
                price_usd,
                percent_change_24h: Decimal::ONE,
                volume_24h: Decimal::ONE_THOUSAND,
                market_cap: Decimal::ONE_HUNDRED,
                external_id,
            },
        );
    }

    pub fn fail(&self, error: OracleError) {
        self.state.lock().unwrap().failure = Some(error);
    }

    pub fn requests(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl PriceOracle for MockOracle {
    async fn quotes(&self, symbols: &[String]) -> Result<HashMap<String, PriceQuote>, OracleError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(symbols.to_vec());
        if let Some(error) = state.failure.clone() {
            return Err(error);
        }
        Ok(symbols
            .iter()
            .filter_map(|s| state.quotes.get(s).map(|q| (s.clone(), q.clone())))
            .collect())
    }
}
