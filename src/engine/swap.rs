// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token swaps through a UniswapV2-style router.
//!
//! Before signing, a swap must pass the same kind of pre-flight a transfer
//! does: the input token balance and router allowance cover the amount, and
//! the native balance covers the estimated gas fee.

use std::{sync::Arc, time::Duration};

use alloy::{
    primitives::{Address, TxKind, B256, U256},
    rpc::types::TransactionRequest,
};
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{
    catalog::{Asset, AssetCatalog},
    context::CallContext,
    error::{EngineError, Step},
    locks::AddressLocks,
    to_units, whole_units,
};
use crate::blockchain::{erc20, router, ChainClient, SigningContext};

#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub from: Address,
    pub from_asset: Asset,
    pub to_asset: Asset,
    /// Whole units of `from_asset` to sell
    pub amount: Decimal,
    /// Floor on whole units of `to_asset` received; one smallest unit if unset
    pub min_amount_out: Option<Decimal>,
    /// Router deadline; the engine's default horizon from now if unset
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SwapReceipt {
    pub transaction_id: B256,
    pub nonce: u64,
    pub chain_id: u64,
    pub deadline: DateTime<Utc>,
    pub amount_in_raw: U256,
    pub min_amount_out_raw: U256,
    pub gas_limit: u64,
    pub gas_price_wei: u128,
    pub estimated_gas_fee: Decimal,
    pub fee_symbol: String,
}

pub struct SwapEngine {
    chain: Arc<dyn ChainClient>,
    catalog: Arc<AssetCatalog>,
    router: Address,
    deadline_horizon: Duration,
    locks: Arc<AddressLocks>,
}

impl SwapEngine {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        catalog: Arc<AssetCatalog>,
        router: Address,
        deadline_horizon: Duration,
        locks: Arc<AddressLocks>,
    ) -> Self {
        Self {
            chain,
            catalog,
            router,
            deadline_horizon,
            locks,
        }
    }

    pub fn router(&self) -> Address {
        self.router
    }

    /// Swap `amount` of `from_asset` for `to_asset` along `[from, to]`.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        request: &SwapRequest,
        signer: &SigningContext,
    ) -> Result<SwapReceipt, EngineError> {
        let (from_token, to_token) = self.validate_assets(request)?;
        if request.amount <= Decimal::ZERO {
            return Err(EngineError::invalid("amount must be positive"));
        }
        let amount_in = to_units(request.amount, request.from_asset.decimals)?;
        let min_amount_out = match request.min_amount_out {
            Some(min) if min <= Decimal::ZERO => {
                return Err(EngineError::invalid("minimum output must be positive"));
            }
            Some(min) => to_units(min, request.to_asset.decimals)?,
            None => U256::from(1u64),
        };
        let deadline = self.resolve_deadline(request.deadline)?;

        if signer.address() != request.from {
            return Err(EngineError::invalid(format!(
                "signing credential does not control {}",
                request.from
            )));
        }

        let _guard = self.locks.acquire(request.from).await;
        let native_decimals = self.catalog.native_decimals();

        let native_balance = ctx
            .chain(Step::NativeBalance, self.chain.native_balance(request.from))
            .await?;

        let token_balance = self
            .read_word(ctx, Step::TokenBalance, from_token, erc20::balance_of_calldata(request.from))
            .await?;
        if token_balance < amount_in {
            return Err(EngineError::InsufficientFunds {
                asset: request.from_asset.symbol.clone(),
                balance: whole_units(token_balance, request.from_asset.decimals)?,
                required: request.amount,
            });
        }

        let allowance = self
            .read_word(
                ctx,
                Step::Allowance,
                from_token,
                erc20::allowance_calldata(request.from, self.router),
            )
            .await?;
        if allowance < amount_in {
            return Err(EngineError::InsufficientAllowance {
                asset: request.from_asset.symbol.clone(),
                allowance: whole_units(allowance, request.from_asset.decimals)?,
                required: request.amount,
            });
        }

        let input = router::swap_exact_tokens_calldata(
            amount_in,
            min_amount_out,
            from_token,
            to_token,
            request.from,
            deadline.timestamp().unsigned_abs(),
        );
        let call = TransactionRequest {
            from: Some(request.from),
            to: Some(TxKind::Call(self.router)),
            input: input.into(),
            ..Default::default()
        };

        let gas_price = ctx
            .chain(Step::GasPrice, self.chain.suggest_gas_price())
            .await?;
        let gas_limit = ctx
            .chain(Step::EstimateGas, self.chain.estimate_gas(call.clone()))
            .await?;
        let fee_raw = U256::from(gas_limit)
            .checked_mul(U256::from(gas_price))
            .ok_or(EngineError::ArithmeticOverflow)?;
        let estimated_gas_fee = whole_units(fee_raw, native_decimals)?;
        if native_balance < fee_raw {
            warn!(from = %request.from, balance = %native_balance, required = %fee_raw, "Swap gas not affordable");
            return Err(EngineError::InsufficientFunds {
                asset: self.catalog.native_symbol().to_string(),
                balance: whole_units(native_balance, native_decimals)?,
                required: estimated_gas_fee,
            });
        }

        let nonce = ctx
            .chain(Step::Nonce, self.chain.nonce(request.from))
            .await?;
        let chain_id = ctx.chain(Step::ChainId, self.chain.chain_id()).await?;

        let tx = TransactionRequest {
            nonce: Some(nonce),
            chain_id: Some(chain_id),
            gas: Some(gas_limit),
            gas_price: Some(gas_price),
            ..call
        };
        let signed = ctx
            .bounded(Step::Sign, signer.sign(tx))
            .await?
            .map_err(|e| EngineError::SigningFailed(e.to_string()))?;
        let transaction_id = ctx
            .submit(self.chain.broadcast(signed.raw))
            .await?;

        info!(
            from = %request.from,
            sell = %request.from_asset.symbol,
            buy = %request.to_asset.symbol,
            amount = %request.amount,
            tx_hash = %transaction_id,
            nonce,
            "Swap broadcast"
        );

        Ok(SwapReceipt {
            transaction_id,
            nonce,
            chain_id,
            deadline,
            amount_in_raw: amount_in,
            min_amount_out_raw: min_amount_out,
            gas_limit,
            gas_price_wei: gas_price,
            estimated_gas_fee,
            fee_symbol: self.catalog.native_symbol().to_string(),
        })
    }

    fn validate_assets(&self, request: &SwapRequest) -> Result<(Address, Address), EngineError> {
        for asset in [&request.from_asset, &request.to_asset] {
            if !self.catalog.contains(asset) {
                return Err(EngineError::invalid(format!(
                    "asset {} is not in the catalog",
                    asset.symbol
                )));
            }
        }
        let (Some(from_token), Some(to_token)) = (
            request.from_asset.contract_address,
            request.to_asset.contract_address,
        ) else {
            return Err(EngineError::invalid("both swap assets must be token contracts"));
        };
        if from_token == to_token {
            return Err(EngineError::invalid("cannot swap an asset for itself"));
        }
        Ok((from_token, to_token))
    }

    fn resolve_deadline(
        &self,
        requested: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>, EngineError> {
        let now = Utc::now();
        let deadline = match requested {
            Some(deadline) => deadline,
            None => {
                let horizon = TimeDelta::from_std(self.deadline_horizon)
                    .map_err(|_| EngineError::ArithmeticOverflow)?;
                now.checked_add_signed(horizon)
                    .ok_or(EngineError::ArithmeticOverflow)?
            }
        };
        if deadline <= now {
            return Err(EngineError::invalid("deadline has already passed"));
        }
        Ok(deadline)
    }

    async fn read_word(
        &self,
        ctx: &CallContext,
        step: Step,
        token: Address,
        call_data: alloy::primitives::Bytes,
    ) -> Result<U256, EngineError> {
        let output = ctx
            .chain(step, self.chain.contract_read(token, call_data))
            .await?;
        let decoded = match step {
            Step::Allowance => erc20::decode_allowance(&output),
            _ => erc20::decode_balance_of(&output),
        };
        decoded.map_err(|e| EngineError::from_chain(step, e))
    }
}
