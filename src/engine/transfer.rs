// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Native and ERC-20 transfers.
//!
//! Quote and execute share one preparation path, so a quote's `total_cost`
//! is exactly what execute checks before signing. Nothing is signed or
//! broadcast unless the gas-paying balance covers that cost.

use std::sync::Arc;

use alloy::{
    primitives::{Address, TxKind, B256, U256},
    rpc::types::TransactionRequest,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{
    catalog::{Asset, AssetCatalog},
    context::CallContext,
    error::{EngineError, Step},
    locks::AddressLocks,
    to_units, whole_units, GWEI_DECIMALS,
};
use crate::blockchain::{erc20, ChainClient, SigningContext};

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub from: Address,
    pub to: Address,
    pub asset: Asset,
    /// Whole units of `asset`, must be positive
    pub amount: Decimal,
}

/// Read-only cost estimate for a transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFeeQuote {
    pub from: Address,
    pub to: Address,
    pub asset: Asset,
    pub amount: Decimal,
    pub amount_raw: U256,
    pub gas_price_wei: u128,
    pub gas_price_gwei: Decimal,
    pub gas_limit: u64,
    /// Native units
    pub estimated_gas_fee: Decimal,
    pub estimated_gas_fee_raw: U256,
    /// Native units the sender must hold: fee plus amount for native
    /// transfers, fee alone for token transfers
    pub total_cost: Decimal,
    pub total_cost_raw: U256,
    pub fee_symbol: String,
}

#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub transaction_id: B256,
    pub nonce: u64,
    pub chain_id: u64,
    pub quote: TransferFeeQuote,
}

struct Prepared {
    quote: TransferFeeQuote,
    call: TransactionRequest,
}

pub struct TransferEngine {
    chain: Arc<dyn ChainClient>,
    catalog: Arc<AssetCatalog>,
    locks: Arc<AddressLocks>,
}

impl TransferEngine {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        catalog: Arc<AssetCatalog>,
        locks: Arc<AddressLocks>,
    ) -> Self {
        Self {
            chain,
            catalog,
            locks,
        }
    }

    /// Estimate the cost of `request` and check it is affordable.
    pub async fn quote(
        &self,
        ctx: &CallContext,
        request: &TransferRequest,
    ) -> Result<TransferFeeQuote, EngineError> {
        let prepared = self.prepare(ctx, request).await?;
        Ok(prepared.quote)
    }

    /// Sign and broadcast `request` with `signer`.
    ///
    /// Executes from the same address are serialized so each reads a fresh
    /// nonce.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        request: &TransferRequest,
        signer: &SigningContext,
    ) -> Result<TransferReceipt, EngineError> {
        if signer.address() != request.from {
            return Err(EngineError::invalid(format!(
                "signing credential does not control {}",
                request.from
            )));
        }

        let _guard = self.locks.acquire(request.from).await;
        let Prepared { quote, call } = self.prepare(ctx, request).await?;

        let nonce = ctx
            .chain(Step::Nonce, self.chain.nonce(request.from))
            .await?;
        let chain_id = ctx.chain(Step::ChainId, self.chain.chain_id()).await?;

        let tx = TransactionRequest {
            nonce: Some(nonce),
            chain_id: Some(chain_id),
            gas: Some(quote.gas_limit),
            gas_price: Some(quote.gas_price_wei),
            ..call
        };
        let signed = ctx
            .bounded(Step::Sign, signer.sign(tx))
            .await?
            .map_err(|e| EngineError::SigningFailed(e.to_string()))?;

        let transaction_id = ctx
            .submit(self.chain.broadcast(signed.raw))
            .await?;
        if transaction_id != signed.hash {
            warn!(
                expected = %signed.hash,
                returned = %transaction_id,
                "Node returned unexpected transaction hash"
            );
        }

        info!(
            from = %request.from,
            to = %request.to,
            asset = %request.asset.symbol,
            amount = %request.amount,
            tx_hash = %transaction_id,
            nonce,
            "Transfer broadcast"
        );

        Ok(TransferReceipt {
            transaction_id,
            nonce,
            chain_id,
            quote,
        })
    }

    async fn prepare(
        &self,
        ctx: &CallContext,
        request: &TransferRequest,
    ) -> Result<Prepared, EngineError> {
        let amount_raw = self.validate(request)?;
        let asset = &request.asset;
        let native_decimals = self.catalog.native_decimals();

        let native_balance = ctx
            .chain(Step::NativeBalance, self.chain.native_balance(request.from))
            .await?;

        let call = match asset.contract_address {
            None => {
                // Nodes refuse to estimate a value transfer the sender cannot cover
                if native_balance < amount_raw {
                    return Err(EngineError::InsufficientFunds {
                        asset: asset.symbol.clone(),
                        balance: whole_units(native_balance, native_decimals)?,
                        required: request.amount,
                    });
                }

                TransactionRequest {
                    from: Some(request.from),
                    to: Some(TxKind::Call(request.to)),
                    value: Some(amount_raw),
                    ..Default::default()
                }
            }
            Some(token) => {
                let output = ctx
                    .chain(
                        Step::TokenBalance,
                        self.chain
                            .contract_read(token, erc20::balance_of_calldata(request.from)),
                    )
                    .await?;
                let token_balance = erc20::decode_balance_of(&output)
                    .map_err(|e| EngineError::from_chain(Step::TokenBalance, e))?;
                if token_balance < amount_raw {
                    return Err(EngineError::InsufficientFunds {
                        asset: asset.symbol.clone(),
                        balance: whole_units(token_balance, asset.decimals)?,
                        required: request.amount,
                    });
                }

                TransactionRequest {
                    from: Some(request.from),
                    to: Some(TxKind::Call(token)),
                    input: erc20::transfer_calldata(request.to, amount_raw).into(),
                    ..Default::default()
                }
            }
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
        let total_raw = if asset.is_native() {
            fee_raw
                .checked_add(amount_raw)
                .ok_or(EngineError::ArithmeticOverflow)?
        } else {
            fee_raw
        };

        let total_cost = whole_units(total_raw, native_decimals)?;
        if native_balance < total_raw {
            warn!(
                from = %request.from,
                balance = %native_balance,
                required = %total_raw,
                "Transfer not affordable"
            );
            return Err(EngineError::InsufficientFunds {
                asset: self.catalog.native_symbol().to_string(),
                balance: whole_units(native_balance, native_decimals)?,
                required: total_cost,
            });
        }

        let quote = TransferFeeQuote {
            from: request.from,
            to: request.to,
            asset: asset.clone(),
            amount: request.amount,
            amount_raw,
            gas_price_wei: gas_price,
            gas_price_gwei: whole_units(U256::from(gas_price), GWEI_DECIMALS)?,
            gas_limit,
            estimated_gas_fee: whole_units(fee_raw, native_decimals)?,
            estimated_gas_fee_raw: fee_raw,
            total_cost,
            total_cost_raw: total_raw,
            fee_symbol: self.catalog.native_symbol().to_string(),
        };

        Ok(Prepared { quote, call })
    }

    fn validate(&self, request: &TransferRequest) -> Result<U256, EngineError> {
        if request.amount <= Decimal::ZERO {
            return Err(EngineError::invalid("amount must be positive"));
        }
        if request.to == Address::ZERO {
            return Err(EngineError::invalid("destination is the zero address"));
        }
        if !self.catalog.contains(&request.asset) {
            return Err(EngineError::invalid(format!(
                "asset {} is not in the catalog",
                request.asset.symbol
            )));
        }
        to_units(request.amount, request.asset.decimals)
    }
}
