// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Engine error taxonomy.

use std::fmt;

use rust_decimal::Decimal;

use crate::blockchain::ChainError;

/// Outbound call an engine operation was performing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    NativeBalance,
    TokenBalance,
    Allowance,
    Quotes,
    GasPrice,
    EstimateGas,
    Nonce,
    ChainId,
    Sign,
    Broadcast,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::NativeBalance => "native_balance",
            Step::TokenBalance => "token_balance",
            Step::Allowance => "allowance",
            Step::Quotes => "quotes",
            Step::GasPrice => "gas_price",
            Step::EstimateGas => "estimate_gas",
            Step::Nonce => "nonce",
            Step::ChainId => "chain_id",
            Step::Sign => "sign",
            Step::Broadcast => "broadcast",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a portfolio, transfer or swap operation.
///
/// Nothing is retried internally; every variant is terminal for the call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("Chain unavailable during {step}: {reason}")]
    ChainUnavailable { step: Step, reason: String },

    #[error("Failed to read {asset} balance: {reason}")]
    BalanceReadFailed { asset: String, reason: String },

    #[error("Price quotes unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("Insufficient {asset} funds: balance {balance}, required {required}")]
    InsufficientFunds {
        asset: String,
        balance: Decimal,
        required: Decimal,
    },

    #[error("Insufficient {asset} allowance: approved {allowance}, required {required}")]
    InsufficientAllowance {
        asset: String,
        allowance: Decimal,
        required: Decimal,
    },

    #[error("Gas estimation failed: {0}")]
    GasEstimationFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Broadcast failed: {0}")]
    BroadcastFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Timed out during {step}{}", for_asset(.asset))]
    Timeout { step: Step, asset: Option<String> },

    #[error("Cancelled during {step}")]
    Cancelled { step: Step },

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

impl EngineError {
    /// Map a chain failure at `step` onto the taxonomy.
    ///
    /// Node rejections during gas estimation or broadcast are request
    /// failures; everything else means the node could not serve the call.
    pub fn from_chain(step: Step, error: ChainError) -> Self {
        match (step, error) {
            (Step::EstimateGas, ChainError::Rejected(reason)) => Self::GasEstimationFailed(reason),
            (Step::Broadcast, ChainError::Rejected(reason)) => Self::BroadcastFailed(reason),
            (step, error) => Self::ChainUnavailable {
                step,
                reason: error.to_string(),
            },
        }
    }

    /// Name the asset whose read stalled.
    pub fn with_asset(self, symbol: &str) -> Self {
        match self {
            Self::Timeout { step, .. } => Self::Timeout {
                step,
                asset: Some(symbol.to_string()),
            },
            other => other,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ChainUnavailable { .. } => "chain_unavailable",
            Self::BalanceReadFailed { .. } => "balance_read_failed",
            Self::QuoteUnavailable(_) => "quote_unavailable",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::InsufficientAllowance { .. } => "insufficient_allowance",
            Self::GasEstimationFailed(_) => "gas_estimation_failed",
            Self::SigningFailed(_) => "signing_failed",
            Self::BroadcastFailed(_) => "broadcast_failed",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled { .. } => "cancelled",
            Self::ArithmeticOverflow => "arithmetic_overflow",
        }
    }
}

fn for_asset(asset: &Option<String>) -> String {
    asset
        .as_ref()
        .map(|symbol| format!(" for {symbol}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_map_by_step() {
        let rejected = || ChainError::Rejected("execution reverted".to_string());

        assert!(matches!(
            EngineError::from_chain(Step::EstimateGas, rejected()),
            EngineError::GasEstimationFailed(_)
        ));
        assert!(matches!(
            EngineError::from_chain(Step::Broadcast, rejected()),
            EngineError::BroadcastFailed(_)
        ));
        assert!(matches!(
            EngineError::from_chain(Step::Nonce, rejected()),
            EngineError::ChainUnavailable { step: Step::Nonce, .. }
        ));
    }

    #[test]
    fn transport_failures_are_unavailability() {
        let err = EngineError::from_chain(Step::Broadcast, ChainError::Rpc("refused".into()));
        assert!(matches!(
            err,
            EngineError::ChainUnavailable { step: Step::Broadcast, .. }
        ));
        assert_eq!(err.code(), "chain_unavailable");
        assert!(err.to_string().contains("broadcast"));
    }

    #[test]
    fn timeouts_can_name_the_asset() {
        let err = EngineError::Timeout {
            step: Step::TokenBalance,
            asset: None,
        };
        assert_eq!(err.to_string(), "Timed out during token_balance");

        let err = err.with_asset("USDC");
        assert_eq!(err.to_string(), "Timed out during token_balance for USDC");
        assert_eq!(err.code(), "timeout");

        let err = EngineError::Cancelled { step: Step::Nonce }.with_asset("USDC");
        assert!(matches!(err, EngineError::Cancelled { step: Step::Nonce }));
    }
}
