// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and fixed-point amount conversions.
//!
//! On-chain amounts are unsigned integers in the asset's smallest unit. The
//! helpers here convert to and from [`Decimal`] whole units without going
//! through floating point.

use alloy::primitives::U256;
use rust_decimal::Decimal;

/// Largest mantissa representable by [`Decimal`] (2^96 - 1).
const MAX_DECIMAL_MANTISSA: u128 = 79_228_162_514_264_337_593_543_950_335;

/// Largest scale supported by [`Decimal`].
pub const MAX_DECIMALS: u8 = 28;

/// EVM network configuration.
///
/// Carries no chain id; that is read from the node at signing time.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: String,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Block explorer URL
    pub explorer_url: Option<String>,
}

impl NetworkConfig {
    /// Explorer link for a transaction hash, if an explorer is configured.
    pub fn tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_url
            .as_deref()
            .filter(|base| !base.is_empty())
            .map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
    }
}

/// Errors from amount parsing and conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Too many decimal places (max {max})")]
    TooManyDecimals { max: u8 },

    #[error("Amount must not be negative")]
    Negative,

    #[error("Amount overflow")]
    Overflow,
}

fn pow10(exp: u8) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// Convert a whole-unit decimal into the smallest on-chain unit.
///
/// Exact: fails rather than rounds when `amount` carries more fractional
/// digits than the asset supports.
pub fn decimal_to_units(amount: Decimal, decimals: u8) -> Result<U256, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::TooManyDecimals { max: MAX_DECIMALS });
    }
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative);
    }

    let normalized = amount.normalize();
    let scale = normalized.scale();
    if scale > u32::from(decimals) {
        return Err(AmountError::TooManyDecimals { max: decimals });
    }

    let mantissa = U256::from(normalized.mantissa().unsigned_abs());
    // scale <= decimals <= 28, so the cast is lossless
    mantissa
        .checked_mul(pow10(decimals - scale as u8))
        .ok_or(AmountError::Overflow)
}

/// Convert a smallest-unit integer into a whole-unit decimal.
///
/// Values wider than the 96-bit decimal mantissa lose their least
/// significant fractional digits; the integer part is never truncated.
pub fn units_to_decimal(raw: U256, decimals: u8) -> Result<Decimal, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::TooManyDecimals { max: MAX_DECIMALS });
    }

    let mut raw = raw;
    let mut scale = u32::from(decimals);
    let max = U256::from(MAX_DECIMAL_MANTISSA);
    while raw > max {
        if scale == 0 {
            return Err(AmountError::Overflow);
        }
        raw /= U256::from(10u64);
        scale -= 1;
    }

    let mantissa: u128 = raw.try_into().map_err(|_| AmountError::Overflow)?;
    let mantissa = i128::try_from(mantissa).map_err(|_| AmountError::Overflow)?;
    Decimal::try_from_i128_with_scale(mantissa, scale).map_err(|_| AmountError::Overflow)
}

/// Format smallest-unit amounts as a human-readable string.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = pow10(decimals);
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!(
            "{:0>width$}",
            remainder.to_string(),
            width = decimals as usize
        );
        let trimmed = decimal_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_amount() {
        let one = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(format_amount(one, 18), "1");

        let one_and_half = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(format_amount(one_and_half, 18), "1.5");

        assert_eq!(format_amount(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_amount(U256::from(7u64), 0), "7");
        assert_eq!(format_amount(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_amount(U256::from(1_000_001u64), 6), "1.000001");
    }

    #[test]
    fn six_decimal_token_is_not_scaled_by_eighteen() {
        let balance = units_to_decimal(U256::from(1_000_000u64), 6).unwrap();
        assert_eq!(balance, dec!(1.0));
    }

    #[test]
    fn decimal_units_round_trip_for_all_supported_precisions() {
        for decimals in 0u8..=18 {
            let scale = u32::from(decimals);
            let amounts = [
                Decimal::new(1_234_567_891, scale.min(9)),
                // Every fractional digit in use
                Decimal::new(987_654_321_012_345_678, scale),
                // One smallest unit
                Decimal::new(1, scale),
            ];

            for amount in amounts {
                let raw = decimal_to_units(amount, decimals).unwrap();
                let back = units_to_decimal(raw, decimals).unwrap();
                assert_eq!(back, amount, "decimals = {decimals}, amount = {amount}");

                let text = format_amount(raw, decimals);
                let reparsed: Decimal = text.parse().unwrap();
                assert_eq!(reparsed, amount, "decimals = {decimals}, amount = {amount}");
            }
            assert_eq!(
                decimal_to_units(Decimal::new(1, scale), decimals).unwrap(),
                U256::from(1u64)
            );
        }
    }

    #[test]
    fn decimal_to_units_rejects_excess_precision() {
        assert_eq!(
            decimal_to_units(dec!(0.0000001), 6),
            Err(AmountError::TooManyDecimals { max: 6 })
        );
        assert_eq!(decimal_to_units(dec!(-1), 6), Err(AmountError::Negative));
        // Trailing zeros beyond the precision are fine
        assert_eq!(
            decimal_to_units(dec!(1.50000000), 2).unwrap(),
            U256::from(150u64)
        );
    }

    #[test]
    fn units_to_decimal_handles_wide_values() {
        // 10^30 wei = 10^12 whole units at 18 decimals
        let raw = U256::from(10u64).pow(U256::from(30u64));
        let value = units_to_decimal(raw, 18).unwrap();
        assert_eq!(value, dec!(1000000000000));
    }

    #[test]
    fn explorer_link_is_optional() {
        let mut network = NetworkConfig {
            name: "test".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            explorer_url: None,
        };
        assert_eq!(network.tx_url("0xabc"), None);

        network.explorer_url = Some("https://bscscan.com/".to_string());
        assert_eq!(
            network.tx_url("0xabc").as_deref(),
            Some("https://bscscan.com/tx/0xabc")
        );
    }
}
