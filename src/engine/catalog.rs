// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registry of tradeable assets.

use std::{collections::HashSet, path::Path};

use alloy::primitives::{address, Address};
use serde::Deserialize;

use super::error::EngineError;
use crate::blockchain::MAX_DECIMALS;

/// Decimals assumed for the gas coin when the catalog lists no native asset.
const DEFAULT_NATIVE_DECIMALS: u8 = 18;

/// Token accepted in place of a symbol or contract address for the gas coin.
pub const NATIVE_TOKEN: &str = "native";

/// A tradeable asset: the chain's native coin or an ERC-20 contract.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub name: String,
    pub symbol: String,
    /// `None` marks the native coin
    #[serde(default)]
    pub contract_address: Option<Address>,
    pub decimals: u8,
}

impl Asset {
    pub fn native(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            contract_address: None,
            decimals,
        }
    }

    pub fn token(
        name: impl Into<String>,
        symbol: impl Into<String>,
        contract_address: Address,
        decimals: u8,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            contract_address: Some(contract_address),
            decimals,
        }
    }

    pub fn is_native(&self) -> bool {
        self.contract_address.is_none()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Duplicate asset symbol: {0}")]
    DuplicateSymbol(String),

    #[error("Duplicate contract address: {0}")]
    DuplicateContract(Address),

    #[error("More than one native asset: {0}")]
    MultipleNative(String),

    #[error("Asset {symbol} has {decimals} decimals (max {max})")]
    UnsupportedDecimals { symbol: String, decimals: u8, max: u8 },

    #[error("Reference asset {0} is not in the catalog")]
    UnknownReference(String),

    #[error("Catalog has no assets")]
    Empty,

    #[error("Invalid catalog file: {0}")]
    InvalidFile(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    reference_symbol: String,
    assets: Vec<Asset>,
}

/// Immutable, validated asset list plus the reference asset used to express
/// portfolio totals.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    assets: Vec<Asset>,
    reference_symbol: String,
}

impl AssetCatalog {
    pub fn new(
        assets: Vec<Asset>,
        reference_symbol: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let reference_symbol = reference_symbol.into();
        if assets.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut symbols = HashSet::new();
        let mut contracts = HashSet::new();
        let mut native: Option<&str> = None;
        for asset in &assets {
            if !symbols.insert(asset.symbol.to_ascii_uppercase()) {
                return Err(CatalogError::DuplicateSymbol(asset.symbol.clone()));
            }
            if asset.decimals > MAX_DECIMALS {
                return Err(CatalogError::UnsupportedDecimals {
                    symbol: asset.symbol.clone(),
                    decimals: asset.decimals,
                    max: MAX_DECIMALS,
                });
            }
            match asset.contract_address {
                Some(contract) => {
                    if !contracts.insert(contract) {
                        return Err(CatalogError::DuplicateContract(contract));
                    }
                }
                None => {
                    if native.replace(&asset.symbol).is_some() {
                        return Err(CatalogError::MultipleNative(asset.symbol.clone()));
                    }
                }
            }
        }

        if !symbols.contains(&reference_symbol.to_ascii_uppercase()) {
            return Err(CatalogError::UnknownReference(reference_symbol));
        }

        Ok(Self {
            assets,
            reference_symbol,
        })
    }

    /// Catalog for BNB Smart Chain mainnet, referenced in BTC.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(
            vec![
                Asset::token(
                    "Bitcoin",
                    "BTC",
                    address!("71CCe0035d82c21Cf4b908bcd8F1117fFf0Fa623"),
                    18,
                ),
                Asset::native("BNB", "BNB", 18),
                Asset::token(
                    "Shiba Inu",
                    "SHIB",
                    address!("2859e4544C4bB03966803b044A93563Bd2D0DD4D"),
                    18,
                ),
                Asset::token(
                    "Binance-Peg USD Coin",
                    "USDC",
                    address!("8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d"),
                    18,
                ),
            ],
            "BTC",
        )
    }

    /// Parse a JSON catalog: `{"referenceSymbol": "...", "assets": [...]}`.
    pub fn from_json(json: &str, reference_override: Option<&str>) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|e| CatalogError::InvalidFile(e.to_string()))?;
        let reference = reference_override
            .map(str::to_string)
            .unwrap_or(file.reference_symbol);
        Self::new(file.assets, reference)
    }

    pub fn load(path: &Path, reference_override: Option<&str>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::InvalidFile(format!("{}: {e}", path.display())))?;
        Self::from_json(&json, reference_override)
    }

    /// Replace the reference asset, re-validating against the asset list.
    pub fn with_reference(self, reference_symbol: &str) -> Result<Self, CatalogError> {
        Self::new(self.assets, reference_symbol)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn reference_symbol(&self) -> &str {
        &self.reference_symbol
    }

    pub fn native(&self) -> Option<&Asset> {
        self.assets.iter().find(|a| a.is_native())
    }

    /// Decimals of the coin that pays gas.
    pub fn native_decimals(&self) -> u8 {
        self.native()
            .map(|a| a.decimals)
            .unwrap_or(DEFAULT_NATIVE_DECIMALS)
    }

    /// Symbol of the coin that pays gas, for display.
    pub fn native_symbol(&self) -> &str {
        self.native().map(|a| a.symbol.as_str()).unwrap_or("native")
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&Asset> {
        self.assets
            .iter()
            .find(|a| a.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn by_contract(&self, contract: Address) -> Option<&Asset> {
        self.assets
            .iter()
            .find(|a| a.contract_address == Some(contract))
    }

    pub fn contains(&self, asset: &Asset) -> bool {
        self.assets.iter().any(|a| a == asset)
    }

    /// Resolve `"native"`, a symbol or a contract address to a catalog asset.
    pub fn resolve(&self, token: &str) -> Result<&Asset, EngineError> {
        let token = token.trim();
        if token.eq_ignore_ascii_case(NATIVE_TOKEN) {
            return self
                .native()
                .ok_or_else(|| EngineError::invalid("catalog has no native asset"));
        }
        if token.starts_with("0x") || token.starts_with("0X") {
            let contract: Address = token
                .parse()
                .map_err(|_| EngineError::invalid(format!("malformed contract address: {token}")))?;
            return self
                .by_contract(contract)
                .ok_or_else(|| EngineError::invalid(format!("unknown contract: {contract}")));
        }
        self.by_symbol(token)
            .ok_or_else(|| EngineError::invalid(format!("unknown asset: {token}")))
    }
}
