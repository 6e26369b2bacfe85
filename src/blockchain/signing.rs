// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction signing.
//!
//! A [`SigningContext`] wraps the caller-supplied credential. Keys arrive as
//! PKCS#8/SEC1 PEM or raw hex; custody of those keys is the caller's concern.

use alloy::{
    eips::eip2718::Encodable2718,
    network::{Ethereum, EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, B256},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use k256::SecretKey;

/// Credential used to sign transactions for a single address.
#[derive(Clone)]
pub struct SigningContext {
    signer: PrivateKeySigner,
}

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    /// EIP-2718 encoded transaction bytes
    pub raw: Bytes,
    /// Transaction hash
    pub hash: B256,
}

impl SigningContext {
    /// Create a context from a private key (hex string, optional 0x prefix).
    pub fn from_hex(private_key_hex: &str) -> Result<Self, SigningError> {
        let key = private_key_hex.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let key_bytes = alloy::hex::decode(key)
            .map_err(|e| SigningError::InvalidKey(e.to_string()))?;

        let signer = PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| SigningError::InvalidKey(e.to_string()))?;

        Ok(Self { signer })
    }

    /// Create a context from a PEM-encoded private key.
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, SigningError> {
        let hex_key = pem_to_hex(pem_bytes)?;
        Self::from_hex(&hex_key)
    }

    /// Address controlled by this credential.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign a fully-populated transaction request.
    ///
    /// The request must carry `from` (matching [`Self::address`]), nonce,
    /// gas limit, gas price and chain id.
    pub async fn sign(&self, tx: TransactionRequest) -> Result<SignedTransaction, SigningError> {
        if tx.from != Some(self.address()) {
            return Err(SigningError::AddressMismatch {
                expected: tx.from.unwrap_or_default(),
                actual: self.address(),
            });
        }
        if tx.chain_id.is_none() {
            return Err(SigningError::Signing("missing chain id".to_string()));
        }

        let wallet = EthereumWallet::from(self.signer.clone());
        let envelope = <TransactionRequest as TransactionBuilder<Ethereum>>::build(tx, &wallet)
            .await
            .map_err(|e| SigningError::Signing(e.to_string()))?;

        Ok(SignedTransaction {
            hash: *envelope.tx_hash(),
            raw: envelope.encoded_2718().into(),
        })
    }
}

impl std::fmt::Debug for SigningContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningContext")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Parse a private key from PEM format to hex string.
///
/// Accepts SEC1 (`EC PRIVATE KEY`) and PKCS#8 (`PRIVATE KEY`) encodings.
///
/// # Returns
/// * `Ok(String)` - Hex-encoded private key (64 characters, no 0x prefix)
/// * `Err(SigningError)` - If PEM parsing fails
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, SigningError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| SigningError::InvalidKey(format!("Invalid UTF-8: {}", e)))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| SigningError::InvalidKey(format!("Invalid PEM: {}", e)))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| SigningError::InvalidKey(format!("Invalid key format: {}", e)))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Errors raised while loading credentials or signing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SigningError {
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Credential controls {actual}, transaction is from {expected}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("Signing failed: {0}")]
    Signing(String),
}
