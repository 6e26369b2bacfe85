// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing credential lookup.
//!
//! Key custody lives outside this service. The engines only need a
//! [`SigningContext`] for the sending address, obtained through
//! [`CredentialResolver`].

use std::path::PathBuf;

use alloy::primitives::Address;
use async_trait::async_trait;
use tracing::debug;

use crate::blockchain::{SigningContext, SigningError};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("No signing credential for {0}")]
    NotFound(Address),

    #[error("Credential for {address} is unusable: {reason}")]
    Invalid { address: Address, reason: String },

    #[error("Credential store unavailable: {0}")]
    Unavailable(String),
}

/// Resolves the signing credential controlling an address.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, address: Address) -> Result<SigningContext, CredentialError>;
}

/// Directory of `<address>.pem` private keys (lowercase hex address with
/// `0x` prefix), SEC1 or PKCS#8 encoded.
#[derive(Debug, Clone)]
pub struct PemKeyDirectory {
    root: PathBuf,
}

impl PemKeyDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn key_path(&self, address: Address) -> PathBuf {
        self.root.join(format!("{address:#x}.pem"))
    }
}

#[async_trait]
impl CredentialResolver for PemKeyDirectory {
    async fn resolve(&self, address: Address) -> Result<SigningContext, CredentialError> {
        let path = self.key_path(address);
        let pem = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CredentialError::NotFound(address));
            }
            Err(e) => return Err(CredentialError::Unavailable(e.to_string())),
        };

        let context = SigningContext::from_pem(&pem).map_err(|e: SigningError| {
            CredentialError::Invalid {
                address,
                reason: e.to_string(),
            }
        })?;
        if context.address() != address {
            return Err(CredentialError::Invalid {
                address,
                reason: format!("key controls {}", context.address()),
            });
        }

        debug!(address = %address, "Resolved signing credential");
        Ok(context)
    }
}
